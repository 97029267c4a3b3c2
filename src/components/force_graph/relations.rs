//! Static metadata for relation kinds.
//!
//! The table is local; it is never fetched. Unknown kinds fall back to a
//! generic, non-directional entry with a humanized label.

use std::borrow::Cow;

/// Broad grouping of relation kinds, used to pick an edge stroke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationCategory {
	Temporal,
	Appearance,
	Location,
	Usage,
	Ownership,
	Generic,
}

/// Display metadata for one relation kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationMeta {
	pub label: Cow<'static, str>,
	/// Directional kinds are drawn with an arrowhead at the target.
	pub directional: bool,
	pub category: RelationCategory,
}

const fn known(label: &'static str, directional: bool, category: RelationCategory) -> RelationMeta {
	RelationMeta {
		label: Cow::Borrowed(label),
		directional,
		category,
	}
}

/// Look up the metadata for a relation kind. Never fails.
pub fn relation_meta(kind: &str) -> RelationMeta {
	use RelationCategory::*;
	match kind {
		"PRECEDES" => known("Precedes", true, Temporal),
		"FOLLOWS" => known("Follows", true, Temporal),
		"CAUSES" => known("Causes", true, Temporal),
		"CONCURRENT_WITH" => known("Concurrent with", false, Temporal),
		"APPEARS" | "APPEARS_IN" => known("Appears in", true, Appearance),
		"PARTICIPATES_IN" => known("Participates in", true, Appearance),
		"WITNESSES" => known("Witnesses", true, Appearance),
		"OCCURS_AT" => known("Occurs at", true, Location),
		"LOCATED_IN" => known("Located in", true, Location),
		"LIVES_IN" => known("Lives in", true, Location),
		"CONNECTED_TO" => known("Connected to", false, Location),
		"USES" => known("Uses", true, Usage),
		"INVOLVES" => known("Involves", true, Usage),
		"OWNS" => known("Owns", true, Ownership),
		"CARRIES" => known("Carries", true, Ownership),
		"BELONGS_TO" => known("Belongs to", true, Ownership),
		"KNOWS" => known("Knows", false, Generic),
		"RELATED_TO" => known("Related to", false, Generic),
		other => RelationMeta {
			label: Cow::Owned(humanize(other)),
			directional: false,
			category: Generic,
		},
	}
}

/// Turn `SOME_KIND` or `some-kind` into `Some kind`.
pub fn humanize(kind: &str) -> String {
	let words: Vec<String> = kind
		.split(['_', '-', ' '])
		.filter(|w| !w.is_empty())
		.map(|w| w.to_lowercase())
		.collect();
	let joined = words.join(" ");
	let mut chars = joined.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => "Related".to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn known_kinds_carry_category_and_direction() {
		let meta = relation_meta("OCCURS_AT");
		assert_eq!(meta.label, "Occurs at");
		assert!(meta.directional);
		assert_eq!(meta.category, RelationCategory::Location);

		assert!(!relation_meta("KNOWS").directional);
	}

	#[test]
	fn unknown_kinds_fall_back_to_generic() {
		let meta = relation_meta("SWORN_ENEMY_OF");
		assert_eq!(meta.label, "Sworn enemy of");
		assert!(!meta.directional);
		assert_eq!(meta.category, RelationCategory::Generic);
	}

	#[test]
	fn humanize_handles_odd_input() {
		assert_eq!(humanize("rival-of"), "Rival of");
		assert_eq!(humanize("__"), "Related");
		assert_eq!(humanize(""), "Related");
	}
}
