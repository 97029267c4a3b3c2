//! Visual styling for the campaign graph.
//!
//! Pure helpers mapping model data to colors, strokes and sizes: color by
//! node type, stroke by relation category, radius by degree.

use super::relations::RelationCategory;
use super::types::NodeType;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		let up = |c: u8| (c as f64 + (255.0 - c as f64) * f) as u8;
		Self {
			r: up(self.r),
			g: up(self.g),
			b: up(self.b),
			a: self.a,
		}
	}

	/// Darken the color by a factor (0.0 = unchanged, 1.0 = black)
	pub fn darken(self, factor: f64) -> Self {
		let f = 1.0 - factor.clamp(0.0, 1.0);
		let down = |c: u8| (c as f64 * f) as u8;
		Self {
			r: down(self.r),
			g: down(self.g),
			b: down(self.b),
			a: self.a,
		}
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Fill color for a node type.
pub fn node_color(node_type: NodeType) -> Color {
	match node_type {
		NodeType::Event => Color::rgb(232, 163, 61),
		NodeType::Character => Color::rgb(94, 129, 172),
		NodeType::Location => Color::rgb(106, 168, 120),
		NodeType::Object => Color::rgb(190, 120, 160),
	}
}

/// How an edge is stroked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStroke {
	pub color: Color,
	/// Line width in screen pixels at zoom 1.
	pub width: f64,
	/// `(dash, gap)` in world units; `None` for a solid line.
	pub dash: Option<(f64, f64)>,
}

/// Stroke for a relation category.
pub fn edge_stroke(category: RelationCategory) -> EdgeStroke {
	let (color, width, dash) = match category {
		RelationCategory::Temporal => (Color::rgb(232, 163, 61), 2.0, Some((8.0, 5.0))),
		RelationCategory::Appearance => (Color::rgb(129, 161, 193), 1.6, None),
		RelationCategory::Location => (Color::rgb(106, 168, 120), 1.6, None),
		RelationCategory::Usage => (Color::rgb(160, 140, 200), 1.4, Some((3.0, 4.0))),
		RelationCategory::Ownership => (Color::rgb(190, 120, 160), 1.4, None),
		RelationCategory::Generic => (Color::rgb(140, 150, 165), 1.2, None),
	};
	EdgeStroke { color, width, dash }
}

/// Smallest node radius, used for orphans.
pub const BASE_NODE_RADIUS: f64 = 9.0;
/// Largest node radius regardless of degree.
pub const MAX_NODE_RADIUS: f64 = 24.0;

/// Node radius grows with the square root of degree, softening hubs.
pub fn node_radius(degree: usize) -> f64 {
	(BASE_NODE_RADIUS + 3.0 * (degree as f64).sqrt()).min(MAX_NODE_RADIUS)
}

/// Background and label colors.
#[derive(Clone, Debug)]
pub struct Theme {
	pub background: Color,
	pub background_secondary: Color,
	pub label: Color,
	pub selection_ring: Color,
	pub focus_ring: Color,
	/// Label font size in screen pixels.
	pub label_size: f64,
}

impl Default for Theme {
	fn default() -> Self {
		Self {
			background: Color::rgb(22, 27, 34),
			background_secondary: Color::rgb(30, 35, 42),
			label: Color::rgba(235, 238, 242, 0.9),
			selection_ring: Color::rgb(255, 214, 102),
			focus_ring: Color::rgba(255, 255, 255, 0.8),
			label_size: 12.0,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn radius_grows_with_degree_and_is_capped() {
		assert_eq!(node_radius(0), BASE_NODE_RADIUS);
		assert!(node_radius(4) > node_radius(1));
		assert_eq!(node_radius(10_000), MAX_NODE_RADIUS);
	}

	#[test]
	fn temporal_relations_are_dashed() {
		assert!(edge_stroke(RelationCategory::Temporal).dash.is_some());
		assert!(edge_stroke(RelationCategory::Generic).dash.is_none());
	}

	#[test]
	fn css_output() {
		assert_eq!(Color::rgb(255, 0, 16).to_css(), "#ff0010");
		assert_eq!(Color::rgb(10, 20, 30).with_alpha(0.5).to_css(), "rgba(10, 20, 30, 0.5)");
		assert_eq!(Color::rgb(100, 100, 100).lighten(1.0), Color::rgb(255, 255, 255));
		assert_eq!(Color::rgb(100, 100, 100).darken(1.0), Color::rgb(0, 0, 0));
	}
}
