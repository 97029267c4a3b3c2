//! Visible-set computation from filter state.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::types::{GraphData, NodeType};

/// Which node types and relation kinds are shown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FiltersState {
	pub types: BTreeMap<NodeType, bool>,
	/// Relation kinds absent from the map are shown.
	pub relations: HashMap<String, bool>,
	pub hide_orphans: bool,
}

impl Default for FiltersState {
	fn default() -> Self {
		Self {
			types: NodeType::ALL.into_iter().map(|t| (t, true)).collect(),
			relations: HashMap::new(),
			hide_orphans: false,
		}
	}
}

impl FiltersState {
	pub fn type_visible(&self, node_type: NodeType) -> bool {
		self.types.get(&node_type).copied().unwrap_or(false)
	}

	pub fn relation_visible(&self, kind: &str) -> bool {
		self.relations.get(kind).copied().unwrap_or(true)
	}

	pub fn toggle_type(&mut self, node_type: NodeType) {
		let visible = self.type_visible(node_type);
		self.types.insert(node_type, !visible);
	}

	pub fn toggle_relation(&mut self, kind: &str) {
		let visible = self.relation_visible(kind);
		self.relations.insert(kind.to_string(), !visible);
	}
}

/// Compute the visible subgraph.
///
/// Always rebuilt from the full data. Links are kept only when both endpoints
/// survive, so the result never contains a dangling link. Degrees on the
/// returned nodes are left as computed from the full data set.
pub fn filter_graph(data: &GraphData, filters: &FiltersState) -> GraphData {
	let typed: HashSet<&str> = data
		.nodes
		.iter()
		.filter(|n| filters.type_visible(n.node_type))
		.map(|n| n.id.as_str())
		.collect();

	let links: Vec<_> = data
		.links
		.iter()
		.filter(|l| {
			typed.contains(l.source.as_str())
				&& typed.contains(l.target.as_str())
				&& filters.relation_visible(&l.kind)
		})
		.cloned()
		.collect();

	let connected: HashSet<&str> = links
		.iter()
		.flat_map(|l| [l.source.as_str(), l.target.as_str()])
		.collect();

	let nodes = data
		.nodes
		.iter()
		.filter(|n| typed.contains(n.id.as_str()))
		.filter(|n| !filters.hide_orphans || connected.contains(n.id.as_str()))
		.cloned()
		.collect();

	GraphData { nodes, links }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::{GraphLink, GraphNode};

	fn node(id: &str, node_type: NodeType) -> GraphNode {
		GraphNode {
			id: id.into(),
			entity_id: id.into(),
			label: id.into(),
			node_type,
			description: None,
			degree: 0,
		}
	}

	fn link(id: &str, source: &str, target: &str, kind: &str) -> GraphLink {
		GraphLink {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			kind: kind.into(),
		}
	}

	fn sample() -> GraphData {
		let mut data = GraphData {
			nodes: vec![
				node("e1", NodeType::Event),
				node("c1", NodeType::Character),
				node("l1", NodeType::Location),
				node("o1", NodeType::Object),
				node("o2", NodeType::Object),
				node("c2", NodeType::Character),
			],
			links: vec![
				link("k1", "e1", "c1", "APPEARS"),
				link("k2", "e1", "l1", "OCCURS_AT"),
				link("k3", "c1", "o1", "OWNS"),
				link("k4", "o2", "l1", "LOCATED_IN"),
				link("k5", "c1", "ghost", "KNOWS"),
			],
		};
		data.recompute_degrees();
		data
	}

	fn ids<T>(items: &[T], id: impl Fn(&T) -> &str) -> Vec<String> {
		items.iter().map(|i| id(i).to_string()).collect()
	}

	fn assert_no_dangling(visible: &GraphData) {
		let nodes: HashSet<&str> = visible.nodes.iter().map(|n| n.id.as_str()).collect();
		for l in &visible.links {
			assert!(nodes.contains(l.source.as_str()) && nodes.contains(l.target.as_str()));
		}
	}

	#[test]
	fn defaults_show_everything_but_dangling_links() {
		let data = sample();
		let visible = filter_graph(&data, &FiltersState::default());
		assert_eq!(visible.nodes, data.nodes);
		assert_eq!(ids(&visible.links, |l| l.id.as_str()), ["k1", "k2", "k3", "k4"]);
		assert_no_dangling(&visible);
	}

	#[test]
	fn hiding_objects_removes_them_and_their_links() {
		let data = sample();
		let mut filters = FiltersState::default();
		filters.toggle_type(NodeType::Object);
		let visible = filter_graph(&data, &filters);

		assert_eq!(ids(&visible.nodes, |n| n.id.as_str()), ["e1", "c1", "l1", "c2"]);
		assert_eq!(ids(&visible.links, |l| l.id.as_str()), ["k1", "k2"]);
		assert_no_dangling(&visible);
	}

	#[test]
	fn relation_filter_defaults_to_visible() {
		let data = sample();
		let mut filters = FiltersState::default();
		filters.toggle_relation("OCCURS_AT");
		assert!(!filters.relation_visible("OCCURS_AT"));
		assert!(filters.relation_visible("NEVER_SEEN"));
		let visible = filter_graph(&data, &filters);
		assert_eq!(ids(&visible.links, |l| l.id.as_str()), ["k1", "k3", "k4"]);
	}

	#[test]
	fn orphans_toggle_round_trips() {
		let data = sample();
		let mut filters = FiltersState::default();
		filters.toggle_type(NodeType::Object);
		let before = filter_graph(&data, &filters);

		filters.hide_orphans = true;
		let hidden = filter_graph(&data, &filters);
		assert_eq!(ids(&hidden.nodes, |n| n.id.as_str()), ["e1", "c1", "l1"]);
		assert_no_dangling(&hidden);

		filters.hide_orphans = false;
		assert_eq!(filter_graph(&data, &filters), before);
	}
}
