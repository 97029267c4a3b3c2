//! Relevance highlighting around a focus node.
//!
//! Everything here is a pure function of the visible links and the focus id;
//! callers recompute on every focus or data change instead of caching.

use std::collections::{HashMap, VecDeque};

use super::types::GraphLink;

/// BFS stops expanding past this many hops.
pub const MAX_HIGHLIGHT_DEPTH: usize = 3;

/// Edge opacity when nothing is focused.
pub const AMBIENT_EDGE_OPACITY: f64 = 0.6;
/// Node opacity for anything unreached by the BFS.
pub const FAR_NODE_OPACITY: f64 = 0.12;
/// Edge opacity when neither endpoint was reached.
pub const FAR_EDGE_OPACITY: f64 = 0.08;

/// Undirected adjacency list keyed by node id.
pub type Adjacency = HashMap<String, Vec<String>>;

/// Hop count from the focus node. Unreached nodes are absent.
pub type Distances = HashMap<String, usize>;

/// Build an undirected adjacency list from links.
pub fn compute_adjacency(links: &[GraphLink]) -> Adjacency {
	let mut adjacency: Adjacency = HashMap::new();
	for link in links {
		adjacency
			.entry(link.source.clone())
			.or_default()
			.push(link.target.clone());
		adjacency
			.entry(link.target.clone())
			.or_default()
			.push(link.source.clone());
	}
	adjacency
}

/// Breadth-first distances from `focus`, expanding at most `max_depth` hops.
pub fn bfs_distances(adjacency: &Adjacency, focus: &str, max_depth: usize) -> Distances {
	let mut distances = Distances::new();
	distances.insert(focus.to_string(), 0);
	let mut queue = VecDeque::from([(focus, 0usize)]);

	while let Some((id, depth)) = queue.pop_front() {
		if depth >= max_depth {
			continue;
		}
		for next in adjacency.get(id).into_iter().flatten() {
			if !distances.contains_key(next) {
				distances.insert(next.clone(), depth + 1);
				queue.push_back((next.as_str(), depth + 1));
			}
		}
	}
	distances
}

/// Opacity for a node at a given BFS distance.
pub fn opacity_for_distance(distance: Option<usize>) -> f64 {
	match distance {
		Some(0 | 1) => 1.0,
		Some(2) => 0.5,
		Some(3) => 0.4,
		_ => FAR_NODE_OPACITY,
	}
}

/// Current highlight state: the focus node and its distance map.
#[derive(Clone, Debug, Default)]
pub struct Highlight {
	pub focus: Option<String>,
	distances: Distances,
}

impl Highlight {
	/// Recompute from scratch for a focus id and the visible links.
	pub fn compute(focus: Option<&str>, links: &[GraphLink]) -> Self {
		let distances = match focus {
			Some(id) => bfs_distances(&compute_adjacency(links), id, MAX_HIGHLIGHT_DEPTH),
			None => Distances::new(),
		};
		Self {
			focus: focus.map(str::to_string),
			distances,
		}
	}

	pub fn distance(&self, id: &str) -> Option<usize> {
		self.distances.get(id).copied()
	}

	pub fn distances(&self) -> &Distances {
		&self.distances
	}

	pub fn node_opacity(&self, id: &str) -> f64 {
		match self.focus {
			None => 1.0,
			Some(_) => opacity_for_distance(self.distance(id)),
		}
	}

	/// An edge is as relevant as its closer endpoint.
	pub fn edge_opacity(&self, source: &str, target: &str) -> f64 {
		if self.focus.is_none() {
			return AMBIENT_EDGE_OPACITY;
		}
		match (self.distance(source), self.distance(target)) {
			(None, None) => FAR_EDGE_OPACITY,
			(a, b) => opacity_for_distance(a.into_iter().chain(b).min()),
		}
	}

	/// Whether an edge touches the focus node directly.
	pub fn is_focus_edge(&self, source: &str, target: &str) -> bool {
		self.focus
			.as_deref()
			.is_some_and(|f| f == source || f == target)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn link(source: &str, target: &str) -> GraphLink {
		GraphLink {
			id: format!("{source}-{target}"),
			source: source.into(),
			target: target.into(),
			kind: "RELATED_TO".into(),
		}
	}

	fn chain(len: usize) -> Vec<GraphLink> {
		(0..len)
			.map(|i| link(&format!("n{i}"), &format!("n{}", i + 1)))
			.collect()
	}

	#[test]
	fn focus_with_two_direct_neighbours() {
		let links = vec![link("E1", "C1"), link("E1", "L1")];
		let highlight = Highlight::compute(Some("E1"), &links);

		let expected: Distances = [("E1", 0), ("C1", 1), ("L1", 1)]
			.into_iter()
			.map(|(k, v)| (k.to_string(), v))
			.collect();
		assert_eq!(highlight.distances(), &expected);
		for id in ["E1", "C1", "L1"] {
			assert_eq!(highlight.node_opacity(id), 1.0);
		}
		let unrelated = links
			.iter()
			.filter(|l| highlight.edge_opacity(&l.source, &l.target) == FAR_EDGE_OPACITY)
			.count();
		assert_eq!(unrelated, 0);
	}

	#[test]
	fn bfs_is_capped_at_max_depth() {
		let adjacency = compute_adjacency(&chain(6));
		let distances = bfs_distances(&adjacency, "n0", MAX_HIGHLIGHT_DEPTH);
		assert_eq!(distances.get("n3"), Some(&3));
		assert_eq!(distances.get("n4"), None);
		assert_eq!(distances.len(), 4);
	}

	#[test]
	fn opacity_never_increases_with_distance() {
		let links = chain(6);
		let highlight = Highlight::compute(Some("n0"), &links);
		let opacities: Vec<f64> = (0..=6)
			.map(|i| highlight.node_opacity(&format!("n{i}")))
			.collect();
		assert_eq!(opacities[0], 1.0);
		assert_eq!(opacities[1], 1.0);
		assert!(opacities.windows(2).all(|w| w[1] <= w[0]));
		assert_eq!(opacities[4], FAR_NODE_OPACITY);
		assert_eq!(opacities[6], FAR_NODE_OPACITY);
		assert_eq!(highlight.node_opacity("elsewhere"), FAR_NODE_OPACITY);
	}

	#[test]
	fn no_focus_means_full_nodes_and_ambient_edges() {
		let links = chain(2);
		let highlight = Highlight::compute(None, &links);
		assert_eq!(highlight.node_opacity("n1"), 1.0);
		assert_eq!(highlight.edge_opacity("n0", "n1"), AMBIENT_EDGE_OPACITY);
	}

	#[test]
	fn edges_follow_closest_endpoint() {
		let mut links = chain(6);
		links.push(link("x", "y"));
		let highlight = Highlight::compute(Some("n0"), &links);
		assert_eq!(highlight.edge_opacity("n1", "n2"), 1.0);
		assert_eq!(highlight.edge_opacity("n2", "n3"), 0.5);
		assert_eq!(highlight.edge_opacity("n3", "n4"), 0.4);
		assert_eq!(highlight.edge_opacity("x", "y"), FAR_EDGE_OPACITY);
		assert!(highlight.is_focus_edge("n0", "n1"));
		assert!(!highlight.is_focus_edge("n1", "n2"));
	}

	#[test]
	fn unknown_focus_reaches_only_itself() {
		let highlight = Highlight::compute(Some("deleted"), &chain(3));
		assert_eq!(highlight.distances().len(), 1);
		assert_eq!(highlight.node_opacity("n0"), FAR_NODE_OPACITY);
	}
}
