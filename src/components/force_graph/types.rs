//! Graph data structures shared by every stage of the pipeline.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The four kinds of narrative entity a campaign tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
	Event,
	Character,
	Location,
	Object,
}

impl NodeType {
	/// All node types in display order.
	pub const ALL: [NodeType; 4] = [
		NodeType::Event,
		NodeType::Character,
		NodeType::Location,
		NodeType::Object,
	];

	/// Parse the wire spelling used by the backend (`"EVENT"`, `"CHARACTER"`, ...).
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_uppercase().as_str() {
			"EVENT" => Some(NodeType::Event),
			"CHARACTER" => Some(NodeType::Character),
			"LOCATION" => Some(NodeType::Location),
			"OBJECT" => Some(NodeType::Object),
			_ => None,
		}
	}

	/// Lowercase prefix used to build campaign-unique node ids.
	pub fn prefix(self) -> &'static str {
		match self {
			NodeType::Event => "event",
			NodeType::Character => "character",
			NodeType::Location => "location",
			NodeType::Object => "object",
		}
	}

	/// Human readable name for legends and panels.
	pub fn label(self) -> &'static str {
		match self {
			NodeType::Event => "Event",
			NodeType::Character => "Character",
			NodeType::Location => "Location",
			NodeType::Object => "Object",
		}
	}
}

impl fmt::Display for NodeType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// A node in the graph, as handed to filtering and the simulation.
///
/// Positions are not stored here: while a simulation is active it owns the
/// mutable `x/y/fx/fy` state (see [`super::simulation::SimNode`]).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	/// Campaign-unique identifier, stable across renders (`event-12`).
	pub id: String,
	/// Backend id of the underlying entity, used for edits.
	pub entity_id: String,
	pub label: String,
	#[serde(rename = "type")]
	pub node_type: NodeType,
	pub description: Option<String>,
	/// Number of incident links. Derived by the adapter.
	#[serde(default)]
	pub degree: usize,
}

/// A typed relation between two nodes.
///
/// Whether the relation reads as directional is decided by its kind's
/// [`super::relations::RelationMeta`], not by the link itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
	pub id: String,
	/// Source node ID.
	pub source: String,
	/// Target node ID.
	pub target: String,
	/// Relation kind, e.g. `OCCURS_AT`.
	#[serde(rename = "type")]
	pub kind: String,
}

/// Complete graph data for one campaign: nodes and links.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub links: Vec<GraphLink>,
}

impl GraphData {
	/// Look up a node by id.
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Links touching `id`, in either direction.
	pub fn links_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphLink> + 'a {
		self.links
			.iter()
			.filter(move |l| l.source == id || l.target == id)
	}

	/// Recount every node's degree from the current link list.
	pub fn recompute_degrees(&mut self) {
		let mut counts: HashMap<&str, usize> = HashMap::new();
		for link in &self.links {
			*counts.entry(link.source.as_str()).or_insert(0) += 1;
			*counts.entry(link.target.as_str()).or_insert(0) += 1;
		}
		for node in &mut self.nodes {
			node.degree = counts.get(node.id.as_str()).copied().unwrap_or(0);
		}
	}
}

/// A world-space point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

/// Persisted node layout keyed by node id.
pub type NodePositions = HashMap<String, Position>;

/// Top-level presentation of the graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
	#[default]
	Graph,
	/// Event nodes are constrained to a horizontal axis ordered by label.
	Timeline,
}
