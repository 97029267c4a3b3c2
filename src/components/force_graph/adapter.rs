//! Translation between the backend's campaign graph and the internal model,
//! plus the edit path back to the backend.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use log::warn;
use serde::{Deserialize, Serialize};

use super::types::{GraphData, GraphLink, GraphNode, NodeType};
use crate::error::{GraphError, Result};

/// Backend ids arrive as either JSON numbers or strings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
	Number(i64),
	Text(String),
}

impl fmt::Display for RawId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RawId::Number(n) => write!(f, "{n}"),
			RawId::Text(s) => f.write_str(s),
		}
	}
}

/// One entity in the fetch response.
#[derive(Clone, Debug, Deserialize)]
pub struct RawNode {
	pub id: RawId,
	pub label: String,
	#[serde(rename = "type")]
	pub node_type: String,
	#[serde(default)]
	pub description: Option<String>,
}

/// An edge endpoint reference.
#[derive(Clone, Debug, Deserialize)]
pub struct RawEndpoint {
	pub id: RawId,
	#[serde(rename = "type")]
	pub node_type: String,
}

/// One relation in the fetch response.
#[derive(Clone, Debug, Deserialize)]
pub struct RawEdge {
	pub id: RawId,
	pub from: RawEndpoint,
	pub to: RawEndpoint,
	pub kind: String,
}

/// Read-only snapshot returned by `fetchCampaignGraph`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CampaignGraphResponse {
	#[serde(default)]
	pub nodes: Vec<RawNode>,
	#[serde(default)]
	pub edges: Vec<RawEdge>,
}

/// Campaign-unique node id for an entity.
pub fn node_id(node_type: NodeType, entity_id: &str) -> String {
	format!("{}-{}", node_type.prefix(), entity_id)
}

fn endpoint_id(endpoint: &RawEndpoint) -> Option<String> {
	NodeType::parse(&endpoint.node_type).map(|t| node_id(t, &endpoint.id.to_string()))
}

/// Convert a fetch response into graph data with degrees filled in.
///
/// Nodes with an unrecognised type are skipped; edges whose endpoints are not
/// in the node set are dropped.
pub fn adapt_campaign_graph(response: &CampaignGraphResponse) -> GraphData {
	let nodes: Vec<GraphNode> = response
		.nodes
		.iter()
		.filter_map(|raw| {
			let Some(node_type) = NodeType::parse(&raw.node_type) else {
				warn!(
					"campaign-graph: skipping node {} with unknown type {:?}",
					raw.id, raw.node_type
				);
				return None;
			};
			let entity_id = raw.id.to_string();
			Some(GraphNode {
				id: node_id(node_type, &entity_id),
				entity_id,
				label: raw.label.clone(),
				node_type,
				description: raw.description.clone().filter(|d| !d.trim().is_empty()),
				degree: 0,
			})
		})
		.collect();

	let known: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
	let links = response
		.edges
		.iter()
		.filter_map(|edge| {
			let source = endpoint_id(&edge.from)?;
			let target = endpoint_id(&edge.to)?;
			(known.contains(source.as_str()) && known.contains(target.as_str())).then(|| {
				GraphLink {
					id: format!("edge-{}", edge.id),
					source,
					target,
					kind: edge.kind.clone(),
				}
			})
		})
		.collect();

	let mut data = GraphData { nodes, links };
	data.recompute_degrees();
	data
}

/// Label/description edit pushed to the backend and patched locally.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityPatch {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub label: Option<String>,
	/// `Some(None)` clears the description.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<Option<String>>,
}

impl GraphData {
	/// Apply an edit in place.
	pub fn apply_patch(&mut self, id: &str, patch: &EntityPatch) -> Result<()> {
		let node = self
			.nodes
			.iter_mut()
			.find(|n| n.id == id)
			.ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
		if let Some(label) = &patch.label {
			node.label = label.clone();
		}
		if let Some(description) = &patch.description {
			node.description = description.clone();
		}
		Ok(())
	}

	/// Remove a node and every link touching it. Returns the removed node.
	pub fn remove_node(&mut self, id: &str) -> Result<GraphNode> {
		let pos = self
			.nodes
			.iter()
			.position(|n| n.id == id)
			.ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
		let removed = self.nodes.remove(pos);
		self.links.retain(|l| l.source != id && l.target != id);
		self.recompute_degrees();
		Ok(removed)
	}

	/// Add a freshly created node. Replaces any node with the same id.
	pub fn insert_node(&mut self, node: GraphNode) {
		self.nodes.retain(|n| n.id != node.id);
		self.nodes.push(node);
		self.recompute_degrees();
	}
}

type UpdateFn = dyn Fn(&str, &EntityPatch) -> Result<()> + Send + Sync;
type RemoveFn = dyn Fn(&str) -> Result<()> + Send + Sync;

/// Injected backend calls for one entity type.
#[derive(Clone)]
pub struct EntityEndpoints {
	pub update: Arc<UpdateFn>,
	pub remove: Arc<RemoveFn>,
}

impl EntityEndpoints {
	pub fn new(
		update: impl Fn(&str, &EntityPatch) -> Result<()> + Send + Sync + 'static,
		remove: impl Fn(&str) -> Result<()> + Send + Sync + 'static,
	) -> Self {
		Self {
			update: Arc::new(update),
			remove: Arc::new(remove),
		}
	}
}

/// Backend endpoints for the four entity types.
#[derive(Clone)]
pub struct CampaignEndpoints {
	pub events: EntityEndpoints,
	pub characters: EntityEndpoints,
	pub locations: EntityEndpoints,
	pub objects: EntityEndpoints,
}

impl CampaignEndpoints {
	pub fn for_type(&self, node_type: NodeType) -> &EntityEndpoints {
		match node_type {
			NodeType::Event => &self.events,
			NodeType::Character => &self.characters,
			NodeType::Location => &self.locations,
			NodeType::Object => &self.objects,
		}
	}
}

/// Pushes node edits to the right backend endpoint, then patches local data.
#[derive(Clone)]
pub struct NodeEditor {
	endpoints: CampaignEndpoints,
}

impl NodeEditor {
	pub fn new(endpoints: CampaignEndpoints) -> Self {
		Self { endpoints }
	}

	pub fn update_node(&self, data: &mut GraphData, id: &str, patch: &EntityPatch) -> Result<()> {
		let node = data
			.node(id)
			.ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
		(self.endpoints.for_type(node.node_type).update)(&node.entity_id, patch)?;
		data.apply_patch(id, patch)
	}

	pub fn remove_node(&self, data: &mut GraphData, id: &str) -> Result<GraphNode> {
		let node = data
			.node(id)
			.ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
		(self.endpoints.for_type(node.node_type).remove)(&node.entity_id)?;
		data.remove_node(id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Mutex;

	const RESPONSE: &str = r#"{
		"nodes": [
			{"id": 1, "label": "The Red Wedding", "type": "EVENT", "description": "  "},
			{"id": 1, "label": "Arya", "type": "CHARACTER"},
			{"id": "twins", "label": "The Twins", "type": "LOCATION", "description": "A castle"},
			{"id": 9, "label": "Needle", "type": "OBJECT"},
			{"id": 3, "label": "???", "type": "FACTION"}
		],
		"edges": [
			{"id": 10, "from": {"id": 1, "type": "CHARACTER"}, "to": {"id": 1, "type": "EVENT"}, "kind": "APPEARS"},
			{"id": 11, "from": {"id": 1, "type": "EVENT"}, "to": {"id": "twins", "type": "LOCATION"}, "kind": "OCCURS_AT"},
			{"id": 12, "from": {"id": 3, "type": "FACTION"}, "to": {"id": 1, "type": "EVENT"}, "kind": "CAUSES"},
			{"id": 13, "from": {"id": 1, "type": "CHARACTER"}, "to": {"id": 404, "type": "OBJECT"}, "kind": "OWNS"}
		]
	}"#;

	fn adapted() -> GraphData {
		let response: CampaignGraphResponse = serde_json::from_str(RESPONSE).unwrap();
		adapt_campaign_graph(&response)
	}

	fn degree(data: &GraphData, id: &str) -> usize {
		data.node(id).map(|n| n.degree).unwrap()
	}

	#[test]
	fn ids_are_scoped_by_type() {
		let data = adapted();
		let ids: Vec<&str> = data.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, ["event-1", "character-1", "location-twins", "object-9"]);
		assert_eq!(data.node("location-twins").unwrap().entity_id, "twins");
	}

	#[test]
	fn unresolvable_edges_are_dropped() {
		let data = adapted();
		let ids: Vec<&str> = data.links.iter().map(|l| l.id.as_str()).collect();
		assert_eq!(ids, ["edge-10", "edge-11"]);
		assert_eq!(data.links[0].source, "character-1");
		assert_eq!(data.links[0].target, "event-1");
	}

	#[test]
	fn degree_counts_incident_links() {
		let data = adapted();
		for node in &data.nodes {
			let expected = data
				.links
				.iter()
				.filter(|l| l.source == node.id || l.target == node.id)
				.count();
			assert_eq!(node.degree, expected, "{}", node.id);
		}
		assert_eq!(degree(&data, "event-1"), 2);
		assert_eq!(degree(&data, "object-9"), 0);
	}

	#[test]
	fn blank_descriptions_become_none() {
		let data = adapted();
		assert_eq!(data.node("event-1").unwrap().description, None);
		assert_eq!(
			data.node("location-twins").unwrap().description.as_deref(),
			Some("A castle")
		);
	}

	#[test]
	fn removing_a_node_drops_its_links_and_updates_degrees() {
		let mut data = adapted();
		let removed = data.remove_node("event-1").unwrap();
		assert_eq!(removed.label, "The Red Wedding");
		assert!(data.links.is_empty());
		assert_eq!(degree(&data, "character-1"), 0);
		assert!(matches!(
			data.remove_node("event-1"),
			Err(GraphError::UnknownNode(_))
		));
	}

	#[test]
	fn inserted_nodes_pick_up_existing_links() {
		let mut data = adapted();
		let mut node = data.remove_node("object-9").unwrap();
		data.links.push(GraphLink {
			id: "edge-20".into(),
			source: "character-1".into(),
			target: "object-9".into(),
			kind: "OWNS".into(),
		});
		node.label = "Needle (reforged)".into();
		data.insert_node(node);
		assert_eq!(degree(&data, "object-9"), 1);
		assert_eq!(data.nodes.len(), 4);
	}

	fn recording_endpoints(log: Arc<Mutex<Vec<String>>>) -> CampaignEndpoints {
		let make = |entity: &'static str| {
			let (log_u, log_r) = (log.clone(), log.clone());
			EntityEndpoints::new(
				move |id, _patch| {
					log_u.lock().unwrap().push(format!("update {entity} {id}"));
					Ok(())
				},
				move |id| {
					if id == "locked" {
						return Err(GraphError::Api {
							entity,
							id: id.to_string(),
							message: "forbidden".into(),
						});
					}
					log_r.lock().unwrap().push(format!("remove {entity} {id}"));
					Ok(())
				},
			)
		};
		CampaignEndpoints {
			events: make("event"),
			characters: make("character"),
			locations: make("location"),
			objects: make("object"),
		}
	}

	#[test]
	fn editor_dispatches_by_node_type() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let editor = NodeEditor::new(recording_endpoints(log.clone()));
		let mut data = adapted();

		let patch = EntityPatch {
			label: Some("Arya Stark".into()),
			description: Some(Some("No one".into())),
		};
		editor.update_node(&mut data, "character-1", &patch).unwrap();
		editor.remove_node(&mut data, "location-twins").unwrap();

		assert_eq!(
			*log.lock().unwrap(),
			["update character 1", "remove location twins"]
		);
		let arya = data.node("character-1").unwrap();
		assert_eq!(arya.label, "Arya Stark");
		assert_eq!(arya.description.as_deref(), Some("No one"));
		assert!(data.node("location-twins").is_none());
	}

	#[test]
	fn editor_leaves_data_alone_on_failure() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let editor = NodeEditor::new(recording_endpoints(log.clone()));
		let mut data = adapted();
		data.insert_node(GraphNode {
			id: "object-locked".into(),
			entity_id: "locked".into(),
			label: "Sealed chest".into(),
			node_type: NodeType::Object,
			description: None,
			degree: 0,
		});

		assert!(matches!(
			editor.remove_node(&mut data, "object-locked"),
			Err(GraphError::Api { .. })
		));
		assert!(data.node("object-locked").is_some());
		assert!(matches!(
			editor.update_node(&mut data, "missing", &EntityPatch::default()),
			Err(GraphError::UnknownNode(_))
		));
		assert!(log.lock().unwrap().is_empty());
	}
}
