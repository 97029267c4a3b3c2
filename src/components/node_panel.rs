//! Detail panel for the selected node.

use leptos::prelude::*;
use log::warn;

use super::force_graph::EntityPatch;
use super::force_graph::context::use_graph_context;
use super::force_graph::relations::relation_meta;
use super::force_graph::types::GraphData;

/// One line of the relation list, phrased from the selected node's side.
pub fn describe_relations(data: &GraphData, node_id: &str) -> Vec<String> {
	data.links_of(node_id)
		.map(|link| {
			let meta = relation_meta(&link.kind);
			let outgoing = link.source == node_id;
			let other = if outgoing { &link.target } else { &link.source };
			let other_label = data.node(other).map_or(other.as_str(), |n| n.label.as_str());
			if outgoing || !meta.directional {
				format!("{} {}", meta.label, other_label)
			} else {
				format!("{} {} this", other_label, meta.label.to_lowercase())
			}
		})
		.collect()
}

/// Shows the selected node's label, type, description and relations.
///
/// Renaming and removal are offered only when backend endpoints were injected.
#[component]
pub fn SelectedNodePanel() -> impl IntoView {
	let graph = use_graph_context();

	move || {
		let node = graph.selected_node()?;
		let relations = graph.data.with(|d| describe_relations(d, &node.id));
		let draft = RwSignal::new(node.label.clone());
		let selected = graph.selected;

		let editing = graph.can_edit().then(|| {
			let (rename_ctx, remove_ctx) = (graph.clone(), graph.clone());
			let (rename_id, remove_id) = (node.id.clone(), node.id.clone());
			view! {
				<div class="node-panel-edit">
					<input
						type="text"
						prop:value=move || draft.get()
						on:input=move |ev| draft.set(event_target_value(&ev))
					/>
					<button on:click=move |_| {
						let patch = EntityPatch {
							label: Some(draft.get_untracked()),
							description: None,
						};
						if let Err(e) = rename_ctx.update_node(&rename_id, &patch) {
							warn!("campaign-graph: rename failed: {e}");
						}
					}>"Rename"</button>
					<button class="danger" on:click=move |_| {
						if let Err(e) = remove_ctx.remove_node(&remove_id) {
							warn!("campaign-graph: remove failed: {e}");
						}
					}>"Remove"</button>
				</div>
			}
		});

		Some(view! {
			<aside class="node-panel">
				<header>
					<span class="node-type">{node.node_type.label()}</span>
					<h2>{node.label.clone()}</h2>
					<button class="close" on:click=move |_| selected.set(None)>"×"</button>
				</header>
				{node.description.clone().map(|text| view! { <p class="description">{text}</p> })}
				<ul class="relations">
					{relations.into_iter().map(|line| view! { <li>{line}</li> }).collect_view()}
				</ul>
				{editing}
			</aside>
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::{GraphLink, GraphNode, NodeType};

	fn node(id: &str, label: &str, node_type: NodeType) -> GraphNode {
		GraphNode {
			id: id.into(),
			entity_id: id.into(),
			label: label.into(),
			node_type,
			description: None,
			degree: 0,
		}
	}

	#[test]
	fn relations_read_from_the_selected_side() {
		let data = GraphData {
			nodes: vec![
				node("event-1", "Ambush", NodeType::Event),
				node("character-1", "Mira", NodeType::Character),
				node("character-2", "Tovin", NodeType::Character),
			],
			links: vec![
				GraphLink {
					id: "edge-1".into(),
					source: "character-1".into(),
					target: "event-1".into(),
					kind: "APPEARS_IN".into(),
				},
				GraphLink {
					id: "edge-2".into(),
					source: "character-1".into(),
					target: "character-2".into(),
					kind: "KNOWS".into(),
				},
			],
		};

		assert_eq!(
			describe_relations(&data, "event-1"),
			vec!["Mira appears in this".to_string()]
		);
		assert_eq!(
			describe_relations(&data, "character-1"),
			vec!["Appears in Ambush".to_string(), "Knows Tovin".to_string()]
		);
		assert_eq!(describe_relations(&data, "character-2"), vec!["Knows Mira".to_string()]);
	}
}
