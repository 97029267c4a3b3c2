//! Session-scoped graph state shared through Leptos context.
//!
//! Holds the full graph data, view mode, filters, display and physics
//! settings, focus/selection ids and the persisted node-position cache. The
//! visible subgraph is a memo over data and filters, so it is recomputed from
//! scratch whenever either changes.

use std::sync::Arc;

use leptos::prelude::*;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::adapter::{EntityPatch, NodeEditor};
use super::filter::{FiltersState, filter_graph};
use super::simulation::PhysicsConfig;
use super::storage::{
	KeyValueStore, SETTINGS_KEY, load_or_default, load_positions, positions_key, prune_positions,
	save_positions, save_quietly,
};
use super::types::{GraphData, GraphNode, NodePositions, ViewMode};
use crate::error::{GraphError, Result};

/// What gets drawn, independent of physics.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
	pub show_labels: bool,
	/// Relation labels on edges adjacent to the focus node.
	pub show_relation_labels: bool,
	/// Arrowheads on directional relations.
	pub show_arrows: bool,
	/// Multiplier on every node radius.
	pub node_scale: f64,
}

impl Default for DisplaySettings {
	fn default() -> Self {
		Self {
			show_labels: true,
			show_relation_labels: true,
			show_arrows: true,
			node_scale: 1.0,
		}
	}
}

/// Persisted user settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
	pub display: DisplaySettings,
	pub physics: PhysicsConfig,
}

/// Load settings, falling back to defaults on any failure.
pub fn load_settings(store: &dyn KeyValueStore) -> GraphSettings {
	load_or_default(store, SETTINGS_KEY)
}

/// Shared graph state. Cheap to clone; every field is a handle.
#[derive(Clone)]
pub struct GraphContext {
	pub data: RwSignal<GraphData>,
	pub view_mode: RwSignal<ViewMode>,
	pub filters: RwSignal<FiltersState>,
	pub display: RwSignal<DisplaySettings>,
	pub physics: RwSignal<PhysicsConfig>,
	/// Hovered or dragged node driving the highlight.
	pub focus: RwSignal<Option<String>>,
	/// Node with an open detail panel.
	pub selected: RwSignal<Option<String>>,
	pub positions: RwSignal<NodePositions>,
	/// Data after filtering.
	pub visible: Memo<GraphData>,
	/// Bumped to ask the canvas to reset its camera.
	pub reset_view: RwSignal<u32>,
	store: Arc<dyn KeyValueStore>,
	positions_key: String,
	editor: Option<NodeEditor>,
}

impl GraphContext {
	/// Create the context for one campaign, restoring layout and settings.
	pub fn new(
		data: GraphData,
		campaign_id: &str,
		store: Arc<dyn KeyValueStore>,
		editor: Option<NodeEditor>,
	) -> Self {
		let key = positions_key(campaign_id);
		let positions = load_positions(store.as_ref(), &key);
		let settings = load_settings(store.as_ref());
		info!(
			"campaign-graph: campaign {campaign_id}: {} nodes, {} links, {} cached positions",
			data.nodes.len(),
			data.links.len(),
			positions.len()
		);

		let data = RwSignal::new(data);
		let filters = RwSignal::new(FiltersState::default());
		let visible = Memo::new(move |_| {
			data.with(|d| filters.with(|f| filter_graph(d, f)))
		});

		Self {
			data,
			view_mode: RwSignal::new(ViewMode::default()),
			filters,
			display: RwSignal::new(settings.display),
			physics: RwSignal::new(settings.physics),
			focus: RwSignal::new(None),
			selected: RwSignal::new(None),
			positions: RwSignal::new(positions),
			visible,
			reset_view: RwSignal::new(0),
			store,
			positions_key: key,
			editor,
		}
	}

	/// Merge a layout into the cache and persist it, best effort.
	///
	/// Entries for nodes that are no longer in the data are dropped.
	pub fn persist_positions(&self, layout: NodePositions) {
		self.data.with_untracked(|data| {
			self.positions.update(|cached| {
				cached.extend(layout);
				prune_positions(cached, data);
			})
		});
		self.save_positions();
	}

	fn save_positions(&self) {
		self.positions
			.with_untracked(|cached| save_positions(self.store.as_ref(), &self.positions_key, cached));
	}

	/// Prune the position cache against `data`, saving only if something went.
	fn forget_missing_positions(&self, data: &GraphData) {
		let mut pruned = 0;
		self.positions.update(|cached| pruned = prune_positions(cached, data));
		if pruned > 0 {
			debug!("campaign-graph: dropped {pruned} stale cached positions");
			self.save_positions();
		}
	}

	/// Persist current display and physics settings, best effort.
	pub fn persist_settings(&self) {
		let settings = GraphSettings {
			display: self.display.get_untracked(),
			physics: self.physics.get_untracked(),
		};
		save_quietly(self.store.as_ref(), SETTINGS_KEY, &settings);
	}

	/// Replace the data wholesale, e.g. after a full reload.
	pub fn replace_data(&self, data: GraphData) {
		let selected = self.selected.get_untracked();
		if selected.is_some_and(|id| data.node(&id).is_none()) {
			self.selected.set(None);
		}
		self.focus.set(None);
		self.forget_missing_positions(&data);
		self.data.set(data);
	}

	pub fn selected_node(&self) -> Option<GraphNode> {
		let id = self.selected.get()?;
		self.data.with(|d| d.node(&id).cloned())
	}

	pub fn can_edit(&self) -> bool {
		self.editor.is_some()
	}

	fn editor(&self, id: &str) -> Result<&NodeEditor> {
		self.editor
			.as_ref()
			.ok_or_else(|| GraphError::ReadOnly(id.to_string()))
	}

	/// Push a label/description edit and patch local data.
	pub fn update_node(&self, id: &str, patch: &EntityPatch) -> Result<()> {
		let editor = self.editor(id)?;
		let mut result = Ok(());
		self.data.update(|d| result = editor.update_node(d, id, patch));
		result
	}

	/// Delete a node through the backend and drop it locally.
	pub fn remove_node(&self, id: &str) -> Result<()> {
		let editor = self.editor(id)?;
		let mut result = Ok(());
		self.data.update(|d| result = editor.remove_node(d, id).map(|_| ()));
		if result.is_ok() {
			self.data.with_untracked(|d| self.forget_missing_positions(d));
			if self.selected.get_untracked().as_deref() == Some(id) {
				self.selected.set(None);
			}
			if self.focus.get_untracked().as_deref() == Some(id) {
				self.focus.set(None);
			}
		}
		result
	}
}

/// Make a [`GraphContext`] available to descendants.
pub fn provide_graph_context(context: GraphContext) {
	let persist = context.clone();
	Effect::new(move |_| {
		persist.display.track();
		persist.physics.track();
		persist.persist_settings();
	});
	provide_context(context);
}

/// Fetch the [`GraphContext`] provided by an ancestor.
pub fn use_graph_context() -> GraphContext {
	expect_context::<GraphContext>()
}
