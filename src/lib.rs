//! campaign-graph: Interactive campaign relationship graph for tabletop-RPG game masters.
//!
//! This crate provides a WASM-based visualization that renders a campaign's
//! events, characters, locations and objects with physics-based layout,
//! a chronological timeline mode, pan/zoom, relevance highlighting and
//! filtering.

use std::sync::Arc;

use js_sys::{Function, Reflect};
use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlScriptElement, Window};

pub mod components;
pub mod error;

use components::controls::GraphControls;
use components::force_graph::{
	CampaignEndpoints, CampaignGraphResponse, EntityEndpoints, GraphContext, LocalStore,
	NodeEditor, adapt_campaign_graph, provide_graph_context,
};
use components::node_panel::SelectedNodePanel;
use error::{GraphError, Result};

pub use components::force_graph::{ForceGraphCanvas, GraphData, GraphLink, GraphNode};

/// Global object the host page may define to receive node edits.
///
/// Expected shape: `{ update(entity, id, patchJson), remove(entity, id) }`.
const HOST_API: &str = "campaignGraphApi";

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("campaign-graph: logging initialized");
}

/// Parse a campaign graph fetch response and adapt it to graph data.
pub fn parse_graph_payload(json: &str) -> Result<GraphData> {
	let response: CampaignGraphResponse = serde_json::from_str(json)?;
	Ok(adapt_campaign_graph(&response))
}

/// Load graph data from a script element with id="graph-data".
/// Expected format: the campaign graph response `{ nodes: [...], edges: [...] }`,
/// with the campaign id in `data-campaign-id`.
fn load_graph_data() -> Option<(String, GraphData)> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("graph-data")?;
	let campaign_id = element
		.get_attribute("data-campaign-id")
		.unwrap_or_else(|| "default".to_string());
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match parse_graph_payload(&json_text) {
		Ok(data) => {
			info!(
				"campaign-graph: loaded {} nodes, {} links",
				data.nodes.len(),
				data.links.len()
			);
			Some((campaign_id, data))
		}
		Err(e) => {
			warn!("campaign-graph: failed to parse graph data: {}", e);
			None
		}
	}
}

/// Call `window.campaignGraphApi[method](entity, id, payload)`.
fn host_call(method: &str, entity: &'static str, id: &str, payload: JsValue) -> Result<()> {
	let api_error = |message: String| GraphError::Api {
		entity,
		id: id.to_string(),
		message,
	};
	let window = web_sys::window().ok_or_else(|| api_error("no window".into()))?;
	let api = Reflect::get(&window, &JsValue::from_str(HOST_API))
		.ok()
		.filter(JsValue::is_object)
		.ok_or_else(|| api_error(format!("window.{HOST_API} is missing")))?;
	let func: Function = Reflect::get(&api, &JsValue::from_str(method))
		.ok()
		.and_then(|f| f.dyn_into().ok())
		.ok_or_else(|| api_error(format!("{HOST_API}.{method} is not a function")))?;
	func.call3(&api, &JsValue::from_str(entity), &JsValue::from_str(id), &payload)
		.map(|_| ())
		.map_err(|e| api_error(e.as_string().unwrap_or_else(|| format!("{e:?}"))))
}

fn host_entity(entity: &'static str) -> EntityEndpoints {
	EntityEndpoints::new(
		move |id, patch| {
			let json = serde_json::to_string(patch)?;
			host_call("update", entity, id, JsValue::from_str(&json))
		},
		move |id| host_call("remove", entity, id, JsValue::UNDEFINED),
	)
}

/// Endpoints backed by the host page's API object, if it defines one.
fn host_endpoints() -> Option<CampaignEndpoints> {
	let window = web_sys::window()?;
	let api = Reflect::get(&window, &JsValue::from_str(HOST_API)).ok()?;
	if !api.is_object() {
		return None;
	}
	Some(CampaignEndpoints {
		events: host_entity("events"),
		characters: host_entity("characters"),
		locations: host_entity("locations"),
		objects: host_entity("objects"),
	})
}

/// Main application component.
/// Loads graph data from DOM and renders the campaign visualization.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let (campaign_id, data) =
		load_graph_data().unwrap_or_else(|| ("default".to_string(), GraphData::default()));
	let editor = host_endpoints().map(NodeEditor::new);
	provide_graph_context(GraphContext::new(data, &campaign_id, Arc::new(LocalStore), editor));

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Campaign Graph" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<ForceGraphCanvas fullscreen=true />
			<div class="graph-overlay">
				<h1>"Campaign Graph"</h1>
				<p class="subtitle">
					"Drag nodes to reposition. Double-click a node for details. Scroll to zoom. Drag background to pan."
				</p>
				<GraphControls />
			</div>
			<SelectedNodePanel />
		</div>
	}
}
