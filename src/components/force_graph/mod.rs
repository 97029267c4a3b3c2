//! Campaign graph visualization engine.
//!
//! Renders a campaign's events, characters, locations and objects as an
//! interactive force-directed graph (or a chronological timeline) on an HTML
//! canvas with:
//! - d3-style force simulation with per-node charge, collision and timeline axes
//! - Pan, zoom, node dragging with neighbour "fabric" nudging
//! - BFS relevance highlighting around the hovered or dragged node
//! - Type, relation and orphan filters
//! - Best-effort layout persistence per campaign
//!
//! # Example
//!
//! ```ignore
//! use campaign_graph::components::force_graph::{
//!     ForceGraphCanvas, GraphContext, LocalStore, adapt_campaign_graph, provide_graph_context,
//! };
//!
//! let data = adapt_campaign_graph(&response);
//! provide_graph_context(GraphContext::new(data, "42", Arc::new(LocalStore), None));
//!
//! view! { <ForceGraphCanvas fullscreen=true /> }
//! ```

pub mod adapter;
pub mod camera;
mod component;
pub mod context;
pub mod filter;
pub mod highlight;
pub mod interaction;
pub mod relations;
mod render;
pub mod simulation;
pub mod storage;
pub mod theme;
pub mod types;

pub use adapter::{
	CampaignEndpoints, CampaignGraphResponse, EntityEndpoints, EntityPatch, NodeEditor,
	adapt_campaign_graph,
};
pub use component::ForceGraphCanvas;
pub use context::{GraphContext, provide_graph_context, use_graph_context};
pub use storage::{KeyValueStore, LocalStore, MemoryStore};
pub use theme::Theme;
pub use types::{GraphData, GraphLink, GraphNode, NodeType, ViewMode};
