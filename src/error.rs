//! Error types for the graph engine.

use thiserror::Error;

/// Errors raised by fallible graph operations.
///
/// Most of the engine never fails: unknown relation kinds, dangling links and
/// corrupt persisted layouts all degrade to defaults. These variants cover the
/// places where a caller does need to know something went wrong.
#[derive(Error, Debug)]
pub enum GraphError {
	/// A node id was not present in the current graph data.
	#[error("node {0} not found")]
	UnknownNode(String),

	/// An injected backend endpoint rejected an edit.
	#[error("{entity} {id}: {message}")]
	Api {
		entity: &'static str,
		id: String,
		message: String,
	},

	/// An edit was requested but no backend endpoints were injected.
	#[error("{0}: editing is disabled, no backend endpoints configured")]
	ReadOnly(String),

	/// The key/value store refused a read or write.
	#[error("storage unavailable: {0}")]
	Storage(String),

	/// A payload could not be (de)serialized.
	#[error("invalid JSON: {0}")]
	Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;
