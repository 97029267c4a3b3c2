//! Best-effort key/value persistence for layouts and settings.
//!
//! The engine only needs `load(key) -> map` and `save(key, map)`. Failures
//! of any kind (storage disabled, quota exceeded, corrupt JSON, wrong shape)
//! are logged at debug level and otherwise ignored.

use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{GraphData, NodePositions};
use crate::error::{GraphError, Result};

/// Scoped string key/value store.
pub trait KeyValueStore: Send + Sync {
	fn get(&self, key: &str) -> Option<String>;
	fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Browser `localStorage`. Looked up on every call; absent outside a browser.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStore;

impl LocalStore {
	fn storage() -> Result<web_sys::Storage> {
		web_sys::window()
			.ok_or_else(|| GraphError::Storage("no window".into()))?
			.local_storage()
			.map_err(|e| GraphError::Storage(format!("{e:?}")))?
			.ok_or_else(|| GraphError::Storage("localStorage disabled".into()))
	}
}

impl KeyValueStore for LocalStore {
	fn get(&self, key: &str) -> Option<String> {
		Self::storage().ok()?.get_item(key).ok().flatten()
	}

	fn set(&self, key: &str, value: &str) -> Result<()> {
		Self::storage()?
			.set_item(key, value)
			.map_err(|e| GraphError::Storage(format!("{e:?}")))
	}
}

/// In-memory store, for tests and hosts without persistent storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
	entries: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
	fn get(&self, key: &str) -> Option<String> {
		self.entries.lock().ok()?.get(key).cloned()
	}

	fn set(&self, key: &str, value: &str) -> Result<()> {
		self.entries
			.lock()
			.map_err(|_| GraphError::Storage("store poisoned".into()))?
			.insert(key.to_string(), value.to_string());
		Ok(())
	}
}

/// Storage key for a campaign's node layout.
pub fn positions_key(campaign_id: &str) -> String {
	format!("campaign-graph:positions:{campaign_id}")
}

/// Storage key for display and physics settings.
pub const SETTINGS_KEY: &str = "campaign-graph:settings";

/// Load a JSON value, falling back to the default on any failure.
pub fn load_or_default<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> T {
	let Some(raw) = store.get(key) else {
		return T::default();
	};
	match serde_json::from_str(&raw) {
		Ok(value) => value,
		Err(e) => {
			debug!("campaign-graph: ignoring malformed {key}: {e}");
			T::default()
		}
	}
}

/// Save a JSON value, swallowing failures.
pub fn save_quietly<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
	let result = serde_json::to_string(value)
		.map_err(GraphError::from)
		.and_then(|json| store.set(key, &json));
	if let Err(e) = result {
		debug!("campaign-graph: could not persist {key}: {e}");
	}
}

/// Load a persisted layout. Missing, corrupt or wrongly shaped payloads yield an empty map.
pub fn load_positions(store: &dyn KeyValueStore, key: &str) -> NodePositions {
	let positions: NodePositions = load_or_default(store, key);
	positions
		.into_iter()
		.filter(|(_, p)| p.x.is_finite() && p.y.is_finite())
		.collect()
}

/// Persist a layout, best effort.
pub fn save_positions(store: &dyn KeyValueStore, key: &str, positions: &NodePositions) {
	save_quietly(store, key, positions);
}

/// Drop cached positions for nodes no longer in `data`. Returns how many went.
pub fn prune_positions(positions: &mut NodePositions, data: &GraphData) -> usize {
	let before = positions.len();
	positions.retain(|id, _| data.node(id).is_some());
	before - positions.len()
}
