use crate::models::QueryHistoryItem;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The fixed key the workbench state is persisted under in the host's
/// key-value store.
pub const STORAGE_KEY: &str = "pg-workbench-state";

/// Everything the workbench persists between sessions: the editor content,
/// the capped query history, the result view preference and the manually
/// arranged diagram node positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WorkbenchState {
    pub query_text: String,
    pub query_history: Vec<QueryHistoryItem>,
    pub view_mode: ViewMode,
    pub diagram_positions: HashMap<String, NodePosition>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Table,
    Json,
}

/// Position of one table node in the relationship diagram.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
}

/// The key-value store provided by the hosting page, e.g. browser local
/// storage. Only string payloads pass through it.
pub trait StateStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

pub fn load_state(store: &impl StateStore) -> Result<Option<WorkbenchState>> {
    store
        .get(STORAGE_KEY)
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(Into::into)
}

pub fn save_state(store: &mut impl StateStore, state: &WorkbenchState) -> Result {
    let raw = serde_json::to_string(state)?;
    store.set(STORAGE_KEY, &raw);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        entries: HashMap<String, String>,
    }

    impl StateStore for MemoryStore {
        fn get(&self, key: &str) -> Option<String> {
            self.entries.get(key).cloned()
        }

        fn set(&mut self, key: &str, value: &str) {
            self.entries.insert(key.to_string(), value.to_string());
        }
    }

    #[test]
    fn state_round_trips_through_the_store() {
        let mut store = MemoryStore::default();

        let state = WorkbenchState {
            query_text: "select * from users;".to_string(),
            view_mode: ViewMode::Json,
            diagram_positions: HashMap::from([(
                "users".to_string(),
                NodePosition { x: 120.0, y: 48.5 },
            )]),
            ..Default::default()
        };

        save_state(&mut store, &state).unwrap();
        let loaded = load_state(&store).unwrap();

        assert_eq!(loaded, Some(state));
    }

    #[test]
    fn missing_state_loads_as_none() {
        let store = MemoryStore::default();

        assert_eq!(load_state(&store).unwrap(), None);
    }

    #[test]
    fn corrupted_state_is_an_error() {
        let mut store = MemoryStore::default();
        store.set(STORAGE_KEY, "not json at all");

        assert!(load_state(&store).is_err());
    }
}
