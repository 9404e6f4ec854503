//! Saved calculator inputs, the server-side stand-in for browser local storage.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::core::{aggregate, parse_names, resolve_people_count};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SavedState {
    pub monthly_saving: f64,
    pub is_group: bool,
    pub people_count: u32,
    pub per_person_amount: f64,
    pub investor_names: String,
    pub years: u32,
}

impl SavedState {
    /// Rewrites names into canonical order and lets a non-empty name list set
    /// the head count.
    pub fn normalized(mut self) -> Self {
        let names = parse_names(&self.investor_names);
        self.people_count = resolve_people_count(&names, self.people_count);
        self.investor_names = names.to_raw();
        self
    }

    /// Monthly amount the rest of the calculator works with.
    pub fn effective_monthly(&self) -> f64 {
        if self.is_group {
            aggregate(self.people_count, self.per_person_amount).monthly_total
        } else if self.monthly_saving.is_finite() && self.monthly_saving > 0.0 {
            self.monthly_saving
        } else {
            0.0
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to write state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait StateStore: Send + Sync {
    /// `None` when nothing was saved yet or the saved record is unreadable.
    fn load(&self) -> Option<SavedState>;
    fn save(&self, state: &SavedState) -> Result<(), StoreError>;
}

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Option<SavedState> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("cannot read state file {}: {e}", self.path.display());
                return None;
            }
        };

        match serde_json::from_str::<SavedState>(&raw) {
            Ok(state) => Some(state.normalized()),
            Err(e) => {
                warn!("ignoring malformed state file {}: {e}", self.path.display());
                None
            }
        }
    }

    fn save(&self, state: &SavedState) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        info!("saved calculator state to {}", self.path.display());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<Option<SavedState>>,
}

impl StateStore for MemoryStore {
    fn load(&self) -> Option<SavedState> {
        self.state
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
            .map(SavedState::normalized)
    }

    fn save(&self, state: &SavedState) -> Result<(), StoreError> {
        if let Ok(mut guard) = self.state.lock() {
            *guard = Some(state.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("savebot-{}-{name}.json", std::process::id()))
    }

    #[test]
    fn normalized_routes_names_through_canonical_order() {
        let state = SavedState {
            is_group: true,
            people_count: 7,
            per_person_amount: 100.0,
            investor_names: "Davide, Simone, Pietro".to_string(),
            ..SavedState::default()
        }
        .normalized();

        assert_eq!(state.investor_names, "L, X, D");
        assert_eq!(state.people_count, 3);
        assert_eq!(state.effective_monthly(), 300.0);
    }

    #[test]
    fn normalized_keeps_manual_count_without_names() {
        let state = SavedState {
            people_count: 4,
            ..SavedState::default()
        }
        .normalized();
        assert_eq!(state.people_count, 4);
        assert_eq!(state.investor_names, "");
    }

    #[test]
    fn effective_monthly_uses_individual_saving_outside_group_mode() {
        let state = SavedState {
            monthly_saving: 450.0,
            people_count: 3,
            per_person_amount: 100.0,
            ..SavedState::default()
        };
        assert_eq!(state.effective_monthly(), 450.0);

        let invalid = SavedState {
            monthly_saving: -1.0,
            ..SavedState::default()
        };
        assert_eq!(invalid.effective_monthly(), 0.0);
    }

    #[test]
    fn partial_json_defaults_missing_fields() {
        let state: SavedState =
            serde_json::from_str(r#"{"monthlySaving": 300, "years": 4}"#).expect("valid json");
        assert_eq!(state.monthly_saving, 300.0);
        assert_eq!(state.years, 4);
        assert!(!state.is_group);
        assert_eq!(state.investor_names, "");
    }

    #[test]
    fn file_store_round_trips_and_normalizes_on_load() {
        let path = temp_path("roundtrip");
        let store = JsonFileStore::new(&path);
        let state = SavedState {
            is_group: true,
            people_count: 2,
            per_person_amount: 150.0,
            investor_names: "Marco, Leo".to_string(),
            years: 3,
            ..SavedState::default()
        };

        store.save(&state).expect("state saved");
        let loaded = store.load().expect("state loaded");
        assert_eq!(loaded.investor_names, "L, Marco");
        assert_eq!(loaded.people_count, 2);
        assert_eq!(loaded.years, 3);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn file_store_treats_missing_or_malformed_files_as_empty() {
        let missing = JsonFileStore::new(temp_path("missing"));
        assert_eq!(missing.load(), None);

        let path = temp_path("malformed");
        fs::write(&path, "{not json").expect("write fixture");
        assert_eq!(JsonFileStore::new(&path).load(), None);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn memory_store_returns_last_saved_state() {
        let store = MemoryStore::default();
        assert_eq!(store.load(), None);

        let state = SavedState {
            monthly_saving: 200.0,
            ..SavedState::default()
        };
        store.save(&state).expect("state saved");
        assert_eq!(store.load(), Some(state));
    }
}
