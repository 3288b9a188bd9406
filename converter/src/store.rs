//! Persistence for settings and the currency selection.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tcurrency_ledger::SelectedCurrencySet;
use tracing::{debug, warn};

use crate::error::ConverterError;
use crate::settings::Settings;

/// Errors from writing the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for ConverterError {
    fn from(e: StoreError) -> Self {
        ConverterError::Store(e.to_string())
    }
}

/// Key/value persistence for the two things the converter remembers.
///
/// Reads never fail: anything missing or unreadable yields the defaults.
pub trait SettingsStore: Send + Sync {
    fn settings(&self) -> Settings;

    fn selected_currencies(&self) -> SelectedCurrencySet;

    fn save_settings(&self, settings: &Settings) -> Result<(), StoreError>;

    fn save_selected_currencies(&self, selection: &SelectedCurrencySet) -> Result<(), StoreError>;
}

/// On-disk document layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    app_settings: Option<Settings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selected_currencies: Option<SelectedCurrencySet>,
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    document: Mutex<StoredDocument>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `settings` and `selection`.
    pub fn with(settings: Settings, selection: SelectedCurrencySet) -> Self {
        Self {
            document: Mutex::new(StoredDocument {
                app_settings: Some(settings),
                selected_currencies: Some(selection),
            }),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn settings(&self) -> Settings {
        self.document.lock().app_settings.clone().unwrap_or_default()
    }

    fn selected_currencies(&self) -> SelectedCurrencySet {
        self.document.lock().selected_currencies.clone().unwrap_or_default()
    }

    fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        self.document.lock().app_settings = Some(settings.clone());
        Ok(())
    }

    fn save_selected_currencies(&self, selection: &SelectedCurrencySet) -> Result<(), StoreError> {
        self.document.lock().selected_currencies = Some(selection.clone());
        Ok(())
    }
}

/// Store backed by a single JSON file.
///
/// The file is read once on open and rewritten in full on every save. The
/// in-memory copy only changes after the write succeeds.
#[derive(Debug)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
    document: Mutex<StoredDocument>,
}

impl JsonFileSettingsStore {
    /// Open `path`, tolerating a missing or garbled file.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let document = Self::load(&path);
        Self {
            path,
            document: Mutex::new(document),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> StoredDocument {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
                return StoredDocument::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read settings file, using defaults");
                return StoredDocument::default();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(document) => document,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable settings file");
                StoredDocument::default()
            }
        }
    }

    fn write(&self, document: &StoredDocument) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(document)?;
        fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "Settings file written");
        Ok(())
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn settings(&self) -> Settings {
        self.document.lock().app_settings.clone().unwrap_or_default()
    }

    fn selected_currencies(&self) -> SelectedCurrencySet {
        self.document.lock().selected_currencies.clone().unwrap_or_default()
    }

    fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        let mut document = self.document.lock();
        let mut next = document.clone();
        next.app_settings = Some(settings.clone());
        self.write(&next)?;
        *document = next;
        Ok(())
    }

    fn save_selected_currencies(&self, selection: &SelectedCurrencySet) -> Result<(), StoreError> {
        let mut document = self.document.lock();
        let mut next = document.clone();
        next.selected_currencies = Some(selection.clone());
        self.write(&next)?;
        *document = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcurrency_common::CurrencyCode;
    use tempfile::tempdir;

    fn selection(list: &[&str]) -> SelectedCurrencySet {
        SelectedCurrencySet::new(list.iter().map(|c| CurrencyCode::new(*c)).collect()).unwrap()
    }

    #[test]
    fn test_memory_store_defaults() {
        let store = MemorySettingsStore::new();
        assert_eq!(store.settings(), Settings::default());
        assert_eq!(store.selected_currencies(), SelectedCurrencySet::default());
    }

    #[test]
    fn test_memory_store_saves() {
        let store = MemorySettingsStore::new();
        let settings = Settings {
            decimal_places: 4,
            ..Settings::default()
        };

        store.save_settings(&settings).unwrap();
        store.save_selected_currencies(&selection(&["USD", "EUR"])).unwrap();

        assert_eq!(store.settings().decimal_places, 4);
        assert_eq!(store.selected_currencies(), selection(&["USD", "EUR"]));
    }

    #[test]
    fn test_file_store_missing_file() {
        let dir = tempdir().unwrap();
        let store = JsonFileSettingsStore::open(dir.path().join("settings.json"));

        assert_eq!(store.settings(), Settings::default());
        assert_eq!(store.selected_currencies().home(), &CurrencyCode::twd());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        {
            let store = JsonFileSettingsStore::open(&path);
            store
                .save_settings(&Settings {
                    decimal_places: 0,
                    custom_home_flag: Some("🏝️".to_string()),
                    ..Settings::default()
                })
                .unwrap();
            store.save_selected_currencies(&selection(&["JPY", "USD"])).unwrap();
        }

        let reopened = JsonFileSettingsStore::open(&path);
        assert_eq!(reopened.settings().decimal_places, 0);
        assert_eq!(reopened.settings().custom_home_flag.as_deref(), Some("🏝️"));
        assert_eq!(reopened.selected_currencies(), selection(&["JPY", "USD"]));

        let raw: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["app_settings"]["decimalPlaces"], 0);
        assert_eq!(raw["selected_currencies"][0], "JPY");
    }

    #[test]
    fn test_file_store_ignores_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, b"{not json").unwrap();

        let store = JsonFileSettingsStore::open(&path);
        assert_eq!(store.settings(), Settings::default());
    }

    #[test]
    fn test_file_store_failed_write_keeps_memory() {
        let dir = tempdir().unwrap();
        let store = JsonFileSettingsStore::open(dir.path().join("missing").join("settings.json"));

        let result = store.save_selected_currencies(&selection(&["USD"]));

        assert!(matches!(result, Err(StoreError::Io(_))));
        assert_eq!(store.selected_currencies(), SelectedCurrencySet::default());
    }
}
