//! Durable key-value storage for the item list and the display mode.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::item::{AppState, Item, ThemeMode};

pub const ITEMS_KEY: &str = "items";
pub const THEME_KEY: &str = "theme";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// All keys live in one JSON object file, rewritten on every `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens the file at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str::<BTreeMap<String, String>>(&data) {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "storage file is corrupt, starting empty");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to read storage file, starting empty");
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    /// Number of `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// Translates [`AppState`] to and from a [`KeyValueStore`].
#[derive(Debug)]
pub struct Persistence<S> {
    backend: S,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Never fails: anything unreadable degrades to the default state.
    pub fn load(&self) -> AppState {
        let state = AppState {
            items: self.load_items(),
            theme: self.load_theme(),
        };
        tracing::info!(items = state.items.len(), theme = state.theme.as_str(), "loaded grocery list");
        state
    }

    pub fn save(&mut self, state: &AppState) -> Result<(), StorageError> {
        let items = serde_json::to_string(&state.items)?;
        self.backend.set(ITEMS_KEY, &items)?;
        self.backend.set(THEME_KEY, state.theme.as_str())?;
        Ok(())
    }

    fn load_items(&self) -> Vec<Item> {
        match self.backend.get(ITEMS_KEY) {
            Ok(Some(raw)) => decode_items(&raw),
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read stored items");
                Vec::new()
            }
        }
    }

    fn load_theme(&self) -> ThemeMode {
        match self.backend.get(THEME_KEY) {
            Ok(Some(raw)) => ThemeMode::from_stored(&raw),
            Ok(None) => ThemeMode::default(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read stored theme");
                ThemeMode::default()
            }
        }
    }
}

/// Records that fail to decode, have a blank name or repeat an earlier id are
/// dropped; a value that is not an array yields an empty list.
fn decode_items(raw: &str) -> Vec<Item> {
    let records = match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        Ok(records) => records,
        Err(err) => {
            tracing::warn!(error = %err, "stored items are corrupt, starting with an empty list");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let item = match serde_json::from_value::<Item>(record) {
            Ok(item) => item,
            Err(err) => {
                tracing::warn!(index, error = %err, "skipping unreadable item record");
                continue;
            }
        };
        if item.name.trim().is_empty() {
            tracing::warn!(index, id = %item.id, "skipping item record without a name");
            continue;
        }
        if !seen.insert(item.id.clone()) {
            tracing::warn!(index, id = %item.id, "skipping item record with duplicate id");
            continue;
        }
        items.push(item);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use chrono::{TimeZone, Utc};

    fn sample_state() -> AppState {
        AppState {
            items: vec![
                Item {
                    id: "1712345678901".into(),
                    name: "Milk".into(),
                    quantity: "2 liters".into(),
                    notes: "oat".into(),
                    category: Category::Dairy,
                    completed: false,
                    created_at: Utc.with_ymd_and_hms(2024, 4, 5, 12, 0, 0).unwrap(),
                },
                Item {
                    id: "1712345678902".into(),
                    name: "Dish soap".into(),
                    quantity: "1".into(),
                    notes: String::new(),
                    category: Category::Household,
                    completed: true,
                    created_at: Utc::now(),
                },
            ],
            theme: ThemeMode::Dark,
        }
    }

    #[test]
    fn test_round_trip() {
        let state = sample_state();
        let mut persistence = Persistence::new(MemoryStore::new());
        persistence.save(&state).unwrap();
        assert_eq!(persistence.load(), state);
    }

    #[test]
    fn test_missing_keys_load_default() {
        let persistence = Persistence::new(MemoryStore::new());
        assert_eq!(persistence.load(), AppState::default());
    }

    #[test]
    fn test_corrupt_items_load_empty() {
        let backend = MemoryStore::new()
            .with_entry(ITEMS_KEY, "{not json")
            .with_entry(THEME_KEY, "dark");
        let state = Persistence::new(backend).load();
        assert!(state.items.is_empty());
        assert_eq!(state.theme, ThemeMode::Dark);

        let backend = MemoryStore::new().with_entry(ITEMS_KEY, r#"{"id":"1"}"#);
        assert!(Persistence::new(backend).load().items.is_empty());
    }

    #[test]
    fn test_bad_records_are_skipped() {
        let raw = r#"[
            {"id":"1","name":"Bread","quantity":"1","notes":"","category":"Pantry","completed":false,"createdAt":"2024-04-05T12:00:00.000Z"},
            {"id":"2","name":"Eggs","createdAt":"yesterday"},
            {"id":"3","name":"   ","createdAt":"2024-04-05T12:00:00Z"},
            {"id":"1","name":"Duplicate","createdAt":"2024-04-05T12:00:00Z"},
            {"id":"4","name":"Candles","category":"Garden","createdAt":"2024-04-05T12:00:00Z"},
            42
        ]"#;
        let backend = MemoryStore::new().with_entry(ITEMS_KEY, raw);
        let items = Persistence::new(backend).load().items;
        let ids: Vec<&str> = items.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
        assert_eq!(items[1].category, Category::Pantry);
        assert_eq!(
            items[0].created_at,
            Utc.with_ymd_and_hms(2024, 4, 5, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_unknown_theme_is_light() {
        let backend = MemoryStore::new().with_entry(THEME_KEY, "sepia");
        assert_eq!(Persistence::new(backend).load().theme, ThemeMode::Light);
    }

    #[test]
    fn test_save_overwrites() {
        let mut persistence = Persistence::new(MemoryStore::new());
        let mut state = sample_state();
        persistence.save(&state).unwrap();
        state.items.remove(0);
        state.theme = ThemeMode::Light;
        persistence.save(&state).unwrap();
        assert_eq!(persistence.load(), state);
        assert_eq!(persistence.backend().write_count(), 4);
    }

    #[test]
    fn test_file_store_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");
        let state = sample_state();

        let mut persistence = Persistence::new(FileStore::open(&path));
        persistence.save(&state).unwrap();
        assert!(path.exists());

        let reopened = Persistence::new(FileStore::open(&path));
        assert_eq!(reopened.load(), state);
    }

    #[test]
    fn test_file_store_corrupt_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "definitely not json").unwrap();

        let store = FileStore::open(&path);
        assert_eq!(store.get(ITEMS_KEY).unwrap(), None);
        assert_eq!(Persistence::new(store).load(), AppState::default());
    }
}
