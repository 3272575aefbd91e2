//! The item store: sole owner of the grocery list.
//!
//! Every successful mutation updates memory, writes the whole state through
//! the [`Persistence`] adapter and then notifies subscribed observers.
//! Rejected operations change nothing and write nothing.

use chrono::Utc;

use crate::category::categorize;
use crate::error::StoreError;
use crate::item::{AppState, Item, ItemDraft, ItemPatch, ThemeMode, DEFAULT_QUANTITY};
use crate::persist::{KeyValueStore, Persistence};

pub type Observer = Box<dyn FnMut(&AppState)>;

/// Issues decimal millisecond ids, bumping forward when the clock has not
/// advanced or the candidate is already taken.
#[derive(Debug, Default)]
struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    fn next(&mut self, existing: &[Item]) -> String {
        self.next_at(Utc::now().timestamp_millis(), existing)
    }

    fn next_at(&mut self, now_millis: i64, existing: &[Item]) -> String {
        let mut candidate = now_millis.max(self.last.saturating_add(1));
        loop {
            let id = candidate.to_string();
            if !existing.iter().any(|item| item.id == id) {
                self.last = candidate;
                return id;
            }
            candidate = candidate.saturating_add(1);
        }
    }
}

pub struct GroceryStore<S> {
    state: AppState,
    persistence: Persistence<S>,
    ids: IdGenerator,
    observers: Vec<Observer>,
}

impl<S: KeyValueStore> GroceryStore<S> {
    /// Hydrates from `backend`; unreadable data yields an empty list.
    pub fn open(backend: S) -> Self {
        let persistence = Persistence::new(backend);
        let state = persistence.load();
        Self {
            state,
            persistence,
            ids: IdGenerator::default(),
            observers: Vec::new(),
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.state.items
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn theme(&self) -> ThemeMode {
        self.state.theme
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.state.items.iter().find(|item| item.id == id)
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&AppState) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn add(&mut self, draft: ItemDraft) -> Result<&Item, StoreError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        let quantity = match draft.quantity.trim() {
            "" => DEFAULT_QUANTITY.to_string(),
            quantity => quantity.to_string(),
        };
        let category = draft.category.unwrap_or_else(|| categorize(name));
        let item = Item {
            id: self.ids.next(&self.state.items),
            name: name.to_string(),
            quantity,
            notes: draft.notes.trim().to_string(),
            category,
            completed: false,
            created_at: Utc::now(),
        };
        tracing::debug!(id = %item.id, name = %item.name, category = %item.category, "item added");

        let index = self.state.items.len();
        self.state.items.push(item);
        self.commit();
        Ok(&self.state.items[index])
    }

    pub fn update(&mut self, id: &str, patch: ItemPatch) -> Result<&Item, StoreError> {
        let index = self.position(id)?;
        let name = match patch.name.as_deref().map(str::trim) {
            Some("") => return Err(StoreError::EmptyName),
            other => other.map(str::to_string),
        };

        let item = &mut self.state.items[index];
        if let Some(name) = name {
            item.name = name;
        }
        if let Some(quantity) = patch.quantity {
            item.quantity = quantity.trim().to_string();
        }
        if let Some(notes) = patch.notes {
            item.notes = notes.trim().to_string();
        }
        if let Some(category) = patch.category {
            item.category = category;
        }
        if let Some(completed) = patch.completed {
            item.completed = completed;
        }
        tracing::debug!(id, "item updated");

        self.commit();
        Ok(&self.state.items[index])
    }

    pub fn delete(&mut self, id: &str) -> Result<Item, StoreError> {
        let index = self.position(id)?;
        let removed = self.state.items.remove(index);
        tracing::debug!(id, name = %removed.name, "item deleted");
        self.commit();
        Ok(removed)
    }

    /// Removes every completed item and returns how many were dropped.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.state.items.len();
        self.state.items.retain(|item| !item.completed);
        let removed = before - self.state.items.len();
        tracing::debug!(removed, "cleared completed items");
        self.commit();
        removed
    }

    /// Flips the completed flag and returns the new value.
    pub fn toggle_completed(&mut self, id: &str) -> Result<bool, StoreError> {
        let index = self.position(id)?;
        let item = &mut self.state.items[index];
        item.completed = !item.completed;
        let completed = item.completed;
        tracing::debug!(id, completed, "item toggled");
        self.commit();
        Ok(completed)
    }

    pub fn toggle_theme(&mut self) -> ThemeMode {
        let theme = self.state.theme.toggled();
        self.set_theme(theme);
        theme
    }

    pub fn set_theme(&mut self, theme: ThemeMode) {
        self.state.theme = theme;
        tracing::debug!(theme = theme.as_str(), "theme changed");
        self.commit();
    }

    fn position(&self, id: &str) -> Result<usize, StoreError> {
        self.state
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn commit(&mut self) {
        if let Err(err) = self.persistence.save(&self.state) {
            tracing::warn!(error = %err, "failed to save grocery list");
        }
        for observer in self.observers.iter_mut() {
            observer(&self.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    use super::*;
    use crate::category::Category;
    use crate::error::StorageError;
    use crate::persist::MemoryStore;

    fn store() -> GroceryStore<MemoryStore> {
        GroceryStore::open(MemoryStore::new())
    }

    fn writes(store: &GroceryStore<MemoryStore>) -> usize {
        store.persistence().backend().write_count()
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into())
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into())
        }
    }

    #[test]
    fn test_add_appends_with_defaults() {
        let mut store = store();
        let item = store.add(ItemDraft::named("  Bananas ")).unwrap().clone();
        assert_eq!(item.name, "Bananas");
        assert_eq!(item.quantity, "1");
        assert_eq!(item.notes, "");
        assert_eq!(item.category, Category::Produce);
        assert!(!item.completed);
        assert_eq!(store.items().len(), 1);
        assert!(writes(&store) > 0);
    }

    #[test]
    fn test_add_keeps_explicit_category() {
        let mut store = store();
        let item = store
            .add(
                ItemDraft::named("Milk")
                    .quantity(" 2 liters ")
                    .notes(" oat ")
                    .category(Category::Beverages),
            )
            .unwrap();
        assert_eq!(item.category, Category::Beverages);
        assert_eq!(item.quantity, "2 liters");
        assert_eq!(item.notes, "oat");
    }

    #[test]
    fn test_add_rejects_blank_name() {
        let mut store = store();
        assert_eq!(store.add(ItemDraft::named("   ")).unwrap_err(), StoreError::EmptyName);
        assert_eq!(store.add(ItemDraft::named("")).unwrap_err(), StoreError::EmptyName);
        assert!(store.items().is_empty());
        assert_eq!(writes(&store), 0);
    }

    #[test]
    fn test_rapid_adds_get_unique_ids() {
        let mut store = store();
        for i in 0..200 {
            let before = store.items().len();
            store.add(ItemDraft::named(format!("Item {i}"))).unwrap();
            assert_eq!(store.items().len(), before + 1);
        }
        let ids: HashSet<&str> = store.items().iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn test_id_generator_skips_taken_ids() {
        let mut ids = IdGenerator::default();
        let first = ids.next_at(1_000, &[]);
        let second = ids.next_at(1_000, &[]);
        assert_eq!(first, "1000");
        assert_eq!(second, "1001");

        let mut store = store();
        store.add(ItemDraft::named("Rice")).unwrap();
        let taken: i64 = store.items()[0].id.parse().unwrap();
        let mut fresh = IdGenerator::default();
        assert_eq!(fresh.next_at(taken, store.items()), (taken + 1).to_string());
    }

    #[test]
    fn test_update_merges_supplied_fields() {
        let mut store = store();
        let id = store.add(ItemDraft::named("Apples").notes("green")).unwrap().id.clone();
        let created_at = store.items()[0].created_at;

        let item = store
            .update(
                &id,
                ItemPatch {
                    quantity: Some(" 6 ".into()),
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(item.name, "Apples");
        assert_eq!(item.notes, "green");
        assert_eq!(item.quantity, "6");
        assert!(item.completed);
        assert_eq!(item.created_at, created_at);
        assert_eq!(item.id, id);
    }

    #[test]
    fn test_update_rejects_blank_name_and_unknown_id() {
        let mut store = store();
        let id = store.add(ItemDraft::named("Pasta")).unwrap().id.clone();
        let before = writes(&store);

        let patch = ItemPatch {
            name: Some("  ".into()),
            notes: Some("penne".into()),
            ..Default::default()
        };
        assert_eq!(store.update(&id, patch).unwrap_err(), StoreError::EmptyName);
        assert_eq!(store.items()[0].notes, "");

        let err = store.update("missing", ItemPatch::completed(true)).unwrap_err();
        assert_eq!(err, StoreError::NotFound("missing".into()));
        assert_eq!(writes(&store), before);
    }

    #[test]
    fn test_delete() {
        let mut store = store();
        let id = store.add(ItemDraft::named("Salt")).unwrap().id.clone();
        store.add(ItemDraft::named("Pepper")).unwrap();

        let removed = store.delete(&id).unwrap();
        assert_eq!(removed.name, "Salt");
        assert_eq!(store.items().len(), 1);
        assert!(matches!(store.delete(&id), Err(StoreError::NotFound(_))));
        assert_eq!(store.items().len(), 1);
    }

    #[test]
    fn test_clear_completed_keeps_order() {
        let mut store = store();
        let names = ["Milk", "Bread", "Eggs", "Rice", "Onions"];
        let ids: Vec<String> = names
            .iter()
            .map(|name| store.add(ItemDraft::named(*name)).unwrap().id.clone())
            .collect();
        store.toggle_completed(&ids[1]).unwrap();
        store.toggle_completed(&ids[3]).unwrap();

        assert_eq!(store.clear_completed(), 2);
        let remaining: Vec<&str> = store.items().iter().map(|item| item.name.as_str()).collect();
        assert_eq!(remaining, vec!["Milk", "Eggs", "Onions"]);
        assert!(store.items().iter().all(|item| !item.completed));
        assert_eq!(store.clear_completed(), 0);
    }

    #[test]
    fn test_toggle_completed() {
        let mut store = store();
        let id = store.add(ItemDraft::named("Yogurt")).unwrap().id.clone();
        assert_eq!(store.toggle_completed(&id), Ok(true));
        assert_eq!(store.toggle_completed(&id), Ok(false));
        assert!(store.toggle_completed("nope").is_err());
    }

    #[test]
    fn test_state_survives_reopen() {
        let mut store = store();
        store.add(ItemDraft::named("Cheese")).unwrap();
        store.toggle_theme();
        let backend = store.persistence().backend().clone();

        let reopened = GroceryStore::open(backend);
        assert_eq!(reopened.state(), store.state());
        assert_eq!(reopened.theme(), ThemeMode::Dark);
    }

    #[test]
    fn test_observers_see_every_mutation() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut store = store();
        let sink = Rc::clone(&seen);
        store.subscribe(move |state| sink.borrow_mut().push(state.items.len()));

        let id = store.add(ItemDraft::named("Butter")).unwrap().id.clone();
        store.add(ItemDraft::named("   ")).unwrap_err();
        store.toggle_completed(&id).unwrap();
        store.clear_completed();
        assert_eq!(*seen.borrow(), vec![1, 1, 0]);
    }

    #[test]
    fn test_write_failures_do_not_block_mutations() {
        let mut store = GroceryStore::open(BrokenStore);
        assert!(store.items().is_empty());
        let id = store.add(ItemDraft::named("Carrots")).unwrap().id.clone();
        assert_eq!(store.toggle_completed(&id), Ok(true));
        assert_eq!(store.toggle_theme(), ThemeMode::Dark);
        assert_eq!(store.items().len(), 1);
    }
}
