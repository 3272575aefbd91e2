//! Core of the grocery list: categorization, the item store, persistence,
//! suggestions and grouping for display.

pub mod category;
pub mod error;
pub mod item;
pub mod logging;
pub mod paths;
pub mod persist;
pub mod store;
pub mod suggest;
pub mod view;

pub use category::{categorize, Category};
pub use error::{StorageError, StoreError};
pub use item::{AppState, Item, ItemDraft, ItemPatch, ThemeMode};
pub use persist::{FileStore, KeyValueStore, MemoryStore, Persistence};
pub use store::GroceryStore;
pub use view::{group_by_category, CategoryGroup, ListStats};
