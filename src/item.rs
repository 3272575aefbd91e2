use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;

pub const DEFAULT_QUANTITY: &str = "1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

fn default_quantity() -> String {
    DEFAULT_QUANTITY.to_string()
}

/// Input for a new item. `category: None` asks the store to categorize by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemDraft {
    pub name: String,
    pub quantity: String,
    pub notes: String,
    pub category: Option<Category>,
}

impl ItemDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn quantity(mut self, quantity: impl Into<String>) -> Self {
        self.quantity = quantity.into();
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }
}

/// Partial update; only `Some` fields are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub quantity: Option<String>,
    pub notes: Option<String>,
    pub category: Option<Category>,
    pub completed: Option<bool>,
}

impl ItemPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.quantity.is_none()
            && self.notes.is_none()
            && self.category.is_none()
            && self.completed.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    /// Only an exact `"dark"` selects dark mode.
    pub fn from_stored(value: &str) -> Self {
        if value.trim() == "dark" {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub items: Vec<Item>,
    pub theme: ThemeMode,
}
