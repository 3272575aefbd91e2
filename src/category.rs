use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed grouping label for an item. Stored by its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Produce,
    Dairy,
    MeatSeafood,
    Pantry,
    Frozen,
    Snacks,
    Beverages,
    Household,
    PersonalCare,
}

impl Category {
    /// Display order of the category sections.
    pub const ALL: [Category; 9] = [
        Category::Produce,
        Category::Dairy,
        Category::MeatSeafood,
        Category::Pantry,
        Category::Frozen,
        Category::Snacks,
        Category::Beverages,
        Category::Household,
        Category::PersonalCare,
    ];

    pub const DEFAULT: Category = Category::Pantry;

    pub fn label(self) -> &'static str {
        match self {
            Category::Produce => "Produce",
            Category::Dairy => "Dairy",
            Category::MeatSeafood => "Meat & Seafood",
            Category::Pantry => "Pantry",
            Category::Frozen => "Frozen",
            Category::Snacks => "Snacks",
            Category::Beverages => "Beverages",
            Category::Household => "Household",
            Category::PersonalCare => "Personal Care",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Category::Produce => "🥬",
            Category::Dairy => "🥛",
            Category::MeatSeafood => "🥩",
            Category::Pantry => "🏺",
            Category::Frozen => "🧊",
            Category::Snacks => "🍿",
            Category::Beverages => "🥤",
            Category::Household => "🧽",
            Category::PersonalCare => "🧴",
        }
    }

    /// Exact label match, ignoring surrounding whitespace and ASCII case.
    pub fn from_label(label: &str) -> Option<Category> {
        let label = label.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(label))
    }

    /// Like [`Category::from_label`] but never fails.
    pub fn from_label_or_default(label: &str) -> Category {
        Category::from_label(label).unwrap_or(Category::DEFAULT)
    }

    pub fn position(self) -> usize {
        Category::ALL
            .iter()
            .position(|category| *category == self)
            .unwrap_or(0)
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::DEFAULT
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Category::from_label_or_default(&value)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.label().to_string()
    }
}

const KEYWORD_GROUPS: &[(Category, &[&str])] = &[
    (
        Category::Produce,
        &[
            "banana", "apple", "orange", "tomato", "onion", "potato", "carrot", "spinach",
            "lettuce",
        ],
    ),
    (
        Category::Dairy,
        &["milk", "cheese", "yogurt", "butter", "cream"],
    ),
    (
        Category::MeatSeafood,
        &["chicken", "beef", "pork", "fish", "salmon", "turkey"],
    ),
    (
        Category::Pantry,
        &["bread", "rice", "pasta", "flour", "sugar", "salt", "pepper", "oil"],
    ),
];

/// Guess a category from an item name. Groups are checked in order and the
/// first one with a keyword contained in the name wins.
pub fn categorize(name: &str) -> Category {
    let name = name.to_lowercase();
    KEYWORD_GROUPS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| name.contains(keyword)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::DEFAULT)
}
