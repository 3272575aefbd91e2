pub const MAX_SUGGESTIONS: usize = 5;

pub const COMMON_ITEMS: &[&str] = &[
    "Milk",
    "Bread",
    "Eggs",
    "Bananas",
    "Apples",
    "Chicken breast",
    "Ground beef",
    "Rice",
    "Pasta",
    "Tomatoes",
    "Onions",
    "Potatoes",
    "Carrots",
    "Spinach",
    "Cheese",
    "Yogurt",
    "Butter",
    "Olive oil",
    "Salt",
    "Pepper",
];

/// Common item names containing `partial`, case-insensitively.
pub fn suggest(partial: &str) -> Vec<&'static str> {
    suggest_from(COMMON_ITEMS, partial)
}

pub fn suggest_from<'a>(catalog: &[&'a str], partial: &str) -> Vec<&'a str> {
    if partial.is_empty() {
        return Vec::new();
    }
    let needle = partial.to_lowercase();
    catalog
        .iter()
        .filter(|entry| entry.to_lowercase().contains(&needle))
        .take(MAX_SUGGESTIONS)
        .copied()
        .collect()
}
