//! Grouping and progress figures derived from the item list on every redraw.

use crate::category::Category;
use crate::item::Item;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup<'a> {
    pub category: Category,
    pub active: Vec<&'a Item>,
    pub completed: Vec<&'a Item>,
}

impl<'a> CategoryGroup<'a> {
    pub fn total(&self) -> usize {
        self.active.len() + self.completed.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn completion_percent(&self) -> f64 {
        percent(self.completed_count(), self.total())
    }

    /// Active items first, then completed ones.
    pub fn iter(&self) -> impl Iterator<Item = &'a Item> + '_ {
        self.active.iter().chain(self.completed.iter()).copied()
    }
}

/// Groups in [`Category::ALL`] order, skipping empty categories. Each group is
/// a stable partition of the collection order.
pub fn group_by_category(items: &[Item]) -> Vec<CategoryGroup<'_>> {
    Category::ALL
        .into_iter()
        .filter_map(|category| {
            let (completed, active): (Vec<&Item>, Vec<&Item>) = items
                .iter()
                .filter(|item| item.category == category)
                .partition(|item| item.completed);
            if active.is_empty() && completed.is_empty() {
                None
            } else {
                Some(CategoryGroup {
                    category,
                    active,
                    completed,
                })
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListStats {
    pub completed: usize,
    pub total: usize,
}

impl ListStats {
    pub fn from_items(items: &[Item]) -> Self {
        Self {
            completed: items.iter().filter(|item| item.completed).count(),
            total: items.len(),
        }
    }

    pub fn completion_percent(&self) -> f64 {
        percent(self.completed, self.total)
    }

    pub fn summary(&self) -> String {
        if self.total > 0 {
            format!("{} of {} completed", self.completed, self.total)
        } else {
            "Start adding items to your list".to_string()
        }
    }
}

fn percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: &str, category: Category, completed: bool) -> Item {
        Item {
            id: id.into(),
            name: format!("item {id}"),
            quantity: "1".into(),
            notes: String::new(),
            category,
            completed,
            created_at: Utc::now(),
        }
    }

    fn ids<'a>(items: impl Iterator<Item = &'a Item>) -> Vec<&'a str> {
        items.map(|item| item.id.as_str()).collect()
    }

    #[test]
    fn test_groups_partition_active_first() {
        let items = vec![
            item("a1", Category::Dairy, false),
            item("a2", Category::Dairy, true),
            item("b1", Category::Frozen, false),
        ];
        let groups = group_by_category(&items);
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].category, Category::Dairy);
        assert_eq!(ids(groups[0].iter()), vec!["a1", "a2"]);
        assert_eq!(groups[0].completion_percent(), 50.0);

        assert_eq!(groups[1].category, Category::Frozen);
        assert_eq!(ids(groups[1].iter()), vec!["b1"]);
        assert_eq!(groups[1].completion_percent(), 0.0);
    }

    #[test]
    fn test_groups_follow_category_order() {
        let items = vec![
            item("1", Category::PersonalCare, false),
            item("2", Category::Produce, false),
            item("3", Category::Pantry, false),
        ];
        let order: Vec<Category> = group_by_category(&items)
            .iter()
            .map(|group| group.category)
            .collect();
        assert_eq!(
            order,
            vec![Category::Produce, Category::Pantry, Category::PersonalCare]
        );
    }

    #[test]
    fn test_partition_is_stable() {
        let items = vec![
            item("1", Category::Produce, true),
            item("2", Category::Produce, false),
            item("3", Category::Produce, true),
            item("4", Category::Produce, false),
        ];
        let groups = group_by_category(&items);
        assert_eq!(ids(groups[0].iter()), vec!["2", "4", "1", "3"]);
        assert_eq!(groups[0].total(), 4);
        assert_eq!(groups[0].completed_count(), 2);
    }

    #[test]
    fn test_empty_list() {
        assert!(group_by_category(&[]).is_empty());
        let stats = ListStats::from_items(&[]);
        assert_eq!(stats.completion_percent(), 0.0);
        assert_eq!(stats.summary(), "Start adding items to your list");
    }

    #[test]
    fn test_global_stats() {
        let items = vec![
            item("1", Category::Produce, true),
            item("2", Category::Dairy, false),
            item("3", Category::Snacks, true),
        ];
        let stats = ListStats::from_items(&items);
        assert_eq!(stats, ListStats { completed: 2, total: 3 });
        assert_eq!(stats.summary(), "2 of 3 completed");
    }
}
