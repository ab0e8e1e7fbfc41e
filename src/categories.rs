//! Item -> category lookup used for directory partitioning.

use std::collections::{BTreeMap, HashMap};

/// Resolves the category directory an item's media lives under.
pub trait CategoryLookup: Send + Sync {
    /// `item` is expected in lowercase.
    fn category_of(&self, item: &str) -> Option<String>;
}

/// Static lookup built from the configured category groups.
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    by_item: HashMap<String, String>,
}

impl CategoryMap {
    pub fn from_groups(groups: &BTreeMap<String, Vec<String>>) -> Self {
        let mut by_item = HashMap::new();
        for (category, items) in groups {
            for item in items {
                let item = item.trim().to_lowercase();
                if let Some(previous) = by_item.insert(item.clone(), category.clone()) {
                    tracing::warn!(
                        "item '{}' listed under both '{}' and '{}', using '{}'",
                        item,
                        previous,
                        category,
                        category
                    );
                }
            }
        }
        Self { by_item }
    }

    pub fn len(&self) -> usize {
        self.by_item.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_item.is_empty()
    }
}

impl CategoryLookup for CategoryMap {
    fn category_of(&self, item: &str) -> Option<String> {
        self.by_item.get(item).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_lowercase() {
        let mut groups = BTreeMap::new();
        groups.insert(
            "passeriformes".to_string(),
            vec!["Blue Jay".to_string(), "american robin".to_string()],
        );
        let map = CategoryMap::from_groups(&groups);

        assert_eq!(map.len(), 2);
        assert_eq!(map.category_of("blue jay").as_deref(), Some("passeriformes"));
        assert_eq!(map.category_of("Blue Jay"), None);
        assert_eq!(map.category_of("osprey"), None);
    }
}
