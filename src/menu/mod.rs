//! Menu providers and the shared snapshot store
//!
//! The parser never owns the catalog. A `MenuProvider` hands over the
//! current items; `MenuStore` turns them into an immutable `MenuIndex`
//! and swaps it in atomically.

mod store;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use order_nlp_types::MenuItem;
use tracing::debug;

use crate::error::MenuError;

pub use store::MenuStore;

// =============================================================================
// Trait Definition
// =============================================================================

/// Source of the current menu snapshot.
///
/// Failures belong to the provider; callers keep whatever snapshot they
/// already have.
pub trait MenuProvider: Send + Sync {
    fn get_current_menu(&self) -> Result<Vec<MenuItem>, MenuError>;
}

// =============================================================================
// Implementations
// =============================================================================

/// Fixed in-memory menu
#[derive(Debug, Clone, Default)]
pub struct StaticMenuProvider {
    items: Vec<MenuItem>,
}

impl StaticMenuProvider {
    pub fn new(items: Vec<MenuItem>) -> Self {
        Self { items }
    }
}

impl MenuProvider for StaticMenuProvider {
    fn get_current_menu(&self) -> Result<Vec<MenuItem>, MenuError> {
        Ok(self.items.clone())
    }
}

/// Menu read from a JSON array of items on every call
#[derive(Debug, Clone)]
pub struct JsonFileMenuProvider {
    path: PathBuf,
}

impl JsonFileMenuProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MenuProvider for JsonFileMenuProvider {
    fn get_current_menu(&self) -> Result<Vec<MenuItem>, MenuError> {
        let content = std::fs::read_to_string(&self.path)?;
        let items: Vec<MenuItem> = serde_json::from_str(&content)?;
        ensure_unique_ids(&items)?;
        debug!(path = %self.path.display(), items = items.len(), "Loaded menu file");
        Ok(items)
    }
}

/// Reject snapshots that reuse an item id
pub fn ensure_unique_ids(items: &[MenuItem]) -> Result<(), MenuError> {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.id.as_str()) {
            return Err(MenuError::DuplicateId(item.id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MENU_JSON: &str = r#"[
        {"id": "p1", "name": "Chicken Pizza", "category": "Pizza", "unit_price": 500},
        {"id": "c1", "name": "Coke", "category": "Beverage", "unit_price": 100,
         "available": false, "synonyms": ["cola"]}
    ]"#;

    #[test]
    fn test_static_provider() {
        let provider = StaticMenuProvider::new(vec![MenuItem::new("c1", "Coke", "Beverage", 100)]);
        assert_eq!(provider.get_current_menu().unwrap().len(), 1);
    }

    #[test]
    fn test_json_file_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("menu.json");
        std::fs::write(&path, MENU_JSON).unwrap();

        let items = JsonFileMenuProvider::new(&path).get_current_menu().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].available);
        assert!(!items[1].available);
        assert_eq!(items[1].synonyms, vec!["cola".to_string()]);
    }

    #[test]
    fn test_json_file_provider_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = JsonFileMenuProvider::new(dir.path().join("missing.json"));
        assert!(matches!(missing.get_current_menu(), Err(MenuError::Io(_))));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        assert!(matches!(
            JsonFileMenuProvider::new(&bad).get_current_menu(),
            Err(MenuError::Json(_))
        ));

        let dup = dir.path().join("dup.json");
        std::fs::write(
            &dup,
            r#"[{"id":"x","name":"A","category":"C","unit_price":1},
                {"id":"x","name":"B","category":"C","unit_price":2}]"#,
        )
        .unwrap();
        assert!(matches!(
            JsonFileMenuProvider::new(&dup).get_current_menu(),
            Err(MenuError::DuplicateId(ref id)) if id == "x"
        ));
    }
}
