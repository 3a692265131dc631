//! Shared menu snapshot with atomic swap
//!
//! Readers clone the current `Arc<MenuIndex>` and keep using it for the
//! whole parse, even if a newer snapshot is installed meanwhile. Writers
//! build the replacement index outside the lock and only hold the write
//! lock for the pointer swap.

use std::sync::{Arc, PoisonError, RwLock};

use order_nlp_types::MenuItem;
use tracing::{debug, info, warn};

use super::MenuProvider;
use crate::error::MenuError;
use crate::normalize::Normalizer;
use crate::resolve::MenuIndex;

#[derive(Debug)]
pub struct MenuStore {
    normalizer: Normalizer,
    current: RwLock<Arc<MenuIndex>>,
}

impl MenuStore {
    /// Empty store; every phrase resolves to `no_match` until a menu arrives
    pub fn new(normalizer: Normalizer) -> Self {
        Self {
            normalizer,
            current: RwLock::new(Arc::new(MenuIndex::default())),
        }
    }

    /// Store seeded with an initial snapshot
    pub fn with_items(normalizer: Normalizer, items: Vec<MenuItem>) -> Self {
        let index = MenuIndex::build(items, &normalizer);
        Self {
            normalizer,
            current: RwLock::new(Arc::new(index)),
        }
    }

    /// The snapshot in force right now
    pub fn snapshot(&self) -> Arc<MenuIndex> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*current)
    }

    /// Install a new snapshot. Returns `false` when the content is
    /// identical to the current one and nothing was swapped.
    pub fn replace(&self, items: Vec<MenuItem>) -> bool {
        let fingerprint = MenuIndex::fingerprint_of(&items);
        if self.snapshot().fingerprint() == fingerprint {
            debug!(fingerprint = %&fingerprint[..16], "Menu unchanged, keeping snapshot");
            return false;
        }

        let index = Arc::new(MenuIndex::build(items, &self.normalizer));
        let items = index.len();
        {
            let mut current = self
                .current
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *current = index;
        }

        info!(items, fingerprint = %&fingerprint[..16], "Installed new menu snapshot");
        true
    }

    /// Pull from a provider and install the result. On failure the current
    /// snapshot stays in place and the error is returned.
    pub fn refresh_from(&self, provider: &dyn MenuProvider) -> Result<bool, MenuError> {
        match provider.get_current_menu() {
            Ok(items) => Ok(self.replace(items)),
            Err(e) => {
                warn!(error = %e, "Menu provider failed, keeping current snapshot");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserRules;

    fn store() -> MenuStore {
        MenuStore::new(Normalizer::new(&ParserRules::builtin().normalizer))
    }

    struct FailingProvider;

    impl MenuProvider for FailingProvider {
        fn get_current_menu(&self) -> Result<Vec<MenuItem>, MenuError> {
            Err(MenuError::Unavailable("offline".to_string()))
        }
    }

    #[test]
    fn test_starts_empty() {
        assert!(store().snapshot().is_empty());
    }

    #[test]
    fn test_replace_swaps_and_old_readers_keep_snapshot() {
        let store = store();
        assert!(store.replace(vec![MenuItem::new("c1", "Coke", "Beverage", 100)]));
        let before = store.snapshot();

        assert!(store.replace(vec![MenuItem::new("c1", "Coke", "Beverage", 120)]));
        let after = store.snapshot();

        assert_eq!(before.get("c1").map(|i| i.unit_price), Some(100));
        assert_eq!(after.get("c1").map(|i| i.unit_price), Some(120));
    }

    #[test]
    fn test_identical_replace_is_noop() {
        let store = store();
        let menu = vec![MenuItem::new("c1", "Coke", "Beverage", 100)];
        assert!(store.replace(menu.clone()));
        let first = store.snapshot();
        assert!(!store.replace(menu));
        assert!(Arc::ptr_eq(&first, &store.snapshot()));
    }

    #[test]
    fn test_failed_refresh_keeps_snapshot() {
        let store = store();
        store.replace(vec![MenuItem::new("c1", "Coke", "Beverage", 100)]);
        let result = store.refresh_from(&FailingProvider);
        assert!(matches!(result, Err(MenuError::Unavailable(_))));
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn test_concurrent_readers_during_swap() {
        let store = Arc::new(store());
        store.replace(vec![MenuItem::new("c1", "Coke", "Beverage", 100)]);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for n in 0..50u64 {
                        if i == 0 {
                            store.replace(vec![MenuItem::new("c1", "Coke", "Beverage", 100 + n)]);
                        } else {
                            let snapshot = store.snapshot();
                            assert_eq!(snapshot.len(), 1);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.snapshot().get("c1").map(|i| i.unit_price), Some(149));
    }
}
