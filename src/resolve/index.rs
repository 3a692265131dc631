//! In-memory menu index
//!
//! `MenuIndex` is built once per menu snapshot and is read-only afterwards.
//! It holds every item's labels (display name plus synonyms) already
//! normalized and plural-folded, and a token index the classifier uses to
//! spot menu vocabulary in an utterance.

use std::collections::{HashMap, HashSet};
use std::fmt;

use order_nlp_types::MenuItem;
use sha2::{Digest, Sha256};
use smallvec::SmallVec;
use tracing::{debug, warn};

use super::similarity::{fold_tokens, token_similarity};
use crate::normalize::Normalizer;

/// Tokens shorter than this are never treated as menu vocabulary
const MIN_VOCABULARY_TOKEN_LEN: usize = 3;

/// Tokens shorter than this only match the vocabulary exactly
const MIN_FUZZY_TOKEN_LEN: usize = 4;

/// A menu item with its matchable labels
#[derive(Debug, Clone)]
pub struct IndexedItem {
    pub item: MenuItem,
    /// Folded token sequence per label spelling; the display name as
    /// written comes first
    pub labels: SmallVec<[Vec<String>; 4]>,
}

/// Immutable, searchable view of one menu snapshot
#[derive(Debug, Clone, Default)]
pub struct MenuIndex {
    fingerprint: String,
    items: Vec<IndexedItem>,
    /// Folded token → positions in `items`
    token_index: HashMap<String, SmallVec<[usize; 8]>>,
}

impl MenuIndex {
    /// Index a menu snapshot. Later items reusing an id are dropped.
    pub fn build(items: Vec<MenuItem>, normalizer: &Normalizer) -> Self {
        let fingerprint = Self::fingerprint_of(&items);
        let mut seen_ids = HashSet::new();
        let mut indexed = Vec::with_capacity(items.len());
        let mut token_index: HashMap<String, SmallVec<[usize; 8]>> = HashMap::new();

        for item in items {
            if !seen_ids.insert(item.id.clone()) {
                warn!(item_id = %item.id, "Duplicate menu item id, keeping first occurrence");
                continue;
            }

            let position = indexed.len();
            let labels: SmallVec<[Vec<String>; 4]> = item
                .labels()
                .flat_map(|label| normalizer.label_forms(label))
                .map(|tokens| fold_tokens(&tokens))
                .filter(|tokens| !tokens.is_empty())
                .fold(SmallVec::new(), |mut labels, tokens| {
                    if !labels.contains(&tokens) {
                        labels.push(tokens);
                    }
                    labels
                });

            for token in labels.iter().flatten() {
                if token.chars().count() < MIN_VOCABULARY_TOKEN_LEN {
                    continue;
                }
                let entry = token_index.entry(token.clone()).or_default();
                if !entry.contains(&position) {
                    entry.push(position);
                }
            }

            indexed.push(IndexedItem { item, labels });
        }

        debug!(
            items = indexed.len(),
            vocabulary = token_index.len(),
            "Built menu index"
        );

        Self {
            fingerprint,
            items: indexed,
            token_index,
        }
    }

    /// Content hash of a snapshot, stable across identical menus
    pub fn fingerprint_of(items: &[MenuItem]) -> String {
        let mut hasher = Sha256::new();
        for item in items {
            hasher.update(item.id.as_bytes());
            hasher.update([0x1f]);
            hasher.update(item.name.as_bytes());
            hasher.update([0x1f]);
            hasher.update(item.category.as_bytes());
            hasher.update([0x1f]);
            hasher.update(item.unit_price.to_le_bytes());
            hasher.update([u8::from(item.available)]);
            for synonym in &item.synonyms {
                hasher.update([0x1f]);
                hasher.update(synonym.as_bytes());
            }
            hasher.update([0x1e]);
        }
        hex::encode(hasher.finalize())
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn items(&self) -> &[IndexedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get an item by id
    pub fn get(&self, id: &str) -> Option<&MenuItem> {
        self.items
            .iter()
            .find(|indexed| indexed.item.id == id)
            .map(|indexed| &indexed.item)
    }

    /// Items whose labels contain a folded token
    pub fn lookup_by_token(&self, token: &str) -> Vec<&MenuItem> {
        self.token_index
            .get(token)
            .map(|positions| positions.iter().map(|p| &self.items[*p].item).collect())
            .unwrap_or_default()
    }

    /// Whether a folded utterance token looks like menu vocabulary.
    ///
    /// Exact hits win outright; longer tokens may also match by
    /// similarity at or above `threshold`.
    pub fn recognizes_token(&self, token: &str, threshold: f64) -> bool {
        let len = token.chars().count();
        if len < MIN_VOCABULARY_TOKEN_LEN {
            return false;
        }
        if self.token_index.contains_key(token) {
            return true;
        }
        if len < MIN_FUZZY_TOKEN_LEN {
            return false;
        }
        self.token_index.keys().any(|known| {
            known.chars().count() >= MIN_FUZZY_TOKEN_LEN
                && token_similarity(token, known) >= threshold
        })
    }

    /// Statistics for debugging
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            fingerprint: self.fingerprint.clone(),
            item_count: self.items.len(),
            available_count: self.items.iter().filter(|i| i.item.available).count(),
            label_count: self.items.iter().map(|i| i.labels.len()).sum(),
            vocabulary_size: self.token_index.len(),
        }
    }
}

/// Index statistics
#[derive(Debug, Clone)]
pub struct IndexStats {
    pub fingerprint: String,
    pub item_count: usize,
    pub available_count: usize,
    pub label_count: usize,
    pub vocabulary_size: usize,
}

impl fmt::Display for IndexStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Menu Index Statistics:")?;
        writeln!(
            f,
            "  Fingerprint: {}",
            &self.fingerprint[..self.fingerprint.len().min(16)]
        )?;
        writeln!(f, "  Items: {}", self.item_count)?;
        writeln!(f, "  Available: {}", self.available_count)?;
        writeln!(f, "  Labels: {}", self.label_count)?;
        writeln!(f, "  Vocabulary: {}", self.vocabulary_size)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserRules;

    fn normalizer() -> Normalizer {
        Normalizer::new(&ParserRules::builtin().normalizer)
    }

    fn sample_menu() -> Vec<MenuItem> {
        vec![
            MenuItem::new("p1", "Chicken Pizza", "Pizza", 500),
            MenuItem::new("c1", "Coke", "Beverage", 100).with_synonyms(["cola"]),
            MenuItem::new("f1", "French Fries", "Sides", 150).unavailable(),
        ]
    }

    #[test]
    fn test_build_folds_labels() {
        let index = MenuIndex::build(sample_menu(), &normalizer());
        assert_eq!(index.len(), 3);

        let fries = &index.items()[2];
        assert_eq!(fries.labels[0], vec!["french".to_string(), "fry".to_string()]);

        let coke = &index.items()[1];
        assert_eq!(coke.labels.len(), 2);
        assert_eq!(coke.labels[1], vec!["cola".to_string()]);
    }

    #[test]
    fn test_labels_keep_written_spelling() {
        let menu = vec![
            MenuItem::new("m1", "Mac N Cheese", "Sides", 350),
            MenuItem::new("w1", "BBQ Wings", "Sides", 600),
        ];
        let index = MenuIndex::build(menu, &normalizer());
        assert_eq!(index.items()[0].labels[0], vec!["mac", "n", "cheese"]);
        assert_eq!(index.items()[0].labels[1], vec!["mac", "and", "cheese"]);
        assert_eq!(index.items()[1].labels[0], vec!["bbq", "wing"]);
        assert_eq!(index.items()[1].labels[1], vec!["barbecue", "wing"]);
    }

    #[test]
    fn test_token_lookup() {
        let index = MenuIndex::build(sample_menu(), &normalizer());
        let hits = index.lookup_by_token("pizza");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "p1");
        assert!(index.lookup_by_token("burger").is_empty());
    }

    #[test]
    fn test_recognizes_token() {
        let index = MenuIndex::build(sample_menu(), &normalizer());
        assert!(index.recognizes_token("pizza", 0.8));
        assert!(index.recognizes_token("cola", 0.8));
        assert!(index.recognizes_token("chickn", 0.8));
        assert!(!index.recognizes_token("there", 0.8));
        assert!(!index.recognizes_token("a", 0.8));
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let mut menu = sample_menu();
        menu.push(MenuItem::new("p1", "Veggie Pizza", "Pizza", 450));
        let index = MenuIndex::build(menu, &normalizer());
        assert_eq!(index.len(), 3);
        assert_eq!(index.get("p1").map(|i| i.name.as_str()), Some("Chicken Pizza"));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = MenuIndex::fingerprint_of(&sample_menu());
        let b = MenuIndex::fingerprint_of(&sample_menu());
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let mut changed = sample_menu();
        changed[0].available = false;
        assert_ne!(a, MenuIndex::fingerprint_of(&changed));
    }

    #[test]
    fn test_stats() {
        let index = MenuIndex::build(sample_menu(), &normalizer());
        let stats = index.stats();
        assert_eq!(stats.item_count, 3);
        assert_eq!(stats.available_count, 2);
        assert_eq!(stats.label_count, 4);
        assert!(stats.to_string().contains("Items: 3"));
    }

    #[test]
    fn test_empty_index() {
        let index = MenuIndex::default();
        assert!(index.is_empty());
        assert!(!index.recognizes_token("pizza", 0.8));
    }
}
