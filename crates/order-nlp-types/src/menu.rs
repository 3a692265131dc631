//! Menu catalog types
//!
//! Menu items are owned by the external menu provider. The parser only
//! ever reads them.

use serde::{Deserialize, Serialize};

/// A single orderable item in the menu catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Unique identifier (e.g., "pizza_chicken_001")
    pub id: String,
    /// Display name (original casing)
    pub name: String,
    /// Category (e.g., "Pizza", "Beverage")
    pub category: String,
    /// Unit price in minor currency units
    pub unit_price: u64,
    /// Whether the item can be ordered right now
    #[serde(default = "default_available")]
    pub available: bool,
    /// Alternative names supplied by the provider ("cola" for "Coke")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
}

fn default_available() -> bool {
    true
}

impl MenuItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        unit_price: u64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            unit_price,
            available: true,
            synonyms: Vec::new(),
        }
    }

    /// Mark the item unavailable
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Attach provider-supplied aliases
    pub fn with_synonyms<I, S>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.synonyms.extend(synonyms.into_iter().map(Into::into));
        self
    }

    /// Display name followed by every synonym
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.synonyms.iter().map(String::as_str))
    }
}
