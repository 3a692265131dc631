//! Shared boundary types for order-nlp
//!
//! Every type that crosses the parser boundary lives here: the request a
//! transport adapter builds, and the result it hands to an order sink.
//!
//! ## Boundary
//!
//! ```text
//! ┌──────────────────┐  ParseRequest   ┌──────────────────┐  ParseResult   ┌──────────────┐
//! │  Adapter         │ ──────────────► │  order-nlp core  │ ─────────────► │  Order sink  │
//! │  (HTTP/CLI/RPC)  │                 │  (pure, sync)    │                │  (external)  │
//! └──────────────────┘                 └──────────────────┘                └──────────────┘
//! ```
//!
//! ## Rules
//!
//! 1. Closed enums for intent and unresolved reason, `snake_case` on the wire
//! 2. Prices are integer minor currency units, never floats
//! 3. Sequence order is user-visible and always follows the utterance

pub mod menu;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use menu::MenuItem;

// ============================================================================
// INTENT
// ============================================================================

/// The high-level purpose of an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentLabel {
    OrderFood,
    ViewMenu,
    CancelOrder,
    Greeting,
    Unknown,
}

impl IntentLabel {
    /// All labels, in declaration order
    pub const ALL: [IntentLabel; 5] = [
        IntentLabel::OrderFood,
        IntentLabel::ViewMenu,
        IntentLabel::CancelOrder,
        IntentLabel::Greeting,
        IntentLabel::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentLabel::OrderFood => "order_food",
            IntentLabel::ViewMenu => "view_menu",
            IntentLabel::CancelOrder => "cancel_order",
            IntentLabel::Greeting => "greeting",
            IntentLabel::Unknown => "unknown",
        }
    }

    /// Whether this intent carries line items
    pub fn is_ordering(&self) -> bool {
        matches!(self, IntentLabel::OrderFood)
    }
}

impl fmt::Display for IntentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// REQUEST
// ============================================================================

/// Input to a single parse call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseRequest {
    pub utterance: String,
    #[serde(default)]
    pub menu_snapshot: Vec<MenuItem>,
}

impl ParseRequest {
    pub fn new(utterance: impl Into<String>, menu_snapshot: Vec<MenuItem>) -> Self {
        Self {
            utterance: utterance.into(),
            menu_snapshot,
        }
    }
}

// ============================================================================
// RESULT
// ============================================================================

/// Why a phrase could not be bound to a menu item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// Nothing in the catalog scored at or above the acceptance threshold
    NoMatch,
    /// The best match exists but is not available right now
    Unavailable,
    /// Several items match equally well; the customer has to pick one
    Ambiguous,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::NoMatch => f.write_str("no_match"),
            UnresolvedReason::Unavailable => f.write_str("unavailable"),
            UnresolvedReason::Ambiguous => f.write_str("ambiguous"),
        }
    }
}

/// A phrase bound to a concrete, available menu item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLineItem {
    pub item_id: String,
    pub name: String,
    pub category: String,
    /// Always at least 1
    pub quantity: u32,
    /// Copied from the matched menu item at parse time
    pub unit_price: u64,
    /// quantity × unit_price
    pub total: u64,
    /// Similarity score of the winning match (0.0 to 1.0)
    pub match_score: f32,
    /// The phrase from the utterance that produced this line
    pub raw_phrase: String,
}

impl ResolvedLineItem {
    /// Add more of the same item, keeping the total in step
    pub fn add_quantity(&mut self, quantity: u32) {
        self.quantity = self.quantity.saturating_add(quantity);
        self.total = line_total(self.quantity, self.unit_price);
    }
}

/// Compute a line total without overflowing
pub fn line_total(quantity: u32, unit_price: u64) -> u64 {
    u64::from(quantity).saturating_mul(unit_price)
}

/// A phrase the parser could not bind to an orderable item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedPhrase {
    pub raw_phrase: String,
    pub reason: UnresolvedReason,
    /// Quantity the customer asked for
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Item names to choose from, for `ambiguous`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl UnresolvedPhrase {
    pub fn new(raw_phrase: impl Into<String>, reason: UnresolvedReason, quantity: u32) -> Self {
        Self {
            raw_phrase: raw_phrase.into(),
            reason,
            quantity,
            options: Vec::new(),
        }
    }

    /// Attach the items the customer can choose between
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }
}

fn default_quantity() -> u32 {
    1
}

/// Output of a single parse call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub intent: IntentLabel,
    /// In utterance order
    pub resolved_items: Vec<ResolvedLineItem>,
    /// In utterance order
    pub unresolved: Vec<UnresolvedPhrase>,
    /// Sum of line totals
    pub order_total: u64,
    /// Heuristic confidence (0.0 to 1.0)
    pub confidence: f32,
}

impl ParseResult {
    /// Result with an intent and nothing else
    pub fn empty(intent: IntentLabel) -> Self {
        Self {
            intent,
            resolved_items: Vec::new(),
            unresolved: Vec::new(),
            order_total: 0,
            confidence: 0.0,
        }
    }

    /// True when at least one line item was resolved
    pub fn has_items(&self) -> bool {
        !self.resolved_items.is_empty()
    }

    /// True when some phrases resolved and others did not
    pub fn is_partial(&self) -> bool {
        self.has_items() && !self.unresolved.is_empty()
    }

    /// True when a phrase matched several items and needs a follow-up question
    pub fn needs_clarification(&self) -> bool {
        self.unresolved
            .iter()
            .any(|u| u.reason == UnresolvedReason::Ambiguous)
    }
}
