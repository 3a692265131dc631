//! order-nlp - natural-language restaurant order parser
//!
//! Turns a free-text customer utterance plus a menu into an intent and,
//! for orders, a list of resolved line items.
//!
//! ## Pipeline
//! Utterance -> Normalizer -> IntentClassifier -> Extractor -> FuzzyResolver -> ParseResult
//!
//! ## Quick Start
//!
//! ```rust
//! use order_nlp::{parse, IntentLabel, MenuItem, ParseRequest};
//!
//! let menu = vec![
//!     MenuItem::new("p1", "Chicken Pizza", "Pizza", 500),
//!     MenuItem::new("c1", "Coke", "Beverage", 100),
//! ];
//! let result = parse(&ParseRequest::new("I want 2 chicken pizzas and 1 coke", menu));
//! assert_eq!(result.intent, IntentLabel::OrderFood);
//! assert_eq!(result.order_total, 1100);
//! ```

// Core error handling
pub mod error;

// Rule tables (YAML)
pub mod config;

// Pipeline stages
pub mod extract;
pub mod intent;
pub mod normalize;
pub mod resolve;

// Parser and the boundaries around it
pub mod menu;
pub mod pipeline;
pub mod service;
pub mod sink;

use once_cell::sync::Lazy;

// Boundary types
pub use order_nlp_types::{
    line_total, IntentLabel, MenuItem, ParseRequest, ParseResult, ResolvedLineItem,
    UnresolvedPhrase, UnresolvedReason,
};

pub use config::ParserRules;
pub use error::{ConfigError, MenuError, OrderNlpError, Result, SinkError};
pub use extract::{Candidate, QuantityItemExtractor};
pub use intent::{Classification, IntentClassifier};
pub use menu::{JsonFileMenuProvider, MenuProvider, MenuStore, StaticMenuProvider};
pub use normalize::{NormalizedText, Normalizer};
pub use pipeline::OrderParser;
pub use resolve::{FuzzyResolver, MenuIndex, Resolution, ResolutionContext};
pub use service::{OrderParsingService, ParseOutcome};
pub use sink::{InMemoryOrderSink, OrderMetadata, OrderReceipt, OrderSink};

static DEFAULT_PARSER: Lazy<OrderParser> = Lazy::new(OrderParser::default);

/// Parse with the built-in rule set
pub fn parse(request: &ParseRequest) -> ParseResult {
    DEFAULT_PARSER.parse(request)
}
