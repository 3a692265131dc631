//! Error types for the order parser boundary
//!
//! The parse pipeline itself never fails: unknown intent and unresolved
//! phrases are data on `ParseResult`. Errors exist only at the edges the
//! parser touches - loading rules, fetching a menu, handing an order to a
//! sink.

use thiserror::Error;

/// Umbrella error for callers that drive the whole service
#[derive(Error, Debug)]
pub enum OrderNlpError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Menu error: {0}")]
    Menu(#[from] MenuError),

    #[error("Order sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Problems with a parser rule set
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read rules file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid rules YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{field} must be within [0, 1], got {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("Intent priority is missing label '{0}'")]
    MissingPriority(String),

    #[error("Intent priority lists label '{0}' more than once")]
    DuplicatePriority(String),

    #[error("Tie-break rule '{0}' listed more than once")]
    DuplicateTieBreak(String),

    #[error("max_quantity must be at least 1")]
    ZeroMaxQuantity,
}

/// Problems obtaining a menu snapshot from a provider
#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Failed to read menu: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid menu JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate menu item id '{0}'")]
    DuplicateId(String),

    #[error("Menu provider unavailable: {0}")]
    Unavailable(String),
}

/// Rejections from an order sink
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SinkError {
    #[error("Only order_food results can be placed, got {0}")]
    NotAnOrder(String),

    #[error("Order has no resolved items")]
    EmptyOrder,

    #[error("Order rejected: {0}")]
    Rejected(String),
}

pub type Result<T, E = OrderNlpError> = std::result::Result<T, E>;
