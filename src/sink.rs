//! Order sink boundary
//!
//! Persisting an order is someone else's job. The parser hands a
//! `ParseResult` plus caller metadata to an `OrderSink` and gets back
//! either a receipt or a rejection.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use order_nlp_types::{IntentLabel, ParseResult};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::SinkError;

/// Caller-supplied context attached to a placed order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Acknowledgement of a persisted order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: Uuid,
    pub placed_at: DateTime<Utc>,
    pub item_count: usize,
    pub order_total: u64,
}

/// Destination for parsed orders
pub trait OrderSink: Send + Sync {
    fn submit(&self, result: &ParseResult, metadata: &OrderMetadata)
        -> Result<OrderReceipt, SinkError>;
}

/// Check a result is something a sink can accept
pub fn ensure_placeable(result: &ParseResult) -> Result<(), SinkError> {
    if result.intent != IntentLabel::OrderFood {
        return Err(SinkError::NotAnOrder(result.intent.to_string()));
    }
    if !result.has_items() {
        return Err(SinkError::EmptyOrder);
    }
    Ok(())
}

/// An order held by `InMemoryOrderSink`
#[derive(Debug, Clone, PartialEq)]
pub struct StoredOrder {
    pub receipt: OrderReceipt,
    pub metadata: OrderMetadata,
    pub result: ParseResult,
}

/// Sink that keeps orders in memory, for tests and the CLI
#[derive(Debug, Default)]
pub struct InMemoryOrderSink {
    orders: RwLock<Vec<StoredOrder>>,
}

impl InMemoryOrderSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> Vec<StoredOrder> {
        self.orders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.orders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OrderSink for InMemoryOrderSink {
    fn submit(
        &self,
        result: &ParseResult,
        metadata: &OrderMetadata,
    ) -> Result<OrderReceipt, SinkError> {
        ensure_placeable(result)?;

        let receipt = OrderReceipt {
            order_id: Uuid::new_v4(),
            placed_at: Utc::now(),
            item_count: result.resolved_items.len(),
            order_total: result.order_total,
        };

        self.orders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(StoredOrder {
                receipt: receipt.clone(),
                metadata: metadata.clone(),
                result: result.clone(),
            });

        info!(
            order_id = %receipt.order_id,
            items = receipt.item_count,
            order_total = receipt.order_total,
            "Order stored"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_nlp_types::ResolvedLineItem;

    fn order() -> ParseResult {
        ParseResult {
            intent: IntentLabel::OrderFood,
            resolved_items: vec![ResolvedLineItem {
                item_id: "c1".to_string(),
                name: "Coke".to_string(),
                category: "Beverage".to_string(),
                quantity: 2,
                unit_price: 100,
                total: 200,
                match_score: 1.0,
                raw_phrase: "cokes".to_string(),
            }],
            unresolved: Vec::new(),
            order_total: 200,
            confidence: 1.0,
        }
    }

    #[test]
    fn test_submit_stores_order() {
        let sink = InMemoryOrderSink::new();
        let metadata = OrderMetadata {
            table: Some("12".to_string()),
            ..Default::default()
        };
        let receipt = sink.submit(&order(), &metadata).unwrap();
        assert_eq!(receipt.item_count, 1);
        assert_eq!(receipt.order_total, 200);

        let stored = sink.orders();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].receipt.order_id, receipt.order_id);
        assert_eq!(stored[0].metadata.table.as_deref(), Some("12"));
    }

    #[test]
    fn test_rejects_non_order() {
        let sink = InMemoryOrderSink::new();
        let result = ParseResult::empty(IntentLabel::ViewMenu);
        assert_eq!(
            sink.submit(&result, &OrderMetadata::default()),
            Err(SinkError::NotAnOrder("view_menu".to_string()))
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn test_rejects_empty_order() {
        let sink = InMemoryOrderSink::new();
        let result = ParseResult::empty(IntentLabel::OrderFood);
        assert_eq!(
            sink.submit(&result, &OrderMetadata::default()),
            Err(SinkError::EmptyOrder)
        );
    }
}
