//! Order parsing service
//!
//! Ties a parser, a shared menu store and an order sink together. This is
//! what a transport adapter (HTTP handler, CLI, chat bot) holds on to.

use order_nlp_types::{MenuItem, ParseResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{MenuError, Result};
use crate::menu::{MenuProvider, MenuStore};
use crate::pipeline::OrderParser;
use crate::sink::{OrderMetadata, OrderReceipt, OrderSink};

/// Parse result plus the receipt, when an order was placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseOutcome {
    pub result: ParseResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<OrderReceipt>,
}

#[derive(Debug)]
pub struct OrderParsingService {
    parser: OrderParser,
    store: MenuStore,
}

impl Default for OrderParsingService {
    fn default() -> Self {
        Self::new(OrderParser::default())
    }
}

impl OrderParsingService {
    /// Service with an empty menu
    pub fn new(parser: OrderParser) -> Self {
        let store = MenuStore::new(parser.normalizer().clone());
        Self { parser, store }
    }

    /// Service seeded from a provider
    pub fn with_provider(parser: OrderParser, provider: &dyn MenuProvider) -> Result<Self> {
        let service = Self::new(parser);
        service.refresh_from(provider)?;
        Ok(service)
    }

    pub fn parser(&self) -> &OrderParser {
        &self.parser
    }

    pub fn store(&self) -> &MenuStore {
        &self.store
    }

    /// Install a menu snapshot directly
    pub fn replace_menu(&self, items: Vec<MenuItem>) -> bool {
        self.store.replace(items)
    }

    /// Pull a fresh snapshot from a provider
    pub fn refresh_from(&self, provider: &dyn MenuProvider) -> std::result::Result<bool, MenuError> {
        self.store.refresh_from(provider)
    }

    /// Parse against the current snapshot
    pub fn parse(&self, utterance: &str) -> ParseResult {
        let snapshot = self.store.snapshot();
        self.parser.parse_with_index(utterance, &snapshot)
    }

    /// Parse, and hand the result to a sink when it is a non-empty order.
    ///
    /// Anything else (other intents, orders where nothing resolved) comes
    /// back without a receipt.
    pub fn parse_and_submit(
        &self,
        utterance: &str,
        metadata: &OrderMetadata,
        sink: &dyn OrderSink,
    ) -> Result<ParseOutcome> {
        let result = self.parse(utterance);

        if !(result.intent.is_ordering() && result.has_items()) {
            debug!(intent = %result.intent, "Nothing to place");
            return Ok(ParseOutcome {
                result,
                receipt: None,
            });
        }

        let receipt = sink.submit(&result, metadata)?;
        info!(order_id = %receipt.order_id, "Order placed");
        Ok(ParseOutcome {
            result,
            receipt: Some(receipt),
        })
    }
}
