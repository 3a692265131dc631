//! Parse pipeline
//!
//! ```text
//! utterance ─► Normalizer ─► IntentClassifier ─┬─► (non-order) ParseResult
//!                                              │
//!                                              └─► Extractor ─► FuzzyResolver ─► ParseResult
//! ```
//!
//! Each call is pure: the parser holds only immutable rules and the menu
//! index is read-only for the duration of a parse.

use std::sync::Arc;

use order_nlp_types::{IntentLabel, MenuItem, ParseRequest, ParseResult, ResolvedLineItem};
use tracing::{debug, info, warn};

use crate::config::ParserRules;
use crate::error::ConfigError;
use crate::extract::QuantityItemExtractor;
use crate::intent::{Classification, IntentClassifier};
use crate::normalize::{NormalizedText, Normalizer};
use crate::resolve::{FuzzyResolver, MenuIndex, Resolution, ResolutionContext};

// ============================================================================
// CONFIDENCE WEIGHTS
// ============================================================================

const BASE_CONFIDENCE: f64 = 0.5;
const NON_ORDER_INTENT_BONUS: f64 = 0.3;
const ORDER_WITH_ITEMS_BONUS: f64 = 0.3;
const ORDER_WITHOUT_ITEMS_PENALTY: f64 = 0.2;
const ITEMS_PRESENT_BONUS: f64 = 0.2;
const FULLY_RESOLVED_BONUS: f64 = 0.1;
const ORDER_TRIGGER_BONUS: f64 = 0.1;
const DIGIT_QUANTITY_BONUS: f64 = 0.1;

// ============================================================================
// PARSER
// ============================================================================

/// Stateless order parser bound to one rule set
#[derive(Debug, Clone)]
pub struct OrderParser {
    rules: Arc<ParserRules>,
    normalizer: Normalizer,
    classifier: IntentClassifier,
    extractor: QuantityItemExtractor,
    resolver: FuzzyResolver,
}

impl Default for OrderParser {
    fn default() -> Self {
        Self::from_valid_rules(ParserRules::builtin())
    }
}

impl OrderParser {
    /// Build a parser from a rule set, validating it first
    pub fn new(rules: ParserRules) -> Result<Self, ConfigError> {
        rules.validate()?;
        Ok(Self::from_valid_rules(rules))
    }

    fn from_valid_rules(rules: ParserRules) -> Self {
        let normalizer = Normalizer::new(&rules.normalizer);
        let classifier = IntentClassifier::new(&rules, &normalizer);
        let extractor = QuantityItemExtractor::new(&rules.extractor);
        let resolver = FuzzyResolver::new(&rules.resolver);
        Self {
            rules: Arc::new(rules),
            normalizer,
            classifier,
            extractor,
            resolver,
        }
    }

    pub fn rules(&self) -> &ParserRules {
        &self.rules
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn resolver(&self) -> &FuzzyResolver {
        &self.resolver
    }

    /// Normalize an utterance with this parser's rules
    pub fn normalize(&self, utterance: &str) -> NormalizedText {
        self.normalizer.normalize(utterance)
    }

    /// Index a menu snapshot with this parser's normalizer
    pub fn index_menu(&self, items: Vec<MenuItem>) -> MenuIndex {
        MenuIndex::build(items, &self.normalizer)
    }

    /// Parse a request carrying its own menu snapshot
    pub fn parse(&self, request: &ParseRequest) -> ParseResult {
        let index = self.index_menu(request.menu_snapshot.clone());
        self.parse_with_index(&request.utterance, &index)
    }

    /// Parse an utterance against a pre-built menu index
    pub fn parse_with_index(&self, utterance: &str, index: &MenuIndex) -> ParseResult {
        let text = self.normalizer.normalize(utterance);
        debug!(utterance = %utterance, normalized = %text, "Normalized utterance");

        if text.words().next().is_none() {
            debug!("Blank utterance");
            return ParseResult::empty(IntentLabel::Unknown);
        }

        let classification = self.classifier.score(&text, index);
        let mut result = ParseResult::empty(classification.intent);

        if classification.intent.is_ordering() {
            self.resolve_items(&text, index, &mut result);
        }

        result.confidence = confidence(&result, &classification, &text);

        info!(
            intent = %result.intent,
            resolved = result.resolved_items.len(),
            unresolved = result.unresolved.len(),
            order_total = result.order_total,
            confidence = result.confidence,
            "Parsed utterance"
        );
        result
    }

    fn resolve_items(&self, text: &NormalizedText, index: &MenuIndex, result: &mut ParseResult) {
        let mut context = ResolutionContext::default();

        let candidates = self.extractor.rejoin_names(
            text,
            self.extractor.extract(text),
            self.resolver.acceptance_threshold(),
            |phrase| self.resolver.best_score(phrase, index),
        );

        for candidate in candidates {
            let resolution = self.resolver.resolve(&candidate, index, &context);
            if let Some(category) = resolution.matched_category() {
                context.record(category);
            }

            match resolution {
                Resolution::Resolved(line) => self.push_line(&mut result.resolved_items, line),
                Resolution::Unresolved { phrase, .. } => {
                    warn!(
                        phrase = %phrase.raw_phrase,
                        reason = %phrase.reason,
                        "Unresolved phrase"
                    );
                    result.unresolved.push(phrase);
                }
            }
        }

        result.order_total = result
            .resolved_items
            .iter()
            .fold(0u64, |sum, line| sum.saturating_add(line.total));
    }

    /// Append a line, merging into an earlier line for the same item when
    /// configured
    fn push_line(&self, lines: &mut Vec<ResolvedLineItem>, line: ResolvedLineItem) {
        if self.rules.resolver.merge_duplicate_items {
            if let Some(existing) = lines.iter_mut().find(|l| l.item_id == line.item_id) {
                debug!(item_id = %line.item_id, quantity = line.quantity, "Merging duplicate item");
                existing.add_quantity(line.quantity);
                existing.match_score = existing.match_score.max(line.match_score);
                return;
            }
        }
        lines.push(line);
    }
}

/// Heuristic confidence in [0, 1], rounded to two decimals
fn confidence(result: &ParseResult, classification: &Classification, text: &NormalizedText) -> f32 {
    let mut score = BASE_CONFIDENCE;

    match result.intent {
        IntentLabel::Unknown => {}
        IntentLabel::OrderFood => {
            if result.has_items() {
                score += ORDER_WITH_ITEMS_BONUS + ITEMS_PRESENT_BONUS;
                if result.unresolved.is_empty() {
                    score += FULLY_RESOLVED_BONUS;
                }
            } else {
                score -= ORDER_WITHOUT_ITEMS_PENALTY;
            }
            if classification.trigger_count(IntentLabel::OrderFood) > 0 {
                score += ORDER_TRIGGER_BONUS;
            }
            if text.has_digit_quantity() {
                score += DIGIT_QUANTITY_BONUS;
            }
        }
        _ => score += NON_ORDER_INTENT_BONUS,
    }

    ((score.clamp(0.0, 1.0) * 100.0).round() / 100.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_nlp_types::UnresolvedReason;

    fn menu() -> Vec<MenuItem> {
        vec![
            MenuItem::new("p1", "Chicken Pizza", "Pizza", 500),
            MenuItem::new("c1", "Coke", "Beverage", 100),
        ]
    }

    fn parse(utterance: &str) -> ParseResult {
        OrderParser::default().parse(&ParseRequest::new(utterance, menu()))
    }

    #[test]
    fn test_full_order() {
        let result = parse("I want 2 chicken pizzas and 1 coke");
        assert_eq!(result.intent, IntentLabel::OrderFood);
        assert_eq!(result.resolved_items.len(), 2);
        assert_eq!(result.resolved_items[0].item_id, "p1");
        assert_eq!(result.resolved_items[0].total, 1000);
        assert_eq!(result.resolved_items[1].item_id, "c1");
        assert_eq!(result.order_total, 1100);
        assert!(result.unresolved.is_empty());
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_non_order_has_no_items() {
        let result = parse("show me the menu with 2 pizzas");
        assert_eq!(result.intent, IntentLabel::ViewMenu);
        assert!(result.resolved_items.is_empty());
        assert!(result.unresolved.is_empty());
        assert_eq!(result.confidence, 0.8);
    }

    #[test]
    fn test_blank_is_unknown() {
        let result = parse("   ");
        assert_eq!(result, ParseResult::empty(IntentLabel::Unknown));
    }

    #[test]
    fn test_unknown_confidence() {
        let result = parse("the weather is nice");
        assert_eq!(result.intent, IntentLabel::Unknown);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn test_partial_order() {
        let result = parse("give me a coke and a samosa");
        assert_eq!(result.intent, IntentLabel::OrderFood);
        assert_eq!(result.resolved_items.len(), 1);
        assert_eq!(result.unresolved.len(), 1);
        assert_eq!(result.unresolved[0].reason, UnresolvedReason::NoMatch);
        assert!(result.is_partial());
        // 0.5 + 0.3 + 0.2 + trigger 0.1
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_order_without_items_confidence() {
        let result = parse("give me a samosa");
        // 0.5 - 0.2 + trigger 0.1
        assert_eq!(result.confidence, 0.4);
    }

    #[test]
    fn test_duplicates_merge_at_first_position() {
        let result = parse("a coke, 2 chicken pizzas and 2 cokes");
        assert_eq!(result.resolved_items.len(), 2);
        assert_eq!(result.resolved_items[0].item_id, "c1");
        assert_eq!(result.resolved_items[0].quantity, 3);
        assert_eq!(result.resolved_items[0].total, 300);
        assert_eq!(result.order_total, 1300);
    }

    #[test]
    fn test_duplicates_kept_when_merge_disabled() {
        let mut rules = ParserRules::builtin();
        rules.resolver.merge_duplicate_items = false;
        let parser = OrderParser::new(rules).unwrap();
        let result = parser.parse(&ParseRequest::new("a coke and 2 cokes", menu()));
        assert_eq!(result.resolved_items.len(), 2);
        assert_eq!(result.order_total, 300);
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let mut rules = ParserRules::builtin();
        rules.resolver.acceptance_threshold = -0.1;
        assert!(OrderParser::new(rules).is_err());
    }

    #[test]
    fn test_empty_menu_yields_no_match() {
        let parser = OrderParser::default();
        let result = parser.parse(&ParseRequest::new("2 pizzas", Vec::new()));
        assert_eq!(result.intent, IntentLabel::OrderFood);
        assert_eq!(result.unresolved.len(), 1);
        assert_eq!(result.unresolved[0].reason, UnresolvedReason::NoMatch);
    }

    fn lines(result: &ParseResult) -> Vec<(&str, u32, u64)> {
        result
            .resolved_items
            .iter()
            .map(|l| (l.item_id.as_str(), l.quantity, l.total))
            .collect()
    }

    #[test]
    fn test_connector_inside_menu_name() {
        let menu = vec![
            MenuItem::new("f1", "Fish and Chips", "Mains", 800),
            MenuItem::new("c1", "Coke", "Beverage", 100),
        ];
        let parser = OrderParser::default();
        let result = parser.parse(&ParseRequest::new("1 fish and chips", menu.clone()));
        assert_eq!(lines(&result), vec![("f1", 1, 800)]);
        assert!(result.unresolved.is_empty());

        let result = parser.parse(&ParseRequest::new("2 fish and chips and a coke", menu));
        assert_eq!(lines(&result), vec![("f1", 2, 1600), ("c1", 1, 100)]);
    }

    #[test]
    fn test_number_word_inside_menu_name() {
        let menu = vec![
            MenuItem::new("d1", "Double Cheeseburger", "Burger", 700),
            MenuItem::new("s1", "Cheeseburger", "Burger", 450),
        ];
        let parser = OrderParser::default();
        let result = parser.parse(&ParseRequest::new("a double cheeseburger", menu.clone()));
        assert_eq!(lines(&result), vec![("d1", 1, 700)]);

        // A plain number word stays a quantity
        let result = parser.parse(&ParseRequest::new("two cheeseburgers", menu));
        assert_eq!(lines(&result), vec![("s1", 2, 900)]);
    }

    #[test]
    fn test_label_abbreviation_not_expanded() {
        let menu = vec![MenuItem::new("m1", "Mac N Cheese", "Sides", 350)];
        let result = OrderParser::default().parse(&ParseRequest::new("2 mac n cheese", menu));
        assert_eq!(lines(&result), vec![("m1", 2, 700)]);
        assert!(result.unresolved.is_empty());
    }

    #[test]
    fn test_generic_item_needs_clarification() {
        let menu = vec![
            MenuItem::new("p1", "Chicken Pizza", "Pizza", 500),
            MenuItem::new("p2", "Margherita Pizza", "Pizza", 400),
            MenuItem::new("p3", "Pepperoni Pizza", "Pizza", 550),
        ];
        let result = OrderParser::default().parse(&ParseRequest::new("i want a pizza", menu));
        assert_eq!(result.intent, IntentLabel::OrderFood);
        assert!(result.resolved_items.is_empty());
        assert!(result.needs_clarification());
        assert_eq!(result.unresolved[0].reason, UnresolvedReason::Ambiguous);
        assert_eq!(result.unresolved[0].options.len(), 3);
    }
}
