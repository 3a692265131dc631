//! Quantity-item extraction
//!
//! Splits a normalized utterance into `(quantity, phrase)` candidates with
//! a single left-to-right scan:
//!
//! ```text
//! i want 2 chicken pizzas and a coke
//!        │ └────┬───────┘ │   │ └┬─┘
//!        qty  phrase   connector qty phrase
//!   → [(2, "chicken pizzas"), (1, "coke")]
//! ```
//!
//! A quantity binds only to the phrase that follows it. Content with no
//! quantity in front opens a candidate with quantity 1.
//!
//! Menu names can contain connectors and number words themselves ("Fish
//! and Chips", "Double Cheeseburger"). [`QuantityItemExtractor::rejoin_names`]
//! stitches such pieces back together when a scorer says the joined phrase
//! names an item better than its parts.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ExtractorRules;
use crate::normalize::{is_digit_token, NormalizedText, SEPARATOR};

/// A quantity and the phrase it applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub quantity: u32,
    /// Phrase tokens joined by single spaces
    pub raw_phrase: String,
    /// Token range in the normalized text (end exclusive)
    pub span: (usize, usize),
    /// Token range of the phrase alone
    pub phrase_span: (usize, usize),
}

/// Candidate under construction
#[derive(Debug)]
struct OpenCandidate {
    quantity: u32,
    start: usize,
    phrase_start: Option<usize>,
    end: usize,
    words: Vec<String>,
}

impl OpenCandidate {
    fn new(quantity: u32, start: usize) -> Self {
        Self {
            quantity,
            start,
            phrase_start: None,
            end: start,
            words: Vec::new(),
        }
    }

    fn push(&mut self, position: usize, word: &str) {
        self.phrase_start.get_or_insert(position);
        self.words.push(word.to_string());
        self.end = position + 1;
    }

    fn finish(self) -> Option<Candidate> {
        if self.words.is_empty() || self.quantity == 0 {
            return None;
        }
        Some(Candidate {
            quantity: self.quantity,
            raw_phrase: self.words.join(" "),
            span: (self.start, self.end),
            phrase_span: (self.phrase_start.unwrap_or(self.start), self.end),
        })
    }
}

/// Rule-driven extractor
#[derive(Debug, Clone)]
pub struct QuantityItemExtractor {
    number_words: HashMap<String, u32>,
    connectors: HashSet<String>,
    multiplier_tokens: HashSet<String>,
    stop_words: HashSet<String>,
    max_quantity: u32,
}

impl Default for QuantityItemExtractor {
    fn default() -> Self {
        Self::new(&ExtractorRules::default())
    }
}

impl QuantityItemExtractor {
    pub fn new(rules: &ExtractorRules) -> Self {
        let lower = |words: &[String]| -> HashSet<String> {
            words.iter().map(|w| w.trim().to_lowercase()).collect()
        };

        let mut connectors = lower(&rules.connectors);
        connectors.insert(SEPARATOR.to_string());

        Self {
            number_words: rules
                .number_words
                .iter()
                .map(|(w, n)| (w.trim().to_lowercase(), *n))
                .collect(),
            connectors,
            multiplier_tokens: lower(&rules.multiplier_tokens),
            stop_words: lower(&rules.stop_words),
            max_quantity: rules.max_quantity.max(1),
        }
    }

    /// Read a quantity marker, clamped to `max_quantity`. Zero stays zero
    /// so the candidate it opens can be discarded.
    pub fn quantity_of(&self, token: &str) -> Option<u32> {
        if is_digit_token(token) {
            let value = token
                .parse::<u64>()
                .map(|n| n.min(u64::from(self.max_quantity)))
                .unwrap_or(u64::from(self.max_quantity));
            return Some(u32::try_from(value).unwrap_or(self.max_quantity));
        }
        self.number_words
            .get(token)
            .map(|n| (*n).min(self.max_quantity))
    }

    pub fn is_connector(&self, token: &str) -> bool {
        self.connectors.contains(token)
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Extract candidates in utterance order. Never fails.
    pub fn extract(&self, text: &NormalizedText) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        let mut open: Option<OpenCandidate> = None;
        let mut after_quantity = false;

        for (position, token) in text.tokens().iter().enumerate() {
            let token = token.as_str();

            if self.is_connector(token) {
                candidates.extend(open.take().and_then(OpenCandidate::finish));
                after_quantity = false;
                continue;
            }

            if let Some(quantity) = self.quantity_of(token) {
                candidates.extend(open.take().and_then(OpenCandidate::finish));
                open = Some(OpenCandidate::new(quantity, position));
                after_quantity = true;
                continue;
            }

            if after_quantity && self.multiplier_tokens.contains(token) {
                after_quantity = false;
                continue;
            }
            after_quantity = false;

            if self.is_stop_word(token) {
                continue;
            }

            open.get_or_insert_with(|| OpenCandidate::new(1, position))
                .push(position, token);
        }
        candidates.extend(open.take().and_then(OpenCandidate::finish));

        debug!(
            tokens = text.len(),
            candidates = candidates.len(),
            "Extracted candidates"
        );
        candidates
    }

    /// Undo splits that cut through a menu name.
    ///
    /// `score` rates a phrase against the menu. A number word in front of
    /// a phrase is folded back in ("double cheeseburger"), and neighbouring
    /// candidates separated only by connectors or number words are joined
    /// ("fish and chips"), whenever the joined phrase reaches `min_score`
    /// and scores at least as well as every piece it replaces.
    pub fn rejoin_names<F>(
        &self,
        text: &NormalizedText,
        candidates: Vec<Candidate>,
        min_score: f64,
        score: F,
    ) -> Vec<Candidate>
    where
        F: Fn(&str) -> f64,
    {
        let tokens = text.tokens();
        let mut joined: Vec<Candidate> = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let candidate = self
                .absorb_marker_word(tokens, &candidate, min_score, &score)
                .unwrap_or(candidate);

            let merged = joined
                .last()
                .and_then(|left| self.join_pair(tokens, left, &candidate, min_score, &score));
            match merged {
                Some(merged) => {
                    debug!(phrase = %merged.raw_phrase, "Rejoined split menu name");
                    if let Some(last) = joined.last_mut() {
                        *last = merged;
                    }
                }
                None => joined.push(candidate),
            }
        }

        joined.retain(|c| c.quantity > 0);
        joined
    }

    /// Fold a number-word quantity marker back into its phrase
    fn absorb_marker_word<F>(
        &self,
        tokens: &[String],
        candidate: &Candidate,
        min_score: f64,
        score: &F,
    ) -> Option<Candidate>
    where
        F: Fn(&str) -> f64,
    {
        let (start, _) = candidate.span;
        let (phrase_start, end) = candidate.phrase_span;
        if start >= phrase_start {
            return None;
        }
        let marker = tokens.get(start)?;
        if is_digit_token(marker) || !self.number_words.contains_key(marker.as_str()) {
            return None;
        }

        let raw_phrase = format!("{} {}", marker, candidate.raw_phrase);
        let joined_score = score(&raw_phrase);
        if joined_score < min_score || joined_score < score(&candidate.raw_phrase) {
            return None;
        }

        // "a double cheeseburger": the marker before the absorbed word
        // becomes the quantity
        let outer = start
            .checked_sub(1)
            .and_then(|p| tokens.get(p).map(|t| (p, t)))
            .and_then(|(p, t)| self.quantity_of(t).map(|q| (p, q)));
        let (span_start, quantity) = outer.unwrap_or((start, 1));

        Some(Candidate {
            quantity,
            raw_phrase,
            span: (span_start, end),
            phrase_span: (start, end),
        })
    }

    /// Join two neighbouring candidates into one phrase
    fn join_pair<F>(
        &self,
        tokens: &[String],
        left: &Candidate,
        right: &Candidate,
        min_score: f64,
        score: &F,
    ) -> Option<Candidate>
    where
        F: Fn(&str) -> f64,
    {
        let gap = tokens.get(left.phrase_span.1..right.phrase_span.0)?;
        let bridges = !gap.is_empty()
            && gap.iter().all(|t| {
                t.chars().all(char::is_alphabetic)
                    && (self.is_connector(t) || self.number_words.contains_key(t.as_str()))
            });
        if !bridges {
            return None;
        }

        let raw_phrase = format!("{} {} {}", left.raw_phrase, gap.join(" "), right.raw_phrase);
        let joined_score = score(&raw_phrase);
        let best_piece = score(&left.raw_phrase).max(score(&right.raw_phrase));
        if joined_score < min_score || joined_score < best_piece {
            return None;
        }

        Some(Candidate {
            quantity: left.quantity,
            raw_phrase,
            span: (left.span.0, right.span.1),
            phrase_span: (left.phrase_span.0, right.phrase_span.1),
        })
    }
}
