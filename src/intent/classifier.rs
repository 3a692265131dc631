//! Intent Classifier
//!
//! Scores a normalized utterance against per-label trigger phrases. Each
//! trigger is compiled once into a regex that only matches a contiguous run
//! of whole tokens, so "hi" never fires inside "chicken".
//!
//! Two phases:
//! 1. Count distinct triggers matched per label; highest count wins, ties go
//!    to the earlier label in the priority list
//! 2. Orderable content (a digit quantity, or a word the menu recognises
//!    directly or through an alias) turns a `greeting`/`unknown` verdict
//!    into `order_food`

use std::collections::{BTreeMap, HashMap, HashSet};

use order_nlp_types::IntentLabel;
use regex::Regex;
use tracing::{debug, warn};

use crate::config::ParserRules;
use crate::normalize::{NormalizedText, Normalizer};
use crate::resolve::similarity::alias_table;
use crate::resolve::{singularize, MenuIndex};

/// Outcome of scoring one utterance
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub intent: IntentLabel,
    /// Distinct triggers matched per label
    pub trigger_counts: BTreeMap<IntentLabel, usize>,
    /// Digit quantity or menu vocabulary present
    pub orderable_content: bool,
}

impl Classification {
    pub fn trigger_count(&self, label: IntentLabel) -> usize {
        self.trigger_counts.get(&label).copied().unwrap_or(0)
    }
}

/// A compiled trigger phrase
#[derive(Debug, Clone)]
struct CompiledTrigger {
    intent: IntentLabel,
    phrase: String,
    regex: Regex,
}

/// Keyword classifier over normalized text
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    triggers: Vec<CompiledTrigger>,
    priority: Vec<IntentLabel>,
    /// Words that never count as orderable content on their own
    ignored: HashSet<String>,
    /// Resolver aliases, so "chai" counts when the menu has "Hot Tea"
    aliases: HashMap<String, Vec<String>>,
    menu_token_threshold: f64,
}

impl IntentClassifier {
    /// Compile the trigger tables of a rule set
    pub fn new(rules: &ParserRules, normalizer: &Normalizer) -> Self {
        let mut triggers = Vec::new();
        for (intent, phrases) in &rules.intents.triggers {
            let mut seen = HashSet::new();
            for phrase in phrases {
                let normalized_phrase = normalizer.normalize(phrase);
                let tokens: Vec<&str> = normalized_phrase.words().collect();
                if tokens.is_empty() {
                    warn!(intent = %intent, phrase = %phrase, "Trigger normalizes to nothing, skipping");
                    continue;
                }
                let normalized = tokens.join(" ");
                if !seen.insert(normalized.clone()) {
                    continue;
                }
                if let Some(compiled) = Self::compile_trigger(*intent, normalized) {
                    triggers.push(compiled);
                }
            }
        }

        let extractor = &rules.extractor;
        let ignored = extractor
            .stop_words
            .iter()
            .chain(extractor.connectors.iter())
            .chain(extractor.multiplier_tokens.iter())
            .chain(extractor.number_words.keys())
            .map(|w| w.trim().to_lowercase())
            .collect();

        debug!(triggers = triggers.len(), "Compiled intent triggers");

        Self {
            triggers,
            priority: rules.intents.priority.clone(),
            ignored,
            aliases: alias_table(&rules.resolver.aliases),
            menu_token_threshold: rules.resolver.menu_token_threshold,
        }
    }

    /// Compile a normalized trigger into a whole-token regex
    fn compile_trigger(intent: IntentLabel, phrase: String) -> Option<CompiledTrigger> {
        let pattern = format!(r"(?:^| ){}(?: |$)", regex::escape(&phrase));
        match Regex::new(&pattern) {
            Ok(regex) => Some(CompiledTrigger {
                intent,
                phrase,
                regex,
            }),
            Err(e) => {
                warn!(intent = %intent, phrase = %phrase, error = %e, "Failed to compile trigger");
                None
            }
        }
    }

    /// Pick the intent label for an utterance
    pub fn classify(&self, text: &NormalizedText, menu: &MenuIndex) -> IntentLabel {
        self.score(text, menu).intent
    }

    /// Full scoring detail for an utterance
    pub fn score(&self, text: &NormalizedText, menu: &MenuIndex) -> Classification {
        if text.words().next().is_none() {
            return Classification {
                intent: IntentLabel::Unknown,
                trigger_counts: BTreeMap::new(),
                orderable_content: false,
            };
        }

        let haystack = text.as_text();
        let mut trigger_counts: BTreeMap<IntentLabel, usize> = BTreeMap::new();
        for trigger in &self.triggers {
            if trigger.regex.is_match(&haystack) {
                debug!(intent = %trigger.intent, trigger = %trigger.phrase, "Trigger matched");
                *trigger_counts.entry(trigger.intent).or_default() += 1;
            }
        }

        let mut intent = IntentLabel::Unknown;
        let mut best = 0;
        for label in &self.priority {
            let count = trigger_counts.get(label).copied().unwrap_or(0);
            if count > best {
                best = count;
                intent = *label;
            }
        }

        let orderable_content = self.has_orderable_content(text, menu);
        if orderable_content && matches!(intent, IntentLabel::Greeting | IntentLabel::Unknown) {
            debug!(from = %intent, "Orderable content overrides intent");
            intent = IntentLabel::OrderFood;
        }

        Classification {
            intent,
            trigger_counts,
            orderable_content,
        }
    }

    fn has_orderable_content(&self, text: &NormalizedText, menu: &MenuIndex) -> bool {
        if text.has_digit_quantity() {
            return true;
        }
        let recognized = |token: &str| menu.recognizes_token(token, self.menu_token_threshold);
        text.words()
            .filter(|w| !self.ignored.contains(*w))
            .map(singularize)
            .any(|w| {
                recognized(&*w)
                    || self
                        .aliases
                        .get(&*w)
                        .is_some_and(|target| target.iter().any(|t| recognized(t.as_str())))
            })
    }
}
