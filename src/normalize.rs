//! Utterance normalization
//!
//! Turns raw customer text into a token sequence every later stage can
//! match against:
//! - Unicode NFKC fold and lowercase
//! - Punctuation stripped (digits kept, `,`/`;` become a separator token)
//! - Whitespace collapsed
//! - Whole-token spelling corrections and abbreviation expansion
//! - Filler words dropped
//!
//! Substitutions only ever replace complete tokens, so "u" → "you" never
//! touches the "u" inside "burger".

use std::collections::{HashMap, HashSet};
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::config::NormalizerRules;

/// Token emitted for `,` and `;`
pub const SEPARATOR: &str = ",";

/// "2x" → ("2", "x")
static QUANTITY_MULTIPLIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)(x)$").expect("static regex compiles"));

/// Token sequence derived from a single utterance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    tokens: Vec<String>,
}

impl NormalizedText {
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens other than separators
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.tokens
            .iter()
            .map(String::as_str)
            .filter(|t| *t != SEPARATOR)
    }

    /// True if any token is a plain run of ASCII digits
    pub fn has_digit_quantity(&self) -> bool {
        self.tokens.iter().any(|t| is_digit_token(t))
    }

    /// Space-joined form, used for pattern matching
    pub fn as_text(&self) -> String {
        self.tokens.join(" ")
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

pub(crate) fn is_digit_token(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Rule-driven normalizer
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    corrections: HashMap<String, Vec<String>>,
    abbreviations: HashMap<String, Vec<String>>,
    filler_words: HashSet<String>,
}

impl Normalizer {
    pub fn new(rules: &NormalizerRules) -> Self {
        Self {
            corrections: expansion_table(&rules.corrections),
            abbreviations: expansion_table(&rules.abbreviations),
            filler_words: rules
                .filler_words
                .iter()
                .map(|w| w.trim().to_lowercase())
                .collect(),
        }
    }

    /// Normalize an utterance. Never fails; junk input yields no tokens.
    pub fn normalize(&self, text: &str) -> NormalizedText {
        let stripped = strip_punctuation(text);

        let mut tokens: Vec<String> = Vec::new();
        for raw in stripped.split_whitespace() {
            for piece in split_multiplier(raw) {
                for token in self.expand(piece) {
                    if self.filler_words.contains(token) {
                        continue;
                    }
                    // Collapse runs of separators
                    if token == SEPARATOR && tokens.last().is_some_and(|t| t == SEPARATOR) {
                        continue;
                    }
                    tokens.push(token.to_string());
                }
            }
        }

        NormalizedText { tokens }
    }

    /// Tokens of a menu label as written. Correction, abbreviation and
    /// filler tables are not applied: they describe how customers type,
    /// not how menus are named.
    pub fn label_tokens(&self, label: &str) -> Vec<String> {
        strip_punctuation(label)
            .split_whitespace()
            .filter(|t| *t != SEPARATOR)
            .map(str::to_string)
            .collect()
    }

    /// Matchable spellings of a label: as written, then the table-normalized
    /// form when it differs ("BBQ Wings" also matches "barbecue wings")
    pub fn label_forms(&self, label: &str) -> Vec<Vec<String>> {
        let written = self.label_tokens(label);
        let normalized: Vec<String> = self
            .normalize(label)
            .tokens
            .into_iter()
            .filter(|t| t != SEPARATOR)
            .collect();

        let mut forms = vec![written];
        if !normalized.is_empty() && !forms.contains(&normalized) {
            forms.push(normalized);
        }
        forms
    }

    /// Apply correction then abbreviation tables to a single token
    fn expand<'a>(&'a self, token: &'a str) -> Vec<&'a str> {
        let corrected: Vec<&str> = match self.corrections.get(token) {
            Some(replacement) => replacement.iter().map(String::as_str).collect(),
            None => vec![token],
        };

        corrected
            .into_iter()
            .flat_map(|t| match self.abbreviations.get(t) {
                Some(expansion) => expansion.iter().map(String::as_str).collect(),
                None => vec![t],
            })
            .collect()
    }
}

/// Lowercase, fold, and reduce punctuation to spaces or separators
fn strip_punctuation(text: &str) -> String {
    let folded: String = text.nfkc().collect::<String>().to_lowercase();

    let mut out = String::with_capacity(folded.len());
    for c in folded.chars() {
        match c {
            c if c.is_alphanumeric() => out.push(c),
            '\'' | '\u{2019}' | '`' => {}
            ',' | ';' => {
                out.push(' ');
                out.push_str(SEPARATOR);
                out.push(' ');
            }
            '&' => out.push_str(" and "),
            _ => out.push(' '),
        }
    }
    out
}

fn split_multiplier(token: &str) -> Vec<&str> {
    match QUANTITY_MULTIPLIER.captures(token) {
        Some(caps) => match (caps.get(1), caps.get(2)) {
            (Some(count), Some(x)) => vec![count.as_str(), x.as_str()],
            _ => vec![token],
        },
        None => vec![token],
    }
}

fn expansion_table(source: &HashMap<String, String>) -> HashMap<String, Vec<String>> {
    source
        .iter()
        .map(|(from, to)| {
            (
                from.trim().to_lowercase(),
                to.split_whitespace().map(str::to_lowercase).collect(),
            )
        })
        .collect()
}
