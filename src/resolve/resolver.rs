//! Fuzzy resolver
//!
//! Binds each extracted candidate to a concrete menu item, or reports why
//! it could not. Resolution is a pure function of the candidate, the menu
//! index and the per-utterance context; it never mutates the catalog.
//!
//! Ranking is score first, then the configured tie-break rules. Item
//! availability never takes part in ranking: an unavailable winner is
//! reported as `unavailable` rather than swapped for a runner-up. When
//! only the id separates the top items the phrase is `ambiguous`, and the
//! available ones among them are offered as options.

use std::cmp::Ordering;
use std::collections::HashMap;

use order_nlp_types::{line_total, MenuItem, ResolvedLineItem, UnresolvedPhrase, UnresolvedReason};
use tracing::debug;

use super::index::{IndexedItem, MenuIndex};
use super::similarity::{alias_table, contains_tokens, fold_phrase, score_tokens};
use crate::config::{ResolverRules, TieBreakRule};
use crate::extract::Candidate;

/// State carried across the candidates of one utterance
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    last_category: Option<String>,
}

impl ResolutionContext {
    /// Remember the category of the latest match
    pub fn record(&mut self, category: &str) {
        self.last_category = Some(category.to_string());
    }

    pub fn last_category(&self) -> Option<&str> {
        self.last_category.as_deref()
    }

    fn is_recent(&self, category: &str) -> bool {
        self.last_category
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(category))
    }
}

/// A menu item scored against one phrase
#[derive(Debug, Clone)]
pub struct ScoredItem<'a> {
    pub item: &'a MenuItem,
    pub score: f64,
    /// Some label contains the phrase, or the phrase contains it
    pub contains: bool,
}

/// Outcome of resolving one candidate
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(ResolvedLineItem),
    Unresolved {
        phrase: UnresolvedPhrase,
        /// Category of the rejected match, when there is exactly one
        matched_category: Option<String>,
    },
}

impl Resolution {
    /// Category of whatever the phrase matched, available or not
    pub fn matched_category(&self) -> Option<&str> {
        match self {
            Resolution::Resolved(line) => Some(&line.category),
            Resolution::Unresolved {
                matched_category, ..
            } => matched_category.as_deref(),
        }
    }
}

/// Similarity search over a menu index
#[derive(Debug, Clone)]
pub struct FuzzyResolver {
    acceptance_threshold: f64,
    token_match_floor: f64,
    tie_break: Vec<TieBreakRule>,
    clarify_ambiguous: bool,
    /// Folded alias phrase → folded replacement
    aliases: HashMap<String, Vec<String>>,
}

impl Default for FuzzyResolver {
    fn default() -> Self {
        Self::new(&ResolverRules::default())
    }
}

impl FuzzyResolver {
    pub fn new(rules: &ResolverRules) -> Self {
        Self {
            acceptance_threshold: rules.acceptance_threshold,
            token_match_floor: rules.token_match_floor,
            tie_break: rules.tie_break.clone(),
            clarify_ambiguous: rules.clarify_ambiguous,
            aliases: alias_table(&rules.aliases),
        }
    }

    pub fn acceptance_threshold(&self) -> f64 {
        self.acceptance_threshold
    }

    /// Whether a score clears the acceptance threshold (inclusive)
    pub fn accepts(&self, score: f64) -> bool {
        score >= self.acceptance_threshold
    }

    /// The phrase itself plus its alias replacement, if the whole phrase
    /// is an alias
    fn phrase_variants(&self, phrase: &str) -> Vec<Vec<String>> {
        let folded = fold_phrase(phrase);
        let alias = self.aliases.get(&folded.join(" ")).cloned();
        std::iter::once(folded).chain(alias).collect()
    }

    fn score_item(&self, variants: &[Vec<String>], indexed: &IndexedItem) -> (f64, bool) {
        let mut score = 0.0_f64;
        let mut contains = false;
        for variant in variants {
            for label in &indexed.labels {
                score = score.max(score_tokens(variant, label, self.token_match_floor));
                contains |= contains_tokens(variant, label);
            }
        }
        (score, contains)
    }

    /// Highest score any item reaches for a phrase
    pub fn best_score(&self, phrase: &str, index: &MenuIndex) -> f64 {
        let variants = self.phrase_variants(phrase);
        index
            .items()
            .iter()
            .map(|indexed| self.score_item(&variants, indexed).0)
            .fold(0.0_f64, f64::max)
    }

    /// Score every item against a phrase, best first
    pub fn rank<'a>(
        &self,
        phrase: &str,
        index: &'a MenuIndex,
        context: &ResolutionContext,
    ) -> Vec<ScoredItem<'a>> {
        let variants = self.phrase_variants(phrase);

        let mut scored: Vec<ScoredItem<'a>> = index
            .items()
            .iter()
            .map(|indexed| {
                let (score, contains) = self.score_item(&variants, indexed);
                ScoredItem {
                    item: &indexed.item,
                    score,
                    contains,
                }
            })
            .collect();

        scored.sort_by(|a, b| self.compare(a, b, context));
        scored
    }

    fn apply_rule(
        rule: TieBreakRule,
        a: &ScoredItem<'_>,
        b: &ScoredItem<'_>,
        context: &ResolutionContext,
    ) -> Ordering {
        match rule {
            TieBreakRule::SubstringContainment => b.contains.cmp(&a.contains),
            TieBreakRule::CategoryRecency => context
                .is_recent(&b.item.category)
                .cmp(&context.is_recent(&a.item.category)),
            TieBreakRule::Identifier => a.item.id.cmp(&b.item.id),
        }
    }

    /// Ordering by score and every tie-break rule except the id
    fn compare_meaningful(
        &self,
        a: &ScoredItem<'_>,
        b: &ScoredItem<'_>,
        context: &ResolutionContext,
    ) -> Ordering {
        let score = b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal);
        self.tie_break
            .iter()
            .filter(|rule| **rule != TieBreakRule::Identifier)
            .fold(score, |ordering, rule| {
                ordering.then_with(|| Self::apply_rule(*rule, a, b, context))
            })
    }

    /// Best-first ordering: score, then the configured tie-break rules,
    /// then id.
    fn compare(&self, a: &ScoredItem<'_>, b: &ScoredItem<'_>, context: &ResolutionContext) -> Ordering {
        let score = b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal);
        self.tie_break
            .iter()
            .fold(score, |ordering, rule| {
                ordering.then_with(|| Self::apply_rule(*rule, a, b, context))
            })
            .then_with(|| a.item.id.cmp(&b.item.id))
    }

    /// Resolve one candidate against the index
    pub fn resolve(
        &self,
        candidate: &Candidate,
        index: &MenuIndex,
        context: &ResolutionContext,
    ) -> Resolution {
        let ranked = self.rank(&candidate.raw_phrase, index, context);

        let best = match ranked.first() {
            Some(best) if self.accepts(best.score) => best,
            other => {
                debug!(
                    phrase = %candidate.raw_phrase,
                    best_score = other.map(|b| b.score).unwrap_or(0.0),
                    "No menu item above threshold"
                );
                return Resolution::Unresolved {
                    phrase: UnresolvedPhrase::new(
                        candidate.raw_phrase.clone(),
                        UnresolvedReason::NoMatch,
                        candidate.quantity,
                    ),
                    matched_category: None,
                };
            }
        };

        if self.clarify_ambiguous {
            let tied: Vec<&ScoredItem<'_>> = ranked
                .iter()
                .take_while(|other| self.compare_meaningful(best, other, context) == Ordering::Equal)
                .collect();
            let offered: Vec<String> = tied
                .iter()
                .filter(|t| t.item.available)
                .map(|t| t.item.name.clone())
                .collect();
            if tied.len() > 1 && !offered.is_empty() {
                debug!(
                    phrase = %candidate.raw_phrase,
                    score = best.score,
                    tied = tied.len(),
                    "Phrase matches several items equally"
                );
                let shared_category = tied
                    .iter()
                    .all(|t| t.item.category == best.item.category)
                    .then(|| best.item.category.clone());
                return Resolution::Unresolved {
                    phrase: UnresolvedPhrase::new(
                        candidate.raw_phrase.clone(),
                        UnresolvedReason::Ambiguous,
                        candidate.quantity,
                    )
                    .with_options(offered),
                    matched_category: shared_category,
                };
            }
        }

        if !best.item.available {
            debug!(
                phrase = %candidate.raw_phrase,
                item_id = %best.item.id,
                score = best.score,
                "Best match is unavailable"
            );
            return Resolution::Unresolved {
                phrase: UnresolvedPhrase::new(
                    candidate.raw_phrase.clone(),
                    UnresolvedReason::Unavailable,
                    candidate.quantity,
                ),
                matched_category: Some(best.item.category.clone()),
            };
        }

        debug!(
            phrase = %candidate.raw_phrase,
            item_id = %best.item.id,
            score = best.score,
            quantity = candidate.quantity,
            "Resolved candidate"
        );

        Resolution::Resolved(ResolvedLineItem {
            item_id: best.item.id.clone(),
            name: best.item.name.clone(),
            category: best.item.category.clone(),
            quantity: candidate.quantity,
            unit_price: best.item.unit_price,
            total: line_total(candidate.quantity, best.item.unit_price),
            match_score: best.score as f32,
            raw_phrase: candidate.raw_phrase.clone(),
        })
    }
}
