//! Phrase-to-label similarity scoring
//!
//! Two views of the same comparison, the better one wins:
//! 1. Character view: normalized Levenshtein over the whole phrase
//! 2. Token view: fuzzy token overlap, averaged over phrase coverage and
//!    label coverage so "pizza" vs "Chicken Pizza" scores 0.75
//!
//! Plurals are folded first ("pizzas" == "pizza"). Scores are quantised to
//! 1e-4 so a configured threshold such as 0.6 compares exactly.

use std::borrow::Cow;
use std::collections::HashMap;

/// Score resolution; thresholds compare against quantised values
const SCORE_RESOLUTION: f64 = 10_000.0;

/// Fold simple English plurals ("pizzas" → "pizza", "fries" → "fry")
pub fn singularize(token: &str) -> Cow<'_, str> {
    if token.chars().count() <= 3 || !token.chars().all(char::is_alphabetic) {
        return Cow::Borrowed(token);
    }

    if let Some(stem) = token.strip_suffix("ies") {
        return Cow::Owned(format!("{}y", stem));
    }
    if let Some(stem) = token.strip_suffix("sses") {
        return Cow::Owned(format!("{}ss", stem));
    }
    for suffix in ["xes", "ches", "shes"] {
        if let Some(stem) = token.strip_suffix(suffix) {
            return Cow::Owned(format!("{}{}", stem, &suffix[..suffix.len() - 2]));
        }
    }
    if token.ends_with('s') && !token.ends_with("ss") && !token.ends_with("us") {
        return Cow::Borrowed(&token[..token.len() - 1]);
    }

    Cow::Borrowed(token)
}

/// Singularize a token sequence
pub fn fold_tokens(tokens: &[String]) -> Vec<String> {
    tokens.iter().map(|t| singularize(t).into_owned()).collect()
}

/// Split a space-separated phrase and fold every token
pub fn fold_phrase(phrase: &str) -> Vec<String> {
    phrase
        .split_whitespace()
        .map(|t| singularize(&t.to_lowercase()).into_owned())
        .collect()
}

/// Fold an alias table: folded key phrase → folded replacement tokens
pub fn alias_table(aliases: &HashMap<String, String>) -> HashMap<String, Vec<String>> {
    aliases
        .iter()
        .map(|(from, to)| (fold_phrase(from).join(" "), fold_phrase(to)))
        .filter(|(from, to)| !from.is_empty() && !to.is_empty())
        .collect()
}

/// Similarity of two single tokens (already folded)
pub fn token_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    strsim::normalized_levenshtein(a, b)
}

/// Round a raw score onto the fixed score grid and clamp to [0, 1]
pub fn quantize(score: f64) -> f64 {
    ((score * SCORE_RESOLUTION).round() / SCORE_RESOLUTION).clamp(0.0, 1.0)
}

/// Score a folded phrase against a folded label.
///
/// `token_floor` is the minimum per-token similarity for a token to count
/// towards overlap at all.
pub fn score_tokens(phrase: &[String], label: &[String], token_floor: f64) -> f64 {
    if phrase.is_empty() || label.is_empty() {
        return 0.0;
    }
    if phrase == label {
        return 1.0;
    }

    let char_score = strsim::normalized_levenshtein(&phrase.join(" "), &label.join(" "));

    let phrase_coverage = coverage(phrase, label, token_floor);
    let label_coverage = coverage(label, phrase, token_floor);
    let overlap = (phrase_coverage + label_coverage) / 2.0;

    quantize(char_score.max(overlap))
}

/// Mean best-match similarity of `from` tokens found in `to`
fn coverage(from: &[String], to: &[String], token_floor: f64) -> f64 {
    let total: f64 = from
        .iter()
        .map(|f| {
            let best = to
                .iter()
                .map(|t| token_similarity(f, t))
                .fold(0.0_f64, f64::max);
            if best >= token_floor {
                best
            } else {
                0.0
            }
        })
        .sum();
    total / from.len() as f64
}

/// Whole-token containment in either direction
pub fn contains_tokens(phrase: &[String], label: &[String]) -> bool {
    if phrase.is_empty() || label.is_empty() {
        return false;
    }
    let phrase_text = format!(" {} ", phrase.join(" "));
    let label_text = format!(" {} ", label.join(" "));
    label_text.contains(&phrase_text) || phrase_text.contains(&label_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        fold_tokens(
            &s.split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("pizzas"), "pizza");
        assert_eq!(singularize("fries"), "fry");
        assert_eq!(singularize("glasses"), "glass");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("sandwiches"), "sandwich");
        assert_eq!(singularize("sauces"), "sauce");
        assert_eq!(singularize("hummus"), "hummus");
        assert_eq!(singularize("tea"), "tea");
        assert_eq!(singularize("7up"), "7up");
    }

    #[test]
    fn test_exact_and_plural_match() {
        assert_eq!(score_tokens(&toks("chicken pizzas"), &toks("chicken pizza"), 0.75), 1.0);
        assert_eq!(score_tokens(&toks("coke"), &toks("coke"), 0.75), 1.0);
    }

    #[test]
    fn test_generic_term_scores_partial() {
        assert_eq!(score_tokens(&toks("pizza"), &toks("chicken pizza"), 0.75), 0.75);
    }

    #[test]
    fn test_misspelling_still_scores_high() {
        let score = score_tokens(&toks("peperoni pizza"), &toks("pepperoni pizza"), 0.75);
        assert!(score > 0.9, "score was {}", score);
    }

    #[test]
    fn test_unrelated_scores_low() {
        assert!(score_tokens(&toks("samosa"), &toks("coke"), 0.75) < 0.6);
        assert!(score_tokens(&toks("samosa"), &toks("chicken pizza"), 0.75) < 0.6);
        assert!(score_tokens(&toks("chicken pizza"), &toks("chicken burger"), 0.75) < 0.6);
    }

    #[test]
    fn test_score_lands_exactly_on_grid() {
        // phrase coverage 1.0, label coverage 0.2 → 0.6 exactly
        let score = score_tokens(
            &toks("pizza"),
            &toks("pizza alpha bravo charlie delta"),
            0.75,
        );
        assert_eq!(score, 0.6);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(score_tokens(&[], &toks("coke"), 0.75), 0.0);
        assert_eq!(score_tokens(&toks("coke"), &[], 0.75), 0.0);
    }

    #[test]
    fn test_containment() {
        assert!(contains_tokens(&toks("pizza"), &toks("chicken pizza")));
        assert!(contains_tokens(&toks("large chicken pizza"), &toks("chicken pizza")));
        assert!(!contains_tokens(&toks("pizz"), &toks("chicken pizza")));
    }

    #[test]
    fn test_alias_table_folds_both_sides() {
        let mut aliases = HashMap::new();
        aliases.insert("Fries".to_string(), "French Fries".to_string());
        aliases.insert("  ".to_string(), "nothing".to_string());
        let table = alias_table(&aliases);
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get("fry"),
            Some(&vec!["french".to_string(), "fry".to_string()])
        );
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(0.59999999), 0.6);
        assert_eq!(quantize(1.2), 1.0);
        assert_eq!(quantize(-0.1), 0.0);
    }
}
