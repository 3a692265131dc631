//! Parser configuration
//!
//! Keyword tables, quantity vocabulary and resolver thresholds are plain
//! data loaded from YAML. A parser binds one immutable rule set at
//! construction; swapping rules means building a new parser.

mod rules;

use once_cell::sync::Lazy;

pub use rules::{
    ExtractorRules, IntentRules, NormalizerRules, ParserRules, ResolverRules, TieBreakRule,
};

/// Rule set shipped with the crate
pub const BUILTIN_RULES_YAML: &str = include_str!("../../config/parser_rules.yaml");

static BUILTIN: Lazy<ParserRules> = Lazy::new(|| {
    ParserRules::from_yaml(BUILTIN_RULES_YAML).expect("embedded parser_rules.yaml is valid")
});

impl ParserRules {
    /// The embedded default rule set
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }
}

impl Default for ParserRules {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_nlp_types::IntentLabel;

    #[test]
    fn test_builtin_rules_parse() {
        let rules = ParserRules::builtin();
        assert_eq!(rules.version, "1.0");
        assert_eq!(rules.resolver.acceptance_threshold, 0.6);
        assert_eq!(
            rules.intents.priority,
            vec![
                IntentLabel::CancelOrder,
                IntentLabel::ViewMenu,
                IntentLabel::OrderFood,
                IntentLabel::Greeting,
                IntentLabel::Unknown,
            ]
        );
        assert_eq!(rules.extractor.number_words.get("two"), Some(&2));
        assert_eq!(rules.extractor.number_words.get("a"), Some(&1));
        assert_eq!(
            rules.normalizer.abbreviations.get("pls").map(String::as_str),
            Some("please")
        );
        assert_eq!(
            rules.resolver.aliases.get("chai").map(String::as_str),
            Some("hot tea")
        );
    }

    #[test]
    fn test_builtin_has_triggers_for_every_scored_label() {
        let rules = ParserRules::builtin();
        for label in [
            IntentLabel::OrderFood,
            IntentLabel::ViewMenu,
            IntentLabel::CancelOrder,
            IntentLabel::Greeting,
        ] {
            assert!(
                rules
                    .intents
                    .triggers
                    .get(&label)
                    .is_some_and(|t| !t.is_empty()),
                "no triggers for {}",
                label
            );
        }
    }
}
