//! Parser rule set types
//!
//! Defines the serde schema for `config/parser_rules.yaml`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use order_nlp_types::IntentLabel;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Root rule set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserRules {
    pub version: String,
    #[serde(default)]
    pub normalizer: NormalizerRules,
    #[serde(default)]
    pub intents: IntentRules,
    #[serde(default)]
    pub extractor: ExtractorRules,
    #[serde(default)]
    pub resolver: ResolverRules,
}

/// Token rewriting applied before any matching
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizerRules {
    /// Whole-token expansions ("pls" → "please", "gimme" → "give me")
    #[serde(default)]
    pub abbreviations: HashMap<String, String>,

    /// Whole-token spelling fixes ("piza" → "pizza")
    #[serde(default)]
    pub corrections: HashMap<String, String>,

    /// Tokens dropped after expansion
    #[serde(default)]
    pub filler_words: Vec<String>,
}

/// Trigger phrases per intent label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentRules {
    #[serde(default)]
    pub triggers: BTreeMap<IntentLabel, Vec<String>>,

    /// Highest priority first; wins ties on trigger count
    #[serde(default = "default_priority")]
    pub priority: Vec<IntentLabel>,
}

impl Default for IntentRules {
    fn default() -> Self {
        Self {
            triggers: BTreeMap::new(),
            priority: default_priority(),
        }
    }
}

fn default_priority() -> Vec<IntentLabel> {
    vec![
        IntentLabel::CancelOrder,
        IntentLabel::ViewMenu,
        IntentLabel::OrderFood,
        IntentLabel::Greeting,
        IntentLabel::Unknown,
    ]
}

/// Quantity and phrase boundary vocabulary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorRules {
    /// Spelled-out and implicit quantities ("two" → 2, "a" → 1)
    #[serde(default)]
    pub number_words: HashMap<String, u32>,

    /// Tokens that close the current phrase
    #[serde(default = "default_connectors")]
    pub connectors: Vec<String>,

    /// Tokens skipped directly after a quantity ("2 x coke")
    #[serde(default)]
    pub multiplier_tokens: Vec<String>,

    /// Lead-in words that never belong to an item phrase
    #[serde(default)]
    pub stop_words: Vec<String>,

    /// Upper bound for a single quantity
    #[serde(default = "default_max_quantity")]
    pub max_quantity: u32,
}

impl Default for ExtractorRules {
    fn default() -> Self {
        Self {
            number_words: HashMap::new(),
            connectors: default_connectors(),
            multiplier_tokens: Vec::new(),
            stop_words: Vec::new(),
            max_quantity: default_max_quantity(),
        }
    }
}

fn default_connectors() -> Vec<String> {
    vec!["and".to_string(), ",".to_string()]
}

fn default_max_quantity() -> u32 {
    100
}

/// Ordering applied when two menu items score the same
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakRule {
    /// Prefer the item whose label contains the phrase (or vice versa)
    SubstringContainment,
    /// Prefer the category matched most recently in the same utterance
    CategoryRecency,
    /// Lexicographically smallest id
    Identifier,
}

/// Fuzzy resolution parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverRules {
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: f64,

    #[serde(default = "default_token_match_floor")]
    pub token_match_floor: f64,

    #[serde(default = "default_menu_token_threshold")]
    pub menu_token_threshold: f64,

    #[serde(default = "default_tie_break")]
    pub tie_break: Vec<TieBreakRule>,

    #[serde(default = "default_merge")]
    pub merge_duplicate_items: bool,

    /// Report `ambiguous` when only the id would separate the top matches
    #[serde(default = "default_clarify_ambiguous")]
    pub clarify_ambiguous: bool,

    /// Whole-phrase stand-ins tried alongside the phrase itself
    /// ("chai" → "hot tea")
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

impl Default for ResolverRules {
    fn default() -> Self {
        Self {
            acceptance_threshold: default_acceptance_threshold(),
            token_match_floor: default_token_match_floor(),
            menu_token_threshold: default_menu_token_threshold(),
            tie_break: default_tie_break(),
            merge_duplicate_items: default_merge(),
            clarify_ambiguous: default_clarify_ambiguous(),
            aliases: HashMap::new(),
        }
    }
}

fn default_acceptance_threshold() -> f64 {
    0.6
}

fn default_token_match_floor() -> f64 {
    0.75
}

fn default_menu_token_threshold() -> f64 {
    0.8
}

fn default_tie_break() -> Vec<TieBreakRule> {
    vec![
        TieBreakRule::SubstringContainment,
        TieBreakRule::CategoryRecency,
        TieBreakRule::Identifier,
    ]
}

fn default_merge() -> bool {
    true
}

fn default_clarify_ambiguous() -> bool {
    true
}

impl ParserRules {
    /// Load rules from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Load rules from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let rules: ParserRules = serde_yaml::from_str(yaml)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Check invariants the parser relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit_range("acceptance_threshold", self.resolver.acceptance_threshold)?;
        check_unit_range("token_match_floor", self.resolver.token_match_floor)?;
        check_unit_range("menu_token_threshold", self.resolver.menu_token_threshold)?;

        let mut seen = HashSet::new();
        for label in &self.intents.priority {
            if !seen.insert(*label) {
                return Err(ConfigError::DuplicatePriority(label.to_string()));
            }
        }
        if let Some(missing) = IntentLabel::ALL.iter().find(|l| !seen.contains(*l)) {
            return Err(ConfigError::MissingPriority(missing.to_string()));
        }

        let mut seen_rules = HashSet::new();
        for rule in &self.resolver.tie_break {
            if !seen_rules.insert(*rule) {
                return Err(ConfigError::DuplicateTieBreak(format!("{:?}", rule)));
            }
        }

        if self.extractor.max_quantity == 0 {
            return Err(ConfigError::ZeroMaxQuantity);
        }

        Ok(())
    }
}

fn check_unit_range(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value })
    }
}
