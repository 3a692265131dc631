//! Intent classification

pub mod classifier;

pub use classifier::{Classification, IntentClassifier};
