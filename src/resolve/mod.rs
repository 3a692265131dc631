//! Menu resolution
//!
//! - `index` - immutable, pre-folded view of one menu snapshot
//! - `similarity` - phrase/label scoring
//! - `resolver` - candidate → line item (or unresolved phrase)

pub mod index;
pub mod resolver;
pub mod similarity;

pub use index::{IndexStats, IndexedItem, MenuIndex};
pub use resolver::{FuzzyResolver, Resolution, ResolutionContext, ScoredItem};
pub use similarity::{score_tokens, singularize};
