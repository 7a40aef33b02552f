//! # lexsort-match
//!
//! The streaming category matcher: pages of target items are matched
//! against pages of category items, tracking each target's best cosine
//! match in bounded memory. Comparisons are O(|targets| × |categories|)
//! but residency never exceeds one target page plus one category page
//! of embeddings.

pub mod cursor;
pub mod error;
pub mod matcher;

pub use cursor::PageCursor;
pub use error::MatchError;
pub use matcher::{MatchStats, MatcherConfig, StreamingCategoryMatcher};
