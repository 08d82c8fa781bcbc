//! Value objects representing immutable domain concepts.

pub mod commit;

// Re-export commonly used types
pub use commit::{CommitOutcome, UpsertCondition};
