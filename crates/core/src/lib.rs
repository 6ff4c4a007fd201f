//! Crosscheck Core
//!
//! Dependency-light foundation for the Crosscheck workspace: the retrieval
//! context data model (retrieved items, ranked and budgeted context) and the
//! pure merge/budget algorithms that operate on it. Heavier concerns (HTTP,
//! providers, persistence) live in the application crate and
//! `crosscheck-llm`.

pub mod context;

// Re-export main types
pub use context::{approx_token_cost, BudgetedContext, RankedContext, RetrievedItem, SourceKind};
