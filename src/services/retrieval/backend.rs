//! Search Backend Abstraction
//!
//! Defines the async `SearchBackend` trait for similarity-search services.
//! The engine itself (index construction, nearest-neighbor search,
//! persistence) is an external collaborator; this boundary only specifies
//! how Crosscheck queries it and how failures are classified.
//!
//! A missing collection is deliberately distinct from a transport failure:
//! the retriever degrades both to zero results, but an absent collection is
//! an expected configuration state while an unreachable backend is worth a
//! louder log line.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

/// A raw (text, metadata, distance) triple as returned by the search service.
#[derive(Debug, Clone)]
pub struct RawHit {
    pub text: String,
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Similarity distance; lower is more relevant.
    pub distance: f64,
}

/// Failures a search query can surface.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// The named collection does not exist on the backend.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// The backend is unreachable or answered with something unusable.
    #[error("search transport error: {0}")]
    Transport(String),
}

/// An opaque similarity-search service.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Return up to `k` nearest passages for `text` in `collection`.
    async fn query(&self, collection: &str, text: &str, k: usize)
        -> Result<Vec<RawHit>, SearchError>;
}
