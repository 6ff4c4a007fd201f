//! Collection Retriever
//!
//! Queries a single similarity-search collection and normalizes the raw
//! hits into [`RetrievedItem`]s. Collection absence and backend transport
//! failures both degrade to an empty result with a logged cause — a missing
//! source must never block analysis of the sources that are available.

use std::sync::Arc;

use crosscheck_core::{RetrievedItem, SourceKind};

use super::backend::{SearchBackend, SearchError};

/// Retriever over an opaque search backend.
pub struct CollectionRetriever {
    backend: Arc<dyn SearchBackend>,
}

impl CollectionRetriever {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// Retrieve up to `k` passages for `query` from `collection`.
    ///
    /// `kind` is the collection's configured source kind; a `source_type`
    /// metadata field on an individual hit overrides it. Returns an empty
    /// list (never an error) when the collection is absent or the backend
    /// is unreachable.
    pub async fn retrieve(
        &self,
        collection: &str,
        kind: SourceKind,
        query: &str,
        k: usize,
    ) -> Vec<RetrievedItem> {
        if query.trim().is_empty() || k == 0 {
            tracing::warn!(collection, k, "skipping retrieval: empty query or k = 0");
            return Vec::new();
        }

        match self.backend.query(collection, query, k).await {
            Ok(hits) => {
                tracing::info!(collection, count = hits.len(), "retrieved passages");
                hits.into_iter()
                    .map(|hit| {
                        let source = hit
                            .metadata
                            .get("source_type")
                            .and_then(|v| v.as_str())
                            .map(SourceKind::from_metadata)
                            .unwrap_or(kind);
                        RetrievedItem {
                            text: hit.text,
                            metadata: hit.metadata,
                            distance: hit.distance,
                            source,
                        }
                    })
                    .collect()
            }
            Err(SearchError::CollectionNotFound(name)) => {
                tracing::warn!(
                    collection = %name,
                    "collection does not exist; continuing without it"
                );
                Vec::new()
            }
            Err(SearchError::Transport(message)) => {
                tracing::error!(
                    collection,
                    %message,
                    "search backend error; treating as zero results"
                );
                Vec::new()
            }
        }
    }
}
