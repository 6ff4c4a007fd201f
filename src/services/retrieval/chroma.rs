//! Chroma Search Backend
//!
//! `SearchBackend` implementation speaking Chroma's REST API. Queries are a
//! two-step exchange: resolve the collection name to its id (a 4xx here is
//! the collection-absent signal), then POST the query with server-side
//! embedding of the query text.
//!
//! Response payloads nest each field one level deep per query text; we
//! always send a single query text, so index 0 of `documents`, `metadatas`
//! and `distances` carries the entire result set.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use super::backend::{RawHit, SearchBackend, SearchError};

/// Default local Chroma endpoint.
pub const DEFAULT_CHROMA_URL: &str = "http://127.0.0.1:8000";

/// Chroma REST backend
pub struct ChromaBackend {
    base_url: String,
    client: reqwest::Client,
}

impl ChromaBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build reqwest client");
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Resolve a collection name to its id.
    async fn collection_id(&self, collection: &str) -> Result<String, SearchError> {
        let url = format!("{}/api/v1/collections/{}", self.base_url, collection);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        // Chroma signals a missing collection with a 4xx and an error body
        // naming the collection; either is treated as absence.
        if (400..500).contains(&status) {
            return Err(SearchError::CollectionNotFound(collection.to_string()));
        }
        if status != 200 {
            return Err(SearchError::Transport(format!(
                "collection lookup failed with HTTP {}",
                status
            )));
        }

        let payload: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| SearchError::Transport(format!("collection lookup: {}", e)))?;
        payload["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SearchError::Transport("collection lookup: no id field".to_string()))
    }
}

#[async_trait]
impl SearchBackend for ChromaBackend {
    async fn query(
        &self,
        collection: &str,
        text: &str,
        k: usize,
    ) -> Result<Vec<RawHit>, SearchError> {
        let id = self.collection_id(collection).await?;

        let url = format!("{}/api/v1/collections/{}/query", self.base_url, id);
        let body = serde_json::json!({
            "query_texts": [text],
            "n_results": k,
            "include": ["documents", "metadatas", "distances"],
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        if status != 200 {
            return Err(SearchError::Transport(format!(
                "query failed with HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let payload: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| SearchError::Transport(format!("query response: {}", e)))?;
        parse_query_response(&payload)
    }
}

/// Zip Chroma's parallel arrays into raw hits.
fn parse_query_response(payload: &serde_json::Value) -> Result<Vec<RawHit>, SearchError> {
    let documents = payload["documents"][0]
        .as_array()
        .ok_or_else(|| SearchError::Transport("query response: no documents array".to_string()))?;
    let metadatas = payload["metadatas"][0].as_array();
    let distances = payload["distances"][0].as_array();

    let mut hits = Vec::with_capacity(documents.len());
    for (i, doc) in documents.iter().enumerate() {
        let text = match doc.as_str() {
            Some(t) => t.to_string(),
            None => continue,
        };

        let metadata: BTreeMap<String, serde_json::Value> = metadatas
            .and_then(|m| m.get(i))
            .and_then(|m| m.as_object())
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        let distance = distances
            .and_then(|d| d.get(i))
            .and_then(|d| d.as_f64())
            .ok_or_else(|| {
                SearchError::Transport(format!("query response: missing distance for hit {}", i))
            })?;

        hits.push(RawHit {
            text,
            metadata,
            distance,
        });
    }

    Ok(hits)
}
