//! Retrieval Services
//!
//! The search-backend boundary, the Chroma REST implementation, and the
//! collection retriever that normalizes raw hits into context items.

pub mod backend;
pub mod chroma;
pub mod retriever;

pub use backend::{RawHit, SearchBackend, SearchError};
pub use chroma::{ChromaBackend, DEFAULT_CHROMA_URL};
pub use retriever::CollectionRetriever;
