//! Crosscheck
//!
//! Retrieval-grounded multi-provider analysis: queries multiple
//! similarity-search collections, merges and ranks their passages by
//! distance, fits them into a token budget, dispatches the assembled
//! context concurrently to several LLM backends with isolated per-provider
//! failure handling, and persists a consolidated, provider-labeled result
//! artifact.
//!
//! The workspace splits into three crates:
//! - `crosscheck-core` — context data model and the merge/budget algorithms
//! - `crosscheck-llm` — provider adapters and the fan-out dispatcher
//! - `crosscheck` (this crate) — configuration, retrieval services, the
//!   orchestrator state machine, and artifact persistence

pub mod config;
pub mod services;
pub mod utils;

pub use config::{AnalyzerConfig, ProviderSettings};
pub use services::orchestrator::{Analyzer, AnalysisRun, RunArtifacts, RunPhase};
pub use services::retrieval::{ChromaBackend, CollectionRetriever, SearchBackend, SearchError};
pub use utils::error::{AppError, AppResult};
