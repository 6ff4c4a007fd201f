//! Orchestration Services
//!
//! The run state machine, prompt rendering, and artifact persistence.

pub mod prompt;
pub mod run_store;
pub mod service;

pub use prompt::{render_item, render_user_message, SYSTEM_PROMPT};
pub use run_store::{AnalysisRun, BatchEntry, RunArtifacts, RunStore, SourceCounts};
pub use service::{Analyzer, RunPhase};
