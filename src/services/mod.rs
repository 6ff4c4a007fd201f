//! Service modules

pub mod orchestrator;
pub mod retrieval;
