//! Integration Tests Module
//!
//! End-to-end tests for the Crosscheck pipeline: retrieval through merge,
//! budgeting, provider fan-out, and artifact persistence, driven with
//! in-memory search backends and fake providers.

// Full pipeline runs (partial provider failure, empty context, artifacts)
mod pipeline_test;
