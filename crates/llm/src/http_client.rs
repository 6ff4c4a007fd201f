//! HTTP Client Factory
//!
//! Provides a factory function for building reqwest clients shared by the
//! provider adapters.

use std::time::Duration;

/// Build a `reqwest::Client` for provider calls.
///
/// A generous connect timeout guards against black-hole endpoints; the
/// per-invocation deadline is enforced separately by the dispatcher so a
/// slow provider cannot stall its siblings.
pub fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(20))
        .build()
        .expect("failed to build reqwest client")
}
