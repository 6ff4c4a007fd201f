//! Fan-Out Dispatcher
//!
//! Issues one concurrent invocation per selected provider and joins all of
//! them: the call returns only once every provider has produced a terminal
//! [`ProviderResult`]. A provider's failure or timeout has no effect on its
//! siblings, and the result order matches the order providers were
//! requested in, regardless of completion order.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;

use super::provider::LlmProvider;
use super::types::{ProviderError, ProviderRequest, ProviderResult};

/// Invoke every provider concurrently with an independent per-call timeout.
///
/// Timeout expiry converts to a `Transport` failure for that provider only;
/// no retries are attempted here. An empty provider list returns an empty
/// vector and logs a warning; callers may still persist retrieval-only
/// output.
pub async fn dispatch_all(
    providers: &[Arc<dyn LlmProvider>],
    request: &ProviderRequest,
    timeout: Duration,
) -> Vec<ProviderResult> {
    if providers.is_empty() {
        tracing::warn!("no providers selected; skipping dispatch");
        return Vec::new();
    }

    tracing::info!(count = providers.len(), "dispatching to providers");

    let calls = providers.iter().map(|provider| {
        let provider = Arc::clone(provider);
        async move {
            let outcome = tokio::time::timeout(timeout, provider.invoke(request)).await;
            match outcome {
                Ok(Ok(text)) => ProviderResult::success(provider.id(), text),
                Ok(Err(error)) => {
                    tracing::error!(provider = provider.id(), %error, "provider failed");
                    ProviderResult::failure(provider.id(), error)
                }
                Err(_) => {
                    tracing::error!(provider = provider.id(), "provider timed out");
                    ProviderResult::failure(
                        provider.id(),
                        ProviderError::transport(format!(
                            "timed out after {}s",
                            timeout.as_secs_f64()
                        )),
                    )
                }
            }
        }
    });

    // join_all preserves input order while polling all calls concurrently.
    join_all(calls).await
}
