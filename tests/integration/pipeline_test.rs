//! Pipeline Integration Tests
//!
//! Drives the orchestrator end to end with an in-memory search backend and
//! fake providers: partial provider failure, empty-context abort, artifact
//! contents, and batch mode.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crosscheck::services::retrieval::{RawHit, SearchBackend, SearchError};
use crosscheck::{Analyzer, AnalyzerConfig, AppError};
use crosscheck_llm::{LlmProvider, LlmResult, ProviderError, ProviderRequest};

// ============================================================================
// Test doubles
// ============================================================================

/// In-memory search backend with canned hits per collection name.
struct MemoryBackend {
    collections: HashMap<String, Vec<RawHit>>,
}

impl MemoryBackend {
    fn new() -> Self {
        Self {
            collections: HashMap::new(),
        }
    }

    fn with_collection(mut self, name: &str, hits: Vec<RawHit>) -> Self {
        self.collections.insert(name.to_string(), hits);
        self
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn query(
        &self,
        collection: &str,
        _text: &str,
        k: usize,
    ) -> Result<Vec<RawHit>, SearchError> {
        match self.collections.get(collection) {
            Some(hits) => Ok(hits.iter().take(k).cloned().collect()),
            None => Err(SearchError::CollectionNotFound(collection.to_string())),
        }
    }
}

fn hit(text: &str, distance: f64, source_type: &str) -> RawHit {
    let mut metadata = BTreeMap::new();
    metadata.insert("source_type".to_string(), serde_json::json!(source_type));
    if source_type == "documentation" {
        metadata.insert("title".to_string(), serde_json::json!("Handbook"));
        metadata.insert("section".to_string(), serde_json::json!("Setup"));
    }
    RawHit {
        text: text.to_string(),
        metadata,
        distance,
    }
}

/// Provider double that counts invocations and returns a fixed outcome.
struct FakeProvider {
    id: &'static str,
    result: Result<&'static str, ProviderError>,
    invocations: AtomicUsize,
}

impl FakeProvider {
    fn ok(id: &'static str, text: &'static str) -> Arc<Self> {
        Arc::new(Self {
            id,
            result: Ok(text),
            invocations: AtomicUsize::new(0),
        })
    }

    fn bad_credential(id: &'static str) -> Arc<Self> {
        Arc::new(Self {
            id,
            result: Err(ProviderError::upstream(401, "invalid api key")),
            invocations: AtomicUsize::new(0),
        })
    }

    fn invocation_count(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    fn model(&self) -> &str {
        "fake-model"
    }

    async fn invoke(&self, _request: &ProviderRequest) -> LlmResult<String> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map(str::to_string)
    }
}

fn test_config(output_dir: &Path) -> AnalyzerConfig {
    AnalyzerConfig {
        output_dir: output_dir.to_path_buf(),
        retrieve_k: 10,
        max_input_tokens: 12_000,
        batch_delay_secs: 0,
        ..AnalyzerConfig::default()
    }
}

fn populated_backend() -> Arc<MemoryBackend> {
    Arc::new(
        MemoryBackend::new()
            .with_collection(
                "documentation",
                vec![
                    hit("Install with the setup script.", 0.10, "documentation"),
                    hit("Configure the output directory.", 0.30, "documentation"),
                ],
            )
            .with_collection(
                "chat_messages",
                vec![
                    hit("how do i install?", 0.05, "chat"),
                    hit("setup keeps failing for me", 0.20, "chat"),
                ],
            ),
    )
}

// ============================================================================
// Scenario C: partial provider failure
// ============================================================================

#[tokio::test]
async fn test_one_bad_credential_does_not_affect_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let a = FakeProvider::ok("openai", "Report A");
    let b = FakeProvider::bad_credential("anthropic");
    let c = FakeProvider::ok("gemini", "Report C");

    let providers: Vec<Arc<dyn LlmProvider>> = vec![a.clone(), b.clone(), c.clone()];
    let analyzer = Analyzer::new(test_config(dir.path()), populated_backend(), providers);

    let artifacts = analyzer.run("Summarize install issues.").await.unwrap();

    // Consolidated artifact lists all three providers, in request order.
    let raw = std::fs::read_to_string(&artifacts.combined_json).unwrap();
    let run: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let results = run["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["provider_id"], "openai");
    assert_eq!(results[0]["outcome"], "success");
    assert_eq!(results[1]["provider_id"], "anthropic");
    assert_eq!(results[1]["outcome"], "failure");
    assert_eq!(results[1]["error"]["kind"], "upstream");
    assert_eq!(results[1]["error"]["status"], 401);
    assert_eq!(results[2]["provider_id"], "gemini");
    assert_eq!(results[2]["outcome"], "success");

    // Every provider was invoked exactly once; the failure cost no retries
    // and silenced nobody.
    assert_eq!(a.invocation_count(), 1);
    assert_eq!(b.invocation_count(), 1);
    assert_eq!(c.invocation_count(), 1);
}

// ============================================================================
// Scenario D: empty context aborts before dispatch
// ============================================================================

#[tokio::test]
async fn test_no_context_fails_before_any_provider_call() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FakeProvider::ok("openai", "never produced");

    // Neither configured collection exists on the backend.
    let analyzer = Analyzer::new(
        test_config(dir.path()),
        Arc::new(MemoryBackend::new()),
        vec![provider.clone()],
    );

    let err = analyzer.run("Anything at all.").await.unwrap_err();
    assert!(matches!(err, AppError::NoContext));
    assert_eq!(provider.invocation_count(), 0);

    // Nothing was persisted.
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_single_absent_collection_still_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MemoryBackend::new().with_collection(
        "documentation",
        vec![hit("Only docs exist.", 0.10, "documentation")],
    ));

    let analyzer = Analyzer::new(
        test_config(dir.path()),
        backend,
        vec![FakeProvider::ok("openai", "Report")],
    );

    let artifacts = analyzer.run("Question?").await.unwrap();
    let raw = std::fs::read_to_string(&artifacts.combined_json).unwrap();
    let run: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(run["sources"]["documentation"], 1);
    assert_eq!(run["sources"]["chat"], 0);
}

// ============================================================================
// Artifact contents
// ============================================================================

#[tokio::test]
async fn test_artifacts_carry_context_provenance() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = Analyzer::new(
        test_config(dir.path()),
        populated_backend(),
        vec![FakeProvider::ok("openai", "Report")],
    );

    let artifacts = analyzer.run_named("provenance", "Question?").await.unwrap();
    let raw = std::fs::read_to_string(&artifacts.combined_json).unwrap();
    let run: serde_json::Value = serde_json::from_str(&raw).unwrap();

    // Items are globally sorted ascending by distance across collections.
    let items = run["context"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 4);
    let distances: Vec<f64> = items
        .iter()
        .map(|i| i["distance"].as_f64().unwrap())
        .collect();
    assert_eq!(distances, vec![0.05, 0.10, 0.20, 0.30]);
    assert_eq!(run["sources"]["documentation"], 2);
    assert_eq!(run["sources"]["chat"], 2);
    assert_eq!(run["context"]["dropped"], 0);

    // Per-provider text artifact and comparison doc exist.
    assert_eq!(artifacts.text_files.len(), 1);
    let text = std::fs::read_to_string(&artifacts.text_files[0].1).unwrap();
    assert_eq!(text, "Report");
    let comparison = std::fs::read_to_string(&artifacts.comparison).unwrap();
    assert!(comparison.contains("## Openai Analysis"));
}

#[tokio::test]
async fn test_budget_drops_low_ranked_items() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    // Each rendered chunk below (40-byte passage plus its 40-byte
    // documentation header) estimates to 20 tokens; allow two.
    config.max_input_tokens = 40;

    let backend = Arc::new(MemoryBackend::new().with_collection(
        "documentation",
        vec![
            hit(&"a".repeat(40), 0.1, "documentation"),
            hit(&"b".repeat(40), 0.2, "documentation"),
            hit(&"c".repeat(40), 0.3, "documentation"),
        ],
    ));

    let analyzer = Analyzer::new(config, backend, vec![FakeProvider::ok("openai", "ok")]);
    let artifacts = analyzer.run("Question?").await.unwrap();

    let raw = std::fs::read_to_string(&artifacts.combined_json).unwrap();
    let run: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(run["context"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(run["context"]["dropped"], 1);
}

#[tokio::test]
async fn test_empty_provider_selection_still_persists_retrieval() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = Analyzer::new(test_config(dir.path()), populated_backend(), Vec::new());

    let artifacts = analyzer.run("Question?").await.unwrap();
    let raw = std::fs::read_to_string(&artifacts.combined_json).unwrap();
    let run: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(run["results"].as_array().unwrap().len(), 0);
    assert_eq!(run["context"]["items"].as_array().unwrap().len(), 4);
}

// ============================================================================
// Batch mode
// ============================================================================

#[tokio::test]
async fn test_batch_records_mixed_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = Analyzer::new(
        test_config(dir.path()),
        populated_backend(),
        vec![FakeProvider::ok("openai", "Report")],
    );

    // Second prompt is empty, so retrieval is skipped for it and the run
    // fails with NoContext; the batch keeps going.
    let prompts = vec![
        ("complaints".to_string(), "Top complaints?".to_string()),
        ("blank".to_string(), "   ".to_string()),
    ];

    let readme = analyzer.run_batch(&prompts).await.unwrap();
    let doc = std::fs::read_to_string(&readme).unwrap();
    assert!(doc.contains("- Successful: 1"));
    assert!(doc.contains("- Failed: 1"));
    assert!(doc.contains("### complaints"));
    assert!(doc.contains("### blank"));
    assert!(doc.contains("No context available"));
}
