//! Analysis Orchestrator
//!
//! Drives one invocation end to end: retrieve from every configured
//! collection, merge and budget the context, fan the rendered prompt out to
//! the selected providers, and persist the consolidated run artifact.
//!
//! The run moves through `Idle → Retrieving → Merging → Budgeting →
//! Dispatching → Persisting → Done`; `Failed` is reachable from `Merging`
//! (empty context) and `Persisting` (unwritable output). Per-collection and
//! per-provider failures never fail the run — they degrade to empty results
//! or `Failure` outcomes respectively.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;

use crosscheck_core::{approx_token_cost, BudgetedContext, RankedContext, SourceKind};
use crosscheck_llm::{dispatch_all, LlmProvider, ProviderRequest};

use super::prompt::{render_item, render_user_message, SYSTEM_PROMPT};
use super::run_store::{
    write_batch_readme, AnalysisRun, BatchEntry, RunArtifacts, RunStore, SourceCounts,
};
use crate::config::AnalyzerConfig;
use crate::services::retrieval::{CollectionRetriever, SearchBackend};
use crate::utils::error::{AppError, AppResult};

/// Orchestration phases of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Retrieving,
    Merging,
    Budgeting,
    Dispatching,
    Persisting,
    Done,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Done | RunPhase::Failed)
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunPhase::Idle => "idle",
            RunPhase::Retrieving => "retrieving",
            RunPhase::Merging => "merging",
            RunPhase::Budgeting => "budgeting",
            RunPhase::Dispatching => "dispatching",
            RunPhase::Persisting => "persisting",
            RunPhase::Done => "done",
            RunPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The retrieval-merge-budget-fanout-aggregate pipeline.
pub struct Analyzer {
    config: AnalyzerConfig,
    retriever: CollectionRetriever,
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl Analyzer {
    pub fn new(
        config: AnalyzerConfig,
        backend: Arc<dyn SearchBackend>,
        providers: Vec<Arc<dyn LlmProvider>>,
    ) -> Self {
        Self {
            config,
            retriever: CollectionRetriever::new(backend),
            providers,
        }
    }

    /// Run one analysis, writing artifacts to the configured output dir.
    pub async fn run(&self, prompt: &str) -> AppResult<RunArtifacts> {
        let store = RunStore::new(&self.config.output_dir);
        self.run_with_store(None, prompt, &store).await
    }

    /// Run one analysis under an explicit output name.
    pub async fn run_named(&self, name: &str, prompt: &str) -> AppResult<RunArtifacts> {
        let store = RunStore::new(&self.config.output_dir);
        self.run_with_store(Some(name), prompt, &store).await
    }

    /// Run every named prompt in sequence, sleeping the configured delay
    /// between prompts and recording per-prompt outcomes without aborting
    /// the batch. Returns the path of the batch README.
    pub async fn run_batch(&self, prompts: &[(String, String)]) -> AppResult<PathBuf> {
        let batch_dir = self
            .config
            .output_dir
            .join(format!("batch_{}", Utc::now().format("%Y%m%d_%H%M%S")));
        std::fs::create_dir_all(&batch_dir)?;
        let store = RunStore::new(&batch_dir);

        tracing::info!(
            count = prompts.len(),
            dir = %batch_dir.display(),
            "starting batch analysis"
        );

        let mut entries = Vec::with_capacity(prompts.len());
        for (index, (name, prompt)) in prompts.iter().enumerate() {
            tracing::info!(
                prompt = %name,
                position = index + 1,
                total = prompts.len(),
                "running batch prompt"
            );

            let outcome = self
                .run_with_store(Some(name), prompt, &store)
                .await
                .map_err(|e| e.to_string());
            if let Err(reason) = &outcome {
                tracing::error!(prompt = %name, %reason, "batch prompt failed");
            }
            entries.push(BatchEntry {
                prompt_name: name.clone(),
                outcome,
            });

            if index + 1 < prompts.len() && !self.config.batch_delay().is_zero() {
                tokio::time::sleep(self.config.batch_delay()).await;
            }
        }

        write_batch_readme(&batch_dir, &entries)
    }

    async fn run_with_store(
        &self,
        name: Option<&str>,
        prompt: &str,
        store: &RunStore,
    ) -> AppResult<RunArtifacts> {
        let mut phase = RunPhase::Idle;

        self.advance(&mut phase, RunPhase::Retrieving);
        let chat = self
            .retriever
            .retrieve(
                &self.config.chat_collection,
                SourceKind::Chat,
                prompt,
                self.config.retrieve_k,
            )
            .await;
        let docs = self
            .retriever
            .retrieve(
                &self.config.doc_collection,
                SourceKind::Documentation,
                prompt,
                self.config.retrieve_k,
            )
            .await;

        self.advance(&mut phase, RunPhase::Merging);
        let ranked = RankedContext::merge(vec![chat, docs]);
        if ranked.is_empty() {
            self.advance(&mut phase, RunPhase::Failed);
            return Err(AppError::NoContext);
        }
        tracing::info!(total = ranked.len(), "merged retrieval results");

        self.advance(&mut phase, RunPhase::Budgeting);
        // Charge each item at its rendered size: the source label and
        // metadata header count against the budget, not just the passage.
        let budgeted = BudgetedContext::truncate(&ranked, self.config.max_input_tokens, |item| {
            approx_token_cost(&render_item(item))
        });
        if budgeted.dropped > 0 {
            tracing::warn!(
                included = budgeted.len(),
                dropped = budgeted.dropped,
                budget = self.config.max_input_tokens,
                "context exceeded token budget; truncated"
            );
        }

        self.advance(&mut phase, RunPhase::Dispatching);
        let request = ProviderRequest::new(SYSTEM_PROMPT, render_user_message(&budgeted, prompt));
        let results = dispatch_all(&self.providers, &request, self.config.request_timeout()).await;

        self.advance(&mut phase, RunPhase::Persisting);
        let sources = SourceCounts {
            documentation: budgeted.count_source(SourceKind::Documentation),
            chat: budgeted.count_source(SourceKind::Chat),
        };
        let run = AnalysisRun {
            prompt: prompt.to_string(),
            context: budgeted,
            results,
            sources,
            generated_at: Utc::now(),
        };

        match store.persist(name, &run) {
            Ok(artifacts) => {
                self.advance(&mut phase, RunPhase::Done);
                Ok(artifacts)
            }
            Err(e) => {
                self.advance(&mut phase, RunPhase::Failed);
                Err(e)
            }
        }
    }

    fn advance(&self, phase: &mut RunPhase, next: RunPhase) {
        tracing::info!(from = %phase, to = %next, "run phase transition");
        *phase = next;
    }
}
