//! Analysis Run Store
//!
//! Persists the consolidated artifact of one orchestration run: per-provider
//! raw text files, a combined JSON document with the full context provenance,
//! and a human-readable side-by-side comparison. Batch runs additionally get
//! a README summarizing every prompt's outcome.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crosscheck_core::BudgetedContext;
use crosscheck_llm::ProviderResult;

use crate::utils::error::AppResult;

/// Preview length used in the comparison document.
const COMPARISON_PREVIEW_LEN: usize = 1000;

/// Included-item counts per source kind.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SourceCounts {
    pub documentation: usize,
    pub chat: usize,
}

/// The consolidated artifact of one orchestration invocation. Created once,
/// written at the end of the run, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRun {
    /// The original analysis prompt.
    pub prompt: String,
    /// Context items that survived budgeting, with metadata and distances.
    pub context: BudgetedContext,
    /// Per-provider outcomes in invocation order.
    pub results: Vec<ProviderResult>,
    /// How many included items came from each source kind.
    pub sources: SourceCounts,
    pub generated_at: DateTime<Utc>,
}

/// Paths of the files one persisted run produced.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub combined_json: PathBuf,
    pub comparison: PathBuf,
    /// `(provider_id, path)` in invocation order.
    pub text_files: Vec<(String, PathBuf)>,
}

/// Writes run artifacts under a base directory.
#[derive(Debug, Clone)]
pub struct RunStore {
    base_dir: PathBuf,
}

impl RunStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Persist one run. `name` overrides the derived output name; the UTC
    /// timestamp is always appended so repeated runs never collide.
    pub fn persist(&self, name: Option<&str>, run: &AnalysisRun) -> AppResult<RunArtifacts> {
        fs::create_dir_all(&self.base_dir)?;

        let base_name = match name {
            Some(n) => n.to_string(),
            None => derive_output_name(&run.prompt),
        };
        let stamp = run.generated_at.format("%Y%m%d_%H%M%S");
        let output_base = self.base_dir.join(format!("{}_{}", base_name, stamp));
        let base = output_base.to_string_lossy();

        // One raw text file per provider; failures record the diagnostic line.
        let mut text_files = Vec::with_capacity(run.results.len());
        for result in &run.results {
            let path = PathBuf::from(format!("{}_{}.txt", base, result.provider_id));
            fs::write(&path, result.display_text())?;
            text_files.push((result.provider_id.clone(), path));
        }

        let combined_json = PathBuf::from(format!("{}_combined.json", base));
        fs::write(&combined_json, serde_json::to_string_pretty(run)?)?;

        let comparison = PathBuf::from(format!("{}_comparison.md", base));
        fs::write(&comparison, render_comparison(run, &text_files))?;

        tracing::info!(
            json = %combined_json.display(),
            comparison = %comparison.display(),
            "run artifacts written"
        );

        Ok(RunArtifacts {
            combined_json,
            comparison,
            text_files,
        })
    }
}

/// Derive an output name from the prompt: a sanitized snippet of its first
/// line plus a short digest for uniqueness across similar prompts.
fn derive_output_name(prompt: &str) -> String {
    let snippet: String = prompt
        .lines()
        .next()
        .unwrap_or("")
        .chars()
        .take(20)
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();

    let digest = Sha256::digest(prompt.as_bytes());
    let short = hex_prefix(&digest, 6);
    format!("analysis_{}_{}", snippet.trim_matches('_'), short)
}

fn hex_prefix(bytes: &[u8], len: usize) -> String {
    bytes
        .iter()
        .flat_map(|b| [b >> 4, b & 0xf])
        .take(len)
        .map(|n| char::from_digit(n as u32, 16).unwrap_or('0'))
        .collect()
}

/// Render the side-by-side comparison document.
fn render_comparison(run: &AnalysisRun, text_files: &[(String, PathBuf)]) -> String {
    let mut doc = String::new();
    doc.push_str("# Multi-Provider Analysis Comparison\n\n");
    doc.push_str(&format!(
        "Generated on: {}\n\n",
        run.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    doc.push_str(&format!("## Prompt\n\n```\n{}\n```\n\n", run.prompt));
    doc.push_str(&format!(
        "Context: {} documentation / {} chat items, {} dropped by budgeting.\n\n",
        run.sources.documentation, run.sources.chat, run.context.dropped
    ));

    for (result, (_, path)) in run.results.iter().zip(text_files) {
        let heading = capitalize(&result.provider_id);
        doc.push_str(&format!("## {} Analysis\n\n", heading));

        let text = result.display_text();
        if text.chars().count() > COMPARISON_PREVIEW_LEN {
            let preview: String = text.chars().take(COMPARISON_PREVIEW_LEN).collect();
            doc.push_str(&format!("```\n{}...\n```\n\n", preview));
        } else {
            doc.push_str(&format!("```\n{}\n```\n\n", text));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        doc.push_str(&format!(
            "[View full {} analysis](./{})\n\n",
            result.provider_id, file_name
        ));
    }

    doc
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// One prompt's outcome within a batch run.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub prompt_name: String,
    pub outcome: Result<RunArtifacts, String>,
}

/// Write the batch README listing every prompt's status and artifacts.
pub fn write_batch_readme(dir: &Path, entries: &[BatchEntry]) -> AppResult<PathBuf> {
    let succeeded = entries.iter().filter(|e| e.outcome.is_ok()).count();

    let mut doc = String::new();
    doc.push_str("# Multi-Provider Analysis Batch Run\n\n");
    doc.push_str(&format!(
        "Generated on: {}\n\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S")
    ));
    doc.push_str("## Summary\n\n");
    doc.push_str(&format!("- Total prompts processed: {}\n", entries.len()));
    doc.push_str(&format!("- Successful: {}\n", succeeded));
    doc.push_str(&format!("- Failed: {}\n\n", entries.len() - succeeded));
    doc.push_str("## Results\n\n");

    for entry in entries {
        doc.push_str(&format!("### {}\n\n", entry.prompt_name));
        match &entry.outcome {
            Ok(artifacts) => {
                doc.push_str("- Status: Success\n");
                if let Some(name) = artifacts.comparison.file_name() {
                    let name = name.to_string_lossy();
                    doc.push_str(&format!("- Comparison: [{}]({})\n", name, name));
                }
                if let Some(name) = artifacts.combined_json.file_name() {
                    let name = name.to_string_lossy();
                    doc.push_str(&format!("- Full JSON: [{}]({})\n", name, name));
                }
                for (provider, path) in &artifacts.text_files {
                    if let Some(name) = path.file_name() {
                        let name = name.to_string_lossy();
                        doc.push_str(&format!("  - [{}]({})\n", capitalize(provider), name));
                    }
                }
                doc.push('\n');
            }
            Err(reason) => {
                doc.push_str("- Status: Failed\n");
                doc.push_str(&format!("- Error: {}\n\n", reason));
            }
        }
    }

    let readme = dir.join("README.md");
    fs::write(&readme, doc)?;
    Ok(readme)
}
