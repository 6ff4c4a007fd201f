//! Crosscheck binary
//!
//! Thin entry point: load configuration, wire the Chroma backend and the
//! selected providers, and run one prompt file (or every `.txt` prompt in a
//! directory as a batch).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crosscheck::{Analyzer, AnalyzerConfig, ChromaBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "crosscheck=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let prompt_path = match args.next() {
        Some(p) => PathBuf::from(p),
        None => {
            eprintln!("usage: crosscheck <prompt-file-or-dir> [config.toml]");
            std::process::exit(2);
        }
    };

    let mut config = match args.next() {
        Some(path) => AnalyzerConfig::load(Path::new(&path))?,
        None => AnalyzerConfig::default(),
    };
    config.credentials_from_env();

    let backend = Arc::new(ChromaBackend::new(config.search_url.clone()));
    let providers = config.build_providers();
    let analyzer = Analyzer::new(config, backend, providers);

    if prompt_path.is_dir() {
        let prompts = load_prompt_dir(&prompt_path)?;
        if prompts.is_empty() {
            anyhow::bail!("no .txt prompt files in {}", prompt_path.display());
        }
        let readme = analyzer.run_batch(&prompts).await?;
        info!(readme = %readme.display(), "batch complete");
        println!("Batch summary: {}", readme.display());
    } else {
        let prompt = std::fs::read_to_string(&prompt_path)?;
        let artifacts = analyzer.run(&prompt).await?;
        println!("Full results saved to: {}", artifacts.combined_json.display());
        println!("Comparison file: {}", artifacts.comparison.display());
    }

    Ok(())
}

/// Collect `(name, text)` pairs from every `.txt` file in a directory,
/// sorted by file name for a stable batch order.
fn load_prompt_dir(dir: &Path) -> anyhow::Result<Vec<(String, String)>> {
    let mut prompts = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "prompt".to_string());
        let text = std::fs::read_to_string(&path)?;
        prompts.push((name, text));
    }
    prompts.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(prompts)
}
