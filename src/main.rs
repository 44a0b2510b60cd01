use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use lawgan_core::assistant::Assistant;
use lawgan_core::config::Config;
use lawgan_llm::any::AnyProvider;
use lawgan_llm::gemini::GeminiProvider;
use lawgan_llm::ollama::OllamaProvider;
use lawgan_llm::provider::LlmProvider;
use lawgan_rag::document::SourceSet;
use lawgan_rag::index::{BuildOutcome, DocumentIndex};
use lawgan_rag::qdrant_store::QdrantStore;
use lawgan_rag::retriever::Retriever;
use lawgan_rag::vector_store::VectorStore;

#[derive(Debug, Parser)]
#[command(
    name = "lawgan",
    about = "Legal assistant over review and constitutional PDF sources"
)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "lawgan.toml")]
    config: PathBuf,

    /// Delete the persisted index before starting, forcing a full re-ingestion.
    #[arg(long)]
    rebuild: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config)?;

    let embedder = build_embedder(&config)?;
    let provider = build_generation_provider(&config)?;
    tracing::info!(
        generation = provider.name(),
        embedding = embedder.name(),
        "providers ready"
    );

    let store: Arc<dyn VectorStore> = Arc::new(
        QdrantStore::new(&config.index.qdrant_url).context("failed to connect to Qdrant")?,
    );

    if args.rebuild {
        tracing::warn!(collection = %config.index.collection, "deleting persisted index");
        store.delete_collection(&config.index.collection).await?;
    }

    let index = DocumentIndex::new(
        Arc::clone(&store),
        &config.index.collection,
        Box::new(embedder.embed_fn()),
    );
    let sources = SourceSet {
        reviews_csv: config.sources.reviews_csv.clone(),
        pdf_dir: config.sources.pdf_dir.clone(),
    };
    match index.ensure_built(&sources).await? {
        BuildOutcome::Built(count) => tracing::info!(count, "index built from sources"),
        BuildOutcome::AlreadyPresent => tracing::info!("reusing persisted index"),
    }

    let retriever = Retriever::new(
        store,
        &config.index.collection,
        Box::new(embedder.embed_fn()),
    )
    .with_top_k(config.assistant.top_k);
    let assistant = Assistant::new(provider, retriever);

    run_loop(&assistant, &config.assistant.name).await
}

fn build_generation_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    match config.llm.provider.as_str() {
        "ollama" => Ok(AnyProvider::Ollama(OllamaProvider::new(
            &config.llm.base_url,
            config.llm.model.clone(),
            config.embedding.model.clone(),
        ))),
        "gemini" => {
            let provider = GeminiProvider::new(
                gemini_api_key(config)?,
                config.llm.model.clone(),
                config.llm.safety.clone(),
                Duration::from_secs(config.llm.request_timeout_secs),
            )?;
            Ok(AnyProvider::Gemini(provider))
        }
        other => bail!("unknown LLM provider: {other}"),
    }
}

fn build_embedder(config: &Config) -> anyhow::Result<AnyProvider> {
    match config.embedding.provider.as_str() {
        "ollama" => Ok(AnyProvider::Ollama(OllamaProvider::new(
            &config.embedding.base_url,
            config.llm.model.clone(),
            config.embedding.model.clone(),
        ))),
        "gemini" => {
            let provider = GeminiProvider::new(
                gemini_api_key(config)?,
                config.llm.model.clone(),
                config.llm.safety.clone(),
                Duration::from_secs(config.llm.request_timeout_secs),
            )?
            .with_embedding_model(config.embedding.model.clone());
            Ok(AnyProvider::Gemini(provider))
        }
        other => bail!("unknown embedding provider: {other}"),
    }
}

fn gemini_api_key(config: &Config) -> anyhow::Result<String> {
    std::env::var(&config.llm.api_key_env).with_context(|| {
        format!(
            "Gemini API key env var {} is not set",
            config.llm.api_key_env
        )
    })
}

async fn run_loop(assistant: &Assistant<AnyProvider>, name: &str) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("{name} ready. Ask a legal question (or 'exit').\n> ").as_bytes())
        .await?;
    stdout.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let question = line.trim();
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }
        if !question.is_empty() {
            let text = assistant.answer(question).await.into_text();
            stdout.write_all(format!("{text}\n").as_bytes()).await?;
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }
    Ok(())
}
