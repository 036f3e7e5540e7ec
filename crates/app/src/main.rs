use chrono::Utc;
use clap::{Parser, Subcommand};
use docqa_core::{
    document_id_for_path, Document, EmbeddingClient, GroqGenerator, HuggingFaceEmbeddings,
    IndexingPipeline, QdrantStore, QueryOrchestrator, VectorStore, DEFAULT_CHAT_MODEL,
    DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBED_MODEL, DEFAULT_GROQ_ENDPOINT, DEFAULT_HF_ENDPOINT,
    DEFAULT_TOP_K,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "docqa", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Qdrant base URL
    #[arg(long, default_value = "http://localhost:6333")]
    qdrant_url: String,

    /// Qdrant API key
    #[arg(long, env = "QDRANT_API_KEY")]
    qdrant_api_key: Option<String>,

    /// Vector collection name
    #[arg(long, default_value = "rag")]
    collection: String,

    /// Embedding vector dimension
    #[arg(long, default_value_t = DEFAULT_EMBEDDING_DIMENSIONS)]
    dimension: usize,

    /// Hugging Face inference base URL
    #[arg(long, default_value = DEFAULT_HF_ENDPOINT)]
    hf_url: String,

    /// Embedding model
    #[arg(long, default_value = DEFAULT_EMBED_MODEL)]
    embed_model: String,

    /// Hugging Face API key
    #[arg(long, env = "HF_API_KEY")]
    hf_api_key: Option<String>,

    /// Chat completions base URL (Groq or any OpenAI-compatible endpoint)
    #[arg(long, default_value = DEFAULT_GROQ_ENDPOINT)]
    groq_url: String,

    /// Chat model used to synthesize answers
    #[arg(long, default_value = DEFAULT_CHAT_MODEL)]
    chat_model: String,

    /// Groq API key
    #[arg(long, env = "GROQ_API_KEY")]
    groq_api_key: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Index a text file, or a folder of .txt and .md files, into the collection.
    Ingest {
        /// Single text file to index.
        #[arg(long, conflicts_with = "folder")]
        file: Option<PathBuf>,
        /// Folder to scan recursively for text files.
        #[arg(long)]
        folder: Option<PathBuf>,
        /// Override the derived document id (single file only).
        #[arg(long)]
        id: Option<String>,
    },
    /// Ask a question over the indexed collection.
    Ask {
        /// Question text
        #[arg(long)]
        question: String,
        /// Number of chunks to retrieve.
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
        /// Print the retrieved chunks without generating an answer.
        #[arg(long, default_value_t = false)]
        no_generate: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut provider = HuggingFaceEmbeddings::new(&cli.hf_url, &cli.embed_model);
    if let Some(api_key) = &cli.hf_api_key {
        provider = provider.with_api_key(api_key);
    }
    let embedder = EmbeddingClient::new(provider, cli.dimension);

    let mut store = QdrantStore::new(&cli.qdrant_url);
    if let Some(api_key) = &cli.qdrant_api_key {
        store = store.with_api_key(api_key);
    }

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "docqa boot"
    );

    let handle = store
        .ensure_collection(&cli.collection, cli.dimension)
        .await?;

    match cli.command {
        Command::Ingest { file, folder, id } => {
            let pipeline = IndexingPipeline::new(embedder, store, handle);

            match (file, folder) {
                (Some(file), None) => {
                    let document_id = id.unwrap_or_else(|| document_id_for_path(&file));
                    let text = tokio::fs::read_to_string(&file).await.map_err(|error| {
                        anyhow::anyhow!("could not read {}: {error}", file.display())
                    })?;
                    let report = pipeline.ingest(&Document::new(document_id, text)).await?;

                    for skipped in &report.skipped {
                        warn!(
                            path = %file.display(),
                            ordinal = skipped.ordinal,
                            reason = %skipped.reason,
                            "skipped chunk"
                        );
                    }

                    info!(path = %file.display(), inserted = report.inserted, "file indexed");
                    println!(
                        "{} chunks indexed at {} ({} chunks skipped)",
                        report.inserted,
                        Utc::now().to_rfc3339(),
                        report.skipped.len()
                    );
                }
                (None, Some(folder)) => {
                    if id.is_some() {
                        anyhow::bail!("--id applies to a single --file");
                    }

                    let report = pipeline.ingest_folder(&folder).await?;

                    if !report.skipped_files.is_empty() {
                        warn!(
                            "skipped_files={} for folder={}",
                            report.skipped_files.len(),
                            folder.display()
                        );
                        for skipped in &report.skipped_files {
                            warn!(
                                path = %skipped.path.display(),
                                reason = %skipped.reason,
                                "skipped file"
                            );
                        }
                    }

                    info!(folder = %folder.display(), inserted = report.inserted, "folder indexed");
                    println!(
                        "{} chunks indexed at {} ({} chunks skipped, {} files skipped)",
                        report.inserted,
                        Utc::now().to_rfc3339(),
                        report.skipped_chunks,
                        report.skipped_files.len()
                    );
                }
                (None, None) => anyhow::bail!("either --file or --folder is required"),
                (Some(_), Some(_)) => anyhow::bail!("--file and --folder are mutually exclusive"),
            }
        }
        Command::Ask {
            question,
            top_k,
            no_generate,
        } => {
            let mut generator = GroqGenerator::new(&cli.groq_url, &cli.chat_model);
            if let Some(api_key) = &cli.groq_api_key {
                generator = generator.with_api_key(api_key);
            }

            let orchestrator = QueryOrchestrator::new(embedder, store, handle, generator);
            let result = if no_generate {
                orchestrator.retrieve(&question, top_k).await?
            } else {
                orchestrator.answer(&question, top_k).await?
            };

            if result.is_no_match() {
                println!("no matching chunks found for: {}", result.question);
                return Ok(());
            }

            for (position, found) in result.matches.iter().enumerate() {
                println!(
                    "[{}] score={:.4} source={}",
                    position + 1,
                    found.score,
                    found.source_id
                );
                println!("  {}", found.text);
            }

            match result.answer {
                Some(answer) => println!("\nanswer:\n{answer}"),
                None if no_generate => {}
                None => println!("\nanswer unavailable, see the matches above"),
            }
        }
    }

    Ok(())
}
