use crate::chunking::{chunk_text, DEFAULT_CHUNK_MAX_CHARS};
use crate::embedder::EmbeddingClient;
use crate::error::IngestError;
use crate::models::{CollectionHandle, Document, IndexEntry};
use crate::traits::{EmbeddingProvider, VectorStore};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

pub const DEFAULT_MAX_EMBED_CHARS: usize = 8_000;

#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    pub chunk_max_chars: usize,
    pub max_embed_chars: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            chunk_max_chars: DEFAULT_CHUNK_MAX_CHARS,
            max_embed_chars: DEFAULT_MAX_EMBED_CHARS,
        }
    }
}

#[derive(Debug)]
pub struct SkippedChunk {
    pub ordinal: u32,
    pub reason: String,
}

#[derive(Debug)]
pub struct IngestReport {
    pub inserted: usize,
    pub skipped: Vec<SkippedChunk>,
}

#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug)]
pub struct FolderReport {
    pub inserted: usize,
    pub skipped_chunks: usize,
    pub skipped_files: Vec<SkippedFile>,
}

pub struct IndexingPipeline<P, S>
where
    P: EmbeddingProvider,
    S: VectorStore,
{
    embedder: EmbeddingClient<P>,
    store: S,
    handle: CollectionHandle,
    options: IngestOptions,
}

impl<P, S> IndexingPipeline<P, S>
where
    P: EmbeddingProvider + Send + Sync,
    S: VectorStore + Send + Sync,
{
    pub fn new(embedder: EmbeddingClient<P>, store: S, handle: CollectionHandle) -> Self {
        Self::with_options(embedder, store, handle, IngestOptions::default())
    }

    pub fn with_options(
        embedder: EmbeddingClient<P>,
        store: S,
        handle: CollectionHandle,
        options: IngestOptions,
    ) -> Self {
        Self {
            embedder,
            store,
            handle,
            options,
        }
    }

    pub async fn ingest(&self, document: &Document) -> Result<IngestReport, IngestError> {
        self.ingest_document(&document.id, &document.text).await
    }

    pub async fn ingest_document(
        &self,
        document_id: &str,
        text: &str,
    ) -> Result<IngestReport, IngestError> {
        if document_id.trim().is_empty() {
            return Err(IngestError::InvalidInput(
                "document id must not be blank".to_string(),
            ));
        }

        let chunks = chunk_text(text, self.options.chunk_max_chars);
        if chunks.is_empty() {
            info!(document_id, "document produced no chunks");
            return Ok(IngestReport {
                inserted: 0,
                skipped: Vec::new(),
            });
        }

        let mut skipped = Vec::new();
        let mut survivors = Vec::new();
        for chunk in chunks {
            let length = chunk.text.chars().count();
            if length > self.options.max_embed_chars {
                warn!(
                    document_id,
                    ordinal = chunk.ordinal,
                    length,
                    "chunk exceeds the embedding size limit"
                );
                skipped.push(SkippedChunk {
                    ordinal: chunk.ordinal,
                    reason: format!(
                        "chunk of {} chars exceeds the {}-char embedding limit",
                        length, self.options.max_embed_chars
                    ),
                });
            } else {
                survivors.push(chunk);
            }
        }

        if survivors.is_empty() {
            return Ok(IngestReport {
                inserted: 0,
                skipped,
            });
        }

        let texts: Vec<String> = survivors.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let entries: Vec<IndexEntry> = survivors
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                IndexEntry::new(document_id, chunk.ordinal, chunk.text, embedding)
            })
            .collect();

        let inserted = self.store.insert(&self.handle, &entries).await?;
        info!(
            document_id,
            inserted,
            skipped = skipped.len(),
            "document indexed"
        );

        Ok(IngestReport { inserted, skipped })
    }

    pub async fn ingest_folder(&self, folder: &Path) -> Result<FolderReport, IngestError> {
        let files = discover_text_files(folder);
        if files.is_empty() {
            return Err(IngestError::InvalidInput(format!(
                "no .txt or .md files found in {}",
                folder.display()
            )));
        }

        let mut inserted = 0;
        let mut skipped_chunks = 0;
        let mut skipped_files = Vec::new();
        for path in files {
            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(error) => {
                    skipped_files.push(SkippedFile {
                        path,
                        reason: error.to_string(),
                    });
                    continue;
                }
            };

            let report = self
                .ingest_document(&document_id_for_path(&path), &text)
                .await?;
            inserted += report.inserted;
            skipped_chunks += report.skipped.len();
        }

        Ok(FolderReport {
            inserted,
            skipped_chunks,
            skipped_files,
        })
    }
}

pub fn discover_text_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_text = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt") || ext.eq_ignore_ascii_case("md"));

        if is_text {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn document_id_for_path(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}
