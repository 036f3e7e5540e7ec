pub mod chunking;
pub mod embedder;
pub mod error;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod providers;
pub mod stores;
pub mod traits;

pub use chunking::{chunk_text, DEFAULT_CHUNK_MAX_CHARS};
pub use embedder::{EmbedOptions, EmbeddingClient, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{EmbedError, GenerationError, IndexError, IngestError, QueryError};
pub use ingest::{
    discover_text_files, document_id_for_path, FolderReport, IndexingPipeline, IngestOptions,
    IngestReport, SkippedChunk, SkippedFile, DEFAULT_MAX_EMBED_CHARS,
};
pub use models::{
    derive_entry_id, Chunk, CollectionHandle, DistanceMetric, Document, IndexEntry, QueryResult,
    RetrievedMatch,
};
pub use orchestrator::{QueryOrchestrator, DEFAULT_TOP_K};
pub use providers::{
    GroqGenerator, HuggingFaceEmbeddings, NgramProvider, DEFAULT_CHAT_MODEL, DEFAULT_EMBED_MODEL,
    DEFAULT_GROQ_ENDPOINT, DEFAULT_HF_ENDPOINT,
};
pub use stores::{MemoryStore, QdrantStore};
pub use traits::{EmbeddingProvider, Generator, VectorStore};
