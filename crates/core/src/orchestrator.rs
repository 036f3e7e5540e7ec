use crate::embedder::EmbeddingClient;
use crate::error::QueryError;
use crate::models::{CollectionHandle, QueryResult, RetrievedMatch};
use crate::traits::{EmbeddingProvider, Generator, VectorStore};
use tracing::{info, warn};

pub const DEFAULT_TOP_K: usize = 5;

const SYSTEM_PROMPT: &str = "You are an assistant that answers user questions using only the \
provided context. If not enough information is present, say you don't know and provide guidance.";

pub struct QueryOrchestrator<P, S, G>
where
    P: EmbeddingProvider,
    S: VectorStore,
    G: Generator,
{
    embedder: EmbeddingClient<P>,
    store: S,
    handle: CollectionHandle,
    generator: G,
}

impl<P, S, G> QueryOrchestrator<P, S, G>
where
    P: EmbeddingProvider + Send + Sync,
    S: VectorStore + Send + Sync,
    G: Generator + Send + Sync,
{
    pub fn new(embedder: EmbeddingClient<P>, store: S, handle: CollectionHandle, generator: G) -> Self {
        Self {
            embedder,
            store,
            handle,
            generator,
        }
    }

    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<QueryResult, QueryError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QueryError::InvalidInput(
                "question must not be blank".to_string(),
            ));
        }

        let top_k = top_k.max(1);
        let query_vector = self.embedder.embed(question).await?;
        let matches = self.store.search(&self.handle, &query_vector, top_k).await?;

        if matches.is_empty() {
            info!(question, "no chunks matched the question");
        }

        Ok(QueryResult {
            question: question.to_string(),
            matches,
            answer: None,
        })
    }

    pub async fn answer(&self, question: &str, top_k: usize) -> Result<QueryResult, QueryError> {
        let mut result = self.retrieve(question, top_k).await?;
        if result.is_no_match() {
            return Ok(result);
        }

        let context = build_context(&result.matches);
        let user_prompt = build_user_prompt(&context, &result.question);

        result.answer = match self.generator.complete(SYSTEM_PROMPT, &user_prompt).await {
            Ok(answer) => Some(answer),
            Err(error) => {
                warn!(
                    generator = self.generator.name(),
                    error = %error,
                    "generation failed, returning matches only"
                );
                None
            }
        };

        Ok(result)
    }
}

fn build_context(matches: &[RetrievedMatch]) -> String {
    matches
        .iter()
        .enumerate()
        .map(|(position, found)| format!("Chunk {}:\n{}", position + 1, found.text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

fn build_user_prompt(context: &str, question: &str) -> String {
    format!(
        "Context:\n{context}\n\nQuestion: {question}\n\nAnswer concisely, cite the chunk numbers if used."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::EmbedOptions;
    use crate::error::{EmbedError, GenerationError, IndexError};
    use crate::ingest::{IndexingPipeline, IngestOptions};
    use crate::models::{DistanceMetric, Document, IndexEntry};
    use crate::providers::NgramProvider;
    use crate::stores::MemoryStore;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn fast_options() -> EmbedOptions {
        EmbedOptions {
            max_attempts: 1,
            backoff_base: Duration::ZERO,
            throttle: Duration::ZERO,
        }
    }

    fn handle() -> CollectionHandle {
        CollectionHandle {
            name: "docs".to_string(),
            dimension: 4,
            metric: DistanceMetric::Cosine,
        }
    }

    fn match_with(text: &str) -> RetrievedMatch {
        RetrievedMatch {
            text: text.to_string(),
            score: 0.9,
            source_id: "doc-1".to_string(),
        }
    }

    struct StubProvider {
        dimensions: usize,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl EmbeddingProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn fetch_embedding(&self, _text: &str) -> Result<Value, EmbedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!(vec![0.5f32; self.dimensions]))
        }
    }

    struct BrokenProvider;

    #[async_trait]
    impl EmbeddingProvider for BrokenProvider {
        fn name(&self) -> &str {
            "broken"
        }

        async fn fetch_embedding(&self, _text: &str) -> Result<Value, EmbedError> {
            Err(EmbedError::MalformedPayload {
                provider: "broken".to_string(),
                details: "scripted failure".to_string(),
            })
        }
    }

    struct FakeStore {
        hits: Vec<RetrievedMatch>,
        requested_top_k: Arc<AtomicUsize>,
    }

    impl FakeStore {
        fn with_hits(hits: Vec<RetrievedMatch>) -> Self {
            Self {
                hits,
                requested_top_k: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl VectorStore for FakeStore {
        fn metric(&self) -> DistanceMetric {
            DistanceMetric::Cosine
        }

        async fn ensure_collection(
            &self,
            name: &str,
            dimension: usize,
        ) -> Result<CollectionHandle, IndexError> {
            Ok(CollectionHandle {
                name: name.to_string(),
                dimension,
                metric: DistanceMetric::Cosine,
            })
        }

        async fn insert(
            &self,
            _handle: &CollectionHandle,
            entries: &[IndexEntry],
        ) -> Result<usize, IndexError> {
            Ok(entries.len())
        }

        async fn search(
            &self,
            _handle: &CollectionHandle,
            _query: &[f32],
            top_k: usize,
        ) -> Result<Vec<RetrievedMatch>, IndexError> {
            self.requested_top_k.store(top_k, Ordering::SeqCst);
            Ok(self.hits.clone())
        }
    }

    struct FakeGenerator {
        reply: Option<String>,
        calls: Arc<AtomicU32>,
    }

    impl FakeGenerator {
        fn always(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                calls: Arc::default(),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                calls: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl Generator for FakeGenerator {
        fn name(&self) -> &str {
            "fake"
        }

        async fn complete(&self, _system: &str, _user: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Err(GenerationError::EmptyResponse {
                    provider: "fake".to_string(),
                }),
            }
        }
    }

    struct RecordingGenerator {
        prompts: Arc<Mutex<Vec<(String, String)>>>,
    }

    #[async_trait]
    impl Generator for RecordingGenerator {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError> {
            self.prompts
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string()));
            Ok("stub answer".to_string())
        }
    }

    fn stub_embedder(calls: Arc<AtomicU32>) -> EmbeddingClient<StubProvider> {
        EmbeddingClient::with_options(
            StubProvider {
                dimensions: 4,
                calls,
            },
            4,
            fast_options(),
        )
    }

    #[test]
    fn context_labels_chunks_starting_at_one() {
        let context = build_context(&[match_with("first text"), match_with("second text")]);

        assert_eq!(
            context,
            "Chunk 1:\nfirst text\n\n---\n\nChunk 2:\nsecond text"
        );
    }

    #[tokio::test]
    async fn a_blank_question_fails_before_any_backend_call() {
        let embed_calls = Arc::new(AtomicU32::new(0));
        let generator = FakeGenerator::always("unused");
        let generator_calls = generator.calls.clone();
        let orchestrator = QueryOrchestrator::new(
            stub_embedder(embed_calls.clone()),
            FakeStore::with_hits(vec![match_with("text")]),
            handle(),
            generator,
        );

        let error = orchestrator.answer("   \n ", 5).await.expect_err("blank question");

        assert!(matches!(error, QueryError::InvalidInput(_)));
        assert_eq!(embed_calls.load(Ordering::SeqCst), 0);
        assert_eq!(generator_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_matches_skip_generation_entirely() {
        let generator = FakeGenerator::always("unused");
        let generator_calls = generator.calls.clone();
        let orchestrator = QueryOrchestrator::new(
            stub_embedder(Arc::default()),
            FakeStore::with_hits(Vec::new()),
            handle(),
            generator,
        );

        let result = orchestrator.answer("anything?", 5).await.unwrap();

        assert!(result.is_no_match());
        assert!(result.answer.is_none());
        assert_eq!(generator_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn generation_failure_degrades_to_matches_only() {
        let orchestrator = QueryOrchestrator::new(
            stub_embedder(Arc::default()),
            FakeStore::with_hits(vec![match_with("first"), match_with("second")]),
            handle(),
            FakeGenerator::failing(),
        );

        let result = orchestrator.answer("what happened?", 5).await.unwrap();

        assert_eq!(result.matches.len(), 2);
        assert!(result.answer.is_none());
        assert!(!result.is_no_match());
    }

    #[tokio::test]
    async fn prompts_carry_the_labeled_context_and_question() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let orchestrator = QueryOrchestrator::new(
            stub_embedder(Arc::default()),
            FakeStore::with_hits(vec![match_with("alpha facts"), match_with("beta facts")]),
            handle(),
            RecordingGenerator {
                prompts: prompts.clone(),
            },
        );

        let result = orchestrator.answer("what is alpha?", 5).await.unwrap();

        assert_eq!(result.answer.as_deref(), Some("stub answer"));
        let recorded = prompts.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        let (system, user) = &recorded[0];
        assert!(system.contains("using only the provided context"));
        assert!(user.contains("Chunk 1:\nalpha facts"));
        assert!(user.contains("Chunk 2:\nbeta facts"));
        assert!(user.contains("\n\n---\n\n"));
        assert!(user.contains("Question: what is alpha?"));
    }

    #[tokio::test]
    async fn an_embedding_failure_is_fatal() {
        let orchestrator = QueryOrchestrator::new(
            EmbeddingClient::with_options(BrokenProvider, 4, fast_options()),
            FakeStore::with_hits(vec![match_with("text")]),
            handle(),
            FakeGenerator::always("unused"),
        );

        let error = orchestrator.answer("anything?", 5).await.expect_err("embedding broke");

        assert!(matches!(error, QueryError::Embed(_)));
    }

    #[tokio::test]
    async fn retrieve_returns_matches_without_calling_the_generator() {
        let generator = FakeGenerator::always("unused");
        let generator_calls = generator.calls.clone();
        let orchestrator = QueryOrchestrator::new(
            stub_embedder(Arc::default()),
            FakeStore::with_hits(vec![match_with("first"), match_with("second")]),
            handle(),
            generator,
        );

        let result = orchestrator.retrieve("what happened?", 5).await.unwrap();

        assert_eq!(result.matches.len(), 2);
        assert!(result.answer.is_none());
        assert_eq!(generator_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn a_top_k_of_zero_is_clamped_to_one() {
        let store = FakeStore::with_hits(vec![match_with("text")]);
        let requested = store.requested_top_k.clone();
        let orchestrator = QueryOrchestrator::new(
            stub_embedder(Arc::default()),
            store,
            handle(),
            FakeGenerator::always("answer"),
        );

        orchestrator.answer("anything?", 0).await.unwrap();

        assert_eq!(requested.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ingested_documents_are_answerable_end_to_end() {
        let store = MemoryStore::new();
        let shared = store.ensure_collection("docs", 16).await.unwrap();
        let pipeline = IndexingPipeline::with_options(
            EmbeddingClient::with_options(NgramProvider::new(16), 16, fast_options()),
            store.clone(),
            shared.clone(),
            IngestOptions {
                chunk_max_chars: 20,
                max_embed_chars: 8_000,
            },
        );
        pipeline
            .ingest(&Document::new(
                "doc-1",
                "The quick brown fox. It jumped over the lazy dog.",
            ))
            .await
            .unwrap();

        let orchestrator = QueryOrchestrator::new(
            EmbeddingClient::with_options(NgramProvider::new(16), 16, fast_options()),
            store,
            shared,
            FakeGenerator::always("The fox jumped over the dog."),
        );

        let result = orchestrator.answer("What did the fox do?", 2).await.unwrap();

        assert_eq!(result.matches.len(), 2);
        assert_eq!(result.answer.as_deref(), Some("The fox jumped over the dog."));
        assert!(!result.is_no_match());
    }
}
