pub mod groq;
pub mod huggingface;
pub mod ngram;

pub use groq::{GroqGenerator, DEFAULT_CHAT_MODEL, DEFAULT_GROQ_ENDPOINT};
pub use huggingface::{HuggingFaceEmbeddings, DEFAULT_EMBED_MODEL, DEFAULT_HF_ENDPOINT};
pub use ngram::NgramProvider;
