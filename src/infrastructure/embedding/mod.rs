//! Embedding infrastructure - OpenAI embedding provider

mod openai;

pub use openai::OpenAiEmbeddingProvider;
