//! LLM integration: embedding generation, reranking, query expansion/HyDE,
//! and the feature-routed gateway they all sit behind (C8, C10, C11).

mod cache;
mod circuit_breaker;
mod embedder;
mod error;
mod expander;
mod gateway;
mod json_repair;
mod reranker;
mod traits;

pub use cache::{CachedExpansion, ExpansionCache};
pub use circuit_breaker::CircuitBreaker;
pub use embedder::OpenAiEmbedder;
pub use error::LlmError;
pub use expander::LlmQueryExpander;
pub use gateway::{gateway_from_config, Gateway, LlmResponse};
pub use reranker::LlmReranker;
pub use traits::{Embedder, QueryExpander, RerankDocument, Reranker, RerankResult};
