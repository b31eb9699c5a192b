//! LLM trait definitions

use async_trait::async_trait;
use crate::error::Result;

/// Embedding generation trait
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for batch of texts
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Document reranking trait. Both the cross-encoder and LLM backends
/// expose this same shape (§4.10).
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Rerank documents for a query, returning at most `top_k` results.
    async fn rerank(&self, query: &str, documents: &[RerankDocument], top_k: usize) -> Result<Vec<RerankResult>>;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Document for reranking
#[derive(Debug, Clone)]
pub struct RerankDocument {
    pub id: String,
    pub text: String,
}

/// Reranking result
#[derive(Debug, Clone)]
pub struct RerankResult {
    pub id: String,
    pub score: f64,
}

/// Query expansion and HyDE trait (§4.8). Kept as two narrow calls rather
/// than one combined struct so the orchestrator can fire them independently
/// and degrade each on its own.
#[async_trait]
pub trait QueryExpander: Send + Sync {
    /// Produce up to a handful of paraphrases/broadenings of `query`.
    async fn expand(&self, query: &str) -> Result<Vec<String>>;

    /// Produce a hypothetical passage for `query`, or `None` if ineligible
    /// or generation failed.
    async fn hyde(&self, query: &str) -> Result<Option<String>>;

    /// Get model name
    fn model_name(&self) -> &str;
}
