//! jobcompass-core
//!
//! Company-aware hybrid retrieval and ranking core for a job-hunting
//! assistant's corporate RAG pipeline.
//!
//! # Modules
//! - Company identity resolution from a structured domain-pattern mapping
//! - Pure in-memory BM25 keyword search alongside a SQLite-BLOB vector store
//! - LLM-backed query expansion, HyDE, reranking and content classification
//!   behind a single feature-routed gateway
//! - Reciprocal Rank Fusion + MMR + BM25 hybrid merge orchestration
//! - A domain-aware web search result scorer

pub mod classify;
pub mod company;
pub mod config;
pub mod content_types;
pub mod error;
pub mod intent;
pub mod keyword;
pub mod llm;
pub mod retrieval;
pub mod tokenizer;
pub mod vector;
pub mod websearch;

pub use classify::{ClassifyInput, Classifier};
pub use company::mapping::{CompanyEntry, CompanyMapping};
pub use company::{registry_from_config, Registry};
pub use config::{Config, Feature, ModelRoute};
pub use content_types::{
    expand_content_type_filter, legacy_to_new, new_to_legacy, normalize_content_type, CONTENT_TYPES_NEW,
};
pub use error::{CoreError, Error, Result};
pub use intent::{classify_query_intent, QueryIntent};
pub use keyword::{keyword_store_from_config, BM25Index, KeywordStore};
pub use llm::{gateway_from_config, Embedder, Gateway, QueryExpander, RerankDocument, RerankResult, Reranker};
pub use retrieval::{Orchestrator, RetrievalParams, RetrievalResult};
pub use tokenizer::FallbackTokenizer;
pub use vector::{vector_store_from_config, IngestChunk, RetrievedChunk, VectorStore};
pub use websearch::{score_result, Confidence, ScoreMode, ScoredResult, SearchResult, SourceType};

/// Default data directory name under the OS data dir (`<data_dir>/jobcompass`).
pub const DATA_DIR_NAME: &str = "jobcompass";
