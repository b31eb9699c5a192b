//! Configuration management: file-then-environment layering.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Which LLM feature a call belongs to, used for model routing and
/// timeout-tier selection (§4.11, §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    QueryExpansion,
    Hyde,
    Rerank,
    Classify,
    /// User-facing features outside the core; included so the timeout-tier
    /// table has a foreground entry even though the core never issues these.
    Foreground,
}

impl Feature {
    /// RAG features get the short timeout tier; foreground features get the long one.
    pub fn is_rag(&self) -> bool {
        !matches!(self, Feature::Foreground)
    }
}

/// Provider + model selected for a feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRoute {
    pub provider: String,
    pub model: String,
}

/// Main configuration structure for the retrieval core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Embedding model name.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Expected embedding dimensionality; used to detect incompatible
    /// embeddings before MMR (§9 "MMR embedding compatibility").
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    /// Maximum input characters per embedding call before chunk splitting.
    #[serde(default = "default_embedding_max_input_chars")]
    pub embedding_max_input_chars: usize,

    /// Token budget per embedding batch (§10.7).
    #[serde(default = "default_embedding_batch_token_budget")]
    pub embedding_batch_token_budget: usize,

    /// Dense-search weight in the hybrid score (re-normalized with `keyword_weight`).
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f64,

    /// BM25 weight in the hybrid score.
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f64,

    /// Rerank-gate "already confident" threshold (§4.9 step 9).
    #[serde(default = "default_rerank_threshold")]
    pub rerank_threshold: f64,

    /// MMR diversification lambda.
    #[serde(default = "default_mmr_lambda")]
    pub mmr_lambda: f64,

    /// Floor for `fetch_k` (actual value is `max(fetch_k_floor, 3*n_results)`).
    #[serde(default = "default_fetch_k_floor")]
    pub fetch_k_floor: usize,

    /// Cap on LLM-generated query expansions.
    #[serde(default = "default_max_queries")]
    pub max_queries: usize,

    /// Cap on the total query set (original + expansions + HyDE).
    #[serde(default = "default_max_total_queries")]
    pub max_total_queries: usize,

    /// RAG-feature LLM timeout (expansion, HyDE, rerank, classify).
    #[serde(default = "default_rag_timeout_secs")]
    pub rag_timeout_secs: u64,

    /// Foreground-feature LLM timeout.
    #[serde(default = "default_foreground_timeout_secs")]
    pub foreground_timeout_secs: u64,

    /// Per-feature provider/model overrides.
    #[serde(default = "default_feature_routes")]
    pub feature_routes: HashMap<Feature, ModelRoute>,

    /// Root directory for persisted state (`<data_root>/bm25`, `<data_root>/vectors`).
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    /// Path to the company mapping JSON file (§6).
    #[serde(default)]
    pub company_mapping_path: Option<PathBuf>,

    /// LLM provider connection settings.
    #[serde(default)]
    pub llm: LlmProvidersConfig,
}

/// Connection settings for the two supported LLM providers.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmProvidersConfig {
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_anthropic_base_url")]
    pub anthropic_base_url: String,
}

fn default_openai_base_url() -> String {
    std::env::var("JOBCOMPASS_OPENAI_BASE_URL")
        .unwrap_or_else(|_| "https://api.openai.com".to_string())
}

fn default_anthropic_base_url() -> String {
    std::env::var("JOBCOMPASS_ANTHROPIC_BASE_URL")
        .unwrap_or_else(|_| "https://api.anthropic.com".to_string())
}

fn default_embedding_model() -> String {
    std::env::var("JOBCOMPASS_EMBEDDING_MODEL").unwrap_or_else(|_| "text-embedding-3-small".into())
}

fn default_embedding_dimensions() -> usize {
    std::env::var("JOBCOMPASS_EMBEDDING_DIMS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1536)
}

fn default_embedding_max_input_chars() -> usize {
    std::env::var("JOBCOMPASS_EMBEDDING_MAX_INPUT_CHARS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8000)
}

fn default_embedding_batch_token_budget() -> usize {
    250_000
}

fn default_semantic_weight() -> f64 {
    std::env::var("JOBCOMPASS_RAG_SEMANTIC_WEIGHT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.6)
}

fn default_keyword_weight() -> f64 {
    std::env::var("JOBCOMPASS_RAG_KEYWORD_WEIGHT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.4)
}

fn default_rerank_threshold() -> f64 {
    std::env::var("JOBCOMPASS_RAG_RERANK_THRESHOLD")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.7)
}

fn default_mmr_lambda() -> f64 {
    std::env::var("JOBCOMPASS_RAG_MMR_LAMBDA")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.5)
}

fn default_fetch_k_floor() -> usize {
    std::env::var("JOBCOMPASS_RAG_FETCH_K")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30)
}

fn default_max_queries() -> usize {
    std::env::var("JOBCOMPASS_RAG_MAX_QUERIES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3)
}

fn default_max_total_queries() -> usize {
    std::env::var("JOBCOMPASS_RAG_MAX_TOTAL_QUERIES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(4)
}

fn default_rag_timeout_secs() -> u64 {
    std::env::var("JOBCOMPASS_LLM_TIMEOUT_RAG_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(20)
}

fn default_foreground_timeout_secs() -> u64 {
    std::env::var("JOBCOMPASS_LLM_TIMEOUT_FOREGROUND_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(90)
}

fn default_feature_routes() -> HashMap<Feature, ModelRoute> {
    let mut m = HashMap::new();
    m.insert(
        Feature::QueryExpansion,
        ModelRoute {
            provider: "openai".into(),
            model: "gpt-5-nano".into(),
        },
    );
    m.insert(
        Feature::Hyde,
        ModelRoute {
            provider: "openai".into(),
            model: "gpt-5-nano".into(),
        },
    );
    m.insert(
        Feature::Classify,
        ModelRoute {
            provider: "openai".into(),
            model: "gpt-5-mini".into(),
        },
    );
    m.insert(
        Feature::Rerank,
        ModelRoute {
            provider: "anthropic".into(),
            model: "claude-haiku".into(),
        },
    );
    m
}

fn default_data_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(crate::DATA_DIR_NAME)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
            embedding_max_input_chars: default_embedding_max_input_chars(),
            embedding_batch_token_budget: default_embedding_batch_token_budget(),
            semantic_weight: default_semantic_weight(),
            keyword_weight: default_keyword_weight(),
            rerank_threshold: default_rerank_threshold(),
            mmr_lambda: default_mmr_lambda(),
            fetch_k_floor: default_fetch_k_floor(),
            max_queries: default_max_queries(),
            max_total_queries: default_max_total_queries(),
            rag_timeout_secs: default_rag_timeout_secs(),
            foreground_timeout_secs: default_foreground_timeout_secs(),
            feature_routes: default_feature_routes(),
            data_root: default_data_root(),
            company_mapping_path: std::env::var("JOBCOMPASS_COMPANY_MAPPING_PATH")
                .ok()
                .map(PathBuf::from),
            llm: LlmProvidersConfig {
                openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
                anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
                openai_base_url: default_openai_base_url(),
                anthropic_base_url: default_anthropic_base_url(),
            },
        }
    }
}

impl Config {
    /// Load from an optional YAML file, then apply environment overrides.
    /// Missing file is not an error: defaults (themselves env-aware) apply.
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        let mut config = match path.or_else(|| None) {
            Some(p) if p.exists() => {
                let content = std::fs::read_to_string(p)?;
                serde_yaml::from_str(&content)?
            }
            _ => Config::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Save config to a YAML file.
    pub fn save(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.semantic_weight + self.keyword_weight <= 0.0 {
            return Err(crate::error::CoreError::Config(
                "semantic_weight + keyword_weight must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mmr_lambda) {
            return Err(crate::error::CoreError::Config(
                "mmr_lambda must be in [0, 1]".into(),
            ));
        }
        Ok(())
    }

    /// Normalized `(semantic_weight, keyword_weight)` so they sum to 1.
    pub fn normalized_weights(&self) -> (f64, f64) {
        let total = self.semantic_weight + self.keyword_weight;
        (self.semantic_weight / total, self.keyword_weight / total)
    }

    pub fn rag_timeout(&self) -> Duration {
        Duration::from_secs(self.rag_timeout_secs)
    }

    pub fn foreground_timeout(&self) -> Duration {
        Duration::from_secs(self.foreground_timeout_secs)
    }

    pub fn bm25_dir(&self) -> PathBuf {
        self.data_root.join("bm25")
    }

    pub fn vector_dir(&self) -> PathBuf {
        self.data_root.join("vectors")
    }
}
