//! Embedding provider (§4.11 "embedding provider"): `generate_embedding`/
//! `generate_embeddings_batch`, splitting into batches by an estimated
//! token budget and preserving index alignment so a failed text yields
//! `None` rather than shifting later results (§7 "Embedding generation").

use super::error::LlmError;
use super::traits::Embedder;
use crate::config::Config;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Estimated tokens per character for Japanese-heavy text (§10.7).
const TOKENS_PER_CHAR: f64 = 2.5;

/// `OpenAiEmbedder` is the only embedding backend the core ships: the
/// reference system's candidate backends (local cross-encoder, on-device
/// model) are out of scope for the embedding concern specifically, unlike
/// the reranker which does ship a pluggable trait (§9 open question).
pub struct OpenAiEmbedder {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    dimensions: usize,
    batch_token_budget: usize,
}

impl OpenAiEmbedder {
    pub fn from_config(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.llm.openai_api_key.clone(),
            base_url: config.llm.openai_base_url.clone(),
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dimensions,
            batch_token_budget: config.embedding_batch_token_budget,
        }
    }

    fn estimate_tokens(text: &str) -> usize {
        (text.chars().count() as f64 * TOKENS_PER_CHAR).ceil() as usize
    }

    /// Splits `texts` into batches such that each batch's estimated token
    /// total stays within `batch_token_budget`. A single text that alone
    /// exceeds the budget still gets its own one-item batch.
    fn batch_by_token_budget(&self, texts: &[String]) -> Vec<Vec<usize>> {
        let mut batches = Vec::new();
        let mut current = Vec::new();
        let mut current_tokens = 0usize;
        for (idx, text) in texts.iter().enumerate() {
            let tokens = Self::estimate_tokens(text);
            if !current.is_empty() && current_tokens + tokens > self.batch_token_budget {
                batches.push(std::mem::take(&mut current));
                current_tokens = 0;
            }
            current.push(idx);
            current_tokens += tokens;
        }
        if !current.is_empty() {
            batches.push(current);
        }
        batches
    }

    async fn embed_raw_batch(&self, texts: &[String]) -> Result<Vec<Option<Vec<f32>>>> {
        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            input: &'a [String],
        }
        #[derive(Deserialize)]
        struct Response {
            data: Vec<EmbeddingData>,
        }
        #[derive(Deserialize)]
        struct EmbeddingData {
            embedding: Vec<f32>,
            index: usize,
        }

        let Some(api_key) = self.api_key.as_deref() else {
            return Err(crate::error::CoreError::NoEmbeddingBackend);
        };

        let url = format!("{}/v1/embeddings", self.base_url);
        let body = Request { model: &self.model, input: texts };

        let response = self.http.post(&url).bearer_auth(api_key).json(&body).send().await.map_err(LlmError::from)?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(%status, "embedding request failed, text batch degraded to None");
            return Ok(vec![None; texts.len()]);
        }

        let parsed: Response = response.json().await.map_err(LlmError::from)?;
        let mut out = vec![None; texts.len()];
        for item in parsed.data {
            if item.index < out.len() {
                out[item.index] = Some(item.embedding);
            }
        }
        Ok(out)
    }

    /// Generates embeddings for all `texts`, batching by token budget.
    /// A failed batch degrades every text in it to `None` rather than
    /// aborting the whole call.
    pub async fn generate_embeddings_batch(&self, texts: &[String]) -> Result<Vec<Option<Vec<f32>>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let batches = self.batch_by_token_budget(texts);
        let mut results = vec![None; texts.len()];
        for batch_indices in batches {
            let batch_texts: Vec<String> = batch_indices.iter().map(|&i| texts[i].clone()).collect();
            match self.embed_raw_batch(&batch_texts).await {
                Ok(embeddings) => {
                    for (offset, &original_idx) in batch_indices.iter().enumerate() {
                        results[original_idx] = embeddings.get(offset).cloned().flatten();
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "embedding batch call failed, leaving batch as None");
                }
            }
        }
        Ok(results)
    }

    pub async fn generate_embedding(&self, text: &str) -> Result<Option<Vec<f32>>> {
        let results = self.generate_embeddings_batch(std::slice::from_ref(&text.to_string())).await?;
        Ok(results.into_iter().next().flatten())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.generate_embedding(text)
            .await?
            .ok_or_else(|| crate::error::CoreError::Llm(LlmError::Unknown("embedding generation returned None".into())))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let results = self.generate_embeddings_batch(texts).await?;
        Ok(results.into_iter().map(|r| r.unwrap_or_default()).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder() -> OpenAiEmbedder {
        let mut config = Config::default();
        config.embedding_batch_token_budget = 100;
        OpenAiEmbedder::from_config(&config)
    }

    #[test]
    fn single_short_text_forms_one_batch() {
        let e = embedder();
        let texts = vec!["短いテキスト".to_string()];
        let batches = e.batch_by_token_budget(&texts);
        assert_eq!(batches.len(), 1);
    }

    #[test]
    fn long_batch_is_split_across_budget() {
        let e = embedder();
        let long_text = "あ".repeat(60);
        let texts = vec![long_text.clone(), long_text.clone(), long_text];
        let batches = e.batch_by_token_budget(&texts);
        assert!(batches.len() >= 2);
    }

    #[test]
    fn batching_preserves_all_indices_exactly_once() {
        let e = embedder();
        let texts: Vec<String> = (0..10).map(|i| format!("テキスト{i}")).collect();
        let batches = e.batch_by_token_budget(&texts);
        let mut seen: Vec<usize> = batches.into_iter().flatten().collect();
        seen.sort();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }
}
