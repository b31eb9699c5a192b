//! LLM reranker backend (C10): JSON-schema output scoring the top-20
//! candidates 0-100; failure returns the original order unchanged, never
//! raises (§4.10).

use super::gateway::Gateway;
use super::traits::{RerankDocument, RerankResult, Reranker};
use crate::config::Feature;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

const MAX_CANDIDATES: usize = 20;
const MAX_TEXT_CHARS: usize = 400;

pub struct LlmReranker {
    gateway: Arc<Gateway>,
    model_name: String,
}

impl LlmReranker {
    pub fn new(gateway: Arc<Gateway>, model_name: String) -> Self {
        Self { gateway, model_name }
    }
}

#[async_trait]
impl Reranker for LlmReranker {
    async fn rerank(&self, query: &str, documents: &[RerankDocument], top_k: usize) -> Result<Vec<RerankResult>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let candidates: Vec<&RerankDocument> = documents.iter().take(MAX_CANDIDATES).collect();
        let prompt = build_prompt(query, &candidates);

        let system = "You are a document relevance scorer. Score each document's relevance to the query \
                      from 0 to 100. Output only valid JSON.";

        let response = self.gateway.call_llm_with_error(system, &prompt, Feature::Rerank, true).await;

        let scored: Vec<RerankResult> = match response.data.as_ref().and_then(|v| v["ranked"].as_array()) {
            Some(ranked) => ranked
                .iter()
                .filter_map(|item| {
                    let id = item["id"].as_str()?.to_string();
                    let score = item["score"].as_f64()?;
                    Some(RerankResult { id, score: score / 100.0 })
                })
                .collect(),
            None => {
                tracing::warn!("LLM rerank failed or returned no ranked array, preserving original order");
                documents.iter().enumerate().map(|(idx, doc)| RerankResult { id: doc.id.clone(), score: 1.0 - idx as f64 * 0.001 }).collect()
            }
        };

        let mut ranked = scored;
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(top_k);
        Ok(ranked)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn build_prompt(query: &str, documents: &[&RerankDocument]) -> String {
    let mut prompt = format!("Query: \"{query}\"\n\nDocuments:\n");
    for doc in documents {
        let text: String = doc.text.chars().take(MAX_TEXT_CHARS).collect();
        prompt.push_str(&format!("\nID: {}\nText: {}\n", doc.id, text));
    }
    prompt.push_str(
        "\nOutput JSON: {\"ranked\": [{\"id\": \"...\", \"score\": 0-100}, ...]}\n\
         Score every document. Output only JSON:",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_truncates_long_document_text() {
        let doc = RerankDocument { id: "1".into(), text: "a".repeat(1000) };
        let prompt = build_prompt("query", &[&doc]);
        assert!(prompt.len() < 1000 + 200);
    }
}
