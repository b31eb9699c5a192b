//! Query expansion / HyDE (C8): LLM-driven paraphrases and a hypothetical
//! passage, both cached (§4.8, I8).

use super::cache::{CachedExpansion, ExpansionCache};
use super::gateway::Gateway;
use super::traits::QueryExpander;
use crate::config::Feature;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

const EXPANSION_MIN_CHARS: usize = 5;
const EXPANSION_MAX_CHARS: usize = 1200;
const SHORT_QUERY_CHARS: usize = 10;
const HYDE_MAX_INPUT_CHARS: usize = 600;
const HYDE_HARD_CAP_CHARS: usize = 1200;
const MAX_EXPANSIONS: usize = 5;

pub struct LlmQueryExpander {
    gateway: Arc<Gateway>,
    cache: Arc<ExpansionCache>,
    model_name: String,
}

impl LlmQueryExpander {
    pub fn new(gateway: Arc<Gateway>, cache: Arc<ExpansionCache>, model_name: String) -> Self {
        Self { gateway, cache, model_name }
    }

    fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        items
            .into_iter()
            .filter(|item| seen.insert(item.to_lowercase()))
            .collect()
    }

    async fn generate_expansions(&self, query: &str) -> Vec<String> {
        let char_count = query.chars().count();
        let system = if char_count < SHORT_QUERY_CHARS {
            "Generate up to 3 short related search query variants as JSON: {\"queries\": [\"...\"]}."
        } else {
            "Generate up to 5 paraphrases or broadenings of this search query, suitable for a hybrid \
             keyword+vector search over Japanese corporate recruitment content. Output JSON: \
             {\"queries\": [\"...\"]}."
        };

        let response = self.gateway.call_llm_with_error(system, query, Feature::QueryExpansion, true).await;
        let queries: Vec<String> = response
            .data
            .as_ref()
            .and_then(|v| v["queries"].as_array())
            .map(|arr| arr.iter().filter_map(|q| q.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        Self::dedup_preserving_order(queries).into_iter().take(MAX_EXPANSIONS).collect()
    }

    async fn generate_hyde(&self, query: &str) -> Option<String> {
        let system = "Write a single plausible passage (300-500 Japanese characters, hard cap 1200) that \
                      could appear on a company's recruitment or business page relevant to this query. \
                      First-person corporate voice. Output JSON: {\"passage\": \"...\"}.";

        let response = self.gateway.call_llm_with_error(system, query, Feature::Hyde, true).await;
        let passage = response.data.as_ref().and_then(|v| v["passage"].as_str()).map(str::to_string)?;
        let truncated: String = passage.chars().take(HYDE_HARD_CAP_CHARS).collect();
        Some(truncated)
    }
}

#[async_trait]
impl QueryExpander for LlmQueryExpander {
    async fn expand(&self, query: &str) -> Result<Vec<String>> {
        let char_count = query.chars().count();
        if !(EXPANSION_MIN_CHARS..=EXPANSION_MAX_CHARS).contains(&char_count) {
            return Ok(Vec::new());
        }

        if let Some(cached) = self.cache.get(query) {
            if !cached.expansions.is_empty() {
                return Ok(cached.expansions);
            }
        }

        let expansions = self.generate_expansions(query).await;
        let existing_hyde = self.cache.get(query).and_then(|c| c.hyde);
        self.cache.put(query, CachedExpansion { expansions: expansions.clone(), hyde: existing_hyde });
        Ok(expansions)
    }

    async fn hyde(&self, query: &str) -> Result<Option<String>> {
        if query.chars().count() > HYDE_MAX_INPUT_CHARS {
            return Ok(None);
        }

        if let Some(cached) = self.cache.get(query) {
            if cached.hyde.is_some() {
                return Ok(cached.hyde);
            }
        }

        let hyde = self.generate_hyde(query).await;
        let existing_expansions = self.cache.get(query).map(|c| c.expansions).unwrap_or_default();
        self.cache.put(query, CachedExpansion { expansions: existing_expansions, hyde: hyde.clone() });
        Ok(hyde)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_preserves_first_occurrence_order() {
        let items = vec!["A".to_string(), "b".to_string(), "a".to_string()];
        let deduped = LlmQueryExpander::dedup_preserving_order(items);
        assert_eq!(deduped, vec!["A".to_string(), "b".to_string()]);
    }
}
