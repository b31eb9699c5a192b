//! Hybrid Retrieval Orchestrator (C9): multi-query fan-out, RRF fusion,
//! optional MMR diversification, BM25 hybrid merge, content-type boost, and
//! a confidence-gated rerank pass (§4.9).

use crate::config::Config;
use crate::error::Result;
use crate::intent::classify_query_intent;
use crate::keyword::KeywordStore;
use crate::llm::{Embedder, QueryExpander, RerankDocument, Reranker};
use crate::vector::{RetrievedChunk, VectorStore};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;

mod boost;
mod mmr;
mod rrf;

pub use boost::boost_table_for;

/// Parameters for one `dense_hybrid_search` call, defaulted from `Config`
/// and the caller's `n_results` (§4.9 entry-point signature).
#[derive(Debug, Clone)]
pub struct RetrievalParams {
    pub n_results: usize,
    pub content_types: Option<Vec<String>>,
    pub expand_queries: bool,
    pub use_hyde: bool,
    pub rerank: bool,
    pub use_mmr: bool,
    pub semantic_weight: f64,
    pub keyword_weight: f64,
    pub rerank_threshold: f64,
    pub use_bm25: bool,
    pub fetch_k: usize,
    pub max_queries: usize,
    pub max_total_queries: usize,
    pub mmr_lambda: f64,
}

impl RetrievalParams {
    pub fn from_config(config: &Config, n_results: usize, content_types: Option<Vec<String>>) -> Self {
        let (semantic_weight, keyword_weight) = config.normalized_weights();
        Self {
            n_results,
            content_types,
            expand_queries: true,
            use_hyde: true,
            rerank: true,
            use_mmr: true,
            semantic_weight,
            keyword_weight,
            rerank_threshold: config.rerank_threshold,
            use_bm25: true,
            fetch_k: config.fetch_k_floor.max(3 * n_results),
            max_queries: config.max_queries,
            max_total_queries: config.max_total_queries,
            mmr_lambda: config.mmr_lambda,
        }
    }
}

/// One candidate's score bag (§3 "Retrieval Result"). At least one score
/// field is always populated; `final_score` documents which one decided the
/// terminal ordering.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub id: String,
    pub text: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub content_type: String,
    pub secondary_content_types: Vec<String>,
    pub rrf_score: Option<f64>,
    pub semantic_score: Option<f64>,
    pub keyword_score: Option<f64>,
    pub hybrid_score: Option<f64>,
    pub content_type_boost: Option<f64>,
    pub boosted_score: Option<f64>,
    pub rerank_score: Option<f64>,
}

impl RetrievalResult {
    /// The score used for the terminal ordering: most-refined populated
    /// field wins (rerank > boosted > hybrid > rrf).
    pub fn final_score(&self) -> f64 {
        self.rerank_score
            .or(self.boosted_score)
            .or(self.hybrid_score)
            .or(self.rrf_score)
            .unwrap_or(0.0)
    }
}

struct Candidate {
    result: RetrievalResult,
    embedding: Option<Vec<f32>>,
    best_rank: usize,
}

/// Ties together the services C9 depends on: the vector store (C4), the
/// keyword index (C3), the embedding/expansion/rerank backends (C8/C10/C11).
pub struct Orchestrator {
    vector_store: Arc<VectorStore>,
    keyword_store: Arc<KeywordStore>,
    embedder: Arc<dyn Embedder>,
    expander: Arc<dyn QueryExpander>,
    reranker: Option<Arc<dyn Reranker>>,
    embedding_dimensions: usize,
}

impl Orchestrator {
    pub fn new(
        vector_store: Arc<VectorStore>,
        keyword_store: Arc<KeywordStore>,
        embedder: Arc<dyn Embedder>,
        expander: Arc<dyn QueryExpander>,
        reranker: Option<Arc<dyn Reranker>>,
        embedding_dimensions: usize,
    ) -> Self {
        Self { vector_store, keyword_store, embedder, expander, reranker, embedding_dimensions }
    }

    /// The canonical entry point (§4.9).
    pub async fn dense_hybrid_search(
        &self,
        company_id: &str,
        query: &str,
        params: &RetrievalParams,
    ) -> Result<Vec<RetrievalResult>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let (w_sem, w_kw) = normalize_weights(params.semantic_weight, params.keyword_weight);
        let queries = self.build_query_set(query, params).await;

        let bm25_handle = self.spawn_bm25(company_id, query, params, w_kw);
        let dense_lists = self.dense_fan_out(company_id, &queries, params).await;

        let mut candidates = rrf::merge(&dense_lists);
        if candidates.is_empty() {
            if let Some(handle) = bm25_handle {
                handle.abort();
            }
            return Ok(Vec::new());
        }

        let bm25_results = match bm25_handle {
            Some(handle) => handle.await.ok().and_then(|r| r.ok()).unwrap_or_default(),
            None => Vec::new(),
        };

        self.apply_mmr(&mut candidates, query, params).await;

        if !bm25_results.is_empty() {
            hybrid_merge(&mut candidates, &bm25_results, w_sem, w_kw);
        }

        apply_content_type_boost(&mut candidates, query);

        let mut ordered = order_candidates(candidates);

        if params.rerank {
            if let Some(reranker) = self.reranker.clone() {
                if should_rerank(&ordered, params.rerank_threshold) {
                    self.apply_rerank(&mut ordered, query, reranker.as_ref()).await;
                }
            }
        }

        ordered.truncate(params.n_results);
        Ok(ordered)
    }

    /// Step 2: `[query]` plus eligible expansions and HyDE, deduplicated and
    /// capped at `max_total_queries`, expansions trimmed first to leave room
    /// for HyDE (§9 open question (c) — this ordering is the spec's stated
    /// default, not a tuned choice).
    async fn build_query_set(&self, query: &str, params: &RetrievalParams) -> Vec<String> {
        let (expansions, hyde) = tokio::join!(
            async {
                if params.expand_queries {
                    self.expander.expand(query).await.unwrap_or_default()
                } else {
                    Vec::new()
                }
            },
            async {
                if params.use_hyde && query.chars().count() <= 600 {
                    self.expander.hyde(query).await.ok().flatten()
                } else {
                    None
                }
            }
        );

        let mut seen = std::collections::HashSet::new();
        let mut queries = Vec::new();
        seen.insert(query.to_lowercase());
        queries.push(query.to_string());

        for expansion in expansions.into_iter().take(params.max_queries) {
            if seen.insert(expansion.to_lowercase()) {
                queries.push(expansion);
            }
        }

        let reserve = if hyde.is_some() { 1 } else { 0 };
        let budget = params.max_total_queries.saturating_sub(reserve).max(1);
        queries.truncate(budget);

        if let Some(passage) = hyde {
            if seen.insert(passage.to_lowercase()) && queries.len() < params.max_total_queries {
                queries.push(passage);
            }
        }

        queries
    }

    /// Step 3: one dense search per query, concurrently.
    async fn dense_fan_out(
        &self,
        company_id: &str,
        queries: &[String],
        params: &RetrievalParams,
    ) -> Vec<Vec<RetrievedChunk>> {
        let include_embeddings = params.use_mmr;
        stream::iter(queries.iter().cloned())
            .map(|q| {
                let vector_store = self.vector_store.clone();
                let embedder = self.embedder.clone();
                let company_id = company_id.to_string();
                let content_types = params.content_types.clone();
                let fetch_k = params.fetch_k;
                async move {
                    match embedder.embed(&q).await {
                        Ok(embedding) => vector_store
                            .search_by_embedding(&company_id, &embedding, fetch_k, content_types.as_deref(), include_embeddings)
                            .unwrap_or_default(),
                        Err(e) => {
                            tracing::warn!(error = %e, "query embedding failed, dropping this query from the fan-out");
                            Vec::new()
                        }
                    }
                }
            })
            .buffer_unordered(4)
            .collect()
            .await
    }

    /// Step 4: BM25 on the original query only, spawned so it can be
    /// cancelled if dense search yields nothing (§4.9 "Cancellation").
    fn spawn_bm25(
        &self,
        company_id: &str,
        query: &str,
        params: &RetrievalParams,
        w_kw: f64,
    ) -> Option<tokio::task::JoinHandle<Result<Vec<(String, f64, String, Vec<String>)>>>> {
        if !params.use_bm25 || w_kw <= 0.0 {
            return None;
        }
        let keyword_store = self.keyword_store.clone();
        let company_id = company_id.to_string();
        let query = query.to_string();
        let k = params.fetch_k.max(3 * params.n_results).max(30);
        let content_types = params.content_types.clone();

        Some(tokio::task::spawn_blocking(move || {
            let index = keyword_store.index_for(&company_id)?;
            let guard = index.read().expect("bm25 index lock poisoned");
            Ok(guard
                .search(&query, k, content_types.as_deref())
                .into_iter()
                .map(|(doc, score)| (doc.id, score, doc.content_type, doc.secondary_content_types))
                .collect())
        }))
    }

    /// Step 6: MMR diversification, only when every candidate and the query
    /// share an embedding and its dimension matches the configured one.
    async fn apply_mmr(&self, candidates: &mut HashMap<String, Candidate>, query: &str, params: &RetrievalParams) {
        if !params.use_mmr {
            return;
        }
        if candidates.values().any(|c| c.embedding.is_none()) {
            tracing::debug!("skipping MMR: not all candidates carry an embedding");
            return;
        }
        let query_embedding = match self.embedder.embed(query).await {
            Ok(e) => e,
            Err(_) => return,
        };
        if query_embedding.len() != self.embedding_dimensions
            || candidates.values().any(|c| c.embedding.as_ref().map(|e| e.len()) != Some(self.embedding_dimensions))
        {
            tracing::debug!("skipping MMR: embedding dimension mismatch against the configured model");
            return;
        }

        let order = mmr::select(candidates, &query_embedding, params.mmr_lambda);
        for (rank, id) in order.into_iter().enumerate() {
            if let Some(candidate) = candidates.get_mut(&id) {
                candidate.best_rank = candidate.best_rank.min(rank);
            }
        }
    }

    async fn apply_rerank(&self, ordered: &mut Vec<RetrievalResult>, query: &str, reranker: &dyn Reranker) {
        let documents: Vec<RerankDocument> =
            ordered.iter().take(20).map(|r| RerankDocument { id: r.id.clone(), text: r.text.clone() }).collect();

        match reranker.rerank(query, &documents, documents.len()).await {
            Ok(results) => {
                let scores: HashMap<String, f64> = results.into_iter().map(|r| (r.id, r.score)).collect();
                for result in ordered.iter_mut() {
                    if let Some(score) = scores.get(&result.id) {
                        result.rerank_score = Some(*score);
                    }
                }
                ordered.sort_by(|a, b| b.final_score().partial_cmp(&a.final_score()).unwrap_or(std::cmp::Ordering::Equal));
            }
            Err(e) => {
                tracing::warn!(error = %e, "rerank failed, keeping prior order");
            }
        }
    }
}

fn normalize_weights(semantic_weight: f64, keyword_weight: f64) -> (f64, f64) {
    let total = semantic_weight + keyword_weight;
    if total <= 0.0 {
        (1.0, 0.0)
    } else {
        (semantic_weight / total, keyword_weight / total)
    }
}

/// Step 7: min-max normalize dense `rrf_score` and BM25 score across the
/// union of both sets, then `hybrid_score = w_s*sem + w_k*kw`.
fn hybrid_merge(
    candidates: &mut HashMap<String, Candidate>,
    bm25_results: &[(String, f64, String, Vec<String>)],
    w_sem: f64,
    w_kw: f64,
) {
    for (id, score, content_type, secondary_content_types) in bm25_results {
        candidates.entry(id.clone()).or_insert_with(|| Candidate {
            result: RetrievalResult {
                id: id.clone(),
                text: String::new(),
                metadata: HashMap::new(),
                content_type: content_type.clone(),
                secondary_content_types: secondary_content_types.clone(),
                rrf_score: None,
                semantic_score: None,
                keyword_score: None,
                hybrid_score: None,
                content_type_boost: None,
                boosted_score: None,
                rerank_score: None,
            },
            embedding: None,
            best_rank: usize::MAX,
        });
    }

    let sem_values: Vec<f64> = candidates.values().filter_map(|c| c.result.rrf_score).collect();
    let (sem_min, sem_max) = min_max(&sem_values);
    let kw_values: Vec<f64> = bm25_results.iter().map(|(_, score, _, _)| *score).collect();
    let (kw_min, kw_max) = min_max(&kw_values);

    let bm25_map: HashMap<&str, f64> = bm25_results.iter().map(|(id, score, _, _)| (id.as_str(), *score)).collect();

    for candidate in candidates.values_mut() {
        let sem_norm = candidate.result.rrf_score.map(|v| normalize(v, sem_min, sem_max)).unwrap_or(0.0);
        let kw_norm = bm25_map.get(candidate.result.id.as_str()).map(|v| normalize(*v, kw_min, kw_max)).unwrap_or(0.0);
        candidate.result.keyword_score = bm25_map.get(candidate.result.id.as_str()).copied();
        candidate.result.hybrid_score = Some(w_sem * sem_norm + w_kw * kw_norm);
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 1.0);
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    (min, max)
}

fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if (max - min).abs() < 1e-12 {
        1.0
    } else {
        (value - min) / (max - min)
    }
}

/// Step 8: multiply each candidate's current score by
/// `max(boost[primary_type], max(boost[secondary_types]))` from the boost
/// profile selected by the query's detected intent (§4.9 step 8).
fn apply_content_type_boost(candidates: &mut HashMap<String, Candidate>, query: &str) {
    let intent = classify_query_intent(query);
    let table = boost_table_for(intent);

    for candidate in candidates.values_mut() {
        let base = candidate.result.hybrid_score.or(candidate.result.rrf_score).unwrap_or(0.0);
        let primary_boost = table.get(candidate.result.content_type.as_str()).copied().unwrap_or(1.0);
        let boost = candidate
            .result
            .secondary_content_types
            .iter()
            .filter_map(|ct| table.get(ct.as_str()).copied())
            .fold(primary_boost, f64::max);
        candidate.result.content_type_boost = Some(boost);
        candidate.result.boosted_score = Some(base * boost);
    }
}

fn order_candidates(candidates: HashMap<String, Candidate>) -> Vec<RetrievalResult> {
    let mut entries: Vec<Candidate> = candidates.into_values().collect();
    entries.sort_by(|a, b| {
        b.result
            .final_score()
            .partial_cmp(&a.result.final_score())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.best_rank.cmp(&b.best_rank))
            .then(a.result.id.cmp(&b.result.id))
    });
    entries.into_iter().map(|c| c.result).collect()
}

/// Step 9: mean-normalized top-3, variance-of-top-5 rerank gate.
fn should_rerank(ordered: &[RetrievalResult], rerank_threshold: f64) -> bool {
    if ordered.is_empty() {
        return false;
    }
    let top_scores: Vec<f64> = ordered.iter().take(5).map(|r| r.final_score()).collect();
    let max = top_scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max).max(1e-9);
    let normalized: Vec<f64> = top_scores.iter().map(|v| v / max).collect();

    let top3_mean = normalized.iter().take(3).sum::<f64>() / normalized.len().min(3) as f64;
    if top3_mean >= rerank_threshold {
        return false;
    }
    if top3_mean < 0.3 {
        return false;
    }

    let mean5 = normalized.iter().sum::<f64>() / normalized.len() as f64;
    let variance = normalized.iter().map(|v| (v - mean5).powi(2)).sum::<f64>() / normalized.len() as f64;
    variance >= 0.02
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, content_type: &str, score: f64) -> RetrievalResult {
        RetrievalResult {
            id: id.to_string(),
            text: String::new(),
            metadata: HashMap::new(),
            content_type: content_type.to_string(),
            secondary_content_types: Vec::new(),
            rrf_score: Some(score),
            semantic_score: None,
            keyword_score: None,
            hybrid_score: None,
            content_type_boost: None,
            boosted_score: Some(score),
            rerank_score: None,
        }
    }

    #[test]
    fn final_score_prefers_most_refined_populated_field() {
        let mut r = result("1", "corporate_site", 0.5);
        assert_eq!(r.final_score(), 0.5);
        r.hybrid_score = Some(0.7);
        assert_eq!(r.final_score(), 0.7);
        r.rerank_score = Some(0.9);
        assert_eq!(r.final_score(), 0.9);
    }

    #[test]
    fn high_confidence_top3_skips_rerank() {
        let ordered = vec![result("1", "corporate_site", 1.0), result("2", "corporate_site", 0.95)];
        assert!(!should_rerank(&ordered, 0.7));
    }

    #[test]
    fn weak_top3_skips_rerank() {
        let ordered = vec![result("1", "corporate_site", 0.1), result("2", "corporate_site", 0.05)];
        assert!(!should_rerank(&ordered, 0.7));
    }

    #[test]
    fn min_max_normalizes_across_range() {
        assert_eq!(normalize(5.0, 0.0, 10.0), 0.5);
        assert_eq!(normalize(1.0, 1.0, 1.0), 1.0);
    }

    #[test]
    fn content_type_boost_consults_secondary_types() {
        let mut r = result("1", "corporate_site", 1.0);
        r.hybrid_score = Some(1.0);
        r.secondary_content_types = vec!["new_grad_recruitment".to_string()];
        let mut candidates = HashMap::new();
        candidates.insert(
            "1".to_string(),
            Candidate { result: r, embedding: None, best_rank: 0 },
        );

        apply_content_type_boost(&mut candidates, "締切はいつですか");

        let boosted = candidates["1"].result.boosted_score.unwrap();
        // corporate_site carries no Deadline boost on its own; the
        // secondary label's 1.4 multiplier must still apply.
        assert!((boosted - 1.4).abs() < 1e-9);
    }
}
