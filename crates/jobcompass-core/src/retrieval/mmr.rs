//! Maximal Marginal Relevance diversification (§4.9 step 6).

use super::Candidate;
use std::collections::{HashMap, HashSet};

fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Greedily selects candidates maximizing `lambda*sim(q,c) - (1-lambda)*max_sim(c,selected)`,
/// returning the full candidate set reordered by selection order. Callers
/// have already verified every candidate carries a compatible-dimension
/// embedding.
pub fn select(candidates: &HashMap<String, Candidate>, query_embedding: &[f32], lambda: f64) -> Vec<String> {
    let query_sim: HashMap<&str, f64> = candidates
        .iter()
        .filter_map(|(id, c)| c.embedding.as_ref().map(|e| (id.as_str(), cosine(e, query_embedding))))
        .collect();

    let mut remaining: HashSet<&str> = candidates.keys().map(|s| s.as_str()).collect();
    let mut selected: Vec<String> = Vec::with_capacity(candidates.len());

    while !remaining.is_empty() {
        let next = remaining
            .iter()
            .map(|&id| {
                let candidate_embedding = candidates[id].embedding.as_ref();
                let max_sim_to_selected = selected
                    .iter()
                    .filter_map(|s| candidate_embedding.zip(candidates[s.as_str()].embedding.as_ref()))
                    .map(|(a, b)| cosine(a, b))
                    .fold(0.0_f64, f64::max);
                let score = lambda * query_sim.get(id).copied().unwrap_or(0.0) - (1.0 - lambda) * max_sim_to_selected;
                (id, score)
            })
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(id, _)| id)
            .unwrap();

        selected.push(next.to_string());
        remaining.remove(next);
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::RetrievalResult;
    use std::collections::HashMap as Map;

    fn candidate(id: &str, embedding: Vec<f32>) -> (String, Candidate) {
        (
            id.to_string(),
            Candidate {
                result: RetrievalResult {
                    id: id.to_string(),
                    text: String::new(),
                    metadata: Map::new(),
                    content_type: "corporate_site".to_string(),
                    secondary_content_types: Vec::new(),
                    rrf_score: Some(1.0),
                    semantic_score: None,
                    keyword_score: None,
                    hybrid_score: None,
                    content_type_boost: None,
                    boosted_score: None,
                    rerank_score: None,
                },
                embedding: Some(embedding),
                best_rank: 0,
            },
        )
    }

    #[test]
    fn diversifies_away_from_near_duplicate() {
        let candidates: HashMap<String, Candidate> = [
            candidate("a", vec![1.0, 0.0]),
            candidate("b", vec![0.99, 0.01]),
            candidate("c", vec![0.0, 1.0]),
        ]
        .into_iter()
        .collect();

        let order = select(&candidates, &[1.0, 0.0], 0.5);
        assert_eq!(order[0], "a");
        assert_eq!(order[1], "c");
    }
}
