//! Reciprocal Rank Fusion across a multi-query dense fan-out (§4.9 step 5).

use super::Candidate;
use crate::retrieval::RetrievalResult;
use crate::vector::RetrievedChunk;
use std::collections::HashMap;

/// Merges per-query dense result lists with adaptive `k = 30 + 10*(#lists)`.
pub fn merge(lists: &[Vec<RetrievedChunk>]) -> HashMap<String, Candidate> {
    let k = 30.0 + 10.0 * lists.len() as f64;
    let mut candidates: HashMap<String, Candidate> = HashMap::new();

    for list in lists {
        for (rank, chunk) in list.iter().enumerate() {
            let contribution = 1.0 / (k + rank as f64 + 1.0);
            let candidate = candidates.entry(chunk.id.clone()).or_insert_with(|| Candidate {
                result: RetrievalResult {
                    id: chunk.id.clone(),
                    text: chunk.text.clone(),
                    metadata: chunk.metadata.clone(),
                    content_type: chunk.content_type.clone(),
                    secondary_content_types: chunk.secondary_content_types.clone(),
                    rrf_score: Some(0.0),
                    semantic_score: None,
                    keyword_score: None,
                    hybrid_score: None,
                    content_type_boost: None,
                    boosted_score: None,
                    rerank_score: None,
                },
                embedding: chunk.embedding.clone(),
                best_rank: rank,
            });
            candidate.result.rrf_score = Some(candidate.result.rrf_score.unwrap_or(0.0) + contribution);
            candidate.best_rank = candidate.best_rank.min(rank);
            if candidate.embedding.is_none() {
                candidate.embedding = chunk.embedding.clone();
            }
        }
    }

    for candidate in candidates.values_mut() {
        candidate.result.semantic_score = candidate.result.rrf_score;
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn chunk(id: &str) -> RetrievedChunk {
        RetrievedChunk {
            id: id.to_string(),
            text: String::new(),
            metadata: Map::new(),
            content_type: "corporate_site".to_string(),
            secondary_content_types: Vec::new(),
            distance: 0.1,
            embedding: None,
        }
    }

    #[test]
    fn doc_in_two_lists_accumulates_both_contributions() {
        let lists = vec![vec![chunk("a"), chunk("b")], vec![chunk("b"), chunk("a")]];
        let merged = merge(&lists);
        let k = 30.0 + 10.0 * 2.0;
        let expected_a = 1.0 / (k + 1.0) + 1.0 / (k + 2.0);
        assert!((merged["a"].result.rrf_score.unwrap() - expected_a).abs() < 1e-9);
    }

    #[test]
    fn best_rank_is_the_minimum_across_lists() {
        let lists = vec![vec![chunk("x"), chunk("a")], vec![chunk("a")]];
        let merged = merge(&lists);
        assert_eq!(merged["a"].best_rank, 0);
    }

    proptest::proptest! {
        // I7: within a single ranked list, RRF score is strictly monotonically
        // decreasing in rank, for any list length and any number of sibling
        // lists contributing noise alongside it.
        #[test]
        fn score_strictly_decreases_with_rank(len in 2usize..30, extra_lists in 0usize..5) {
            let ids: Vec<String> = (0..len).map(|i| format!("doc{i}")).collect();
            let primary: Vec<RetrievedChunk> = ids.iter().map(|id| chunk(id)).collect();
            let mut lists = vec![primary];
            for n in 0..extra_lists {
                lists.push(vec![chunk(&format!("noise{n}"))]);
            }
            let merged = merge(&lists);

            let scores: Vec<f64> = ids.iter().map(|id| merged[id].result.rrf_score.unwrap()).collect();
            for window in scores.windows(2) {
                proptest::prop_assert!(window[0] > window[1]);
            }
        }
    }
}
