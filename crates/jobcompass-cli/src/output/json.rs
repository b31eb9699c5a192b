//! JSON output formatter

use jobcompass_core::RetrievalResult;

pub fn format_search_results(results: &[RetrievalResult]) -> String {
    let output: Vec<serde_json::Value> = results
        .iter()
        .map(|r| {
            serde_json::json!({
                "id": r.id,
                "content_type": r.content_type,
                "score": r.final_score(),
                "rrf_score": r.rrf_score,
                "hybrid_score": r.hybrid_score,
                "rerank_score": r.rerank_score,
                "text": r.text,
            })
        })
        .collect();

    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "[]".to_string()) + "\n"
}
