//! Search command: drives the hybrid retrieval orchestrator.

use crate::app::{OutputFormat, SearchArgs};
use crate::output;
use anyhow::Result;
use jobcompass_core::config::Feature;
use jobcompass_core::llm::{gateway_from_config, ExpansionCache, LlmQueryExpander, LlmReranker, OpenAiEmbedder};
use jobcompass_core::{keyword_store_from_config, vector_store_from_config, Config, Orchestrator, RetrievalParams};
use std::sync::Arc;

pub async fn run(args: SearchArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let gateway = Arc::new(gateway_from_config(config));
    let vector_store = Arc::new(vector_store_from_config(config)?);
    let keyword_store = Arc::new(keyword_store_from_config(config));
    let embedder = Arc::new(OpenAiEmbedder::from_config(config));

    let expansion_model = config
        .feature_routes
        .get(&Feature::QueryExpansion)
        .map(|r| r.model.clone())
        .unwrap_or_else(|| "gpt-5-nano".to_string());
    let expander = Arc::new(LlmQueryExpander::new(gateway.clone(), Arc::new(ExpansionCache::new()), expansion_model));

    let rerank_model =
        config.feature_routes.get(&Feature::Rerank).map(|r| r.model.clone()).unwrap_or_else(|| "claude-haiku".to_string());
    let reranker = Some(Arc::new(LlmReranker::new(gateway, rerank_model)) as Arc<dyn jobcompass_core::Reranker>);

    let orchestrator =
        Orchestrator::new(vector_store, keyword_store, embedder, expander, reranker, config.embedding_dimensions);

    let content_types = if args.content_type.is_empty() { None } else { Some(args.content_type.clone()) };
    let mut params = RetrievalParams::from_config(config, args.n, content_types);
    if args.no_expand {
        params.expand_queries = false;
        params.use_hyde = false;
    }
    if args.no_rerank {
        params.rerank = false;
    }

    let results = orchestrator.dense_hybrid_search(&args.company_id, &args.query, &params).await?;
    print!("{}", output::format_search_results(&results, format));
    Ok(())
}
