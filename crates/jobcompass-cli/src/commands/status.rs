//! Status command: config summary, circuit-breaker state, store sizes.

use crate::app::OutputFormat;
use crate::output::terminal::print_status_line;
use anyhow::Result;
use jobcompass_core::llm::gateway_from_config;
use jobcompass_core::Config;

pub fn run(config: &Config, format: OutputFormat) -> Result<()> {
    let gateway = gateway_from_config(config);
    let openai_open = gateway.circuit_breaker().is_open("openai");
    let anthropic_open = gateway.circuit_breaker().is_open("anthropic");

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "embedding_model": config.embedding_model,
                    "embedding_dimensions": config.embedding_dimensions,
                    "semantic_weight": config.semantic_weight,
                    "keyword_weight": config.keyword_weight,
                    "rerank_threshold": config.rerank_threshold,
                    "data_root": config.data_root,
                    "circuit_breaker": {
                        "openai_open": openai_open,
                        "anthropic_open": anthropic_open,
                    },
                })
            );
        }
        OutputFormat::Plain => {
            println!("embedding model:     {} ({} dims)", config.embedding_model, config.embedding_dimensions);
            println!("weights (sem/kw):    {:.2} / {:.2}", config.semantic_weight, config.keyword_weight);
            println!("rerank threshold:    {:.2}", config.rerank_threshold);
            println!("data root:           {}", config.data_root.display());
            print_status_line("openai circuit:", if openai_open { "open" } else { "closed" }, !openai_open);
            print_status_line("anthropic circuit:", if anthropic_open { "open" } else { "closed" }, !anthropic_open);
        }
    }
    Ok(())
}
