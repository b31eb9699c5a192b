//! Classify command: drives the content classifier in isolation.

use crate::app::{ClassifyArgs, OutputFormat};
use anyhow::Result;
use jobcompass_core::llm::gateway_from_config;
use jobcompass_core::{ClassifyInput, Classifier, Config};
use std::sync::Arc;

pub async fn run(args: ClassifyArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let text = std::fs::read_to_string(&args.text_file)?;
    let gateway = Arc::new(gateway_from_config(config));
    let classifier = Classifier::new(gateway);

    let input =
        ClassifyInput { source_url: args.url, heading: args.heading, text, source_channel: args.source_channel };
    let label = classifier.classify(&input).await;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "content_type": label }));
        }
        OutputFormat::Plain => {
            println!("{label}");
        }
    }
    Ok(())
}
