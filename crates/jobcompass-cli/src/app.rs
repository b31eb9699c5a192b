//! CLI argument definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jobcompass")]
#[command(author, version, about = "Company-aware retrieval over a job-hunting corporate knowledge base")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a YAML config file (falls back to built-in + env-var defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Hybrid dense + keyword retrieval for a company
    Search(SearchArgs),

    /// Classify a single chunk into a content-type label
    Classify(ClassifyArgs),

    /// Resolve a URL's identity relation to a company
    Company(CompanyArgs),

    /// Show config summary, circuit-breaker state, and store sizes
    Status,
}

#[derive(clap::Args)]
pub struct SearchArgs {
    /// Company id the chunks were ingested under
    pub company_id: String,

    /// Search query
    pub query: String,

    /// Number of results
    #[arg(short = 'n', long, default_value = "10")]
    pub n: usize,

    /// Restrict to one or more content types (repeatable)
    #[arg(long = "content-type")]
    pub content_type: Vec<String>,

    /// Skip query expansion and HyDE
    #[arg(long)]
    pub no_expand: bool,

    /// Skip the rerank pass even if the confidence gate would trigger it
    #[arg(long)]
    pub no_rerank: bool,
}

#[derive(clap::Args)]
pub struct ClassifyArgs {
    /// Source URL of the chunk
    pub url: String,

    /// Heading or title text
    pub heading: String,

    /// Path to a file containing the chunk body
    pub text_file: PathBuf,

    /// Channel hint to fall back on if no rule matches and the LLM is unavailable
    #[arg(long)]
    pub source_channel: Option<String>,
}

#[derive(clap::Args)]
pub struct CompanyArgs {
    /// Company name as it appears in the mapping
    pub name: String,

    /// URL to resolve against the company's registered domains
    pub url: String,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}
