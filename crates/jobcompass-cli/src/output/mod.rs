//! Output formatters: plain colored terminal text, or pretty JSON.

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use jobcompass_core::RetrievalResult;

pub fn format_search_results(results: &[RetrievalResult], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_search_results(results),
        OutputFormat::Plain => terminal::format_search_results(results),
    }
}
