//! Colored terminal output formatter

use jobcompass_core::RetrievalResult;
use std::io::Write;
use termcolor::{Color, ColorSpec, StandardStream, WriteColor};

pub fn format_search_results(results: &[RetrievalResult]) -> String {
    if results.is_empty() {
        return "(no results)\n".to_string();
    }

    let mut output = String::new();
    for (rank, result) in results.iter().enumerate() {
        output.push_str(&format!(
            "{:>2}. [{:.3}] {} ({})\n",
            rank + 1,
            result.final_score(),
            result.id,
            result.content_type,
        ));
        let preview: String = result.text.chars().take(120).collect();
        output.push_str(&format!("    {preview}\n"));
    }
    output
}

/// Writes a single colored status line, falling back to plain text if the
/// terminal doesn't support color.
pub fn print_status_line(label: &str, value: &str, ok: bool) {
    let mut stream = StandardStream::stdout(termcolor::ColorChoice::Auto);
    let _ = write!(&mut stream, "{label:<20}");
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(if ok { Color::Green } else { Color::Red }));
    let _ = stream.set_color(&spec);
    let _ = writeln!(&mut stream, "{value}");
    let _ = stream.reset();
}
