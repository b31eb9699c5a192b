//! Company command: resolves a URL's identity relation to a company.

use crate::app::{CompanyArgs, OutputFormat};
use anyhow::Result;
use jobcompass_core::{registry_from_config, Config};

pub fn run(args: CompanyArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let registry = registry_from_config(config)?;
    let resolution = registry.resolve(&args.name, &args.url);

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "is_official": resolution.is_official,
                    "is_parent": resolution.is_parent,
                    "is_subsidiary": resolution.is_subsidiary,
                    "subsidiary_label": resolution.subsidiary_label,
                    "is_sibling": resolution.is_sibling,
                    "sibling_label": resolution.sibling_label,
                    "conflicting_companies": resolution.conflicting_companies,
                })
            );
        }
        OutputFormat::Plain => {
            println!("official:    {}", resolution.is_official);
            println!("parent:      {}", resolution.is_parent);
            println!("subsidiary:  {} {}", resolution.is_subsidiary, resolution.subsidiary_label.as_deref().unwrap_or(""));
            println!("sibling:     {} {}", resolution.is_sibling, resolution.sibling_label.as_deref().unwrap_or(""));
            if !resolution.conflicting_companies.is_empty() {
                println!("conflicts:   {}", resolution.conflicting_companies.join(", "));
            }
        }
    }
    Ok(())
}
