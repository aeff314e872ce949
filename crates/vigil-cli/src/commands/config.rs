//! Configuration commands.

use anyhow::Result;
use clap::ValueEnum;
use vigil_config::VigilConfig;

use crate::style::{colors::SemanticStyle, print_labeled, print_spacer};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ShowFormat {
    Text,
    Json,
    Toml,
}

/// Show the effective configuration.
pub fn show(config: &VigilConfig, format: ShowFormat) -> Result<()> {
    match format {
        ShowFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ShowFormat::Toml => {
            print!("{}", toml::to_string_pretty(config)?);
        }
        ShowFormat::Text => {
            println!("{}", "Vigil Configuration".header());
            println!("===================");
            print_spacer();

            println!("PDP:");
            print_labeled(
                "Parallel threshold",
                &config.pdp.parallel_threshold.to_string(),
            );
            print_spacer();

            println!("Store:");
            print_labeled(
                "Policy file",
                &config
                    .store
                    .policy_file
                    .as_ref()
                    .map_or_else(|| "None".to_string(), |p| p.display().to_string()),
            );
            print_labeled("Page size", &config.store.page_size.to_string());
            print_spacer();

            println!("Logging:");
            print_labeled("Level", &config.logging.level);
            print_labeled("Format", &format!("{:?}", config.logging.format));
        }
    }

    Ok(())
}
