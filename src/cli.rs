//! Command-line interface for wp2jekyll.
//!
//! Provides commands for converting export files and inspecting the
//! resolved configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::config::Config;
use crate::export::Exporter;
use crate::ingest::WxrParser;

/// wp2jekyll - WordPress WXR exports to Jekyll-style static site trees
#[derive(Parser, Debug)]
#[command(name = "wp2jekyll")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.yaml", env = "WP2JEKYLL_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert every export file found in the configured directory
    Convert {
        /// Download referenced images (overrides the config file)
        #[arg(long)]
        download_images: bool,
    },

    /// Show the resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = Config::load(&self.config)?;

        match self.command {
            Commands::Convert { download_images } => {
                let mut config = config;
                if download_images {
                    config.download_images = true;
                }
                convert_all(config).await
            }
            Commands::Config => {
                println!("{:#?}", config);
                Ok(())
            }
        }
    }
}

/// Parse and export every `*.xml` file under the configured exports
/// directory, one after another.
async fn convert_all(config: Config) -> Result<()> {
    let parser = WxrParser::from_config(&config)?;
    let exporter = Exporter::new(config.clone());

    let pattern = format!("{}/*.xml", config.wp_exports_dir);
    let paths: Vec<PathBuf> = glob::glob(&pattern)
        .with_context(|| format!("Invalid exports directory pattern: {}", pattern))?
        .flatten()
        .collect();

    if paths.is_empty() {
        warn!(%pattern, "no export files found");
        return Ok(());
    }

    for path in paths {
        info!(file = %path.display(), "converting export");

        let mut doc = match parser.parse_file(&path) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unreadable export");
                continue;
            }
        };

        exporter.export(&mut doc).await?;
    }

    Ok(())
}
