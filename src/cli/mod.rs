//! CLI module for taxoclass.
//!
//! Subcommands:
//! - `init`: Initialize the PostgreSQL store schema
//! - `classify`: Classify one or more identifiers
//! - `explain`: Show how an identifier was classified
//! - `covered`: Check whether a class resolves through static configuration alone
//! - `categories`: List configured categories

mod categories;
mod classify;
mod init;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use figment::providers::{Format, Toml};
use figment::Figment;

use crate::config::Config;
use crate::context::Context;
use crate::services::RegionalCategories;

/// Taxoclass - hierarchy classification over a knowledge graph
#[derive(Parser)]
#[command(name = "taxoclass")]
#[command(about = "Classify knowledge-graph entities into configured categories")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Serve the knowledge graph from a JSON fixture instead of the Wikidata API
    #[arg(long, global = true)]
    pub fixture: Option<PathBuf>,

    /// Regional category overrides (TOML with `[categories]` and `[labels]`)
    #[arg(long, global = true)]
    pub region: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize the hierarchy store schema
    Init,

    /// Classify identifiers through their "instance of" targets
    Classify {
        /// Identifiers to classify (e.g. Q64)
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Explain how an identifier was classified
    Explain {
        /// Identifier to explain
        id: String,
    },

    /// Check whether a class resolves using static configuration only
    Covered {
        /// Class identifier
        id: String,
    },

    /// List configured categories and ignored classes
    Categories,
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Init => self.run_init().await,
            Command::Classify { ref ids } => self.run_classify(ids).await,
            Command::Explain { ref id } => self.run_explain(id).await,
            Command::Covered { ref id } => self.run_covered(id).await,
            Command::Categories => self.run_categories(),
        }
    }

    /// Loads configuration, builds the context and applies `--region`.
    async fn context(&self) -> color_eyre::Result<Context> {
        let config = Config::load()?;
        let ctx = Context::from(config, self.fixture.as_deref()).await?;

        if let Some(region) = self.load_region()? {
            ctx.classifier
                .add_regional_categories(region.categories, region.labels);
        }

        Ok(ctx)
    }

    /// Parses the `--region` file, if given.
    fn load_region(&self) -> color_eyre::Result<Option<RegionalCategories>> {
        let Some(path) = &self.region else {
            return Ok(None);
        };
        if !path.exists() {
            color_eyre::eyre::bail!("Region file not found: {}", path.display());
        }
        let region: RegionalCategories = Figment::from(Toml::file(path)).extract()?;
        tracing::info!(
            categories = region.categories.len(),
            labels = region.labels.len(),
            "Loaded regional overrides from {}",
            path.display()
        );
        Ok(Some(region))
    }
}
