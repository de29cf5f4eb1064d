//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ImportConfig;

pub mod describe;
pub mod import;
pub mod status;

/// Batch importer from a relational knowledge base into a property graph
#[derive(Parser)]
#[command(name = "graphport")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (defaults to ./graphport.toml when present)
    #[arg(short, long, global = true, env = "GRAPHPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import the knowledge base into a graph
    Import(import::ImportArgs),

    /// Show the labels and attribute classification of a type
    Describe(describe::DescribeArgs),

    /// Show node and relationship counts of the Neo4j database
    Status,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = ImportConfig::load(self.config.as_deref())?;

        match self.command {
            Commands::Import(args) => import::execute(args, config).await,
            Commands::Describe(args) => describe::execute(args, &config),
            Commands::Status => status::execute(&config).await,
        }
    }
}
