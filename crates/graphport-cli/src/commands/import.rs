//! `graphport import`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use graphport_core::{GraphSink, SchemaIntrospector};
use graphport_graph::{run_import, BoltSink, DumpSink, GraphClient, ImportOptions, MemorySink};
use graphport_source::SqliteSource;
use tracing::info;

use crate::config::{load_schema, ImportConfig};
use crate::output;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    /// JSON-lines dump directory
    Dump,
    /// Live Neo4j database over Bolt
    Bolt,
    /// Keep the graph in memory and only report
    Memory,
}

#[derive(Args)]
pub struct ImportArgs {
    /// SQLite knowledge base to read
    #[arg(long, env = "GRAPHPORT_SOURCE")]
    pub source: Option<PathBuf>,

    /// Dump directory, deleted and recreated on every run
    #[arg(long, env = "GRAPHPORT_DESTINATION")]
    pub destination: Option<PathBuf>,

    /// Where to write the graph
    #[arg(long, value_enum, default_value_t = Target::Dump)]
    pub target: Target,

    /// Import only the named top-level pathway (repeatable)
    #[arg(long = "root", value_name = "NAME")]
    pub roots: Vec<String>,

    /// Schema description replacing the built-in one
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: ImportArgs, config: ImportConfig) -> Result<()> {
    let source_path = args
        .source
        .or(config.source)
        .context("No knowledge base given. Use --source or GRAPHPORT_SOURCE.")?;
    let source = SqliteSource::open(&source_path)
        .with_context(|| format!("Failed to open knowledge base {}", source_path.display()))?;

    let schema = load_schema(args.schema.or(config.schema).as_deref())?;
    info!(version = %schema.version, types = schema.types.len(), "Using schema description");
    let introspector = SchemaIntrospector::new(schema);

    let roots = if args.roots.is_empty() { config.roots } else { args.roots };
    let mut options = if roots.is_empty() {
        ImportOptions::default()
    } else {
        ImportOptions::scoped(roots)
    };
    options.show_progress = !args.no_progress && !args.json;

    let mut sink: Box<dyn GraphSink> = match args.target {
        Target::Dump => {
            let destination = args
                .destination
                .or(config.destination)
                .context("No destination given. Use --destination or GRAPHPORT_DESTINATION.")?;
            Box::new(
                DumpSink::create(&destination)
                    .with_context(|| format!("Failed to prepare destination {}", destination.display()))?,
            )
        }
        Target::Bolt => {
            let graph_config = config.neo4j.with_env_overrides();
            let client = GraphClient::connect(&graph_config).await?;
            let sink = BoltSink::new(client, graph_config.batch_size);
            sink.clear().await.context("Failed to clear destination graph")?;
            Box::new(sink)
        }
        Target::Memory => Box::new(MemorySink::new()),
    };

    if !args.json {
        println!("{}", "Importing knowledge base...".bold());
    }
    let report = run_import(introspector, &source, sink.as_mut(), &options)
        .await
        .context("Import failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_report(&report);
    }
    Ok(())
}
