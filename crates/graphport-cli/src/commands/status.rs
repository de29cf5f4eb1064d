//! `graphport status`.

use anyhow::Result;
use colored::Colorize;
use graphport_graph::GraphClient;

use crate::config::ImportConfig;

pub async fn execute(config: &ImportConfig) -> Result<()> {
    let graph_config = config.neo4j.clone().with_env_overrides();
    let client = GraphClient::connect(&graph_config).await?;
    let counts = client.get_counts().await?;

    println!("{}", "Graph Status".bold());
    println!("{}", "─".repeat(40));
    println!("  {}: {}", "URI".bold(), graph_config.uri);
    println!("  {}: {}", "Database".bold(), graph_config.database);
    println!("  {}: {}", "Nodes".bold(), counts.nodes.to_string().cyan());
    println!("  {}: {}", "Relationships".bold(), counts.relationships.to_string().cyan());
    Ok(())
}
