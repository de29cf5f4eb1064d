//! `graphport describe`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use graphport_core::SchemaIntrospector;

use crate::config::{load_schema, ImportConfig};
use crate::output;

#[derive(Args)]
pub struct DescribeArgs {
    /// Type name, e.g. Complex
    pub type_name: String,

    /// Schema description replacing the built-in one
    #[arg(long)]
    pub schema: Option<PathBuf>,
}

pub fn execute(args: DescribeArgs, config: &ImportConfig) -> Result<()> {
    let schema = load_schema(args.schema.as_deref().or(config.schema.as_deref()))?;
    let mut introspector = SchemaIntrospector::new(schema);
    let descriptor = introspector.type_descriptor(&args.type_name)?;
    output::print_descriptor(&descriptor);
    Ok(())
}
