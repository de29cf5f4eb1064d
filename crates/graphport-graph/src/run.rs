//! Whole-run orchestration: roots, deferred schema, report.

use std::collections::BTreeSet;
use std::time::Instant;

use chrono::Utc;
use graphport_core::{
    GraphSink, ImportError, ImportResult, ImportWarning, SchemaIntrospector, SourceAdapter, SourceInstance,
};
use tracing::{debug, info};

use crate::engine::{GraphImportEngine, ImportContext, ImportProgress};
use crate::report::{format_elapsed, ImportReport};
use crate::schema::create_deferred_schema;

/// Bookkeeping types that are never reached from the root set.
pub const UNIMPORTED_TYPES: &[&str] = &["StableIdentifier", "PathwayDiagramItem", "ReactionCoordinates"];

/// Attribute named in warnings about a root that could not be imported.
const ROOT_ATTRIBUTE: &str = "frontPageItem";

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Display names of the roots to import. `None` imports every root.
    pub roots: Option<BTreeSet<String>>,
    pub show_progress: bool,
}

impl ImportOptions {
    pub fn scoped<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roots: Some(names.into_iter().map(Into::into).collect()),
            show_progress: false,
        }
    }

    fn includes(&self, root: &SourceInstance) -> bool {
        match &self.roots {
            Some(names) => names.contains(root.name_or_empty()),
            None => true,
        }
    }
}

/// Instances the run is expected to import, for progress reporting.
pub fn expected_total<A: SourceAdapter + ?Sized>(adapter: &A, root_type: &str) -> ImportResult<u64> {
    let mut total = adapter.count_instances(root_type)?;
    for name in UNIMPORTED_TYPES {
        total = total.saturating_sub(adapter.count_instances(name)?);
    }
    Ok(total)
}

/// Import every selected root, then flush and create the deferred schema.
///
/// Only errors that terminate the run are returned; everything else is
/// counted in the report's warnings.
pub async fn run_import<A, S>(
    introspector: SchemaIntrospector,
    adapter: &A,
    sink: &mut S,
    options: &ImportOptions,
) -> ImportResult<ImportReport>
where
    A: SourceAdapter + ?Sized,
    S: GraphSink + ?Sized,
{
    let started_at = Utc::now();
    let clock = Instant::now();

    let total = expected_total(adapter, &introspector.schema().root)?;
    let roots: Vec<SourceInstance> = adapter
        .fetch_root_set()?
        .into_iter()
        .filter(|root| options.includes(root))
        .collect();
    info!(roots = roots.len(), expected = total, "Started importing {} top level pathways", roots.len());

    let ctx = ImportContext::new(introspector, ImportProgress::new(total, options.show_progress));
    let mut engine = GraphImportEngine::new(adapter, &mut *sink, ctx);
    let mut roots_imported = 0;
    for root in roots {
        let root_clock = Instant::now();
        let (db_id, name) = (root.db_id, root.name_or_empty().to_string());
        match engine.import_instance(root).await {
            Ok(_) => {
                roots_imported += 1;
                info!(root = %name, "{} was processed within: {}", name, format_elapsed(root_clock.elapsed()));
            }
            Err(e) if !e.is_fatal() => engine.record(ImportWarning::RelationFailure {
                db_id,
                display_name: name,
                attribute: ROOT_ATTRIBUTE.to_string(),
                reason: e.to_string(),
            }),
            Err(e) => return Err(e),
        }
    }
    debug!(types = engine.described_types(), "Type descriptors computed");

    let mut ctx = engine.into_context();
    ctx.progress.finish(ctx.memo.len());
    info!(nodes = ctx.memo.len(), relationships = ctx.relationships_created, "All top level pathways have been imported");

    sink.flush()
        .await
        .map_err(|e| ImportError::sink("buffered writes", e))?;
    let schema = create_deferred_schema(sink, &mut ctx.warnings).await;
    sink.shutdown()
        .await
        .map_err(|e| ImportError::sink("shutdown", e))?;

    let report = ImportReport {
        started_at,
        elapsed: clock.elapsed(),
        expected_total: total,
        roots_imported,
        nodes_created: ctx.nodes_created(),
        relationships_created: ctx.relationships_created,
        constraints_created: schema.constraints_created,
        indexes_created: schema.indexes_created,
        warnings: ctx.warnings,
    };
    info!(
        status = report.status().as_str(),
        warnings = report.warnings.total(),
        "Import finished in {}",
        format_elapsed(report.elapsed)
    );
    Ok(report)
}
