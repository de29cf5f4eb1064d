//! # Graphport Graph
//!
//! Import engine and graph destinations for graphport.
//!
//! Walks the root set of a knowledge base depth-first, writes one node per
//! instance and one aggregated edge per distinct target, then creates the
//! deferred constraints and indexes.

pub mod client;
pub mod engine;
pub mod report;
pub mod run;
pub mod schema;
pub mod sink;

pub use client::{GraphClient, GraphConfig, GraphCounts};
pub use engine::{GraphImportEngine, ImportContext, ImportMemo, ImportProgress, VisitState};
pub use report::{ImportReport, RunStatus};
pub use run::{run_import, ImportOptions};
pub use sink::{BoltSink, DumpSink, MemorySink, SinkCall};
