//! [`GraphSink`](graphport_core::GraphSink) implementations.
//!
//! - [`BoltSink`]: a live Neo4j database over Bolt.
//! - [`DumpSink`]: an on-disk dump directory for offline loading.
//! - [`MemorySink`]: an in-process recorder, used by tests and dry runs.

pub mod bolt;
pub mod dump;
pub mod memory;

pub use bolt::BoltSink;
pub use dump::DumpSink;
pub use memory::{MemoryEdge, MemoryNode, MemorySink, SinkCall};
