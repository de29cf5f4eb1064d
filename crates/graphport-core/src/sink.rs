//! Write-side contract over the destination graph.

use async_trait::async_trait;

use crate::{PropertyMap, SinkResult};

/// Graph-native node id, stable for the run.
pub type NodeId = i64;

/// Bulk-load destination for nodes and edges.
///
/// No uniqueness is enforced while loading; callers avoid duplicate edges
/// by aggregating before calling [`create_edge`](GraphSink::create_edge).
/// Constraints and indexes are requested only after [`flush`](GraphSink::flush)
/// has completed every buffered node and edge write.
#[async_trait]
pub trait GraphSink: Send {
    async fn create_node(&mut self, labels: &[String], properties: &PropertyMap) -> SinkResult<NodeId>;

    async fn create_edge(&mut self, from: NodeId, to: NodeId, relation: &str, properties: &PropertyMap) -> SinkResult<()>;

    /// Complete any buffered writes.
    async fn flush(&mut self) -> SinkResult<()>;

    async fn create_uniqueness_constraint(&mut self, label: &str, property: &str) -> SinkResult<()>;

    async fn create_index(&mut self, label: &str, property: &str) -> SinkResult<()>;

    /// Release destination resources. Called once at the end of a run.
    async fn shutdown(&mut self) -> SinkResult<()> {
        Ok(())
    }
}
