//! In-memory graph recorder.

use std::collections::HashSet;

use async_trait::async_trait;
use graphport_core::{GraphSink, NodeId, PropertyMap, PropertyValue, SinkError, SinkResult};

/// One call made against the sink, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    CreateNode(NodeId),
    CreateEdge { from: NodeId, to: NodeId, relation: String },
    Flush,
    CreateConstraint { label: String, property: String },
    CreateIndex { label: String, property: String },
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryNode {
    pub id: NodeId,
    pub labels: Vec<String>,
    pub properties: PropertyMap,
}

impl MemoryNode {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn db_id(&self) -> Option<i64> {
        self.properties.get("dbId").and_then(PropertyValue::as_integer)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub relation: String,
    pub properties: PropertyMap,
}

impl MemoryEdge {
    pub fn stoichiometry(&self) -> Option<i64> {
        self.properties.get("stoichiometry").and_then(PropertyValue::as_integer)
    }
}

/// Keeps everything written to it. Node ids are indexes into [`nodes`](MemorySink::nodes).
#[derive(Debug, Default)]
pub struct MemorySink {
    pub nodes: Vec<MemoryNode>,
    pub edges: Vec<MemoryEdge>,
    pub constraints: Vec<(String, String)>,
    pub indexes: Vec<(String, String)>,
    pub calls: Vec<SinkCall>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> Option<&MemoryNode> {
        usize::try_from(id).ok().and_then(|i| self.nodes.get(i))
    }

    /// Node created for a source instance.
    pub fn node_for(&self, db_id: i64) -> Option<&MemoryNode> {
        self.nodes.iter().find(|n| n.db_id() == Some(db_id))
    }

    pub fn nodes_with_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a MemoryNode> + 'a {
        self.nodes.iter().filter(move |n| n.has_label(label))
    }

    pub fn edges_from(&self, from: NodeId) -> Vec<&MemoryEdge> {
        self.edges.iter().filter(|e| e.from == from).collect()
    }

    pub fn edge(&self, from: NodeId, to: NodeId, relation: &str) -> Option<&MemoryEdge> {
        self.edges
            .iter()
            .find(|e| e.from == from && e.to == to && e.relation == relation)
    }

    fn has_duplicate_values(&self, label: &str, property: &str) -> bool {
        let mut seen = HashSet::new();
        self.nodes_with_label(label)
            .filter_map(|n| n.properties.get(property))
            .any(|value| !seen.insert(format!("{:?}", value)))
    }
}

#[async_trait]
impl GraphSink for MemorySink {
    async fn create_node(&mut self, labels: &[String], properties: &PropertyMap) -> SinkResult<NodeId> {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(MemoryNode {
            id,
            labels: labels.to_vec(),
            properties: properties.clone(),
        });
        self.calls.push(SinkCall::CreateNode(id));
        Ok(id)
    }

    async fn create_edge(&mut self, from: NodeId, to: NodeId, relation: &str, properties: &PropertyMap) -> SinkResult<()> {
        if self.node(from).is_none() || self.node(to).is_none() {
            return Err(SinkError::Rejected(format!(
                "{} edge between unknown nodes {} and {}",
                relation, from, to
            )));
        }
        self.edges.push(MemoryEdge {
            from,
            to,
            relation: relation.to_string(),
            properties: properties.clone(),
        });
        self.calls.push(SinkCall::CreateEdge {
            from,
            to,
            relation: relation.to_string(),
        });
        Ok(())
    }

    async fn flush(&mut self) -> SinkResult<()> {
        self.calls.push(SinkCall::Flush);
        Ok(())
    }

    async fn create_uniqueness_constraint(&mut self, label: &str, property: &str) -> SinkResult<()> {
        self.calls.push(SinkCall::CreateConstraint {
            label: label.to_string(),
            property: property.to_string(),
        });
        if self.has_duplicate_values(label, property) {
            return Err(SinkError::Conflict(format!(
                "duplicate {} values on :{} nodes",
                property, label
            )));
        }
        self.constraints.push((label.to_string(), property.to_string()));
        Ok(())
    }

    async fn create_index(&mut self, label: &str, property: &str) -> SinkResult<()> {
        self.calls.push(SinkCall::CreateIndex {
            label: label.to_string(),
            property: property.to_string(),
        });
        self.indexes.push((label.to_string(), property.to_string()));
        Ok(())
    }

    async fn shutdown(&mut self) -> SinkResult<()> {
        self.calls.push(SinkCall::Shutdown);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(db_id: i64, st_id: &str) -> PropertyMap {
        let mut map = PropertyMap::new();
        map.insert("dbId".into(), db_id.into());
        map.insert("stableIdentifier".into(), st_id.into());
        map
    }

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let mut sink = MemorySink::new();
        let labels = vec!["Pathway".to_string()];
        let a = sink.create_node(&labels, &props(1, "R-1")).await.unwrap();
        let b = sink.create_node(&labels, &props(2, "R-2")).await.unwrap();
        sink.create_edge(a, b, "hasEvent", &PropertyMap::new()).await.unwrap();
        sink.flush().await.unwrap();

        assert_eq!(
            sink.calls,
            vec![
                SinkCall::CreateNode(0),
                SinkCall::CreateNode(1),
                SinkCall::CreateEdge { from: 0, to: 1, relation: "hasEvent".into() },
                SinkCall::Flush,
            ]
        );
        assert_eq!(sink.node_for(2).map(|n| n.id), Some(1));
    }

    #[tokio::test]
    async fn test_edge_to_unknown_node_is_rejected() {
        let mut sink = MemorySink::new();
        let err = sink.create_edge(0, 7, "input", &PropertyMap::new()).await.unwrap_err();
        assert!(matches!(err, SinkError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_constraint_conflict_on_duplicates() {
        let mut sink = MemorySink::new();
        let labels = vec!["Event".to_string()];
        sink.create_node(&labels, &props(1, "R-1")).await.unwrap();
        sink.create_node(&labels, &props(2, "R-1")).await.unwrap();

        sink.create_uniqueness_constraint("Event", "dbId").await.unwrap();
        let err = sink.create_uniqueness_constraint("Event", "stableIdentifier").await.unwrap_err();
        assert!(matches!(err, SinkError::Conflict(_)));
        assert_eq!(sink.constraints, vec![("Event".to_string(), "dbId".to_string())]);
    }
}
