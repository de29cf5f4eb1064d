//! Neo4j sink over Bolt.
//!
//! Nodes are created one statement at a time so the engine gets the graph
//! id back immediately. Edges only need ids that already exist, so they are
//! buffered per relation name and written with `UNWIND` in batches.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use graphport_core::{GraphSink, NodeId, PropertyMap, PropertyValue, SinkError, SinkResult};
use neo4rs::{BoltType, Query};
use tracing::{debug, info};

use crate::client::GraphClient;

/// Nodes removed per statement by [`BoltSink::clear`].
const CLEAR_BATCH_SIZE: i64 = 10_000;

pub struct BoltSink {
    client: GraphClient,
    batch_size: usize,
    pending: BTreeMap<String, Vec<HashMap<String, BoltType>>>,
}

impl BoltSink {
    pub fn new(client: GraphClient, batch_size: usize) -> Self {
        Self {
            client,
            batch_size: batch_size.max(1),
            pending: BTreeMap::new(),
        }
    }

    /// Delete every node and relationship, in batches.
    pub async fn clear(&self) -> anyhow::Result<u64> {
        let mut removed = 0u64;
        loop {
            let query = Query::new(
                "MATCH (n) WITH n LIMIT $limit DETACH DELETE n RETURN count(*) AS removed".to_string(),
            )
            .param("limit", CLEAR_BATCH_SIZE);
            let batch: i64 = self.client.query_scalar(query, "removed").await?.unwrap_or(0);
            if batch == 0 {
                break;
            }
            removed += batch as u64;
            debug!(removed, "Clearing destination graph");
        }
        info!(removed, "Destination graph cleared");
        Ok(removed)
    }

    async fn write_edges(&mut self, relation: &str) -> SinkResult<()> {
        let Some(batch) = self.pending.remove(relation) else {
            return Ok(());
        };
        if batch.is_empty() {
            return Ok(());
        }
        let count = batch.len();
        let query = Query::new(format!(
            "UNWIND $rels AS rel
             MATCH (a) WHERE id(a) = rel.from
             MATCH (b) WHERE id(b) = rel.to
             CREATE (a)-[r:{}]->(b)
             SET r = rel.props",
            quote(relation)
        ))
        .param("rels", batch);

        self.client
            .execute(query)
            .await
            .map_err(|e| SinkError::Rejected(format!("{:#}", e)))?;
        debug!(relation, count, "Wrote relationship batch");
        Ok(())
    }
}

#[async_trait]
impl GraphSink for BoltSink {
    async fn create_node(&mut self, labels: &[String], properties: &PropertyMap) -> SinkResult<NodeId> {
        if labels.is_empty() {
            return Err(SinkError::Rejected("node without labels".to_string()));
        }
        let labels: String = labels.iter().map(|l| format!(":{}", quote(l))).collect();
        let query = Query::new(format!("CREATE (n{}) SET n = $props RETURN id(n) AS id", labels))
            .param("props", to_bolt_map(properties));

        self.client
            .query_scalar::<i64>(query, "id")
            .await
            .map_err(|e| SinkError::Rejected(format!("{:#}", e)))?
            .ok_or_else(|| SinkError::Rejected("CREATE returned no node id".to_string()))
    }

    async fn create_edge(&mut self, from: NodeId, to: NodeId, relation: &str, properties: &PropertyMap) -> SinkResult<()> {
        let mut row: HashMap<String, BoltType> = HashMap::new();
        row.insert("from".to_string(), from.into());
        row.insert("to".to_string(), to.into());
        row.insert("props".to_string(), to_bolt_map(properties).into());

        let buffered = self.pending.entry(relation.to_string()).or_default();
        buffered.push(row);
        if buffered.len() >= self.batch_size {
            self.write_edges(relation).await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> SinkResult<()> {
        let relations: Vec<String> = self.pending.keys().cloned().collect();
        for relation in relations {
            self.write_edges(&relation).await?;
        }
        Ok(())
    }

    async fn create_uniqueness_constraint(&mut self, label: &str, property: &str) -> SinkResult<()> {
        let statement = format!(
            "CREATE CONSTRAINT {} IF NOT EXISTS FOR (n:{}) REQUIRE n.{} IS UNIQUE",
            quote(&schema_name(label, property, "unique")),
            quote(label),
            quote(property)
        );
        self.client
            .execute(Query::new(statement))
            .await
            .map_err(|e| SinkError::Conflict(format!("{:#}", e)))
    }

    async fn create_index(&mut self, label: &str, property: &str) -> SinkResult<()> {
        let statement = format!(
            "CREATE INDEX {} IF NOT EXISTS FOR (n:{}) ON (n.{})",
            quote(&schema_name(label, property, "index")),
            quote(label),
            quote(property)
        );
        self.client
            .execute(Query::new(statement))
            .await
            .map_err(|e| SinkError::Conflict(format!("{:#}", e)))
    }

    async fn shutdown(&mut self) -> SinkResult<()> {
        self.flush().await
    }
}

fn to_bolt(value: &PropertyValue) -> BoltType {
    match value {
        PropertyValue::Text(s) => s.clone().into(),
        PropertyValue::Integer(i) => (*i).into(),
        PropertyValue::Float(f) => (*f).into(),
        PropertyValue::Boolean(b) => (*b).into(),
        PropertyValue::TextList(items) => items.clone().into(),
    }
}

fn to_bolt_map(properties: &PropertyMap) -> HashMap<String, BoltType> {
    properties.iter().map(|(k, v)| (k.clone(), to_bolt(v))).collect()
}

/// Backtick-quote a label, relation type or property name for Cypher.
fn quote(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

fn schema_name(label: &str, property: &str, kind: &str) -> String {
    format!("{}_{}_{}", label, property, kind).to_lowercase()
}
