//! Dump directory sink.
//!
//! Writes the graph as APOC-style JSON lines to `graph.json` and the
//! deferred schema as Cypher statements to `schema.cypher`, for loading
//! into a database with `apoc.import.json` offline.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use graphport_core::{GraphSink, NodeId, PropertyMap, SinkError, SinkResult};
use serde::Serialize;
use tracing::info;

pub const GRAPH_FILE: &str = "graph.json";
pub const SCHEMA_FILE: &str = "schema.cypher";

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum DumpRecord<'a> {
    Node {
        id: String,
        labels: &'a [String],
        properties: &'a PropertyMap,
    },
    Relationship {
        id: String,
        label: &'a str,
        start: Endpoint,
        end: Endpoint,
        properties: &'a PropertyMap,
    },
}

#[derive(Serialize)]
struct Endpoint {
    id: String,
}

pub struct DumpSink {
    dir: PathBuf,
    graph: BufWriter<File>,
    schema: BufWriter<File>,
    next_node: NodeId,
    next_edge: u64,
    constraints: HashSet<(String, String)>,
    indexes: HashSet<(String, String)>,
}

impl DumpSink {
    /// Recreate `dir` empty and open the dump files inside it.
    pub fn create(dir: &Path) -> SinkResult<Self> {
        prepare_destination(dir)?;
        let graph = BufWriter::new(File::create(dir.join(GRAPH_FILE))?);
        let schema = BufWriter::new(File::create(dir.join(SCHEMA_FILE))?);
        info!(path = %dir.display(), "Writing graph dump");
        Ok(Self {
            dir: dir.to_path_buf(),
            graph,
            schema,
            next_node: 0,
            next_edge: 0,
            constraints: HashSet::new(),
            indexes: HashSet::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_record(&mut self, record: &DumpRecord<'_>) -> SinkResult<()> {
        serde_json::to_writer(&mut self.graph, record)?;
        self.graph.write_all(b"\n")?;
        Ok(())
    }
}

/// Remove any previous content at `dir` and create it empty.
pub fn prepare_destination(dir: &Path) -> std::io::Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)
}

#[async_trait]
impl GraphSink for DumpSink {
    async fn create_node(&mut self, labels: &[String], properties: &PropertyMap) -> SinkResult<NodeId> {
        if labels.is_empty() {
            return Err(SinkError::Rejected("node without labels".to_string()));
        }
        let id = self.next_node;
        self.write_record(&DumpRecord::Node {
            id: id.to_string(),
            labels,
            properties,
        })?;
        self.next_node += 1;
        Ok(id)
    }

    async fn create_edge(&mut self, from: NodeId, to: NodeId, relation: &str, properties: &PropertyMap) -> SinkResult<()> {
        if from >= self.next_node || to >= self.next_node {
            return Err(SinkError::Rejected(format!(
                "{} edge between unknown nodes {} and {}",
                relation, from, to
            )));
        }
        let id = self.next_edge;
        self.write_record(&DumpRecord::Relationship {
            id: id.to_string(),
            label: relation,
            start: Endpoint { id: from.to_string() },
            end: Endpoint { id: to.to_string() },
            properties,
        })?;
        self.next_edge += 1;
        Ok(())
    }

    async fn flush(&mut self) -> SinkResult<()> {
        self.graph.flush()?;
        Ok(())
    }

    async fn create_uniqueness_constraint(&mut self, label: &str, property: &str) -> SinkResult<()> {
        if !self.constraints.insert((label.to_string(), property.to_string())) {
            return Err(SinkError::Conflict(format!(
                "constraint on :{}({}) already requested",
                label, property
            )));
        }
        writeln!(
            self.schema,
            "CREATE CONSTRAINT IF NOT EXISTS FOR (n:`{}`) REQUIRE n.`{}` IS UNIQUE;",
            label, property
        )?;
        Ok(())
    }

    async fn create_index(&mut self, label: &str, property: &str) -> SinkResult<()> {
        if !self.indexes.insert((label.to_string(), property.to_string())) {
            return Err(SinkError::Conflict(format!(
                "index on :{}({}) already requested",
                label, property
            )));
        }
        writeln!(
            self.schema,
            "CREATE INDEX IF NOT EXISTS FOR (n:`{}`) ON (n.`{}`);",
            label, property
        )?;
        Ok(())
    }

    async fn shutdown(&mut self) -> SinkResult<()> {
        self.graph.flush()?;
        self.schema.flush()?;
        info!(
            path = %self.dir.display(),
            nodes = self.next_node,
            relationships = self.next_edge,
            "Graph dump complete"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_apoc_json_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("graph");
        let mut sink = DumpSink::create(&dir).unwrap();

        let mut props = PropertyMap::new();
        props.insert("dbId".into(), 5i64.into());
        let a = sink.create_node(&["Pathway".to_string()], &props).await.unwrap();
        let b = sink.create_node(&["Reaction".to_string()], &PropertyMap::new()).await.unwrap();
        let mut edge = PropertyMap::new();
        edge.insert("stoichiometry".into(), 2i64.into());
        sink.create_edge(a, b, "hasEvent", &edge).await.unwrap();
        sink.shutdown().await.unwrap();

        let content = fs::read_to_string(dir.join(GRAPH_FILE)).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["type"], "node");
        assert_eq!(lines[0]["id"], "0");
        assert_eq!(lines[0]["labels"][0], "Pathway");
        assert_eq!(lines[0]["properties"]["dbId"], 5);
        assert_eq!(lines[2]["type"], "relationship");
        assert_eq!(lines[2]["label"], "hasEvent");
        assert_eq!(lines[2]["start"]["id"], "0");
        assert_eq!(lines[2]["end"]["id"], "1");
        assert_eq!(lines[2]["properties"]["stoichiometry"], 2);
    }

    #[tokio::test]
    async fn test_destination_is_recreated() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("graph");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("stale.txt"), "old").unwrap();

        let _sink = DumpSink::create(&dir).unwrap();
        assert!(!dir.join("stale.txt").exists());
        assert!(dir.join(GRAPH_FILE).exists());
    }

    #[tokio::test]
    async fn test_repeated_constraint_conflicts() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sink = DumpSink::create(tmp.path()).unwrap();
        sink.create_uniqueness_constraint("Event", "dbId").await.unwrap();
        let err = sink.create_uniqueness_constraint("Event", "dbId").await.unwrap_err();
        assert!(matches!(err, SinkError::Conflict(_)));
        sink.shutdown().await.unwrap();

        let schema = fs::read_to_string(tmp.path().join(SCHEMA_FILE)).unwrap();
        assert_eq!(schema.lines().count(), 1);
        assert!(schema.contains("FOR (n:`Event`) REQUIRE n.`dbId` IS UNIQUE"));
    }
}
