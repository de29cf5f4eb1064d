use std::fs;

use async_trait::async_trait;
use graphport_core::{
    GraphSink, ImportError, NodeId, PropertyMap, PropertyValue, SchemaDescription, SchemaIntrospector, SinkError,
    SinkResult, WarningKind,
};
use graphport_graph::sink::dump::{GRAPH_FILE, SCHEMA_FILE};
use graphport_graph::{run_import, DumpSink, ImportOptions, ImportReport, MemorySink, RunStatus, SinkCall};
use graphport_source::{SourceBuilder, SqliteSource};

fn introspector() -> SchemaIntrospector {
    SchemaIntrospector::new(SchemaDescription::builtin().unwrap())
}

async fn import(source: &SqliteSource, options: &ImportOptions) -> (MemorySink, ImportReport) {
    let mut sink = MemorySink::new();
    let report = run_import(introspector(), source, &mut sink, options).await.unwrap();
    (sink, report)
}

fn node_id(sink: &MemorySink, db_id: i64) -> NodeId {
    sink.node_for(db_id).map(|n| n.id).unwrap()
}

#[tokio::test]
async fn test_shared_instance_imported_once() {
    let mut kb = SourceBuilder::reactome().unwrap();
    let pathway = kb.instance("TopLevelPathway", "Mitophagy").unwrap();
    let r1 = kb.instance("Reaction", "r1").unwrap();
    let r2 = kb.instance("Reaction", "r2").unwrap();
    let atp = kb.instance("SimpleEntity", "ATP").unwrap();
    kb.reference(pathway, "hasEvent", r1).unwrap();
    kb.reference(pathway, "hasEvent", r2).unwrap();
    kb.reference(r1, "input", atp).unwrap();
    kb.reference(r2, "output", atp).unwrap();
    kb.front_page(&[pathway]).unwrap();
    let source = kb.finish();

    let (sink, report) = import(&source, &ImportOptions::default()).await;

    assert_eq!(sink.nodes.len(), 4);
    assert_eq!(report.nodes_created, 4);
    assert_eq!(sink.nodes.iter().filter(|n| n.db_id() == Some(atp)).count(), 1);
    let atp_node = node_id(&sink, atp);
    assert!(sink.edge(node_id(&sink, r1), atp_node, "input").is_some());
    assert!(sink.edge(node_id(&sink, r2), atp_node, "output").is_some());
}

#[tokio::test]
async fn test_cycle_terminates() {
    let mut kb = SourceBuilder::reactome().unwrap();
    let a = kb.instance("Pathway", "A").unwrap();
    let b = kb.instance("Pathway", "B").unwrap();
    kb.reference(a, "hasEvent", b).unwrap();
    kb.reference(b, "hasEvent", a).unwrap();
    kb.front_page(&[a]).unwrap();
    let source = kb.finish();

    let (sink, report) = import(&source, &ImportOptions::default()).await;

    assert_eq!(sink.nodes.len(), 2);
    assert_eq!(sink.edges.len(), 2);
    assert_eq!(report.relationships_created, 2);
    let (na, nb) = (node_id(&sink, a), node_id(&sink, b));
    assert!(sink.edge(na, nb, "hasEvent").is_some());
    assert!(sink.edge(nb, na, "hasEvent").is_some());
}

#[tokio::test]
async fn test_repeated_targets_become_one_edge_with_count() {
    let mut kb = SourceBuilder::reactome().unwrap();
    let reaction = kb.instance("Reaction", "r").unwrap();
    let x = kb.instance("SimpleEntity", "X").unwrap();
    let y = kb.instance("SimpleEntity", "Y").unwrap();
    for target in [x, x, y, x] {
        kb.reference(reaction, "input", target).unwrap();
    }
    kb.front_page(&[reaction]).unwrap();
    let source = kb.finish();

    let (sink, _) = import(&source, &ImportOptions::default()).await;

    let from = node_id(&sink, reaction);
    let inputs: Vec<_> = sink.edges_from(from).into_iter().filter(|e| e.relation == "input").collect();
    assert_eq!(inputs.len(), 2);
    assert_eq!(sink.edge(from, node_id(&sink, x), "input").and_then(|e| e.stoichiometry()), Some(3));
    assert_eq!(sink.edge(from, node_id(&sink, y), "input").and_then(|e| e.stoichiometry()), Some(1));
}

#[tokio::test]
async fn test_labels_follow_ancestry_without_root() {
    let mut kb = SourceBuilder::reactome().unwrap();
    let complex = kb.instance("Complex", "C").unwrap();
    let regulation = kb.instance("PositiveRegulation", "reg").unwrap();
    kb.front_page(&[complex, regulation]).unwrap();
    let source = kb.finish();

    let (sink, _) = import(&source, &ImportOptions::default()).await;

    assert_eq!(
        sink.node_for(complex).unwrap().labels,
        vec!["Complex".to_string(), "PhysicalEntity".to_string()]
    );
    assert_eq!(
        sink.node_for(regulation).unwrap().labels,
        vec!["PositiveRegulation".to_string(), "Regulation".to_string()]
    );
}

#[tokio::test]
async fn test_scalar_and_derived_properties() {
    let mut kb = SourceBuilder::reactome().unwrap();
    let pathway = kb.instance("Pathway", "Apoptosis").unwrap();
    let st_id = kb.instance("StableIdentifier", "R-HSA-109581.3").unwrap();
    kb.text(st_id, "identifier", "R-HSA-109581").unwrap();
    kb.reference(pathway, "stableIdentifier", st_id).unwrap();
    kb.text(pathway, "doi", "10.3180/REACT_578.2").unwrap();
    kb.text(pathway, "name", "Apoptosis").unwrap();
    kb.text(pathway, "name", "Programmed cell death").unwrap();
    let human = kb.instance("Species", "Homo sapiens").unwrap();
    kb.reference(pathway, "species", human).unwrap();
    kb.front_page(&[pathway]).unwrap();
    let source = kb.finish();

    let (sink, _) = import(&source, &ImportOptions::default()).await;
    let props = &sink.node_for(pathway).unwrap().properties;

    assert_eq!(props.get("dbId"), Some(&PropertyValue::Integer(pathway)));
    assert_eq!(props.get("displayName"), Some(&PropertyValue::Text("Apoptosis".into())));
    assert_eq!(props.get("stableIdentifier"), Some(&PropertyValue::Text("R-HSA-109581".into())));
    assert_eq!(props.get("doi"), Some(&PropertyValue::Text("10.3180/REACT_578.2".into())));
    assert_eq!(props.get("speciesName"), Some(&PropertyValue::Text("Homo sapiens".into())));
    assert_eq!(
        props.get("name"),
        Some(&PropertyValue::TextList(vec!["Apoptosis".into(), "Programmed cell death".into()]))
    );
    assert!(!props.contains_key("hasDiagram"));
    // The identifier instance is only read, never imported.
    assert!(sink.node_for(st_id).is_none());
}

#[tokio::test]
async fn test_missing_derivation_source_still_creates_node() {
    let mut kb = SourceBuilder::reactome().unwrap();
    let healthy = kb.instance("Reaction", "healthy").unwrap();
    let diseased = kb.instance("Reaction", "diseased").unwrap();
    let cancer = kb.instance("Disease", "cancer").unwrap();
    kb.reference(diseased, "disease", cancer).unwrap();
    kb.front_page(&[healthy, diseased]).unwrap();
    let source = kb.finish();

    let (sink, report) = import(&source, &ImportOptions::default()).await;

    assert!(!sink.node_for(healthy).unwrap().properties.contains_key("isInDisease"));
    assert_eq!(
        sink.node_for(diseased).unwrap().properties.get("isInDisease"),
        Some(&PropertyValue::Boolean(true))
    );
    assert!(report.warnings.get(WarningKind::DerivationFailure) > 0);
    assert_eq!(report.status(), RunStatus::SucceededWithWarnings);
}

#[tokio::test]
async fn test_missing_display_name_is_reported() {
    let mut kb = SourceBuilder::reactome().unwrap();
    let unnamed = kb.unnamed_instance("SimpleEntity").unwrap();
    kb.front_page(&[unnamed]).unwrap();
    let source = kb.finish();

    let (sink, report) = import(&source, &ImportOptions::default()).await;

    let node = sink.node_for(unnamed).unwrap();
    assert!(!node.properties.contains_key("displayName"));
    assert_eq!(report.warnings.get(WarningKind::MissingRequiredField), 1);
}

#[tokio::test]
async fn test_constraints_follow_every_write() {
    let mut kb = SourceBuilder::reactome().unwrap();
    let pathway = kb.instance("TopLevelPathway", "Mitophagy").unwrap();
    let reaction = kb.instance("Reaction", "r").unwrap();
    let complex = kb.instance("Complex", "c").unwrap();
    kb.reference(pathway, "hasEvent", reaction).unwrap();
    kb.reference(reaction, "input", complex).unwrap();
    kb.front_page(&[pathway]).unwrap();
    let source = kb.finish();

    let (sink, report) = import(&source, &ImportOptions::default()).await;

    let last_write = sink
        .calls
        .iter()
        .rposition(|c| matches!(c, SinkCall::CreateNode(_) | SinkCall::CreateEdge { .. }))
        .unwrap();
    let flush = sink.calls.iter().position(|c| *c == SinkCall::Flush).unwrap();
    let first_schema = sink
        .calls
        .iter()
        .position(|c| matches!(c, SinkCall::CreateConstraint { .. } | SinkCall::CreateIndex { .. }))
        .unwrap();
    assert!(last_write < flush);
    assert!(flush < first_schema);
    assert_eq!(sink.calls.last(), Some(&SinkCall::Shutdown));
    assert_eq!(report.constraints_created, 22);
    assert_eq!(report.indexes_created, 2);
}

#[tokio::test]
async fn test_root_scope_limits_import() {
    let mut kb = SourceBuilder::reactome().unwrap();
    let mitophagy = kb.instance("TopLevelPathway", "Mitophagy").unwrap();
    let clock = kb.instance("TopLevelPathway", "Circadian Clock").unwrap();
    let pink1 = kb.instance("Reaction", "PINK1 binds").unwrap();
    let bmal = kb.instance("Reaction", "BMAL1 binds").unwrap();
    kb.reference(mitophagy, "hasEvent", pink1).unwrap();
    kb.reference(clock, "hasEvent", bmal).unwrap();
    kb.front_page(&[mitophagy, clock]).unwrap();
    let source = kb.finish();

    let (sink, report) = import(&source, &ImportOptions::scoped(["Mitophagy"])).await;

    assert_eq!(report.roots_imported, 1);
    assert_eq!(sink.nodes.len(), 2);
    assert!(sink.node_for(pink1).is_some());
    assert!(sink.node_for(clock).is_none());
    assert!(sink.node_for(bmal).is_none());
}

#[tokio::test]
async fn test_regulation_written_once_from_inverse() {
    let mut kb = SourceBuilder::reactome().unwrap();
    let reaction = kb.instance("Reaction", "r").unwrap();
    let regulation = kb.instance("PositiveRegulation", "activates r").unwrap();
    kb.reference(regulation, "regulatedEntity", reaction).unwrap();
    kb.front_page(&[reaction]).unwrap();
    let source = kb.finish();

    let (sink, report) = import(&source, &ImportOptions::default()).await;

    // positivelyRegulatedBy and inferredTo are reported, regulatedBy is not.
    assert_eq!(report.warnings.get(WarningKind::SchemaMismatch), 2);
    let from = node_id(&sink, reaction);
    let regulated: Vec<_> = sink
        .edges_from(from)
        .into_iter()
        .filter(|e| e.relation == "regulatedBy")
        .collect();
    assert_eq!(regulated.len(), 1);
    assert_eq!(regulated[0].to, node_id(&sink, regulation));
    assert!(!sink.edges.iter().any(|e| e.relation == "positivelyRegulatedBy"));
    // regulatedEntity itself is never written.
    assert!(!sink.edges.iter().any(|e| e.relation == "regulatedEntity"));
}

#[tokio::test]
async fn test_missing_legacy_regulation_is_not_reported() {
    let mut kb = SourceBuilder::reactome().unwrap();
    kb.attribute("Event", "positivelyRegulatedBy").unwrap();
    let reaction = kb.instance("Reaction", "r").unwrap();
    kb.front_page(&[reaction]).unwrap();
    let source = kb.finish();

    let (_, report) = import(&source, &ImportOptions::default()).await;

    // Only inferredTo is left invalid besides regulatedBy.
    assert_eq!(report.warnings.get(WarningKind::SchemaMismatch), 1);
    assert_eq!(report.status(), RunStatus::SucceededWithWarnings);
}

#[tokio::test]
async fn test_stored_regulation_not_duplicated_by_inverse() {
    let mut kb = SourceBuilder::reactome().unwrap();
    kb.attribute("Event", "regulatedBy").unwrap();
    let reaction = kb.instance("Reaction", "r").unwrap();
    let regulation = kb.instance("PositiveRegulation", "activates r").unwrap();
    kb.reference(reaction, "regulatedBy", regulation).unwrap();
    kb.reference(regulation, "regulatedEntity", reaction).unwrap();
    kb.front_page(&[reaction]).unwrap();
    let source = kb.finish();

    let (sink, _) = import(&source, &ImportOptions::default()).await;

    let from = node_id(&sink, reaction);
    let to = node_id(&sink, regulation);
    let regulated: Vec<_> = sink
        .edges_from(from)
        .into_iter()
        .filter(|e| e.relation == "regulatedBy")
        .collect();
    assert_eq!(regulated.len(), 1);
    assert_eq!(regulated[0].to, to);
    assert_eq!(regulated[0].stoichiometry(), Some(1));
}

#[tokio::test]
async fn test_inferred_to_requires_several_orthologs() {
    let mut kb = SourceBuilder::reactome().unwrap();
    let single = kb.instance("Reaction", "single").unwrap();
    let ortholog = kb.instance("Reaction", "mouse single").unwrap();
    kb.reference(single, "orthologousEvent", ortholog).unwrap();
    let plural = kb.instance("Reaction", "plural").unwrap();
    let o1 = kb.instance("Reaction", "mouse plural").unwrap();
    let o2 = kb.instance("Reaction", "rat plural").unwrap();
    kb.reference(plural, "orthologousEvent", o1).unwrap();
    kb.reference(plural, "orthologousEvent", o2).unwrap();
    kb.front_page(&[single, plural]).unwrap();
    let source = kb.finish();

    let (sink, _) = import(&source, &ImportOptions::default()).await;

    assert!(sink.node_for(ortholog).is_none());
    let from = node_id(&sink, plural);
    assert!(sink.edge(from, node_id(&sink, o1), "inferredTo").is_some());
    assert!(sink.edge(from, node_id(&sink, o2), "inferredTo").is_some());
    assert!(!sink.edges.iter().any(|e| e.relation == "orthologousEvent"));
}

#[tokio::test]
async fn test_instances_released_after_import() {
    let mut kb = SourceBuilder::reactome().unwrap();
    let pathway = kb.instance("TopLevelPathway", "p").unwrap();
    let reaction = kb.instance("Reaction", "r").unwrap();
    let entity = kb.instance("SimpleEntity", "e").unwrap();
    let st_id = kb.instance("StableIdentifier", "R-HSA-1.1").unwrap();
    kb.text(st_id, "identifier", "R-HSA-1").unwrap();
    kb.reference(pathway, "stableIdentifier", st_id).unwrap();
    kb.reference(pathway, "hasEvent", reaction).unwrap();
    kb.reference(reaction, "input", entity).unwrap();
    kb.front_page(&[pathway]).unwrap();
    let source = kb.finish();

    import(&source, &ImportOptions::default()).await;

    assert_eq!(source.loaded_instances(), 0);
}

#[tokio::test]
async fn test_undescribed_target_is_skipped() {
    let mut kb = SourceBuilder::reactome().unwrap();
    kb.class("Mystery", Some("DatabaseObject")).unwrap();
    let pathway = kb.instance("Pathway", "p").unwrap();
    let mystery = kb.instance("Mystery", "?").unwrap();
    let reaction = kb.instance("Reaction", "r").unwrap();
    kb.reference(pathway, "hasEvent", mystery).unwrap();
    kb.reference(pathway, "hasEvent", reaction).unwrap();
    kb.front_page(&[pathway]).unwrap();
    let source = kb.finish();

    let (sink, report) = import(&source, &ImportOptions::default()).await;

    assert!(sink.node_for(mystery).is_none());
    assert!(sink.node_for(reaction).is_some());
    assert_eq!(sink.edges_from(node_id(&sink, pathway)).len(), 1);
    assert_eq!(report.warnings.get(WarningKind::RelationFailure), 1);
}

#[tokio::test]
async fn test_expected_total_excludes_bookkeeping() {
    let mut kb = SourceBuilder::reactome().unwrap();
    let pathway = kb.instance("TopLevelPathway", "p").unwrap();
    kb.instance("StableIdentifier", "R-HSA-1.1").unwrap();
    kb.instance("StableIdentifier", "R-HSA-2.1").unwrap();
    kb.front_page(&[pathway]).unwrap();
    let source = kb.finish();

    let (_, report) = import(&source, &ImportOptions::default()).await;

    // Pathway and front page remain.
    assert_eq!(report.expected_total, 2);
}

/// Refuses every node carrying `label`.
struct RejectingSink {
    inner: MemorySink,
    label: &'static str,
}

#[async_trait]
impl GraphSink for RejectingSink {
    async fn create_node(&mut self, labels: &[String], properties: &PropertyMap) -> SinkResult<NodeId> {
        if labels.iter().any(|l| l == self.label) {
            return Err(SinkError::Rejected(format!("{} nodes are not accepted", self.label)));
        }
        self.inner.create_node(labels, properties).await
    }

    async fn create_edge(&mut self, from: NodeId, to: NodeId, relation: &str, properties: &PropertyMap) -> SinkResult<()> {
        self.inner.create_edge(from, to, relation, properties).await
    }

    async fn flush(&mut self) -> SinkResult<()> {
        self.inner.flush().await
    }

    async fn create_uniqueness_constraint(&mut self, label: &str, property: &str) -> SinkResult<()> {
        self.inner.create_uniqueness_constraint(label, property).await
    }

    async fn create_index(&mut self, label: &str, property: &str) -> SinkResult<()> {
        self.inner.create_index(label, property).await
    }
}

#[tokio::test]
async fn test_node_rejection_aborts_run() {
    let mut kb = SourceBuilder::reactome().unwrap();
    let reaction = kb.instance("Reaction", "r").unwrap();
    let complex = kb.instance("Complex", "c").unwrap();
    kb.reference(reaction, "input", complex).unwrap();
    kb.front_page(&[reaction]).unwrap();
    let source = kb.finish();

    let mut sink = RejectingSink {
        inner: MemorySink::new(),
        label: "Complex",
    };
    let err = run_import(introspector(), &source, &mut sink, &ImportOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::SinkRejection { .. }));
    assert!(err.is_fatal());
    assert!(!sink.inner.calls.iter().any(|c| matches!(c, SinkCall::CreateConstraint { .. })));
}

#[tokio::test]
async fn test_missing_front_page_aborts_run() {
    let mut kb = SourceBuilder::reactome().unwrap();
    kb.instance("Pathway", "orphan").unwrap();
    let source = kb.finish();

    let mut sink = MemorySink::new();
    let err = run_import(introspector(), &source, &mut sink, &ImportOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::SourceData(_)));
    assert!(sink.calls.is_empty());
}

#[tokio::test]
async fn test_dump_sink_end_to_end() {
    let mut kb = SourceBuilder::reactome().unwrap();
    let pathway = kb.instance("TopLevelPathway", "Mitophagy").unwrap();
    let reaction = kb.instance("Reaction", "r").unwrap();
    let entity = kb.instance("SimpleEntity", "e").unwrap();
    kb.reference(pathway, "hasEvent", reaction).unwrap();
    kb.reference(reaction, "input", entity).unwrap();
    kb.front_page(&[pathway]).unwrap();
    let source = kb.finish();

    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("graph.db");
    let mut sink = DumpSink::create(&dir).unwrap();
    let report = run_import(introspector(), &source, &mut sink, &ImportOptions::default())
        .await
        .unwrap();

    let graph = fs::read_to_string(dir.join(GRAPH_FILE)).unwrap();
    assert_eq!(graph.lines().count(), report.nodes_created + report.relationships_created);
    assert_eq!(report.nodes_created, 3);
    let schema = fs::read_to_string(dir.join(SCHEMA_FILE)).unwrap();
    assert_eq!(schema.lines().count(), 24);
}
