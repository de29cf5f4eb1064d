//! Depth-first import of source instances into a graph sink.
//!
//! Each instance becomes one node. Its relationship attributes are followed
//! recursively, and the node id is memoized before that happens, so cycles
//! in the source terminate and shared instances are written only once.

pub mod memo;
pub mod progress;

use std::collections::HashSet;

use futures::future::{FutureExt, LocalBoxFuture};
use graphport_core::relation::reports_mismatch;
use graphport_core::{
    aggregate, DerivationRule, GraphSink, ImportError, ImportResult, ImportWarning, NodeId, PropertyMap,
    PropertyValue, RelationStrategy, SchemaIntrospector, SinkError, SourceAdapter, SourceError, SourceInstance,
    SourceResult, TypeDescriptor, WarningCounts,
};
use tracing::{debug, error};

pub use memo::{ImportMemo, MemoEntry, VisitState};
pub use progress::ImportProgress;

/// Node property holding the source id.
pub const DB_ID: &str = "dbId";
/// Node property holding the display name.
pub const DISPLAY_NAME: &str = "displayName";
/// Edge property holding how many times the target was referenced.
pub const STOICHIOMETRY: &str = "stoichiometry";

/// Mutable state of one import run.
pub struct ImportContext {
    pub memo: ImportMemo,
    pub introspector: SchemaIntrospector,
    pub progress: ImportProgress,
    pub warnings: WarningCounts,
    pub relationships_created: usize,
}

impl ImportContext {
    pub fn new(introspector: SchemaIntrospector, progress: ImportProgress) -> Self {
        Self {
            memo: ImportMemo::new(),
            introspector,
            progress,
            warnings: WarningCounts::default(),
            relationships_created: 0,
        }
    }

    pub fn nodes_created(&self) -> usize {
        self.memo.len()
    }
}

/// Targets to write for one relationship attribute, and the edge name to use.
struct Relation {
    edge_name: String,
    targets: Vec<SourceInstance>,
}

pub struct GraphImportEngine<'a, A: SourceAdapter + ?Sized, S: GraphSink + ?Sized> {
    adapter: &'a A,
    sink: &'a mut S,
    ctx: ImportContext,
}

impl<'a, A, S> GraphImportEngine<'a, A, S>
where
    A: SourceAdapter + ?Sized,
    S: GraphSink + ?Sized,
{
    pub fn new(adapter: &'a A, sink: &'a mut S, ctx: ImportContext) -> Self {
        Self { adapter, sink, ctx }
    }

    pub fn context(&self) -> &ImportContext {
        &self.ctx
    }

    pub fn into_context(self) -> ImportContext {
        self.ctx
    }

    /// Log and count a warning raised outside the engine.
    pub fn record(&mut self, warning: ImportWarning) {
        self.ctx.warnings.record(warning);
    }

    /// Import `instance` and everything reachable from it, returning its node id.
    ///
    /// An instance already in the memo is not read again; its existing node
    /// id is returned.
    pub fn import_instance<'b>(&'b mut self, instance: SourceInstance) -> LocalBoxFuture<'b, ImportResult<NodeId>> {
        async move {
            if let Some(node_id) = self.ctx.memo.node_id(instance.db_id) {
                return Ok(node_id);
            }

            let descriptor = self.ctx.introspector.type_descriptor(&instance.class_name)?;
            let properties = self.node_properties(&instance, &descriptor)?;
            let node_id = self
                .sink
                .create_node(&descriptor.labels, &properties)
                .await
                .map_err(|e| rejected(format!("node for {}", instance), e))?;

            self.ctx.memo.begin(instance.db_id, node_id);
            self.ctx.progress.observe(self.ctx.memo.len());

            let mut emitted = HashSet::new();
            for attribute in &descriptor.relationships {
                match self.relation(&instance, &descriptor, attribute, &mut emitted) {
                    Ok(Some(relation)) => self.write_relation(&instance, node_id, attribute, relation).await?,
                    Ok(None) => {}
                    Err(e) if e.is_unavailable() => return Err(e.into()),
                    Err(e) => self.ctx.warnings.record(relation_failure(&instance, attribute, e.to_string())),
                }
            }

            self.ctx.memo.complete(instance.db_id);
            self.adapter.release(&instance);
            Ok(node_id)
        }
        .boxed_local()
    }

    fn node_properties(&mut self, instance: &SourceInstance, descriptor: &TypeDescriptor) -> ImportResult<PropertyMap> {
        let mut properties = PropertyMap::new();
        properties.insert(DB_ID.to_string(), PropertyValue::Integer(instance.db_id));
        match &instance.display_name {
            Some(name) => {
                properties.insert(DISPLAY_NAME.to_string(), PropertyValue::Text(name.clone()));
            }
            None => self.ctx.warnings.record(ImportWarning::MissingRequiredField {
                db_id: instance.db_id,
                field: DISPLAY_NAME.to_string(),
            }),
        }

        for attribute in &descriptor.scalars {
            if let Some(rule) = DerivationRule::for_attribute(attribute) {
                match rule.derive(instance, self.adapter) {
                    Ok(Some(value)) => {
                        properties.insert(attribute.clone(), value);
                    }
                    Ok(None) => self.ctx.warnings.record(ImportWarning::DerivationFailure {
                        db_id: instance.db_id,
                        attribute: attribute.clone(),
                        reason: rule.missing().to_string(),
                        absent: true,
                    }),
                    Err(e) => self.extraction_failure(instance, attribute, e)?,
                }
                continue;
            }

            if !self.is_valid(instance, attribute)? {
                continue;
            }
            match self.adapter.get_scalar(instance, attribute) {
                Ok(Some(value)) => match value.into_property() {
                    Some(value) => {
                        properties.insert(attribute.clone(), value);
                    }
                    None => {
                        let err = SourceError::unexpected(attribute.as_str(), "primitive value");
                        self.extraction_failure(instance, attribute, err)?;
                    }
                },
                Ok(None) => {}
                Err(e) => self.extraction_failure(instance, attribute, e)?,
            }
        }

        for attribute in &descriptor.scalar_lists {
            if !self.is_valid(instance, attribute)? {
                continue;
            }
            match self.adapter.get_scalar_list(instance, attribute) {
                Ok(values) => {
                    let items: Vec<String> = values.into_iter().filter_map(|v| v.into_list_item()).collect();
                    if !items.is_empty() {
                        properties.insert(attribute.clone(), PropertyValue::TextList(items));
                    }
                }
                Err(e) => self.extraction_failure(instance, attribute, e)?,
            }
        }

        Ok(properties)
    }

    /// Whether the runtime schema stores `attribute`; a mismatch is recorded.
    fn is_valid(&mut self, instance: &SourceInstance, attribute: &str) -> ImportResult<bool> {
        if self.adapter.is_attribute_valid(instance, attribute)? {
            return Ok(true);
        }
        self.ctx.warnings.record(mismatch(instance, attribute));
        Ok(false)
    }

    fn extraction_failure(&mut self, instance: &SourceInstance, attribute: &str, err: SourceError) -> ImportResult<()> {
        if err.is_unavailable() {
            return Err(err.into());
        }
        self.ctx.warnings.record(ImportWarning::DerivationFailure {
            db_id: instance.db_id,
            attribute: attribute.to_string(),
            reason: err.to_string(),
            absent: false,
        });
        Ok(())
    }

    /// Resolve the targets of one relationship attribute.
    ///
    /// `emitted` holds the edge names already produced for this instance.
    /// An inverse lookup is skipped when its edge name was emitted or the
    /// runtime class stores that relationship directly.
    fn relation(
        &mut self,
        instance: &SourceInstance,
        descriptor: &TypeDescriptor,
        attribute: &str,
        emitted: &mut HashSet<String>,
    ) -> SourceResult<Option<Relation>> {
        if self.adapter.is_attribute_valid(instance, attribute)? {
            emitted.insert(attribute.to_string());
            return Ok(Some(Relation {
                edge_name: attribute.to_string(),
                targets: self.adapter.get_relation_targets(instance, attribute)?,
            }));
        }

        if reports_mismatch(attribute) {
            self.ctx.warnings.record(mismatch(instance, attribute));
        }

        match RelationStrategy::for_attribute(attribute) {
            Some(RelationStrategy::InverseOf { attribute: inverse, edge_name }) => {
                let stored_directly = edge_name != attribute
                    && descriptor.relationships.iter().any(|r| r == edge_name)
                    && self.adapter.is_attribute_valid(instance, edge_name)?;
                if stored_directly || !emitted.insert(edge_name.to_string()) {
                    return Ok(None);
                }
                Ok(Some(Relation {
                    edge_name: edge_name.to_string(),
                    targets: self.adapter.get_inverse_relation_targets(instance, inverse)?,
                }))
            }
            Some(RelationStrategy::WhenPlural { attribute: stored }) => {
                if !self.adapter.is_attribute_valid(instance, stored)? {
                    return Ok(None);
                }
                let targets = self.adapter.get_relation_targets(instance, stored)?;
                Ok((targets.len() > 1).then(|| Relation {
                    edge_name: attribute.to_string(),
                    targets,
                }))
            }
            None => Ok(None),
        }
    }

    async fn write_relation(
        &mut self,
        instance: &SourceInstance,
        node_id: NodeId,
        attribute: &str,
        relation: Relation,
    ) -> ImportResult<()> {
        for entry in aggregate(relation.targets) {
            let target_id = match self.ctx.memo.node_id(entry.db_id()) {
                Some(id) => id,
                None => match self.import_instance(entry.target.clone()).await {
                    Ok(id) => id,
                    Err(e) if !e.is_fatal() => {
                        let reason = format!("target {}: {}", entry.target, e);
                        self.ctx.warnings.record(relation_failure(instance, attribute, reason));
                        continue;
                    }
                    Err(e) => return Err(e),
                },
            };

            let mut properties = PropertyMap::new();
            properties.insert(STOICHIOMETRY.to_string(), PropertyValue::Integer(entry.count as i64));
            self.sink
                .create_edge(node_id, target_id, &relation.edge_name, &properties)
                .await
                .map_err(|e| rejected(format!("{} edge from {}", relation.edge_name, instance), e))?;
            self.ctx.relationships_created += 1;
        }
        debug!(db_id = instance.db_id, %attribute, "Relationships written");
        Ok(())
    }

    /// Number of types described so far, for diagnostics.
    pub fn described_types(&self) -> usize {
        self.ctx.introspector.cached_types()
    }
}

fn mismatch(instance: &SourceInstance, attribute: &str) -> ImportWarning {
    ImportWarning::SchemaMismatch {
        class: instance.class_name.clone(),
        attribute: attribute.to_string(),
    }
}

fn relation_failure(instance: &SourceInstance, attribute: &str, reason: String) -> ImportWarning {
    ImportWarning::RelationFailure {
        db_id: instance.db_id,
        display_name: instance.name_or_empty().to_string(),
        attribute: attribute.to_string(),
        reason,
    }
}

fn rejected(what: String, err: SinkError) -> ImportError {
    error!(%what, error = %err, "Sink rejected write");
    ImportError::sink(what, err)
}
