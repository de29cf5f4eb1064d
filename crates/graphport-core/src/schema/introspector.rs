//! Per-type attribute classification and label chains.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::{AttributeKind, SchemaDescription};
use crate::ImportResult;

/// Bookkeeping attributes never carried into the graph.
const DENIED_ATTRIBUTES: &[&str] = &[
    "dbId",
    "displayName",
    "id",
    "timestamp",
    "schemaClass",
    "author",
    // Stored in the source, but not populated on the graph side.
    "inferredFrom",
    // Replaced by the inverse regulatedBy relationship.
    "regulatedEntity",
    // Carried as inferredTo.
    "orthologousEvent",
];

/// Attribute name prefixes that are excluded as a group.
const DENIED_PREFIXES: &[&str] = &["super"];

pub fn is_denied(attribute: &str) -> bool {
    DENIED_ATTRIBUTES.contains(&attribute) || DENIED_PREFIXES.iter().any(|p| attribute.starts_with(p))
}

/// Everything the importer needs to know about one concrete type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: String,
    /// Self first, then ancestors nearest first; the root type is excluded.
    pub labels: Vec<String>,
    pub scalars: Vec<String>,
    pub scalar_lists: Vec<String>,
    pub relationships: Vec<String>,
}

impl TypeDescriptor {
    pub fn kind_of(&self, attribute: &str) -> Option<AttributeKind> {
        if self.scalars.iter().any(|a| a == attribute) {
            Some(AttributeKind::Scalar)
        } else if self.scalar_lists.iter().any(|a| a == attribute) {
            Some(AttributeKind::ScalarList)
        } else if self.relationships.iter().any(|a| a == attribute) {
            Some(AttributeKind::Relationship)
        } else {
            None
        }
    }
}

/// Computes type descriptors from a [`SchemaDescription`], once per type.
///
/// Owned by a single import run; the cache lives as long as the run.
pub struct SchemaIntrospector {
    schema: SchemaDescription,
    cache: HashMap<String, Arc<TypeDescriptor>>,
}

impl SchemaIntrospector {
    pub fn new(schema: SchemaDescription) -> Self {
        Self {
            schema,
            cache: HashMap::new(),
        }
    }

    pub fn schema(&self) -> &SchemaDescription {
        &self.schema
    }

    /// Number of types computed so far.
    pub fn cached_types(&self) -> usize {
        self.cache.len()
    }

    pub fn type_descriptor(&mut self, type_name: &str) -> ImportResult<Arc<TypeDescriptor>> {
        if let Some(descriptor) = self.cache.get(type_name) {
            return Ok(Arc::clone(descriptor));
        }

        let descriptor = Arc::new(self.compute(type_name)?);
        debug!(
            type_name,
            labels = ?descriptor.labels,
            scalars = descriptor.scalars.len(),
            lists = descriptor.scalar_lists.len(),
            relationships = descriptor.relationships.len(),
            "Computed type descriptor"
        );
        self.cache.insert(type_name.to_string(), Arc::clone(&descriptor));
        Ok(descriptor)
    }

    fn compute(&self, type_name: &str) -> ImportResult<TypeDescriptor> {
        let ancestors = self.schema.ancestors(type_name)?;

        let mut chain = Vec::with_capacity(ancestors.len() + 1);
        chain.push(type_name);
        chain.extend(ancestors);

        let mut labels: Vec<String> = Vec::with_capacity(chain.len());
        for name in &chain {
            if *name != self.schema.root && !labels.iter().any(|l| l == *name) {
                labels.push(name.to_string());
            }
        }

        let mut descriptor = TypeDescriptor {
            name: type_name.to_string(),
            labels,
            scalars: Vec::new(),
            scalar_lists: Vec::new(),
            relationships: Vec::new(),
        };

        // Most-derived declaration of a name wins.
        let mut seen = HashSet::new();
        for name in &chain {
            let Some(def) = self.schema.get(name) else { continue };
            for (attribute, kind) in &def.attributes {
                if is_denied(attribute) || !seen.insert(attribute.as_str()) {
                    continue;
                }
                let bucket = match kind {
                    AttributeKind::Scalar => &mut descriptor.scalars,
                    AttributeKind::ScalarList => &mut descriptor.scalar_lists,
                    AttributeKind::Relationship => &mut descriptor.relationships,
                };
                bucket.push(attribute.clone());
            }
        }

        Ok(descriptor)
    }
}
