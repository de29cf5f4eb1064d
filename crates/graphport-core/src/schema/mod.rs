//! Versioned, statically declared description of the importable types.
//!
//! Each type names its parent and classifies the attributes it declares.
//! The description is loaded once per run; the [`SchemaIntrospector`]
//! derives and caches one [`TypeDescriptor`] per concrete type from it.

pub mod introspector;

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::{ImportError, ImportResult};

pub use introspector::{SchemaIntrospector, TypeDescriptor};

/// Built-in description of the Reactome data model.
const BUILTIN_SCHEMA: &str = include_str!("reactome.toml");

/// How an attribute is carried into the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttributeKind {
    /// A single primitive, stored as a node property.
    Scalar,
    /// A collection of primitives, stored as a string-array property.
    ScalarList,
    /// A reference (or collection of references) to another importable type.
    Relationship,
}

/// One declared type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypeDef {
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeKind>,
}

/// The whole schema description document.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDescription {
    pub version: String,
    /// The universal base type. It anchors the hierarchy but never becomes a label.
    pub root: String,
    pub types: BTreeMap<String, TypeDef>,
}

impl SchemaDescription {
    /// The description compiled into the binary.
    pub fn builtin() -> ImportResult<Self> {
        Self::from_toml_str(BUILTIN_SCHEMA)
    }

    pub fn load(path: &Path) -> ImportResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ImportResult<Self> {
        let schema: SchemaDescription = toml::from_str(content)
            .map_err(|e| ImportError::schema(format!("Invalid schema description: {}", e)))?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Ancestors of `name`, nearest first, ending with the root.
    pub fn ancestors(&self, name: &str) -> ImportResult<Vec<&str>> {
        let mut chain = Vec::new();
        let mut current = self
            .types
            .get(name)
            .ok_or_else(|| ImportError::UnknownType(name.to_string()))?;

        while let Some(parent) = current.parent.as_deref() {
            chain.push(parent);
            current = self
                .types
                .get(parent)
                .ok_or_else(|| ImportError::UnknownType(parent.to_string()))?;
        }
        Ok(chain)
    }

    fn validate(&self) -> ImportResult<()> {
        let root = self
            .types
            .get(&self.root)
            .ok_or_else(|| ImportError::schema(format!("Root type '{}' is not declared", self.root)))?;
        if root.parent.is_some() {
            return Err(ImportError::schema(format!("Root type '{}' must not have a parent", self.root)));
        }

        for (name, def) in &self.types {
            if name != &self.root && def.parent.is_none() {
                return Err(ImportError::schema(format!("Type '{}' has no parent", name)));
            }
            if let Some(parent) = &def.parent {
                if !self.types.contains_key(parent) {
                    return Err(ImportError::schema(format!(
                        "Type '{}' extends undeclared type '{}'",
                        name, parent
                    )));
                }
            }

            let mut seen = HashSet::new();
            let mut current = name.as_str();
            while let Some(parent) = self.types.get(current).and_then(|d| d.parent.as_deref()) {
                if !seen.insert(current) {
                    return Err(ImportError::schema(format!("Inheritance cycle through '{}'", name)));
                }
                current = parent;
            }
        }
        Ok(())
    }
}
