//! # Graphport Core
//!
//! Data model and pure import logic for converting a reflection-described
//! relational knowledge base into a labeled property graph.
//!
//! The source and destination are reached only through the
//! [`SourceAdapter`] and [`GraphSink`] contracts defined here.

pub mod derive;
pub mod error;
pub mod instance;
pub mod relation;
pub mod schema;
pub mod sink;
pub mod source;
pub mod stoichiometry;
pub mod value;
pub mod warning;

pub use derive::DerivationRule;
pub use error::{ImportError, ImportResult, SinkError, SinkResult, SourceError, SourceResult};
pub use instance::SourceInstance;
pub use relation::RelationStrategy;
pub use schema::{AttributeKind, SchemaDescription, SchemaIntrospector, TypeDescriptor};
pub use sink::{GraphSink, NodeId};
pub use source::SourceAdapter;
pub use stoichiometry::{aggregate, Stoichiometry};
pub use value::{AttributeValue, PropertyMap, PropertyValue};
pub use warning::{ImportWarning, WarningCounts, WarningKind};
