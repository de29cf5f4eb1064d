//! # Graphport Source
//!
//! SQLite access to a reflection-described knowledge base.
//!
//! The relational layout keeps the runtime schema (`schema_class`,
//! `schema_attribute`) next to the data (`DatabaseObject`,
//! `attribute_value`), so attribute validity is answered by the source
//! itself rather than by the graph model.

pub mod adapter;
pub mod fixture;
pub mod migrations;
pub mod pool;

pub use adapter::SqliteSource;
pub use fixture::SourceBuilder;
pub use pool::SourcePool;
