//! Programmatic construction of small knowledge bases.
//!
//! Used to seed test and demo sources without a relational dump.

use graphport_core::{
    AttributeValue, DerivationRule, RelationStrategy, SchemaDescription, SourceError, SourceResult,
};
use rusqlite::params;

use crate::adapter::{SqliteSource, FRONT_PAGE_CLASS, FRONT_PAGE_ITEM};

/// Attributes the source stores although the graph model denies or renames them.
const STORED_ONLY: &[(&str, &str)] = &[
    ("Event", "inferredFrom"),
    ("Event", "orthologousEvent"),
    ("PhysicalEntity", "inferredFrom"),
    ("Regulation", "regulatedEntity"),
    ("Publication", "author"),
];

pub struct SourceBuilder {
    source: SqliteSource,
    next_id: i64,
}

impl SourceBuilder {
    /// Empty source with no runtime schema.
    pub fn new() -> SourceResult<Self> {
        Ok(Self {
            source: SqliteSource::in_memory()?,
            next_id: 1,
        })
    }

    /// Source whose runtime schema mirrors the built-in description.
    pub fn reactome() -> SourceResult<Self> {
        let schema = SchemaDescription::builtin().map_err(|e| SourceError::unavailable(e.to_string()))?;
        let mut builder = Self::new()?;
        builder.runtime_schema(&schema)?;
        Ok(builder)
    }

    /// Register classes and stored attributes for every type in `schema`.
    ///
    /// Derived attributes and the relationships materialized from other
    /// attributes are not stored, so they are left out. `stableIdentifier`
    /// is derived from a stored reference of the same name.
    pub fn runtime_schema(&mut self, schema: &SchemaDescription) -> SourceResult<&mut Self> {
        // Parents first: schema_class.parent references schema_class.name.
        let mut ordered = Vec::with_capacity(schema.types.len());
        for (name, def) in &schema.types {
            let depth = schema
                .ancestors(name)
                .map_err(|e| SourceError::unavailable(e.to_string()))?
                .len();
            ordered.push((depth, name, def));
        }
        ordered.sort_by_key(|(depth, _, _)| *depth);

        for (_, name, def) in &ordered {
            self.class(name, def.parent.as_deref())?;
        }
        for (_, name, def) in &ordered {
            for attribute in def.attributes.keys() {
                let derived = DerivationRule::for_attribute(attribute)
                    .is_some_and(|rule| rule != DerivationRule::StableIdentifier);
                if derived || RelationStrategy::for_attribute(attribute).is_some() {
                    continue;
                }
                self.attribute(name, attribute)?;
            }
        }
        for (class, attribute) in STORED_ONLY {
            self.attribute(class, attribute)?;
        }
        Ok(self)
    }

    /// Register a class. Its parent must already be registered.
    pub fn class(&mut self, name: &str, parent: Option<&str>) -> SourceResult<&mut Self> {
        self.source.pool().with_conn(|conn| {
            conn.execute(
                "INSERT INTO schema_class (name, parent) VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET parent = excluded.parent",
                params![name, parent],
            )
        })?;
        Ok(self)
    }

    pub fn attribute(&mut self, class: &str, name: &str) -> SourceResult<&mut Self> {
        self.source.pool().with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO schema_attribute (class, name) VALUES (?1, ?2)",
                params![class, name],
            )
        })?;
        Ok(self)
    }

    /// Remove an attribute from a class's runtime schema.
    pub fn drop_attribute(&mut self, class: &str, name: &str) -> SourceResult<&mut Self> {
        self.source.pool().with_conn(|conn| {
            conn.execute(
                "DELETE FROM schema_attribute WHERE class = ?1 AND name = ?2",
                params![class, name],
            )
        })?;
        Ok(self)
    }

    /// Insert an instance and return its id.
    pub fn instance(&mut self, class: &str, display_name: &str) -> SourceResult<i64> {
        self.insert_instance(class, Some(display_name))
    }

    pub fn unnamed_instance(&mut self, class: &str) -> SourceResult<i64> {
        self.insert_instance(class, None)
    }

    fn insert_instance(&mut self, class: &str, display_name: Option<&str>) -> SourceResult<i64> {
        let db_id = self.next_id;
        self.next_id += 1;
        self.source.pool().with_conn(|conn| {
            conn.execute(
                "INSERT INTO DatabaseObject (DB_ID, _class, _displayName) VALUES (?1, ?2, ?3)",
                params![db_id, class, display_name],
            )
        })?;
        Ok(db_id)
    }

    /// Append a value to an attribute.
    pub fn value(&mut self, db_id: i64, attribute: &str, value: AttributeValue) -> SourceResult<&mut Self> {
        let (value_type, value, target): (&str, rusqlite::types::Value, Option<i64>) = match value {
            AttributeValue::Text(s) => ("text", s.into(), None),
            AttributeValue::Integer(i) => ("int", i.into(), None),
            AttributeValue::Float(f) => ("real", f.into(), None),
            AttributeValue::Boolean(b) => ("bool", i64::from(b).into(), None),
            AttributeValue::Instance(i) => ("instance", rusqlite::types::Value::Null, Some(i.db_id)),
        };
        self.source.pool().with_conn(|conn| {
            conn.execute(
                "INSERT INTO attribute_value (DB_ID, attribute, rank, value_type, value, value_instance)
                 VALUES (?1, ?2,
                         (SELECT COALESCE(MAX(rank) + 1, 0) FROM attribute_value WHERE DB_ID = ?1 AND attribute = ?2),
                         ?3, ?4, ?5)",
                params![db_id, attribute, value_type, value, target],
            )
        })?;
        Ok(self)
    }

    pub fn text(&mut self, db_id: i64, attribute: &str, value: &str) -> SourceResult<&mut Self> {
        self.value(db_id, attribute, AttributeValue::Text(value.to_string()))
    }

    pub fn integer(&mut self, db_id: i64, attribute: &str, value: i64) -> SourceResult<&mut Self> {
        self.value(db_id, attribute, AttributeValue::Integer(value))
    }

    pub fn boolean(&mut self, db_id: i64, attribute: &str, value: bool) -> SourceResult<&mut Self> {
        self.value(db_id, attribute, AttributeValue::Boolean(value))
    }

    /// Append a reference from `db_id` to `target`.
    pub fn reference(&mut self, db_id: i64, attribute: &str, target: i64) -> SourceResult<&mut Self> {
        let handle = self.source.fetch_instance(target)?;
        self.value(db_id, attribute, AttributeValue::Instance(handle))
    }

    /// Create the front page listing `roots` as top-level items.
    pub fn front_page(&mut self, roots: &[i64]) -> SourceResult<i64> {
        let front_page = self.instance(FRONT_PAGE_CLASS, "Frontpage")?;
        for root in roots {
            self.reference(front_page, FRONT_PAGE_ITEM, *root)?;
        }
        Ok(front_page)
    }

    pub fn finish(self) -> SqliteSource {
        self.source
    }
}
