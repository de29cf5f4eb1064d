//! [`SourceAdapter`] over the SQLite knowledge base layout.
//!
//! Attribute rows of an instance are loaded on first access and kept until
//! the instance is released, so memory stays proportional to the instances
//! currently being imported rather than to the corpus.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use graphport_core::{AttributeValue, SourceAdapter, SourceError, SourceInstance, SourceResult};
use rusqlite::types::Value;
use rusqlite::{params, OptionalExtension};
use tracing::{debug, info};

use crate::migrations::run_migrations;
use crate::pool::SourcePool;

/// Class holding the top-level root set.
pub const FRONT_PAGE_CLASS: &str = "FrontPage";
pub const FRONT_PAGE_ITEM: &str = "frontPageItem";

type LoadedAttributes = HashMap<String, Vec<AttributeValue>>;

pub struct SqliteSource {
    pool: SourcePool,
    loaded: Mutex<HashMap<i64, Arc<LoadedAttributes>>>,
    class_attributes: Mutex<HashMap<String, Arc<HashSet<String>>>>,
}

impl SqliteSource {
    /// Open an existing knowledge base read-only.
    pub fn open(path: &Path) -> SourceResult<Self> {
        let source = Self::from_pool(SourcePool::open(path)?);
        let objects = source.count_rows()?;
        info!(path = %path.display(), objects, "Established connection to knowledge base");
        Ok(source)
    }

    /// Empty in-memory knowledge base with the layout created.
    pub fn in_memory() -> SourceResult<Self> {
        let pool = SourcePool::in_memory()?;
        run_migrations(&pool)?;
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SourcePool) -> Self {
        Self {
            pool,
            loaded: Mutex::new(HashMap::new()),
            class_attributes: Mutex::new(HashMap::new()),
        }
    }

    pub fn pool(&self) -> &SourcePool {
        &self.pool
    }

    /// Number of instances whose attributes are currently cached.
    pub fn loaded_instances(&self) -> usize {
        lock(&self.loaded).len()
    }

    /// Look up a single instance handle by id.
    pub fn fetch_instance(&self, db_id: i64) -> SourceResult<SourceInstance> {
        self.pool
            .with_conn(|conn| {
                conn.query_row(
                    "SELECT DB_ID, _class, _displayName FROM DatabaseObject WHERE DB_ID = ?1",
                    params![db_id],
                    |row| Ok(SourceInstance::new(row.get(0)?, row.get::<_, String>(1)?, row.get(2)?)),
                )
                .optional()
            })?
            .ok_or_else(|| SourceError::NotFound(format!("DatabaseObject {}", db_id)))
    }

    fn count_rows(&self) -> SourceResult<i64> {
        self.pool
            .with_conn(|conn| conn.query_row("SELECT COUNT(*) FROM DatabaseObject", [], |row| row.get(0)))
    }

    fn attributes_of(&self, instance: &SourceInstance) -> SourceResult<Arc<LoadedAttributes>> {
        if let Some(cached) = lock(&self.loaded).get(&instance.db_id) {
            return Ok(Arc::clone(cached));
        }

        let rows = self.pool.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT av.attribute, av.value_type, av.value, av.value_instance, o._class, o._displayName
                 FROM attribute_value av
                 LEFT JOIN DatabaseObject o ON o.DB_ID = av.value_instance
                 WHERE av.DB_ID = ?1
                 ORDER BY av.attribute, av.rank",
            )?;
            let rows = stmt.query_map(params![instance.db_id], |row| {
                Ok(StoredValue {
                    attribute: row.get(0)?,
                    value_type: row.get(1)?,
                    value: row.get(2)?,
                    value_instance: row.get(3)?,
                    target_class: row.get(4)?,
                    target_name: row.get(5)?,
                })
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })?;

        let mut attributes = LoadedAttributes::new();
        for row in rows {
            let attribute = row.attribute.clone();
            match row.into_value()? {
                Some(value) => attributes.entry(attribute).or_default().push(value),
                None => debug!(db_id = instance.db_id, %attribute, "Skipping empty or dangling value"),
            }
        }

        let attributes = Arc::new(attributes);
        lock(&self.loaded).insert(instance.db_id, Arc::clone(&attributes));
        Ok(attributes)
    }

    fn values(&self, instance: &SourceInstance, attribute: &str) -> SourceResult<Vec<AttributeValue>> {
        if !self.is_attribute_valid(instance, attribute)? {
            return Err(SourceError::InvalidAttribute {
                class: instance.class_name.clone(),
                attribute: attribute.to_string(),
            });
        }
        let attributes = self.attributes_of(instance)?;
        Ok(attributes.get(attribute).cloned().unwrap_or_default())
    }

    fn valid_attributes(&self, class: &str) -> SourceResult<Arc<HashSet<String>>> {
        if let Some(cached) = lock(&self.class_attributes).get(class) {
            return Ok(Arc::clone(cached));
        }

        let names = self.pool.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(
                "WITH RECURSIVE ancestry(name) AS (
                     SELECT ?1
                     UNION
                     SELECT c.parent FROM schema_class c JOIN ancestry ON c.name = ancestry.name
                     WHERE c.parent IS NOT NULL
                 )
                 SELECT a.name FROM schema_attribute a WHERE a.class IN (SELECT name FROM ancestry)",
            )?;
            let rows = stmt.query_map(params![class], |row| row.get::<_, String>(0))?;
            rows.collect::<rusqlite::Result<HashSet<_>>>()
        })?;

        let names = Arc::new(names);
        lock(&self.class_attributes).insert(class.to_string(), Arc::clone(&names));
        Ok(names)
    }
}

impl SourceAdapter for SqliteSource {
    fn fetch_root_set(&self) -> SourceResult<Vec<SourceInstance>> {
        let front_page = self
            .pool
            .with_conn(|conn| {
                conn.query_row(
                    "SELECT DB_ID, _class, _displayName FROM DatabaseObject
                     WHERE _class = ?1 ORDER BY DB_ID LIMIT 1",
                    params![FRONT_PAGE_CLASS],
                    |row| Ok(SourceInstance::new(row.get(0)?, row.get::<_, String>(1)?, row.get(2)?)),
                )
                .optional()
            })?
            .ok_or_else(|| SourceError::NotFound(FRONT_PAGE_CLASS.to_string()))?;

        let roots = self.get_relation_targets(&front_page, FRONT_PAGE_ITEM);
        self.release(&front_page);
        roots
    }

    fn count_instances(&self, class: &str) -> SourceResult<u64> {
        let count: i64 = self.pool.with_conn(|conn| {
            conn.query_row(
                "WITH RECURSIVE subclass(name) AS (
                     SELECT ?1
                     UNION
                     SELECT c.name FROM schema_class c JOIN subclass ON c.parent = subclass.name
                 )
                 SELECT COUNT(*) FROM DatabaseObject WHERE _class IN (SELECT name FROM subclass)",
                params![class],
                |row| row.get(0),
            )
        })?;
        Ok(count.max(0) as u64)
    }

    fn get_scalar(&self, instance: &SourceInstance, attribute: &str) -> SourceResult<Option<AttributeValue>> {
        Ok(self.values(instance, attribute)?.into_iter().next())
    }

    fn get_scalar_list(&self, instance: &SourceInstance, attribute: &str) -> SourceResult<Vec<AttributeValue>> {
        self.values(instance, attribute)
    }

    fn get_relation_targets(&self, instance: &SourceInstance, attribute: &str) -> SourceResult<Vec<SourceInstance>> {
        Ok(self
            .values(instance, attribute)?
            .into_iter()
            .filter_map(AttributeValue::into_instance)
            .collect())
    }

    fn get_inverse_relation_targets(&self, instance: &SourceInstance, attribute: &str) -> SourceResult<Vec<SourceInstance>> {
        self.pool.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT o.DB_ID, o._class, o._displayName
                 FROM attribute_value av
                 JOIN DatabaseObject o ON o.DB_ID = av.DB_ID
                 WHERE av.value_instance = ?1 AND av.attribute = ?2
                 ORDER BY o.DB_ID, av.rank",
            )?;
            let rows = stmt.query_map(params![instance.db_id, attribute], |row| {
                Ok(SourceInstance::new(row.get(0)?, row.get::<_, String>(1)?, row.get(2)?))
            })?;
            rows.collect()
        })
    }

    fn is_attribute_valid(&self, instance: &SourceInstance, attribute: &str) -> SourceResult<bool> {
        Ok(self.valid_attributes(&instance.class_name)?.contains(attribute))
    }

    fn release(&self, instance: &SourceInstance) {
        lock(&self.loaded).remove(&instance.db_id);
    }
}

/// Raw `attribute_value` row joined with its target object.
struct StoredValue {
    attribute: String,
    value_type: String,
    value: Value,
    value_instance: Option<i64>,
    target_class: Option<String>,
    target_name: Option<String>,
}

impl StoredValue {
    /// `Ok(None)` for a reference to an object that does not exist.
    fn into_value(self) -> SourceResult<Option<AttributeValue>> {
        let mismatch = |expected: &str| SourceError::unexpected(self.attribute.clone(), expected);
        let value = match (self.value_type.as_str(), self.value) {
            ("instance", _) => {
                let (Some(db_id), Some(class)) = (self.value_instance, self.target_class) else {
                    return Ok(None);
                };
                AttributeValue::Instance(SourceInstance::new(db_id, class, self.target_name))
            }
            ("text", Value::Text(s)) => AttributeValue::Text(s),
            ("int", Value::Integer(i)) => AttributeValue::Integer(i),
            ("real", Value::Real(f)) => AttributeValue::Float(f),
            ("real", Value::Integer(i)) => AttributeValue::Float(i as f64),
            ("bool", Value::Integer(i)) => AttributeValue::Boolean(i != 0),
            (_, Value::Null) => return Ok(None),
            (other, _) => return Err(mismatch(other)),
        };
        Ok(Some(value))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
