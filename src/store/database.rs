//! Table storage and entity hydration.

use crate::criteria::ResultValue;
use crate::entity::{EntityMeta, EntityTrait, Record};
use crate::error::CatteryError;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct Table {
    meta: &'static EntityMeta,
    rows: BTreeMap<i64, Record>,
}

/// Committed rows of every registered entity, keyed by table name and id
#[derive(Debug, Clone, Default)]
pub struct Database {
    tables: BTreeMap<&'static str, Table>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity table, along with the tables its collections point at
    pub fn register(&mut self, meta: &'static EntityMeta) {
        if self.tables.contains_key(meta.table) {
            return;
        }
        self.tables.insert(
            meta.table,
            Table {
                meta,
                rows: BTreeMap::new(),
            },
        );
        for attribute in meta.one_to_many() {
            if let Some(target) = attribute.target() {
                self.register(target);
            }
        }
    }

    pub fn get(&self, meta: &EntityMeta, id: i64) -> Option<&Record> {
        self.tables.get(meta.table)?.rows.get(&id)
    }

    pub fn contains(&self, meta: &EntityMeta, id: i64) -> bool {
        self.get(meta, id).is_some()
    }

    /// Rows of a table in id order; empty for an unregistered table
    pub fn rows<'a>(&'a self, meta: &EntityMeta) -> impl Iterator<Item = &'a Record> + 'a {
        self.tables
            .get(meta.table)
            .into_iter()
            .flat_map(|table| table.rows.values())
    }

    pub fn count(&self, meta: &EntityMeta) -> usize {
        self.tables.get(meta.table).map_or(0, |table| table.rows.len())
    }

    pub(crate) fn upsert(&mut self, meta: &'static EntityMeta, record: Record) {
        self.register(meta);
        if let Some(table) = self.tables.get_mut(meta.table) {
            table.rows.insert(record.id(), record);
        }
    }

    pub(crate) fn delete(&mut self, meta: &EntityMeta, id: i64) -> bool {
        self.tables
            .get_mut(meta.table)
            .is_some_and(|table| table.rows.remove(&id).is_some())
    }

    pub(crate) fn clear(&mut self, meta: &EntityMeta) -> usize {
        self.tables.get_mut(meta.table).map_or(0, |table| {
            let removed = table.rows.len();
            table.rows.clear();
            removed
        })
    }

    /// Verify that every collection member still exists
    pub(crate) fn check_integrity(&self) -> Result<(), CatteryError> {
        for table in self.tables.values() {
            for record in table.rows.values() {
                for (attribute, ids) in record.relations() {
                    let Some(target) = table
                        .meta
                        .attribute(attribute)
                        .and_then(|attr| attr.target())
                    else {
                        continue;
                    };
                    if let Some(missing) = ids.iter().find(|id| !self.contains(target, **id)) {
                        return Err(CatteryError::ConstraintViolation(format!(
                            "{} {}.{} references {} {}, which does not exist",
                            table.meta.name,
                            record.id(),
                            attribute,
                            target.name,
                            missing
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Builds entities from stored records, following one-to-many collections.
///
/// The hydrator tracks the chain of rows currently being loaded and fails instead of
/// recursing forever when a collection leads back to one of them.
pub struct Hydrator<'a> {
    database: &'a Database,
    path: Vec<(&'static str, i64)>,
}

impl<'a> Hydrator<'a> {
    pub fn new(database: &'a Database) -> Self {
        Self {
            database,
            path: Vec::new(),
        }
    }

    pub fn load<E: EntityTrait>(&mut self, id: i64) -> Result<E, CatteryError> {
        let meta = E::meta();
        if self.path.contains(&(meta.table, id)) {
            return Err(CatteryError::ConstraintViolation(format!(
                "cyclic association: {} {} is its own descendant",
                meta.name, id
            )));
        }
        let database = self.database;
        let record = database.get(meta, id).ok_or(CatteryError::EntityNotFound {
            entity: meta.name,
            id,
        })?;

        self.path.push((meta.table, id));
        let entity = E::from_record(record, self);
        self.path.pop();
        entity
    }

    pub fn load_all<E: EntityTrait>(&mut self, ids: &[i64]) -> Result<Vec<E>, CatteryError> {
        ids.iter().map(|id| self.load::<E>(*id)).collect()
    }

    /// Load the entity a query result refers to
    pub fn load_result<E: EntityTrait>(&mut self, value: ResultValue) -> Result<E, CatteryError> {
        match value {
            ResultValue::Entity { meta, id } if meta == E::meta() => self.load(id),
            other => Err(CatteryError::illegal_argument(format!(
                "cannot convert {} into {}",
                other,
                E::meta().name
            ))),
        }
    }
}
