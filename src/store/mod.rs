//! The embedded entity store.
//!
//! [`EntityManager`] is the persistence context: `persist` and `remove` queue writes,
//! [`EntityManager::flush`] applies them to the [`Database`] as one unit, and every read
//! flushes first so queries always see what was saved.

pub mod config;
mod database;

pub use config::DatabaseConfig;
pub use database::{Database, Hydrator};

use crate::entity::{EntityMeta, EntityTrait, Record};
use crate::error::{CatteryError, TransactionError};
use crate::tracing_helpers;
use parking_lot::{RwLock, RwLockWriteGuard};
use std::sync::Arc;

#[derive(Debug)]
enum PendingWrite {
    Upsert {
        meta: &'static EntityMeta,
        record: Record,
    },
    Delete {
        meta: &'static EntityMeta,
        id: i64,
    },
    DeleteAll {
        meta: &'static EntityMeta,
    },
}

#[derive(Debug)]
struct Context {
    database: Database,
    pending: Vec<PendingWrite>,
    /// Database state at the start of each open transaction, innermost last
    snapshots: Vec<Database>,
    next_id: i64,
}

impl Context {
    fn next_id(&mut self) -> Result<i64, CatteryError> {
        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or_else(|| CatteryError::illegal_argument("identifier sequence exhausted"))?;
        Ok(id)
    }

    fn flush(&mut self) -> Result<(), CatteryError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let pending = std::mem::take(&mut self.pending);
        let _span = tracing_helpers::flush_span(pending.len()).entered();

        let mut working = self.database.clone();
        for write in pending {
            match write {
                PendingWrite::Upsert { meta, record } => working.upsert(meta, record),
                PendingWrite::Delete { meta, id } => {
                    if !working.delete(meta, id) {
                        tracing::debug!(entity = meta.name, id, "delete of a missing row ignored");
                    }
                }
                PendingWrite::DeleteAll { meta } => {
                    let removed = working.clear(meta);
                    tracing::debug!(entity = meta.name, removed, "deleted all rows");
                }
            }
        }

        if let Err(err) = working.check_integrity() {
            tracing::warn!(error = %err, "flush rejected, database unchanged");
            return Err(err);
        }
        self.database = working;
        Ok(())
    }
}

/// Handle to an embedded store.
///
/// Cloning the handle shares the store; each `EntityManager::new` creates an
/// independent one.
#[derive(Clone)]
pub struct EntityManager {
    inner: Arc<RwLock<Context>>,
    config: Arc<DatabaseConfig>,
}

impl std::fmt::Debug for EntityManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl EntityManager {
    pub fn new(config: DatabaseConfig) -> Self {
        tracing::debug!(name = %config.name, "opening entity store");
        let context = Context {
            database: Database::new(),
            pending: Vec::new(),
            snapshots: Vec::new(),
            next_id: config.sequence_start,
        };
        Self {
            inner: Arc::new(RwLock::new(context)),
            config: Arc::new(config),
        }
    }

    /// Store with the default configuration
    pub fn in_memory() -> Self {
        Self::new(DatabaseConfig::default())
    }

    /// Store configured by [`DatabaseConfig::load`]
    pub fn from_env() -> Result<Self, ::config::ConfigError> {
        DatabaseConfig::load().map(Self::new)
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Validate an entity, assign its identifier and queue it for writing.
    ///
    /// An entity that already has an id replaces the stored row on flush. Returns the
    /// entity with its id set.
    pub fn persist<E: EntityTrait>(&self, mut entity: E) -> Result<E, CatteryError> {
        entity.validate()?;
        let meta = E::meta();
        let mut ctx = self.inner.write();
        match entity.id() {
            Some(id) => {
                let after = id.checked_add(1).ok_or_else(|| {
                    CatteryError::illegal_argument(format!(
                        "{} id {id} is out of range; the largest assignable id is {}",
                        meta.name,
                        i64::MAX - 1
                    ))
                })?;
                if after > ctx.next_id {
                    ctx.next_id = after;
                }
            }
            None => {
                let id = ctx.next_id()?;
                entity.set_id(id);
            }
        }
        let record = entity.to_record()?;
        tracing::trace!(entity = meta.name, id = record.id(), "persist");
        ctx.database.register(meta);
        ctx.pending.push(PendingWrite::Upsert { meta, record });
        Ok(entity)
    }

    /// Queue the removal of a persisted entity
    pub fn remove<E: EntityTrait>(&self, entity: &E) -> Result<(), CatteryError> {
        let id = entity.id().ok_or_else(|| {
            CatteryError::TransientEntity(format!(
                "cannot remove a {} that was never saved",
                E::meta().name
            ))
        })?;
        self.remove_by_id::<E>(id);
        Ok(())
    }

    pub fn remove_by_id<E: EntityTrait>(&self, id: i64) {
        self.inner.write().pending.push(PendingWrite::Delete {
            meta: E::meta(),
            id,
        });
    }

    /// Queue the removal of every row of `E`
    pub fn remove_all<E: EntityTrait>(&self) {
        self.inner
            .write()
            .pending
            .push(PendingWrite::DeleteAll { meta: E::meta() });
    }

    /// Apply all queued writes.
    ///
    /// Either every write is applied or, when the result would leave a collection
    /// pointing at a missing row, none is and `ConstraintViolation` is returned. The
    /// queue is emptied in both cases.
    pub fn flush(&self) -> Result<(), CatteryError> {
        self.inner.write().flush()
    }

    pub fn find<E: EntityTrait>(&self, id: i64) -> Result<Option<E>, CatteryError> {
        self.with_database(|db| {
            if !db.contains(E::meta(), id) {
                return Ok(None);
            }
            Hydrator::new(db).load(id).map(Some)
        })
    }

    /// All rows of `E` in id order
    pub fn find_all<E: EntityTrait>(&self) -> Result<Vec<E>, CatteryError> {
        self.with_database(|db| {
            let ids: Vec<i64> = db.rows(E::meta()).map(Record::id).collect();
            Hydrator::new(db).load_all(&ids)
        })
    }

    pub fn count<E: EntityTrait>(&self) -> Result<usize, CatteryError> {
        self.with_database(|db| Ok(db.count(E::meta())))
    }

    pub fn contains<E: EntityTrait>(&self, id: i64) -> Result<bool, CatteryError> {
        self.with_database(|db| Ok(db.contains(E::meta(), id)))
    }

    /// Flush, then run `f` against the committed rows
    pub fn with_database<R>(
        &self,
        f: impl FnOnce(&Database) -> Result<R, CatteryError>,
    ) -> Result<R, CatteryError> {
        let mut ctx = self.inner.write();
        ctx.flush()?;
        let ctx = RwLockWriteGuard::downgrade(ctx);
        f(&ctx.database)
    }

    /// Number of open transactions
    pub fn transaction_depth(&self) -> usize {
        self.inner.read().snapshots.len()
    }

    pub(crate) fn push_snapshot(&self) -> Result<usize, CatteryError> {
        let mut ctx = self.inner.write();
        ctx.flush()?;
        let snapshot = ctx.database.clone();
        ctx.snapshots.push(snapshot);
        Ok(ctx.snapshots.len())
    }

    /// Flush and release the snapshot at `depth` (1-based)
    pub(crate) fn release_snapshot(&self, depth: usize) -> Result<(), CatteryError> {
        let mut ctx = self.inner.write();
        check_innermost(ctx.snapshots.len(), depth)?;
        ctx.flush()?;
        ctx.snapshots.pop();
        Ok(())
    }

    /// Discard queued writes and restore the snapshot at `depth` (1-based)
    pub(crate) fn restore_snapshot(&self, depth: usize) -> Result<(), CatteryError> {
        let mut ctx = self.inner.write();
        check_innermost(ctx.snapshots.len(), depth)?;
        ctx.pending.clear();
        if let Some(snapshot) = ctx.snapshots.pop() {
            ctx.database = snapshot;
        }
        Ok(())
    }

    /// Restore the snapshot at `depth`, discarding any inner ones still open
    pub(crate) fn abandon_snapshot(&self, depth: usize) {
        let mut ctx = self.inner.write();
        if depth == 0 || ctx.snapshots.len() < depth {
            return;
        }
        ctx.pending.clear();
        ctx.snapshots.truncate(depth);
        if let Some(snapshot) = ctx.snapshots.pop() {
            ctx.database = snapshot;
        }
    }
}

fn check_innermost(open: usize, depth: usize) -> Result<(), TransactionError> {
    if open == depth {
        Ok(())
    } else if open > depth {
        Err(TransactionError::NestedTransactionError(format!(
            "transaction at depth {depth} closed while {} inner transaction(s) are open",
            open - depth
        )))
    } else {
        // An enclosing transaction already ended and took this one with it
        Err(TransactionError::TransactionClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Cat, Person};

    #[test]
    fn test_persist_assigns_sequential_ids() {
        let em = EntityManager::in_memory();
        let mugi = em.persist(Cat::new("Mugi", 3)).unwrap();
        let sora = em.persist(Cat::new("Sora", 4)).unwrap();
        assert_eq!(mugi.id, Some(1));
        assert_eq!(sora.id, Some(2));
    }

    #[test]
    fn test_sequence_start_from_config() {
        let em = EntityManager::new(DatabaseConfig {
            sequence_start: 100,
            ..DatabaseConfig::default()
        });
        let cat = em.persist(Cat::new("Mugi", 3)).unwrap();
        assert_eq!(cat.id, Some(100));
    }

    #[test]
    fn test_assigned_id_advances_sequence() {
        let em = EntityManager::in_memory();
        em.persist(Cat::new("Leo", 2).with_id(10)).unwrap();
        let next = em.persist(Cat::new("Coco", 1)).unwrap();
        assert_eq!(next.id, Some(11));
    }

    #[test]
    fn test_assigned_id_at_the_end_of_the_range() {
        let em = EntityManager::in_memory();
        let err = em.persist(Cat::new("Max", 1).with_id(i64::MAX)).unwrap_err();
        assert!(err.is_illegal_argument(), "{err}");
        assert_eq!(em.count::<Cat>().unwrap(), 0);

        em.persist(Cat::new("Almost", 1).with_id(i64::MAX - 1)).unwrap();
        let err = em.persist(Cat::new("Next", 1)).unwrap_err();
        assert_eq!(
            err,
            CatteryError::illegal_argument("identifier sequence exhausted")
        );
        assert_eq!(em.count::<Cat>().unwrap(), 1);
    }

    #[test]
    fn test_reads_flush_pending_writes() {
        let em = EntityManager::in_memory();
        let cat = em.persist(Cat::new("Mugi", 3)).unwrap();
        assert_eq!(em.count::<Cat>().unwrap(), 1);
        assert_eq!(em.find::<Cat>(cat.id.unwrap()).unwrap(), Some(cat));
        assert_eq!(em.find::<Cat>(42).unwrap(), None);
    }

    #[test]
    fn test_persist_rejects_invalid_entity() {
        let em = EntityManager::in_memory();
        let err = em.persist(Cat::new("", 3)).unwrap_err();
        assert!(matches!(err, CatteryError::Validation(_)));
        assert_eq!(em.count::<Cat>().unwrap(), 0);
    }

    #[test]
    fn test_save_existing_id_replaces_row() {
        let em = EntityManager::in_memory();
        let mut cat = em.persist(Cat::new("Mugi", 3)).unwrap();
        cat.age = 4;
        em.persist(cat.clone()).unwrap();
        assert_eq!(em.find_all::<Cat>().unwrap(), vec![cat]);
    }

    #[test]
    fn test_persist_with_transient_member_fails() {
        let em = EntityManager::in_memory();
        let person = Person::new("Hinata").with_kittens(vec![Cat::new("Mugi", 1)]);
        let err = em.persist(person).unwrap_err();
        assert!(matches!(err, CatteryError::TransientEntity(_)));
    }

    #[test]
    fn test_flush_rejects_dangling_reference_and_changes_nothing() {
        let em = EntityManager::in_memory();
        let mugi = em.persist(Cat::new("Mugi", 1)).unwrap();
        em.persist(Person::new("Hinata").with_kittens(vec![mugi.clone()]))
            .unwrap();
        em.flush().unwrap();

        em.remove(&mugi).unwrap();
        let err = em.flush().unwrap_err();
        assert!(matches!(err, CatteryError::ConstraintViolation(_)));

        assert_eq!(em.count::<Cat>().unwrap(), 1);
        let people = em.find_all::<Person>().unwrap();
        assert_eq!(people[0].kittens, vec![mugi]);
    }

    #[test]
    fn test_remove_all() {
        let em = EntityManager::in_memory();
        em.persist(Cat::new("Mugi", 1)).unwrap();
        em.persist(Cat::new("Sora", 2)).unwrap();
        em.remove_all::<Cat>();
        assert_eq!(em.count::<Cat>().unwrap(), 0);
    }

    #[test]
    fn test_remove_transient_entity_fails() {
        let em = EntityManager::in_memory();
        let err = em.remove(&Cat::new("Mugi", 1)).unwrap_err();
        assert!(matches!(err, CatteryError::TransientEntity(_)));
    }

    #[test]
    fn test_handles_share_the_store() {
        let em = EntityManager::in_memory();
        let other = em.clone();
        em.persist(Cat::new("Mugi", 1)).unwrap();
        assert_eq!(other.count::<Cat>().unwrap(), 1);
        assert_eq!(EntityManager::in_memory().count::<Cat>().unwrap(), 0);
    }
}
