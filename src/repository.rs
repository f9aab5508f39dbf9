//! CRUD repositories.
//!
//! [`CrudRepository`] supplies every operation as a default method over the
//! [`EntityManager`]; an implementor only says which entity manager to use. The generic
//! [`Repository`] is enough for most entities, and [`CatRepository`] /
//! [`PersonRepository`] name it for the two bundled ones.

use crate::entity::{Cat, EntityTrait, Person};
use crate::error::CatteryError;
use crate::store::EntityManager;
use std::fmt;
use std::marker::PhantomData;

/// Create, read and delete operations for one entity type
pub trait CrudRepository<E: EntityTrait> {
    fn entity_manager(&self) -> &EntityManager;

    /// Queue an entity for writing and return it with its identifier set
    fn save(&self, entity: E) -> Result<E, CatteryError> {
        self.entity_manager().persist(entity)
    }

    fn save_and_flush(&self, entity: E) -> Result<E, CatteryError> {
        let saved = self.save(entity)?;
        self.flush()?;
        Ok(saved)
    }

    /// Save several entities; stops at the first one that fails validation
    fn save_all<I>(&self, entities: I) -> Result<Vec<E>, CatteryError>
    where
        I: IntoIterator<Item = E>,
    {
        entities.into_iter().map(|e| self.save(e)).collect()
    }

    fn save_all_and_flush<I>(&self, entities: I) -> Result<Vec<E>, CatteryError>
    where
        I: IntoIterator<Item = E>,
    {
        let saved = self.save_all(entities)?;
        self.flush()?;
        Ok(saved)
    }

    fn find_all(&self) -> Result<Vec<E>, CatteryError> {
        self.entity_manager().find_all::<E>()
    }

    fn find_by_id(&self, id: i64) -> Result<Option<E>, CatteryError> {
        self.entity_manager().find::<E>(id)
    }

    fn exists_by_id(&self, id: i64) -> Result<bool, CatteryError> {
        self.entity_manager().contains::<E>(id)
    }

    fn count(&self) -> Result<usize, CatteryError> {
        self.entity_manager().count::<E>()
    }

    fn delete(&self, entity: &E) -> Result<(), CatteryError> {
        self.entity_manager().remove(entity)
    }

    fn delete_by_id(&self, id: i64) {
        self.entity_manager().remove_by_id::<E>(id)
    }

    /// Queue the removal of every row
    fn delete_all(&self) {
        self.entity_manager().remove_all::<E>()
    }

    fn flush(&self) -> Result<(), CatteryError> {
        self.entity_manager().flush()
    }
}

/// Repository for any entity, backed by a shared entity manager
pub struct Repository<E> {
    em: EntityManager,
    _entity: PhantomData<fn() -> E>,
}

impl<E: EntityTrait> Repository<E> {
    pub fn new(em: &EntityManager) -> Self {
        Self {
            em: em.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            em: self.em.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: EntityTrait> fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &E::meta().name)
            .finish()
    }
}

impl<E: EntityTrait> CrudRepository<E> for Repository<E> {
    fn entity_manager(&self) -> &EntityManager {
        &self.em
    }
}

pub type CatRepository = Repository<Cat>;

pub type PersonRepository = Repository<Person>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_find() {
        let em = EntityManager::in_memory();
        let cats = CatRepository::new(&em);
        let saved = cats.save_and_flush(Cat::new("Fuku", 5)).unwrap();
        let id = saved.id.unwrap();

        assert_eq!(cats.find_by_id(id).unwrap(), Some(saved));
        assert!(cats.exists_by_id(id).unwrap());
        assert!(!cats.exists_by_id(id + 1).unwrap());
    }

    #[test]
    fn test_save_all_and_count() {
        let em = EntityManager::in_memory();
        let cats = CatRepository::new(&em);
        let saved = cats
            .save_all(vec![Cat::new("Fuku", 5), Cat::new("Akari", 3)])
            .unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(cats.count().unwrap(), 2);
    }

    #[test]
    fn test_delete_and_delete_all() {
        let em = EntityManager::in_memory();
        let cats = CatRepository::new(&em);
        let saved = cats
            .save_all_and_flush(vec![Cat::new("Fuku", 5), Cat::new("Akari", 3)])
            .unwrap();

        cats.delete(&saved[0]).unwrap();
        assert_eq!(cats.find_all().unwrap(), vec![saved[1].clone()]);

        cats.delete_all();
        assert_eq!(cats.count().unwrap(), 0);
    }

    #[test]
    fn test_repositories_share_the_entity_manager() {
        let em = EntityManager::in_memory();
        let cats = CatRepository::new(&em);
        let people = PersonRepository::new(&em);

        let mugi = cats.save(Cat::new("Mugi", 1)).unwrap();
        let hinata = people
            .save_and_flush(Person::new("Hinata").with_kittens(vec![mugi.clone()]))
            .unwrap();

        let loaded = people.find_by_id(hinata.id.unwrap()).unwrap().unwrap();
        assert_eq!(loaded.kittens, vec![mugi]);
    }
}
