//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use cattery::entity::Cat;
use cattery::{CatRepository, CrudRepository, EntityManager};
use rand::Rng;
use std::fmt::Debug;

/// Oldest age handed out to fixture cats (exclusive)
pub const AGE_MAX: u32 = 38;

/// Fresh store with logging enabled
pub fn setup() -> EntityManager {
    cattery::logging::init_logging();
    EntityManager::in_memory()
}

/// Logs result lists between `■<name> [Start]` and `■<name> [End]` markers
pub struct ResultLogger;

impl ResultLogger {
    pub fn output_result_list<T: Debug>(process_name: &str, results: &[T]) {
        Self::label(&format!("{process_name} [Start]"));
        for result in results {
            tracing::info!("{result:?}");
        }
        Self::label(&format!("{process_name} [End]"));
    }

    fn label(label: &str) {
        tracing::info!("■{label}");
    }
}

/// Builds fixture cats through a [`CatRepository`]
pub struct CatFixtures {
    repository: CatRepository,
}

impl CatFixtures {
    pub fn new(em: &EntityManager) -> Self {
        Self {
            repository: CatRepository::new(em),
        }
    }

    pub fn repository(&self) -> &CatRepository {
        &self.repository
    }

    pub fn random_age() -> u32 {
        rand::thread_rng().gen_range(0..AGE_MAX)
    }

    /// A transient cat of random age without kittens
    pub fn cat(&self, name: &str) -> Cat {
        Cat::new(name, Self::random_age())
    }

    /// A transient cat whose kittens are saved first, named `<name> Jr.<n>`
    #[cfg(not(feature = "kitten-count"))]
    pub fn cat_with_kittens(&self, name: &str, age: u32, kittens: usize) -> Cat {
        if kittens == 0 {
            return Cat::new(name, age);
        }
        let kittens = (1..=kittens)
            .map(|i| Cat::new(format!("{name} Jr.{i}"), rand::thread_rng().gen_range(0..=1)))
            .collect::<Vec<_>>();
        let kittens = self.repository.save_all_and_flush(kittens).unwrap();
        Cat::new(name, age).with_kittens(kittens)
    }

    /// A transient cat with a kitten count
    #[cfg(feature = "kitten-count")]
    pub fn cat_with_kittens(&self, name: &str, age: u32, kittens: usize) -> Cat {
        Cat::new(name, age).with_kittens(kittens as u32)
    }

    /// Replace every cat with `Cat1..=Cat<size>`, saved in name order
    pub fn name_ordered_list(&self, size: usize) -> Vec<Cat> {
        self.repository.delete_all();
        let cats = (1..=size).map(|i| self.cat(&format!("Cat{i}")));
        self.repository.save_all_and_flush(cats).unwrap()
    }
}

pub fn assert_not_empty<T>(results: &[T]) {
    assert!(!results.is_empty(), "expected a non-empty result list");
}
