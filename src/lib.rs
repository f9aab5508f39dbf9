//! # cattery
//!
//! Criteria-style query building over an embedded entity store.
//!
//! Entities are plain structs deriving [`Entity`]. They are persisted through an
//! [`EntityManager`] (directly, or through a [`CrudRepository`]) and queried back with a
//! [`CriteriaBuilder`] created by a [`CriteriaBuilderFactory`]:
//!
//! ```no_run
//! use cattery::entity::{Cat, Person};
//! use cattery::{CatRepository, CriteriaBuilderFactory, CrudRepository, EntityManager};
//!
//! # fn main() -> Result<(), cattery::CatteryError> {
//! let em = EntityManager::in_memory();
//! let cats = CatRepository::new(&em);
//! cats.save_all_and_flush(vec![Cat::new("Mugi", 3), Cat::new("Sora", 7)])?;
//!
//! let cbf = CriteriaBuilderFactory::new();
//! let names: Vec<String> = cbf
//!     .create::<String>(&em)
//!     .from_as::<Cat>("c")
//!     .filter("c.age").ge(5u32)
//!     .select("c.name")
//!     .order_by_asc("c.name")
//!     .get_result_list()?;
//! assert_eq!(names, vec!["Sora".to_string()]);
//! # let _ = Person::new("Hinata");
//! # Ok(())
//! # }
//! ```

extern crate self as cattery;

pub mod config;
pub mod criteria;
pub mod entity;
pub mod error;
pub mod logging;
pub mod repository;
pub mod store;
pub mod transaction;
pub mod value;

mod tracing_helpers;

pub use cattery_derive::Entity;
pub use criteria::{CriteriaBuilder, CriteriaBuilderFactory, PagedList};
pub use entity::EntityTrait;
pub use error::{CatteryError, TransactionError};
pub use repository::{CatRepository, CrudRepository, PersonRepository, Repository};
pub use store::{DatabaseConfig, EntityManager};
pub use transaction::Transaction;
