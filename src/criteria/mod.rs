//! Criteria queries over stored entities.
//!
//! A query starts at a [`CriteriaBuilderFactory`], names its roots, optionally selects
//! an expression, adds restrictions and orderings, and finally runs with
//! `get_result_list`, `get_single_result` or `get_count`. `page` turns it into a
//! [`PaginatedCriteriaBuilder`].
//!
//! # Expressions
//!
//! Expressions are strings: literals (`5`, `2.5`, `'Mugi'`, `TRUE`, `NULL`), paths
//! (`c`, `c.name`, `person.kittens`) and `SIZE(path)` for collection sizes. A path that
//! does not start with a root alias is resolved against the only root; with several
//! roots it must be qualified.
//!
//! ```
//! use cattery::entity::Cat;
//! use cattery::{CriteriaBuilderFactory, EntityManager};
//!
//! # fn main() -> Result<(), cattery::CatteryError> {
//! let em = EntityManager::in_memory();
//! em.persist(Cat::new("Mugi", 3))?;
//!
//! let names: Vec<String> = CriteriaBuilderFactory::new()
//!     .create::<String>(&em)
//!     .from_as::<Cat>("c")
//!     .select("c.name")
//!     .get_result_list()?;
//! assert_eq!(names, vec!["Mugi".to_string()]);
//! # Ok(())
//! # }
//! ```

mod builder;
mod execution;
pub mod expression;
pub mod paging;
mod plan;
pub mod result;
mod sql;

pub use builder::{BetweenBuilder, CriteriaBuilder, RestrictionBuilder};
pub use paging::{PagedList, PaginatedCriteriaBuilder};
pub use plan::ComparisonOp;
pub use result::{FromResult, ResultKind, ResultValue};

use crate::entity::EntityTrait;
use crate::error::CatteryError;
use crate::store::EntityManager;
use plan::Root;

/// Entry point for criteria queries
#[derive(Debug, Clone, Copy, Default)]
pub struct CriteriaBuilderFactory {
    _private: (),
}

impl CriteriaBuilderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a query returning `T`.
    ///
    /// When `T` is an entity it becomes the query root under its default alias until
    /// an explicit `from`/`from_as` replaces it.
    pub fn create<T: FromResult>(&self, em: &EntityManager) -> CriteriaBuilder<T> {
        let builder = CriteriaBuilder::new(em);
        match T::query_root() {
            Some(meta) => builder.with_implicit_root(Root {
                alias: meta.alias.to_string(),
                meta,
                implicit: true,
            }),
            None => builder,
        }
    }

    /// Start a query rooted at entity `T` under `alias`
    pub fn create_with_alias<T: FromResult>(
        &self,
        em: &EntityManager,
        alias: &str,
    ) -> CriteriaBuilder<T> {
        let mut builder = CriteriaBuilder::new(em);
        match T::query_root() {
            Some(meta) if expression::is_valid_alias(alias) => builder.with_implicit_root(Root {
                alias: alias.to_string(),
                meta,
                implicit: false,
            }),
            Some(_) => {
                builder.fail(CatteryError::illegal_argument(format!(
                    "'{alias}' is not a valid alias"
                )));
                builder
            }
            None => {
                builder.fail(CatteryError::illegal_argument(format!(
                    "create_with_alias needs an entity result type, not {}",
                    std::any::type_name::<T>()
                )));
                builder
            }
        }
    }
}

/// Shorthand for `from::<E>()` on a fresh builder returning `E`
pub fn query<E: EntityTrait + FromResult>(em: &EntityManager) -> CriteriaBuilder<E> {
    CriteriaBuilderFactory::new().create::<E>(em)
}
