//! Keyset-free offset paging.

use super::builder::CriteriaBuilder;
use super::result::FromResult;
use super::sql;
use crate::error::CatteryError;
use std::ops::Deref;

/// A criteria query restricted to one page of results.
///
/// Created by [`CriteriaBuilder::page`]. Paging needs a deterministic order, so the
/// query must be ordered by the id of every root.
#[derive(Debug, Clone)]
pub struct PaginatedCriteriaBuilder<T> {
    builder: CriteriaBuilder<T>,
    first_result: usize,
    max_results: usize,
}

impl<T: FromResult> PaginatedCriteriaBuilder<T> {
    pub(crate) fn new(
        builder: CriteriaBuilder<T>,
        first_result: usize,
        max_results: usize,
    ) -> Self {
        Self {
            builder,
            first_result,
            max_results,
        }
    }

    pub fn first_result(&self) -> usize {
        self.first_result
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    fn plan(&self) -> Result<super::plan::QueryPlan, CatteryError> {
        let plan = self.builder.plan()?;
        if !plan.has_unique_order() {
            return Err(CatteryError::illegal_argument(format!(
                "paging needs a unique ordering; order by the id of every root ({})",
                plan.root_aliases()
            )));
        }
        Ok(plan)
    }

    /// Fetch the page along with the size of the whole result
    pub fn get_result_list(&self) -> Result<PagedList<T>, CatteryError> {
        let plan = self.plan()?;
        let (items, total_size) = self
            .builder
            .fetch(&plan, Some((self.first_result, self.max_results)))?;
        Ok(PagedList {
            items,
            first_result: self.first_result,
            max_results: self.max_results,
            total_size,
        })
    }

    /// The page query rendered as PostgreSQL, with `LIMIT` and `OFFSET`
    pub fn query_string(&self) -> Result<String, CatteryError> {
        let plan = self.plan()?;
        Ok(sql::render(
            &plan,
            Some((self.first_result as u64, self.max_results as u64)),
        ))
    }
}

/// One page of results plus the paging position
#[derive(Debug, Clone, PartialEq)]
pub struct PagedList<T> {
    items: Vec<T>,
    first_result: usize,
    max_results: usize,
    total_size: usize,
}

impl<T> PagedList<T> {
    pub fn first_result(&self) -> usize {
        self.first_result
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// 1-based page number
    pub fn page(&self) -> usize {
        self.first_result / self.max_results + 1
    }

    /// Number of results on this page
    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn total_pages(&self) -> usize {
        self.total_size.div_ceil(self.max_results)
    }

    /// Number of results across all pages
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> Deref for PagedList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> IntoIterator for PagedList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a PagedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
