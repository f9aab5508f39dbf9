//! Fluent query builders.

use super::execution;
use super::expression::{self, Expression};
use super::paging::PaginatedCriteriaBuilder;
use super::plan::{self, ComparisonOp, Ordering, QueryPlan, Restriction, Root};
use super::result::{FromResult, ResultValue};
use super::sql;
use crate::entity::EntityTrait;
use crate::error::CatteryError;
use crate::store::{EntityManager, Hydrator};
use crate::tracing_helpers;
use crate::value::ValueType;
use std::fmt;
use std::marker::PhantomData;

/// A criteria query returning `T`.
///
/// Builder methods never fail on the spot. The first invalid argument is remembered
/// and returned by the terminal operation (`get_result_list`, `get_single_result`,
/// `get_count`, `query_string`).
///
/// # Example
///
/// ```
/// use cattery::entity::Cat;
/// use cattery::{CriteriaBuilderFactory, EntityManager};
///
/// # fn main() -> Result<(), cattery::CatteryError> {
/// let em = EntityManager::in_memory();
/// em.persist(Cat::new("Mugi", 3))?;
/// em.persist(Cat::new("Sora", 7))?;
///
/// let cats: Vec<Cat> = CriteriaBuilderFactory::new()
///     .create::<Cat>(&em)
///     .filter("age").gt(5u32)
///     .get_result_list()?;
/// assert_eq!(cats.len(), 1);
/// assert_eq!(cats[0].name, "Sora");
/// # Ok(())
/// # }
/// ```
pub struct CriteriaBuilder<T> {
    em: EntityManager,
    roots: Vec<Root>,
    selection: Option<Expression>,
    restrictions: Vec<Restriction>,
    orderings: Vec<Ordering>,
    error: Option<CatteryError>,
    _result: PhantomData<fn() -> T>,
}

impl<T> Clone for CriteriaBuilder<T> {
    fn clone(&self) -> Self {
        Self {
            em: self.em.clone(),
            roots: self.roots.clone(),
            selection: self.selection.clone(),
            restrictions: self.restrictions.clone(),
            orderings: self.orderings.clone(),
            error: self.error.clone(),
            _result: PhantomData,
        }
    }
}

impl<T> fmt::Debug for CriteriaBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CriteriaBuilder")
            .field("result", &std::any::type_name::<T>())
            .field("roots", &self.roots)
            .field("selection", &self.selection)
            .field("restrictions", &self.restrictions)
            .field("orderings", &self.orderings)
            .field("error", &self.error)
            .finish()
    }
}

impl<T: FromResult> CriteriaBuilder<T> {
    pub(crate) fn new(em: &EntityManager) -> Self {
        Self {
            em: em.clone(),
            roots: Vec::new(),
            selection: None,
            restrictions: Vec::new(),
            orderings: Vec::new(),
            error: None,
            _result: PhantomData,
        }
    }

    /// Keep the first error only
    pub(crate) fn fail(&mut self, error: CatteryError) {
        if self.error.is_none() {
            tracing::debug!(error = %error, "criteria builder argument rejected");
            self.error = Some(error);
        }
    }

    pub(crate) fn with_implicit_root(mut self, root: Root) -> Self {
        self.roots.push(root);
        self
    }

    fn parse(&mut self, input: &str) -> Option<Expression> {
        match expression::parse(input) {
            Ok(expression) => Some(expression),
            Err(err) => {
                self.fail(err);
                None
            }
        }
    }

    /// Add a root under the entity's default alias (`cat` for `Cat`)
    pub fn from<E: EntityTrait>(self) -> Self {
        self.from_as::<E>(E::meta().alias)
    }

    /// Add a root under `alias`.
    ///
    /// The first explicit root replaces the one implied by the result type.
    pub fn from_as<E: EntityTrait>(mut self, alias: &str) -> Self {
        if !expression::is_valid_alias(alias) {
            self.fail(CatteryError::illegal_argument(format!(
                "'{alias}' is not a valid alias"
            )));
            return self;
        }
        self.roots.retain(|root| !root.implicit);
        if self.roots.iter().any(|root| root.alias == alias) {
            self.fail(CatteryError::illegal_argument(format!(
                "alias '{alias}' is already used by another root"
            )));
            return self;
        }
        self.roots.push(Root {
            alias: alias.to_string(),
            meta: E::meta(),
            implicit: false,
        });
        self
    }

    /// Project each row onto an expression instead of the root entity
    pub fn select(mut self, expression: &str) -> Self {
        if self.selection.is_some() {
            self.fail(CatteryError::illegal_argument(format!(
                "select(\"{expression}\"): a selection was already made"
            )));
            return self;
        }
        self.selection = self.parse(expression);
        self
    }

    /// Start a restriction on `expression`; all restrictions are combined with AND
    pub fn filter(mut self, expression: &str) -> RestrictionBuilder<T> {
        let operand = self.parse(expression);
        RestrictionBuilder {
            builder: self,
            operand,
        }
    }

    pub fn order_by_asc(self, expression: &str) -> Self {
        self.order_by(expression, true)
    }

    pub fn order_by_desc(self, expression: &str) -> Self {
        self.order_by(expression, false)
    }

    pub fn order_by(mut self, expression: &str, ascending: bool) -> Self {
        if let Some(expression) = self.parse(expression) {
            self.orderings.push(Ordering {
                expression,
                ascending,
            });
        }
        self
    }

    /// Restrict results to `max_results` rows starting at `first_result`.
    ///
    /// The ordering must include the id of every root.
    pub fn page(mut self, first_result: usize, max_results: usize) -> PaginatedCriteriaBuilder<T> {
        if max_results == 0 {
            self.fail(CatteryError::illegal_argument(
                "max_results must be greater than zero",
            ));
        }
        PaginatedCriteriaBuilder::new(self, first_result, max_results)
    }

    pub(crate) fn add_restriction(&mut self, restriction: Restriction) {
        self.restrictions.push(restriction);
    }

    pub(crate) fn plan(&self) -> Result<QueryPlan, CatteryError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        plan::build(
            &self.roots,
            self.selection.as_ref(),
            &self.restrictions,
            &self.orderings,
            T::result_kind(),
            std::any::type_name::<T>(),
        )
    }

    /// Execute a plan, returning the rows of the requested window and the total count
    pub(crate) fn fetch(
        &self,
        plan: &QueryPlan,
        page: Option<(usize, usize)>,
    ) -> Result<(Vec<T>, usize), CatteryError> {
        let show_sql = self.em.config().show_sql;
        self.em.with_database(|db| {
            let _span = tracing_helpers::execute_query_span(&plan.root_aliases()).entered();
            if show_sql {
                let window = page.map(|(first, max)| (first as u64, max as u64));
                tracing::info!(target: "cattery::sql", "{}", sql::render(plan, window));
            }

            let results = execution::execute(plan, db);
            let total = results.len();
            let window: Vec<ResultValue> = match page {
                Some((first, max)) => results.into_iter().skip(first).take(max).collect(),
                None => results,
            };

            let mut hydrator = Hydrator::new(db);
            let items = window
                .into_iter()
                .map(|value| T::from_result(value, &mut hydrator))
                .collect::<Result<Vec<_>, _>>()?;
            tracing::debug!(rows = items.len(), total, "criteria query executed");
            Ok((items, total))
        })
    }

    pub fn get_result_list(&self) -> Result<Vec<T>, CatteryError> {
        let plan = self.plan()?;
        self.fetch(&plan, None).map(|(items, _)| items)
    }

    /// The only result; `NoResult` or `NonUniqueResult` otherwise
    pub fn get_single_result(&self) -> Result<T, CatteryError> {
        let mut items = self.get_result_list()?;
        match items.len() {
            0 => Err(CatteryError::NoResult),
            1 => items.pop().ok_or(CatteryError::NoResult),
            n => Err(CatteryError::NonUniqueResult(n)),
        }
    }

    /// Number of results the query would return
    pub fn get_count(&self) -> Result<usize, CatteryError> {
        let plan = self.plan()?;
        self.em.with_database(|db| {
            let _span = tracing_helpers::execute_query_span(&plan.root_aliases()).entered();
            Ok(execution::execute(&plan, db).len())
        })
    }

    /// The query rendered as PostgreSQL
    pub fn query_string(&self) -> Result<String, CatteryError> {
        self.plan().map(|plan| sql::render(&plan, None))
    }
}

/// Completes a `filter(...)` call
#[must_use = "a restriction is only added once a comparison is chosen"]
pub struct RestrictionBuilder<T> {
    builder: CriteriaBuilder<T>,
    operand: Option<Expression>,
}

impl<T: FromResult> RestrictionBuilder<T> {
    fn compare(self, op: ComparisonOp, right: Option<Expression>) -> CriteriaBuilder<T> {
        let mut builder = self.builder;
        if let (Some(left), Some(right)) = (self.operand, right) {
            builder.add_restriction(Restriction::Compare { left, op, right });
        }
        builder
    }

    fn compare_value(self, op: ComparisonOp, value: impl ValueType) -> CriteriaBuilder<T> {
        self.compare(op, Some(Expression::Literal(value.into_value())))
    }

    fn compare_expression(mut self, op: ComparisonOp, expression: &str) -> CriteriaBuilder<T> {
        let right = self.builder.parse(expression);
        self.compare(op, right)
    }

    pub fn eq(self, value: impl ValueType) -> CriteriaBuilder<T> {
        self.compare_value(ComparisonOp::Eq, value)
    }

    pub fn ne(self, value: impl ValueType) -> CriteriaBuilder<T> {
        self.compare_value(ComparisonOp::Ne, value)
    }

    pub fn gt(self, value: impl ValueType) -> CriteriaBuilder<T> {
        self.compare_value(ComparisonOp::Gt, value)
    }

    pub fn ge(self, value: impl ValueType) -> CriteriaBuilder<T> {
        self.compare_value(ComparisonOp::Ge, value)
    }

    pub fn lt(self, value: impl ValueType) -> CriteriaBuilder<T> {
        self.compare_value(ComparisonOp::Lt, value)
    }

    pub fn le(self, value: impl ValueType) -> CriteriaBuilder<T> {
        self.compare_value(ComparisonOp::Le, value)
    }

    pub fn eq_expression(self, expression: &str) -> CriteriaBuilder<T> {
        self.compare_expression(ComparisonOp::Eq, expression)
    }

    pub fn ne_expression(self, expression: &str) -> CriteriaBuilder<T> {
        self.compare_expression(ComparisonOp::Ne, expression)
    }

    pub fn gt_expression(self, expression: &str) -> CriteriaBuilder<T> {
        self.compare_expression(ComparisonOp::Gt, expression)
    }

    pub fn ge_expression(self, expression: &str) -> CriteriaBuilder<T> {
        self.compare_expression(ComparisonOp::Ge, expression)
    }

    pub fn lt_expression(self, expression: &str) -> CriteriaBuilder<T> {
        self.compare_expression(ComparisonOp::Lt, expression)
    }

    pub fn le_expression(self, expression: &str) -> CriteriaBuilder<T> {
        self.compare_expression(ComparisonOp::Le, expression)
    }

    /// Inclusive range
    pub fn between(self, low: impl ValueType, high: impl ValueType) -> CriteriaBuilder<T> {
        BetweenBuilder {
            builder: self.builder,
            operand: self.operand,
            low: Some(Expression::Literal(low.into_value())),
        }
        .and(high)
    }

    /// Inclusive range whose lower bound is an expression; finish with `and_expression`
    pub fn between_expression(mut self, low: &str) -> BetweenBuilder<T> {
        let low = self.builder.parse(low);
        BetweenBuilder {
            builder: self.builder,
            operand: self.operand,
            low,
        }
    }

    pub fn is_null(self) -> CriteriaBuilder<T> {
        self.null_check(false)
    }

    pub fn is_not_null(self) -> CriteriaBuilder<T> {
        self.null_check(true)
    }

    fn null_check(self, negated: bool) -> CriteriaBuilder<T> {
        let mut builder = self.builder;
        if let Some(operand) = self.operand {
            builder.add_restriction(Restriction::IsNull { operand, negated });
        }
        builder
    }
}

/// Completes a `between_expression(...)` call
#[must_use = "a range is only added once its upper bound is given"]
pub struct BetweenBuilder<T> {
    builder: CriteriaBuilder<T>,
    operand: Option<Expression>,
    low: Option<Expression>,
}

impl<T: FromResult> BetweenBuilder<T> {
    pub fn and(self, high: impl ValueType) -> CriteriaBuilder<T> {
        self.finish(Some(Expression::Literal(high.into_value())))
    }

    pub fn and_expression(mut self, high: &str) -> CriteriaBuilder<T> {
        let high = self.builder.parse(high);
        self.finish(high)
    }

    fn finish(self, high: Option<Expression>) -> CriteriaBuilder<T> {
        let mut builder = self.builder;
        if let (Some(operand), Some(low), Some(high)) = (self.operand, self.low, high) {
            builder.add_restriction(Restriction::Between { operand, low, high });
        }
        builder
    }
}
