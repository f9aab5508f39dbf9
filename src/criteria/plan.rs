//! Resolution and static checking of criteria queries.
//!
//! The builder records roots, expressions and restrictions as written. Before any row
//! is read they are resolved against the query roots into a [`QueryPlan`]; every
//! argument error (unknown attributes, ambiguous relative paths, type mismatches) is
//! reported here.

use super::expression::{Expression, Path};
use super::result::ResultKind;
use crate::entity::{AttributeDef, AttributeKind, EntityMeta};
use crate::error::CatteryError;
use crate::value::{Value, ValueKind};
use std::fmt;

/// A `FROM` entry
#[derive(Debug, Clone)]
pub(crate) struct Root {
    pub alias: String,
    pub meta: &'static EntityMeta,
    /// Added by the factory from the result type; replaced by the first explicit root
    pub implicit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl ComparisonOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Ne => "<>",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
        }
    }
}

/// A restriction as written, before resolution
#[derive(Debug, Clone)]
pub(crate) enum Restriction {
    Compare {
        left: Expression,
        op: ComparisonOp,
        right: Expression,
    },
    Between {
        operand: Expression,
        low: Expression,
        high: Expression,
    },
    IsNull {
        operand: Expression,
        negated: bool,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct Ordering {
    pub expression: Expression,
    pub ascending: bool,
}

/// A resolved expression
#[derive(Debug, Clone)]
pub(crate) enum Operand {
    Literal(Value),
    /// The entity bound to a root
    Root(usize),
    Attribute {
        root: usize,
        attribute: &'static AttributeDef,
    },
    Size {
        root: usize,
        attribute: &'static AttributeDef,
    },
}

/// Static type of an operand
#[derive(Debug, Clone, Copy)]
enum OperandType {
    /// `None` for the NULL literal, which is compatible with every kind
    Scalar(Option<ValueKind>),
    Entity(&'static EntityMeta),
    Collection(&'static EntityMeta),
}

impl fmt::Display for OperandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandType::Scalar(Some(kind)) => write!(f, "{kind}"),
            OperandType::Scalar(None) => f.write_str("null"),
            OperandType::Entity(meta) => write!(f, "{} entity", meta.name),
            OperandType::Collection(meta) => write!(f, "collection of {}", meta.name),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Predicate {
    Compare {
        left: Operand,
        op: ComparisonOp,
        right: Operand,
    },
    Between {
        operand: Operand,
        low: Operand,
        high: Operand,
    },
    IsNull {
        operand: Operand,
        negated: bool,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct OrderItem {
    pub operand: Operand,
    pub ascending: bool,
}

/// A fully resolved, type-checked query
#[derive(Debug, Clone)]
pub(crate) struct QueryPlan {
    pub roots: Vec<Root>,
    pub selection: Operand,
    pub predicates: Vec<Predicate>,
    pub order: Vec<OrderItem>,
}

impl QueryPlan {
    /// Whether the ordering includes the primary key of every root
    pub fn has_unique_order(&self) -> bool {
        (0..self.roots.len()).all(|index| {
            self.order.iter().any(|item| {
                matches!(
                    item.operand,
                    Operand::Attribute { root, attribute }
                        if root == index && attribute.is_primary_key()
                )
            })
        })
    }

    pub fn root_aliases(&self) -> String {
        self.roots
            .iter()
            .map(|root| format!("{} {}", root.meta.name, root.alias))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Resolve a query against its roots and check it for `result_kind` results
pub(crate) fn build(
    roots: &[Root],
    selection: Option<&Expression>,
    restrictions: &[Restriction],
    orderings: &[Ordering],
    result_kind: ResultKind,
    result_type: &str,
) -> Result<QueryPlan, CatteryError> {
    if roots.is_empty() {
        return Err(CatteryError::illegal_argument(
            "query has no root; add one with from() or from_as()",
        ));
    }
    let resolver = Resolver { roots };

    let selection = match selection {
        Some(expression) => resolver.operand(expression)?,
        None if roots.len() == 1 => Operand::Root(0),
        None => {
            return Err(CatteryError::illegal_argument(format!(
                "query with {} roots needs an explicit select()",
                roots.len()
            )));
        }
    };
    check_result_kind(&resolver.type_of(&selection), result_kind, result_type)?;

    let predicates = restrictions
        .iter()
        .map(|restriction| resolver.predicate(restriction))
        .collect::<Result<Vec<_>, _>>()?;

    let order = orderings
        .iter()
        .map(|ordering| {
            let operand = resolver.operand(&ordering.expression)?;
            resolver.scalar_kind(&operand, &ordering.expression, "order by")?;
            Ok(OrderItem {
                operand,
                ascending: ordering.ascending,
            })
        })
        .collect::<Result<Vec<_>, CatteryError>>()?;

    Ok(QueryPlan {
        roots: roots.to_vec(),
        selection,
        predicates,
        order,
    })
}

fn check_result_kind(
    selected: &OperandType,
    expected: ResultKind,
    result_type: &str,
) -> Result<(), CatteryError> {
    let matches = match (expected, selected) {
        (ResultKind::Any, _) => true,
        (ResultKind::Scalar, OperandType::Scalar(_)) => true,
        (ResultKind::Entity(meta), OperandType::Entity(selected))
        | (ResultKind::Entity(meta), OperandType::Collection(selected)) => meta == *selected,
        _ => false,
    };
    if matches {
        Ok(())
    } else {
        Err(CatteryError::illegal_argument(format!(
            "result type {result_type} cannot hold the selected {selected}"
        )))
    }
}

struct Resolver<'a> {
    roots: &'a [Root],
}

impl Resolver<'_> {
    fn operand(&self, expression: &Expression) -> Result<Operand, CatteryError> {
        match expression {
            Expression::Literal(value) => Ok(Operand::Literal(value.clone())),
            Expression::Null => Ok(Operand::Literal(Value::String(None))),
            Expression::Path(path) => self.path(path),
            Expression::Size(path) => match self.path(path)? {
                Operand::Attribute { root, attribute }
                    if matches!(attribute.kind, AttributeKind::OneToMany { .. }) =>
                {
                    Ok(Operand::Size { root, attribute })
                }
                other => Err(CatteryError::illegal_argument(format!(
                    "SIZE expects a collection attribute, but '{path}' is {}",
                    self.type_of(&other)
                ))),
            },
        }
    }

    fn path(&self, path: &Path) -> Result<Operand, CatteryError> {
        let (root, attributes) = match path.segments.split_first() {
            Some((first, rest)) => match self.roots.iter().position(|r| &r.alias == first) {
                Some(root) => (root, rest),
                None => (self.relative_root(path)?, path.segments.as_slice()),
            },
            None => return Err(CatteryError::illegal_argument("empty attribute path")),
        };

        let meta = self.roots[root].meta;
        match attributes {
            [] => Ok(Operand::Root(root)),
            [name] => {
                let attribute = meta.attribute(name).ok_or_else(|| {
                    CatteryError::illegal_argument(format!(
                        "{} has no attribute '{}' (in '{}')",
                        meta.name, name, path
                    ))
                })?;
                Ok(Operand::Attribute { root, attribute })
            }
            _ => Err(CatteryError::illegal_argument(format!(
                "'{path}' dereferences more than one attribute; join the association instead"
            ))),
        }
    }

    /// Root for an unqualified path, only defined when there is exactly one
    fn relative_root(&self, path: &Path) -> Result<usize, CatteryError> {
        if self.roots.len() == 1 {
            return Ok(0);
        }
        let aliases = self
            .roots
            .iter()
            .map(|root| root.alias.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Err(CatteryError::illegal_argument(format!(
            "relative path '{path}' is ambiguous with {} query roots; qualify it with one of: {aliases}",
            self.roots.len()
        )))
    }

    fn type_of(&self, operand: &Operand) -> OperandType {
        match operand {
            Operand::Literal(value) => OperandType::Scalar(ValueKind::of(value)),
            Operand::Root(root) => OperandType::Entity(self.roots[*root].meta),
            Operand::Attribute { attribute, .. } => match attribute.target() {
                Some(target) => OperandType::Collection(target),
                None => OperandType::Scalar(attribute.value_kind()),
            },
            Operand::Size { .. } => OperandType::Scalar(Some(ValueKind::Integer)),
        }
    }

    fn scalar_kind(
        &self,
        operand: &Operand,
        expression: &Expression,
        usage: &str,
    ) -> Result<Option<ValueKind>, CatteryError> {
        match self.type_of(operand) {
            OperandType::Scalar(kind) => Ok(kind),
            other => Err(CatteryError::illegal_argument(format!(
                "cannot {usage} '{expression}': it is a {other}, not a value"
            ))),
        }
    }

    fn comparable(
        &self,
        left: (&Operand, &Expression),
        right: (&Operand, &Expression),
        usage: &str,
    ) -> Result<(), CatteryError> {
        let left_kind = self.scalar_kind(left.0, left.1, usage)?;
        let right_kind = self.scalar_kind(right.0, right.1, usage)?;
        match (left_kind, right_kind) {
            (Some(l), Some(r)) if !l.is_comparable_with(r) => {
                Err(CatteryError::illegal_argument(format!(
                    "cannot compare '{}' ({l}) with '{}' ({r})",
                    left.1, right.1
                )))
            }
            _ => Ok(()),
        }
    }

    fn predicate(&self, restriction: &Restriction) -> Result<Predicate, CatteryError> {
        match restriction {
            Restriction::Compare { left, op, right } => {
                let l = self.operand(left)?;
                let r = self.operand(right)?;
                self.comparable((&l, left), (&r, right), "compare")?;
                Ok(Predicate::Compare {
                    left: l,
                    op: *op,
                    right: r,
                })
            }
            Restriction::Between { operand, low, high } => {
                let o = self.operand(operand)?;
                let lo = self.operand(low)?;
                let hi = self.operand(high)?;
                self.comparable((&o, operand), (&lo, low), "compare")?;
                self.comparable((&o, operand), (&hi, high), "compare")?;
                Ok(Predicate::Between {
                    operand: o,
                    low: lo,
                    high: hi,
                })
            }
            Restriction::IsNull { operand, negated } => {
                let o = self.operand(operand)?;
                self.scalar_kind(&o, operand, "null-check")?;
                Ok(Predicate::IsNull {
                    operand: o,
                    negated: *negated,
                })
            }
        }
    }
}
