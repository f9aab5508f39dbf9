//! Evaluation of a query plan against the stored rows.

use super::plan::{ComparisonOp, Operand, OrderItem, Predicate, QueryPlan};
use super::result::ResultValue;
use crate::entity::Record;
use crate::store::Database;
use crate::value::compare::{compare, is_null, order_ascending};
use crate::value::Value;
use std::cmp::Ordering;

/// One combination of root rows
type Tuple<'a> = Vec<&'a Record>;

/// Run the plan: cross join the roots, filter, sort, then project.
///
/// Selecting a collection yields one result per member, following the row order.
pub(crate) fn execute(plan: &QueryPlan, db: &Database) -> Vec<ResultValue> {
    let mut rows: Vec<(Tuple<'_>, Vec<Value>)> = cross_join(plan, db)
        .into_iter()
        .filter(|tuple| plan.predicates.iter().all(|p| satisfies(p, tuple)))
        .map(|tuple| {
            let keys = plan
                .order
                .iter()
                .map(|item| scalar(&item.operand, &tuple))
                .collect();
            (tuple, keys)
        })
        .collect();

    if !plan.order.is_empty() {
        // Stable, so rows tied on every key keep id order
        rows.sort_by(|(_, a), (_, b)| compare_keys(&plan.order, a, b));
    }

    rows.iter()
        .flat_map(|(tuple, _)| project(plan, tuple))
        .collect()
}

fn cross_join<'a>(plan: &QueryPlan, db: &'a Database) -> Vec<Tuple<'a>> {
    let mut tuples: Vec<Tuple<'a>> = vec![Vec::new()];
    for root in &plan.roots {
        let rows: Vec<&Record> = db.rows(root.meta).collect();
        tuples = tuples
            .into_iter()
            .flat_map(|tuple| {
                rows.iter().map(move |row| {
                    let mut next = tuple.clone();
                    next.push(*row);
                    next
                })
            })
            .collect();
    }
    tuples
}

fn compare_keys(order: &[OrderItem], a: &[Value], b: &[Value]) -> Ordering {
    order
        .iter()
        .zip(a.iter().zip(b))
        .map(|(item, (x, y))| {
            let ordering = order_ascending(x, y);
            if item.ascending {
                ordering
            } else {
                ordering.reverse()
            }
        })
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Value of a scalar operand for one tuple; missing values read as null
fn scalar(operand: &Operand, tuple: &[&Record]) -> Value {
    match operand {
        Operand::Literal(value) => value.clone(),
        Operand::Attribute { root, attribute } => {
            let record = tuple[*root];
            if attribute.is_primary_key() {
                Value::BigInt(Some(record.id()))
            } else {
                record
                    .get_value(attribute.name)
                    .unwrap_or(Value::String(None))
            }
        }
        Operand::Size { root, attribute } => {
            let size = tuple[*root].relation(attribute.name).len();
            Value::BigInt(Some(size as i64))
        }
        // Plans never compare entities
        Operand::Root(root) => Value::BigInt(Some(tuple[*root].id())),
    }
}

fn satisfies(predicate: &Predicate, tuple: &[&Record]) -> bool {
    match predicate {
        Predicate::Compare { left, op, right } => {
            let ordering = compare(&scalar(left, tuple), &scalar(right, tuple));
            ordering.is_some_and(|ordering| match op {
                ComparisonOp::Eq => ordering == Ordering::Equal,
                ComparisonOp::Ne => ordering != Ordering::Equal,
                ComparisonOp::Gt => ordering == Ordering::Greater,
                ComparisonOp::Ge => ordering != Ordering::Less,
                ComparisonOp::Lt => ordering == Ordering::Less,
                ComparisonOp::Le => ordering != Ordering::Greater,
            })
        }
        Predicate::Between { operand, low, high } => {
            let value = scalar(operand, tuple);
            let above = compare(&value, &scalar(low, tuple));
            let below = compare(&value, &scalar(high, tuple));
            matches!(above, Some(Ordering::Greater | Ordering::Equal))
                && matches!(below, Some(Ordering::Less | Ordering::Equal))
        }
        Predicate::IsNull { operand, negated } => is_null(&scalar(operand, tuple)) != *negated,
    }
}

fn project(plan: &QueryPlan, tuple: &[&Record]) -> Vec<ResultValue> {
    match &plan.selection {
        Operand::Root(root) => vec![ResultValue::Entity {
            meta: plan.roots[*root].meta,
            id: tuple[*root].id(),
        }],
        Operand::Attribute { root, attribute } => match attribute.target() {
            Some(target) => tuple[*root]
                .relation(attribute.name)
                .iter()
                .map(|id| ResultValue::Entity {
                    meta: target,
                    id: *id,
                })
                .collect(),
            None => vec![ResultValue::Scalar(scalar(&plan.selection, tuple))],
        },
        operand => vec![ResultValue::Scalar(scalar(operand, tuple))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::expression::parse;
    use crate::criteria::plan::{build, Ordering as Order, Restriction, Root};
    use crate::criteria::result::ResultKind;
    use crate::entity::Cat;
    use crate::EntityTrait;

    fn database(cats: &[(&str, u32)]) -> Database {
        let mut db = Database::new();
        for (i, (name, age)) in cats.iter().enumerate() {
            let record = Cat::new(*name, *age).with_id(i as i64 + 1).to_record().unwrap();
            db.upsert(Cat::meta(), record);
        }
        db
    }

    fn roots() -> Vec<Root> {
        vec![Root {
            alias: "c".to_string(),
            meta: Cat::meta(),
            implicit: false,
        }]
    }

    fn names(results: Vec<ResultValue>) -> Vec<String> {
        results
            .into_iter()
            .map(|r| match r {
                ResultValue::Scalar(Value::String(Some(s))) => s,
                other => panic!("unexpected {other}"),
            })
            .collect()
    }

    #[test]
    fn test_between_is_inclusive() {
        let db = database(&[("Mugi", 4), ("Sora", 5), ("Leo", 10), ("Coco", 11)]);
        let restriction = Restriction::Between {
            operand: parse("c.age").unwrap(),
            low: parse("5").unwrap(),
            high: parse("10").unwrap(),
        };
        let plan = build(
            &roots(),
            Some(&parse("c.name").unwrap()),
            &[restriction],
            &[],
            ResultKind::Scalar,
            "String",
        )
        .unwrap();
        assert_eq!(names(execute(&plan, &db)), vec!["Sora", "Leo"]);
    }

    #[test]
    fn test_descending_order_is_stable() {
        let db = database(&[("Mugi", 3), ("Sora", 7), ("Leo", 3)]);
        let order = [Order {
            expression: parse("c.age").unwrap(),
            ascending: false,
        }];
        let plan = build(
            &roots(),
            Some(&parse("c.name").unwrap()),
            &[],
            &order,
            ResultKind::Scalar,
            "String",
        )
        .unwrap();
        assert_eq!(names(execute(&plan, &db)), vec!["Sora", "Mugi", "Leo"]);
    }

    #[test]
    fn test_cross_join_of_two_roots() {
        let db = database(&[("Mugi", 3), ("Sora", 7)]);
        let roots = vec![
            Root {
                alias: "a".to_string(),
                meta: Cat::meta(),
                implicit: false,
            },
            Root {
                alias: "b".to_string(),
                meta: Cat::meta(),
                implicit: false,
            },
        ];
        let plan = build(
            &roots,
            Some(&parse("b.name").unwrap()),
            &[],
            &[],
            ResultKind::Scalar,
            "String",
        )
        .unwrap();
        assert_eq!(names(execute(&plan, &db)), vec!["Mugi", "Sora", "Mugi", "Sora"]);
    }
}
