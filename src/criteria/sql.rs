//! PostgreSQL rendering of criteria queries.
//!
//! Tables follow the entity conventions: a root becomes `"<table>" AS "<alias>"`, a
//! one-to-many attribute is read through the join table `<owner>_<attribute>` with
//! columns `<owner>_id` and `<attribute>_id`, and `SIZE` becomes a correlated count
//! over that join table.

use super::plan::{ComparisonOp, Operand, Predicate, QueryPlan, Root};
use crate::entity::{AttributeDef, EntityMeta};
use sea_query::{
    Expr, ExprTrait, Iden, JoinType, Order, PostgresQueryBuilder, Query, SelectStatement,
};

/// An identifier known only at runtime
struct SqlIdent(String);

impl Iden for SqlIdent {
    fn unquoted(&self) -> &str {
        &self.0
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn column(alias: &str, column: &str) -> String {
    format!("{}.{}", quote(alias), quote(column))
}

/// Join table name plus owner and member key columns of a collection attribute
fn join_table(owner: &EntityMeta, attribute: &AttributeDef) -> (String, String, String) {
    (
        owner.join_table(attribute),
        format!("{}_id", owner.table),
        format!("{}_id", attribute.column),
    )
}

fn size_subquery(root: &Root, attribute: &AttributeDef) -> String {
    let (table, owner_key, _) = join_table(root.meta, attribute);
    format!(
        "(SELECT COUNT(*) FROM {} WHERE {} = {})",
        quote(&table),
        column(&table, &owner_key),
        column(&root.alias, root.meta.key_column())
    )
}

fn expr(plan: &QueryPlan, operand: &Operand) -> Expr {
    match operand {
        Operand::Literal(value) => Expr::val(value.clone()),
        Operand::Root(root) => {
            let root = &plan.roots[*root];
            Expr::cust(column(&root.alias, root.meta.key_column()))
        }
        Operand::Attribute { root, attribute } => {
            Expr::cust(column(&plan.roots[*root].alias, attribute.column))
        }
        Operand::Size { root, attribute } => {
            Expr::cust(size_subquery(&plan.roots[*root], attribute))
        }
    }
}

fn condition(plan: &QueryPlan, predicate: &Predicate) -> Expr {
    match predicate {
        Predicate::Compare { left, op, right } => {
            let (left, right) = (expr(plan, left), expr(plan, right));
            match op {
                ComparisonOp::Eq => left.eq(right),
                ComparisonOp::Ne => left.ne(right),
                ComparisonOp::Gt => left.gt(right),
                ComparisonOp::Ge => left.gte(right),
                ComparisonOp::Lt => left.lt(right),
                ComparisonOp::Le => left.lte(right),
            }
        }
        Predicate::Between { operand, low, high } => {
            expr(plan, operand).between(expr(plan, low), expr(plan, high))
        }
        Predicate::IsNull { operand, negated } => {
            if *negated {
                expr(plan, operand).is_not_null()
            } else {
                expr(plan, operand).is_null()
            }
        }
    }
}

fn select_entity(statement: &mut SelectStatement, alias: &str, meta: &EntityMeta) {
    for attribute in meta.attributes {
        if attribute.target().is_none() {
            statement.expr(Expr::cust(column(alias, attribute.column)));
        }
    }
}

fn statement(plan: &QueryPlan) -> SelectStatement {
    let mut statement = Query::select();

    match &plan.selection {
        Operand::Root(root) => {
            let root = &plan.roots[*root];
            select_entity(&mut statement, &root.alias, root.meta);
        }
        Operand::Attribute { root, attribute } if attribute.target().is_some() => {
            let owner = &plan.roots[*root];
            if let Some(target) = attribute.target() {
                let (table, owner_key, member_key) = join_table(owner.meta, attribute);
                let link = format!("{}_{}", owner.alias, attribute.name);
                let member = format!("{}_{}_member", owner.alias, attribute.name);
                select_entity(&mut statement, &member, target);
                statement.join_as(
                    JoinType::InnerJoin,
                    SqlIdent(table),
                    SqlIdent(link.clone()),
                    Expr::cust(format!(
                        "{} = {}",
                        column(&link, &owner_key),
                        column(&owner.alias, owner.meta.key_column())
                    )),
                );
                statement.join_as(
                    JoinType::InnerJoin,
                    SqlIdent(target.table.to_string()),
                    SqlIdent(member.clone()),
                    Expr::cust(format!(
                        "{} = {}",
                        column(&member, target.key_column()),
                        column(&link, &member_key)
                    )),
                );
            }
        }
        operand => {
            statement.expr(expr(plan, operand));
        }
    }

    // Joins attach to the last FROM entry, so the collection owner goes last
    let owner = match &plan.selection {
        Operand::Attribute { root, attribute } if attribute.target().is_some() => Some(*root),
        _ => None,
    };
    let roots = plan
        .roots
        .iter()
        .enumerate()
        .filter(|(index, _)| Some(*index) != owner)
        .chain(owner.map(|index| (index, &plan.roots[index])));
    for (_, root) in roots {
        statement.from_as(
            SqlIdent(root.meta.table.to_string()),
            SqlIdent(root.alias.clone()),
        );
    }
    for predicate in &plan.predicates {
        statement.and_where(condition(plan, predicate));
    }
    for item in &plan.order {
        let order = if item.ascending { Order::Asc } else { Order::Desc };
        statement.order_by_expr(expr(plan, &item.operand), order);
    }
    statement
}

/// Render the plan, optionally restricted to a page
pub(crate) fn render(plan: &QueryPlan, page: Option<(u64, u64)>) -> String {
    let mut statement = statement(plan);
    if let Some((first_result, max_results)) = page {
        statement.limit(max_results).offset(first_result);
    }
    statement.to_string(PostgresQueryBuilder)
}
