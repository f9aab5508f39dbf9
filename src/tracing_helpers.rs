//! Span constructors for the store, transactions and query execution.

use tracing::{debug_span, Span};

pub(crate) fn flush_span(pending: usize) -> Span {
    debug_span!("cattery.flush", pending)
}

pub(crate) fn begin_transaction_span(depth: usize) -> Span {
    debug_span!("cattery.transaction.begin", depth)
}

pub(crate) fn commit_transaction_span(depth: usize) -> Span {
    debug_span!("cattery.transaction.commit", depth)
}

pub(crate) fn rollback_transaction_span(depth: usize) -> Span {
    debug_span!("cattery.transaction.rollback", depth)
}

pub(crate) fn execute_query_span(roots: &str) -> Span {
    debug_span!("cattery.query", roots)
}
