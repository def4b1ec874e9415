//! Transaction control.
//!
//! The engine has no transactions. Every control operation reports
//! [`TransactionOutcome::NotSupported`] so callers can tell a skipped
//! operation apart from one that ran.

use std::fmt;

/// A transaction control operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionOp {
    Begin,
    Commit,
    Rollback,
    AddBeginQuery,
    AddCommitQuery,
}

impl TransactionOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionOp::Begin => "begin",
            TransactionOp::Commit => "commit",
            TransactionOp::Rollback => "rollback",
            TransactionOp::AddBeginQuery => "add_begin_query",
            TransactionOp::AddCommitQuery => "add_commit_query",
        }
    }
}

impl fmt::Display for TransactionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a transaction control operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// The operation was sent to the engine
    ///
    /// Reserved for [`TransactionControl`] implementations backed by an
    /// engine with transactions; [`ConnectionManager`](crate::adapter::ConnectionManager)
    /// never reports it.
    Executed,
    /// The operation was skipped because the engine has no transactions
    NotSupported(TransactionOp),
}

impl TransactionOutcome {
    pub fn is_supported(&self) -> bool {
        matches!(self, TransactionOutcome::Executed)
    }
}

/// Transaction control surface of a connection manager.
pub trait TransactionControl {
    fn begin(&self) -> TransactionOutcome;

    fn commit(&self) -> TransactionOutcome;

    fn rollback(&self) -> TransactionOutcome;

    fn add_begin_query(&self) -> TransactionOutcome;

    fn add_commit_query(&self) -> TransactionOutcome;
}
