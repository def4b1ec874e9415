//! Query execution over an asynchronous RPC session.
//!
//! The server only offers fire-and-poll execution, so [`QueryExecutor::execute`]
//! runs an explicit state machine:
//!
//! 1. submit the prepared statement with [`RpcCursor::execute_async`]
//! 2. [`poll_until_terminal`] until the operation leaves the pending states
//! 3. [`resolve_poll_status`] turns the terminal status into success or a
//!    `QueryError::Database`
//!
//! The poll loop has no timeout. It ends when the server reaches a terminal
//! state, when another task cancels the cursor, or when the caller's
//! `CancellationToken` fires.

use crate::adapter::transaction::{TransactionOp, TransactionOutcome};
use crate::error::{QueryError, SparkError, TransportError};
use crate::query::statement::{normalize_bindings, prepare_statement, Parameter};
use crate::transport::protocol::{ColumnDescription, PollStatus, Row, RpcCursor, RpcSession};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Executor configuration.
#[derive(Debug, Clone, Default)]
pub struct ExecutorConfig {
    /// Pause between status polls; zero only yields to the runtime
    pub poll_interval: Duration,
}

/// Cursor held by an executor, with whether its last execute succeeded.
struct CursorSlot {
    cursor: Arc<dyn RpcCursor>,
    executed: bool,
}

/// Owns one live session and at most one cursor.
///
/// Calling [`cursor`](Self::cursor) replaces the held cursor without closing
/// the previous one; closing it is the caller's responsibility.
pub struct QueryExecutor {
    session: Arc<dyn RpcSession>,
    cursor: Mutex<Option<CursorSlot>>,
    config: ExecutorConfig,
}

impl QueryExecutor {
    /// Wrap a live session.
    pub fn new(session: Arc<dyn RpcSession>) -> Self {
        Self::with_config(session, ExecutorConfig::default())
    }

    /// Wrap a live session with explicit configuration.
    pub fn with_config(session: Arc<dyn RpcSession>, config: ExecutorConfig) -> Self {
        Self {
            session,
            cursor: Mutex::new(None),
            config,
        }
    }

    /// The underlying session.
    pub fn session(&self) -> &Arc<dyn RpcSession> {
        &self.session
    }

    /// Open a fresh cursor and hold it for subsequent calls.
    ///
    /// # Errors
    ///
    /// Returns `SparkError::Transport` if the session cannot open a cursor;
    /// the previously held cursor is kept in that case.
    pub async fn cursor(&self) -> Result<&Self, SparkError> {
        let cursor = self.session.cursor().await?;
        *self.cursor.lock().await = Some(CursorSlot {
            cursor,
            executed: false,
        });
        Ok(self)
    }

    /// Whether a cursor is currently held.
    pub async fn has_cursor(&self) -> bool {
        self.cursor.lock().await.is_some()
    }

    /// Execute a statement and wait for it to finish.
    ///
    /// # Arguments
    ///
    /// * `sql` - Statement text; one trailing `;` is removed
    /// * `bindings` - Parameter values; decimals are sent as floats
    ///
    /// # Errors
    ///
    /// Returns `QueryError::NoCursor` if no cursor is held,
    /// `QueryError::Database` if the server reports an error or the query
    /// ends in any state other than finished, or `SparkError::Transport` if
    /// an RPC call fails.
    pub async fn execute(&self, sql: &str, bindings: &[Parameter]) -> Result<(), SparkError> {
        self.execute_until_cancelled(sql, bindings, &CancellationToken::new())
            .await
    }

    /// Execute a statement, abandoning the poll loop when `cancel` fires.
    ///
    /// On cancellation the cursor is cancelled on a best-effort basis and
    /// `QueryError::Cancelled` is returned.
    pub async fn execute_until_cancelled(
        &self,
        sql: &str,
        bindings: &[Parameter],
        cancel: &CancellationToken,
    ) -> Result<(), SparkError> {
        let cursor = self.begin_execution().await?;

        let sql = prepare_statement(sql);
        let bindings = normalize_bindings(bindings);

        cursor.execute_async(&sql, &bindings).await?;

        let status = poll_until_terminal(cursor.as_ref(), self.config.poll_interval, cancel).await?;
        resolve_poll_status(&status)?;

        debug!(state = %status.operation_state, "Poll status, query complete");
        self.mark_executed(&cursor).await;

        Ok(())
    }

    /// Cancel the operation on the held cursor.
    ///
    /// I/O errors are logged at debug level and discarded; any other error
    /// is returned.
    pub async fn cancel(&self) -> Result<(), SparkError> {
        if let Some(cursor) = self.held_cursor().await {
            tolerate_environmental(cursor.cancel().await, "cancelling query")?;
        }
        Ok(())
    }

    /// Close the held cursor, with the same error tolerance as [`cancel`](Self::cancel).
    pub async fn close(&self) -> Result<(), SparkError> {
        if let Some(cursor) = self.held_cursor().await {
            tolerate_environmental(cursor.close().await, "closing cursor")?;
        }
        Ok(())
    }

    /// Close the underlying session, discarding I/O errors.
    pub async fn close_session(&self) -> Result<(), SparkError> {
        tolerate_environmental(self.session.close().await, "closing session")?;
        Ok(())
    }

    /// Transactions are not supported; nothing is sent to the server.
    pub fn rollback(&self) -> TransactionOutcome {
        debug!("NotImplemented: rollback");
        TransactionOutcome::NotSupported(TransactionOp::Rollback)
    }

    /// Fetch all rows of the last successful execute.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::NoCursor` or `QueryError::InvalidState` if no
    /// execute has succeeded on the held cursor.
    pub async fn fetch_all(&self) -> Result<Vec<Row>, SparkError> {
        let cursor = self.executed_cursor("fetch_all").await?;
        Ok(cursor.fetch_all().await?)
    }

    /// Column metadata of the last successful execute.
    pub async fn description(&self) -> Result<Option<Vec<ColumnDescription>>, SparkError> {
        let cursor = self.executed_cursor("description").await?;
        Ok(cursor.description())
    }

    async fn held_cursor(&self) -> Option<Arc<dyn RpcCursor>> {
        self.cursor
            .lock()
            .await
            .as_ref()
            .map(|slot| Arc::clone(&slot.cursor))
    }

    async fn begin_execution(&self) -> Result<Arc<dyn RpcCursor>, QueryError> {
        let mut guard = self.cursor.lock().await;
        let slot = guard.as_mut().ok_or(QueryError::NoCursor)?;
        slot.executed = false;
        Ok(Arc::clone(&slot.cursor))
    }

    async fn mark_executed(&self, cursor: &Arc<dyn RpcCursor>) {
        let mut guard = self.cursor.lock().await;
        // The cursor may have been replaced while we were polling
        if let Some(slot) = guard.as_mut().filter(|slot| same_cursor(&slot.cursor, cursor)) {
            slot.executed = true;
        }
    }

    async fn executed_cursor(&self, operation: &str) -> Result<Arc<dyn RpcCursor>, QueryError> {
        let guard = self.cursor.lock().await;
        match guard.as_ref() {
            None => Err(QueryError::NoCursor),
            Some(slot) if !slot.executed => Err(QueryError::InvalidState(format!(
                "{} called before a successful execute",
                operation
            ))),
            Some(slot) => Ok(Arc::clone(&slot.cursor)),
        }
    }
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Poll a submitted operation until it leaves the pending states.
///
/// Each pending status is logged. Between polls the loop pauses for
/// `poll_interval` (or yields when it is zero) and checks `cancel`.
pub async fn poll_until_terminal(
    cursor: &dyn RpcCursor,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> Result<PollStatus, SparkError> {
    let mut status = cursor.poll().await?;

    while status.operation_state.is_pending() {
        debug!(state = %status.operation_state, "Poll status, sleeping");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Cancellation requested while polling");
                if let Err(err) = tolerate_environmental(cursor.cancel().await, "cancelling query") {
                    debug!(error = %err, "Cancel after abandoned poll failed");
                }
                return Err(QueryError::Cancelled.into());
            }
            _ = pause(poll_interval) => {}
        }

        status = cursor.poll().await?;
    }

    Ok(status)
}

/// Turn a terminal poll status into the outcome of the query.
///
/// An error message is reported verbatim. Without one, any state other than
/// finished is still a failure: a cancelled or timed-out operation carries no
/// message but did not succeed.
pub fn resolve_poll_status(status: &PollStatus) -> Result<(), QueryError> {
    if let Some(message) = status.error_message.as_deref().filter(|m| !m.is_empty()) {
        debug!(response = ?status, "Poll response");
        debug!(state = %status.operation_state, "Poll status");
        return Err(QueryError::Database(message.to_string()));
    }

    if !status.operation_state.is_success() {
        return Err(QueryError::Database(format!(
            "Query failed with status: {}",
            status.operation_state
        )));
    }

    Ok(())
}

async fn pause(interval: Duration) {
    if interval.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(interval).await;
    }
}

fn tolerate_environmental(
    result: Result<(), TransportError>,
    action: &'static str,
) -> Result<(), TransportError> {
    match result {
        Err(err) if err.is_environmental() => {
            debug!(error = %err, "Exception while {}", action);
            Ok(())
        }
        other => other,
    }
}

fn same_cursor(a: &Arc<dyn RpcCursor>, b: &Arc<dyn RpcCursor>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
