//! Connection manager.
//!
//! The [`ConnectionManager`] mediates every caller interaction with a
//! [`Connection`]: opening it through the retrying opener, dispatching
//! cancellation, closing it, and running statements with errors reshaped into
//! a single runtime error kind.

use crate::adapter::transaction::{TransactionControl, TransactionOp, TransactionOutcome};
use crate::connection::opener::ConnectionOpener;
use crate::connection::session::Connection;
use crate::error::SparkError;
use crate::query::executor::{ExecutorConfig, QueryExecutor};
use crate::query::statement::Parameter;
use crate::transport::protocol::{ColumnDescription, Row, SessionConnector};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Manager configuration.
#[derive(Debug, Clone, Default)]
pub struct ManagerConfig {
    /// Configuration given to every executor the manager creates
    pub executor: ExecutorConfig,
}

/// Response of [`ConnectionManager::execute`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResponse {
    /// Always `"OK"`; failures are returned as errors
    pub status: String,
    /// Column metadata of the statement
    pub columns: Vec<ColumnDescription>,
    /// Fetched rows, empty unless fetching was requested
    pub rows: Vec<Row>,
}

/// Opens, cancels and closes connections and runs statements on them.
pub struct ConnectionManager {
    connector: Arc<dyn SessionConnector>,
    config: ManagerConfig,
}

impl ConnectionManager {
    /// Connection type served by this manager.
    pub const TYPE: &'static str = "spark";

    pub fn new(connector: Arc<dyn SessionConnector>) -> Self {
        Self::with_config(connector, ManagerConfig::default())
    }

    pub fn with_config(connector: Arc<dyn SessionConnector>, config: ManagerConfig) -> Self {
        Self { connector, config }
    }

    /// Open a connection.
    ///
    /// An open connection is returned untouched. Otherwise a session is
    /// opened with retry, wrapped in a [`QueryExecutor`] and stored as the
    /// connection's handle.
    ///
    /// # Errors
    ///
    /// Returns the opener's error; the connection stays closed.
    pub async fn open<'c>(
        &self,
        connection: &'c mut Connection,
    ) -> Result<&'c mut Connection, SparkError> {
        if connection.is_open() {
            debug!(
                name = connection.name().unwrap_or_default(),
                "Connection is already open, skipping open."
            );
            return Ok(connection);
        }

        let credentials = Arc::clone(connection.credentials());
        let mut opener = ConnectionOpener::new(Arc::clone(&self.connector));
        let session = opener.open(&credentials).await?;

        let executor = QueryExecutor::with_config(session, self.config.executor.clone());
        connection.mark_open(Arc::new(executor));

        Ok(connection)
    }

    /// Cancel the running query of a connection, if any.
    pub async fn cancel(&self, connection: &Connection) -> Result<(), SparkError> {
        match connection.handle() {
            Some(handle) => {
                debug!(
                    name = connection.name().unwrap_or_default(),
                    "Cancelling query"
                );
                handle.cancel().await
            }
            None => Ok(()),
        }
    }

    /// Close a connection.
    ///
    /// The connection is reset to closed even when closing the cursor or the
    /// session fails.
    pub async fn close(&self, connection: &mut Connection) -> Result<(), SparkError> {
        let Some(handle) = connection.reset() else {
            return Ok(());
        };

        debug!(
            name = connection.name().unwrap_or_default(),
            "Closing connection"
        );
        let cursor_result = handle.close().await;
        handle.close_session().await?;
        cursor_result
    }

    /// Status reported for every statement that did not fail.
    pub fn get_status(&self) -> &'static str {
        "OK"
    }

    /// Await `operation`, reshaping its error with [`reshape_error`].
    ///
    /// The failing statement and the original error are logged at debug
    /// level.
    pub async fn exception_handler<T, F>(&self, sql: &str, operation: F) -> Result<T, SparkError>
    where
        F: Future<Output = Result<T, SparkError>>,
    {
        operation.await.map_err(|err| {
            debug!("Error while running:\n{}", sql);
            debug!(error = ?err, "{}", err);
            reshape_error(err)
        })
    }

    /// Open the connection if needed and run one statement on a fresh cursor.
    ///
    /// Returns the executor holding the cursor the statement ran on.
    pub async fn add_query(
        &self,
        connection: &mut Connection,
        sql: &str,
        bindings: &[Parameter],
    ) -> Result<Arc<QueryExecutor>, SparkError> {
        self.add_query_until_cancelled(connection, sql, bindings, &CancellationToken::new())
            .await
    }

    /// Like [`add_query`](Self::add_query), but polling stops when `cancel`
    /// fires.
    ///
    /// The connection stays mutably borrowed while the statement runs, so a
    /// caller that needs to cancel it keeps a clone of the token. On
    /// cancellation the cursor is cancelled and `QueryError::Cancelled` is
    /// returned; the connection stays open.
    pub async fn add_query_until_cancelled(
        &self,
        connection: &mut Connection,
        sql: &str,
        bindings: &[Parameter],
        cancel: &CancellationToken,
    ) -> Result<Arc<QueryExecutor>, SparkError> {
        let connection = self.open(connection).await?;
        let handle = Arc::clone(connection.require_handle()?);

        debug!(
            name = connection.name().unwrap_or_default(),
            "Using {} connection", Self::TYPE
        );
        debug!("On {}: {}", connection.name().unwrap_or_default(), sql);

        let started = Instant::now();
        self.exception_handler(sql, async {
            handle.cursor().await?;
            handle.execute_until_cancelled(sql, bindings, cancel).await
        })
        .await?;

        debug!(
            "SQL status: {} in {:.2} seconds",
            self.get_status(),
            started.elapsed().as_secs_f64()
        );

        Ok(handle)
    }

    /// Run a statement and collect its response.
    ///
    /// Rows are fetched only when `fetch` is set.
    pub async fn execute(
        &self,
        connection: &mut Connection,
        sql: &str,
        fetch: bool,
    ) -> Result<ExecutionResponse, SparkError> {
        self.execute_until_cancelled(connection, sql, fetch, &CancellationToken::new())
            .await
    }

    /// Like [`execute`](Self::execute), but polling stops when `cancel` fires.
    pub async fn execute_until_cancelled(
        &self,
        connection: &mut Connection,
        sql: &str,
        fetch: bool,
        cancel: &CancellationToken,
    ) -> Result<ExecutionResponse, SparkError> {
        let handle = self
            .add_query_until_cancelled(connection, sql, &[], cancel)
            .await?;

        let columns = self
            .exception_handler(sql, handle.description())
            .await?
            .unwrap_or_default();
        let rows = if fetch {
            self.exception_handler(sql, handle.fetch_all()).await?
        } else {
            Vec::new()
        };

        Ok(ExecutionResponse {
            status: self.get_status().to_string(),
            columns,
            rows,
        })
    }

    fn not_supported(&self, op: TransactionOp) -> TransactionOutcome {
        debug!("NotImplemented: {}", op);
        TransactionOutcome::NotSupported(op)
    }
}

impl TransactionControl for ConnectionManager {
    fn begin(&self) -> TransactionOutcome {
        self.not_supported(TransactionOp::Begin)
    }

    fn commit(&self) -> TransactionOutcome {
        self.not_supported(TransactionOp::Commit)
    }

    fn rollback(&self) -> TransactionOutcome {
        self.not_supported(TransactionOp::Rollback)
    }

    fn add_begin_query(&self) -> TransactionOutcome {
        self.not_supported(TransactionOp::AddBeginQuery)
    }

    fn add_commit_query(&self) -> TransactionOutcome {
        self.not_supported(TransactionOp::AddCommitQuery)
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Reshape a statement error into a runtime error.
///
/// - errors without a payload and errors already reshaped are returned as is
/// - an RPC status envelope is replaced by the message it carries, or by the
///   envelope's own text when it has none
/// - any other error becomes a runtime error with the same text
pub fn reshape_error(err: SparkError) -> SparkError {
    if !err.has_arguments() || matches!(err, SparkError::Runtime(_)) {
        return err;
    }

    if let Some(status) = err.rpc_status() {
        let message = status
            .error_message
            .clone()
            .unwrap_or_else(|| status.to_string());
        return SparkError::Runtime(message);
    }

    SparkError::Runtime(err.to_string())
}
