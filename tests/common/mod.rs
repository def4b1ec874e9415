//! Common test utilities for sparkhive-rs integration tests.
//!
//! The integration tests run against a scripted, in-process engine instead of
//! a live Spark Thrift server:
//!
//! - [`FakeConnector`] answers connection attempts from a script and records
//!   every target it was asked to reach
//! - [`FakeSession`] hands out pre-built cursors in order
//! - [`FakeCursor`] answers polls from a script, keeps reporting a running
//!   operation once the script is used up, and switches to the cancelled
//!   state as soon as it is cancelled
//!
//! Log output of the current thread can be captured with [`capture_logs`].
//!
//! # Example
//!
//! ```ignore
//! let cursor = FakeCursor::finishing_after(2);
//! let session = FakeSession::with_cursors(vec![cursor.clone()]);
//! let connector = FakeConnector::succeeding(session);
//!
//! let manager = ConnectionManager::new(connector.clone());
//! ```

#![allow(dead_code)]

use async_trait::async_trait;
use sparkhive_rs::connection::{ConnectionMethod, Credentials};
use sparkhive_rs::error::TransportError;
use sparkhive_rs::query::Parameter;
use sparkhive_rs::transport::{
    ColumnDescription, ConnectTarget, OperationState, PollStatus, Row, RpcCursor, RpcSession,
    SessionConnector,
};
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;

// ============================================================================
// Credential Fixtures
// ============================================================================

/// Host used by every fixture.
pub const TEST_HOST: &str = "myorg.sparkhost.com";

/// Schema used by every fixture.
pub const TEST_SCHEMA: &str = "analytics";

/// Thrift credentials with the given retry policy.
pub fn thrift_credentials(connect_retries: u32, connect_timeout_secs: u64) -> Credentials {
    Credentials::builder(ConnectionMethod::Thrift)
        .host(TEST_HOST)
        .port(10001)
        .user("dbt")
        .schema(TEST_SCHEMA)
        .connect_retries(connect_retries)
        .connect_timeout_secs(connect_timeout_secs)
        .build()
}

/// HTTP tunnel credentials.
pub fn http_credentials() -> Credentials {
    Credentials::builder(ConnectionMethod::Http)
        .host(TEST_HOST)
        .cluster("01234-23423-coffeetime")
        .organization("0123456789")
        .token("abc123")
        .schema(TEST_SCHEMA)
        .build()
}

// ============================================================================
// Fake Cursor
// ============================================================================

/// Scripted cursor.
pub struct FakeCursor {
    polls: Mutex<VecDeque<PollStatus>>,
    rows: Vec<Row>,
    description: Option<Vec<ColumnDescription>>,
    execute_error: Option<TransportError>,
    cancel_error: Option<TransportError>,
    close_error: Option<TransportError>,
    cancelled: AtomicBool,
    executed: Mutex<Vec<(String, Vec<Parameter>)>>,
    poll_count: AtomicUsize,
    cancel_count: AtomicUsize,
    close_count: AtomicUsize,
}

impl FakeCursor {
    /// A cursor answering polls with `statuses`, then running forever.
    pub fn scripted(statuses: Vec<PollStatus>) -> Self {
        Self {
            polls: Mutex::new(statuses.into()),
            rows: Vec::new(),
            description: None,
            execute_error: None,
            cancel_error: None,
            close_error: None,
            cancelled: AtomicBool::new(false),
            executed: Mutex::new(Vec::new()),
            poll_count: AtomicUsize::new(0),
            cancel_count: AtomicUsize::new(0),
            close_count: AtomicUsize::new(0),
        }
    }

    /// A cursor that reports `pending` pending polls, then finishes.
    pub fn finishing_after(pending: usize) -> Self {
        let mut statuses = vec![PollStatus::new(OperationState::Pending); pending];
        statuses.push(PollStatus::new(OperationState::Finished));
        Self::scripted(statuses)
    }

    /// A cursor that never leaves the running state unless cancelled.
    pub fn running_forever() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn with_rows(mut self, description: Vec<ColumnDescription>, rows: Vec<Row>) -> Self {
        self.description = Some(description);
        self.rows = rows;
        self
    }

    pub fn failing_execute(mut self, err: TransportError) -> Self {
        self.execute_error = Some(err);
        self
    }

    pub fn failing_cancel(mut self, err: TransportError) -> Self {
        self.cancel_error = Some(err);
        self
    }

    pub fn failing_close(mut self, err: TransportError) -> Self {
        self.close_error = Some(err);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Statements submitted so far, with their bindings.
    pub fn executed(&self) -> Vec<(String, Vec<Parameter>)> {
        self.executed.lock().unwrap().clone()
    }

    pub fn poll_count(&self) -> usize {
        self.poll_count.load(Ordering::SeqCst)
    }

    pub fn cancel_count(&self) -> usize {
        self.cancel_count.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RpcCursor for FakeCursor {
    async fn execute_async(&self, sql: &str, parameters: &[Parameter]) -> Result<(), TransportError> {
        if let Some(err) = &self.execute_error {
            return Err(err.clone());
        }
        self.executed
            .lock()
            .unwrap()
            .push((sql.to_string(), parameters.to_vec()));
        Ok(())
    }

    async fn poll(&self) -> Result<PollStatus, TransportError> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        if self.cancelled.load(Ordering::SeqCst) {
            return Ok(PollStatus::new(OperationState::Canceled));
        }
        let next = self.polls.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| PollStatus::new(OperationState::Running)))
    }

    async fn cancel(&self) -> Result<(), TransportError> {
        self.cancel_count.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.cancel_error {
            return Err(err.clone());
        }
        self.cancelled.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        match &self.close_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn fetch_all(&self) -> Result<Vec<Row>, TransportError> {
        Ok(self.rows.clone())
    }

    fn description(&self) -> Option<Vec<ColumnDescription>> {
        self.description.clone()
    }
}

// ============================================================================
// Fake Session
// ============================================================================

/// Session handing out pre-built cursors in order.
///
/// Once the list is used up, every further cursor finishes immediately.
pub struct FakeSession {
    cursors: Mutex<VecDeque<Arc<FakeCursor>>>,
    handed_out: AtomicUsize,
    close_count: AtomicUsize,
}

impl FakeSession {
    pub fn with_cursors(cursors: Vec<Arc<FakeCursor>>) -> Arc<Self> {
        Arc::new(Self {
            cursors: Mutex::new(cursors.into()),
            handed_out: AtomicUsize::new(0),
            close_count: AtomicUsize::new(0),
        })
    }

    pub fn cursors_handed_out(&self) -> usize {
        self.handed_out.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RpcSession for FakeSession {
    async fn cursor(&self) -> Result<Arc<dyn RpcCursor>, TransportError> {
        self.handed_out.fetch_add(1, Ordering::SeqCst);
        let next = self.cursors.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| FakeCursor::finishing_after(0).into_arc()))
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Fake Connector
// ============================================================================

/// Connector answering attempts from a script of failures.
///
/// Each scripted error is returned once, in order; after that every attempt
/// succeeds with the configured session.
pub struct FakeConnector {
    failures: Mutex<VecDeque<TransportError>>,
    session: Arc<FakeSession>,
    targets: Mutex<Vec<ConnectTarget>>,
}

impl FakeConnector {
    pub fn succeeding(session: Arc<FakeSession>) -> Arc<Self> {
        Self::failing_first(Vec::new(), session)
    }

    pub fn failing_first(failures: Vec<TransportError>, session: Arc<FakeSession>) -> Arc<Self> {
        Arc::new(Self {
            failures: Mutex::new(failures.into()),
            session,
            targets: Mutex::new(Vec::new()),
        })
    }

    /// Number of connection attempts made.
    pub fn attempts(&self) -> usize {
        self.targets.lock().unwrap().len()
    }

    /// Targets of all connection attempts, in order.
    pub fn targets(&self) -> Vec<ConnectTarget> {
        self.targets.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionConnector for FakeConnector {
    async fn connect(&self, target: &ConnectTarget) -> Result<Arc<dyn RpcSession>, TransportError> {
        self.targets.lock().unwrap().push(target.clone());
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(Arc::clone(&self.session) as Arc<dyn RpcSession>)
    }
}

/// A connect error the opener treats as transient.
pub fn cluster_starting() -> TransportError {
    TransportError::Rpc {
        message: "Cluster 01234-23423-coffeetime is in PENDING state".to_string(),
    }
}

// ============================================================================
// Log Capture
// ============================================================================

/// Formatted log output of the current thread.
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    _guard: DefaultGuard,
}

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

#[derive(Clone)]
struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Capture debug-level logs emitted on this thread until the capture is
/// dropped. Use with the current-thread test runtime.
pub fn capture_logs() -> LogCapture {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let writer = BufferWriter(Arc::clone(&buffer));

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    LogCapture {
        buffer,
        _guard: tracing::subscriber::set_default(subscriber),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_cursor_runs_until_cancelled() {
        let cursor = FakeCursor::running_forever();

        assert_eq!(
            cursor.poll().await.unwrap().operation_state,
            OperationState::Running
        );
        cursor.cancel().await.unwrap();
        assert_eq!(
            cursor.poll().await.unwrap().operation_state,
            OperationState::Canceled
        );
        assert_eq!(cursor.poll_count(), 2);
    }

    #[tokio::test]
    async fn test_fake_connector_script() {
        let connector =
            FakeConnector::failing_first(vec![cluster_starting()], FakeSession::with_cursors(vec![]));
        let target = ConnectTarget::Direct {
            host: TEST_HOST.to_string(),
            port: 10001,
            username: "dbt".to_string(),
        };

        assert!(connector.connect(&target).await.is_err());
        assert!(connector.connect(&target).await.is_ok());
        assert_eq!(connector.attempts(), 2);
    }
}
