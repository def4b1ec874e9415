//! RPC session capability traits.
//!
//! This module defines the traits that abstract the Thrift session a host
//! provides. The crate never speaks the wire protocol itself: a
//! [`SessionConnector`] opens sessions, an [`RpcSession`] hands out cursors,
//! and an [`RpcCursor`] submits statements and reports their progress.
//!
//! All cursor methods take `&self`, so a cancel issued from one task can run
//! while another task is polling the same cursor.

use crate::error::TransportError;
use crate::query::statement::Parameter;
use crate::transport::http::HttpTransport;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// A fetched result row.
pub type Row = Vec<serde_json::Value>;

/// State of an asynchronously executing operation.
///
/// Mirrors the Thrift `TOperationState` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationState {
    Initialized,
    Running,
    Finished,
    Canceled,
    Closed,
    Error,
    Unknown,
    Pending,
    TimedOut,
    /// A state code outside the known set
    Unrecognized(i32),
}

impl OperationState {
    /// Map a wire code to a state.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Initialized,
            1 => Self::Running,
            2 => Self::Finished,
            3 => Self::Canceled,
            4 => Self::Closed,
            5 => Self::Error,
            6 => Self::Unknown,
            7 => Self::Pending,
            8 => Self::TimedOut,
            other => Self::Unrecognized(other),
        }
    }

    /// The wire code of this state.
    pub fn code(&self) -> i32 {
        match self {
            Self::Initialized => 0,
            Self::Running => 1,
            Self::Finished => 2,
            Self::Canceled => 3,
            Self::Closed => 4,
            Self::Error => 5,
            Self::Unknown => 6,
            Self::Pending => 7,
            Self::TimedOut => 8,
            Self::Unrecognized(code) => *code,
        }
    }

    /// Protocol name of the state, `None` for unrecognized codes.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Self::Initialized => Some("INITIALIZED_STATE"),
            Self::Running => Some("RUNNING_STATE"),
            Self::Finished => Some("FINISHED_STATE"),
            Self::Canceled => Some("CANCELED_STATE"),
            Self::Closed => Some("CLOSED_STATE"),
            Self::Error => Some("ERROR_STATE"),
            Self::Unknown => Some("UKNOWN_STATE"),
            Self::Pending => Some("PENDING_STATE"),
            Self::TimedOut => Some("TIMEDOUT_STATE"),
            Self::Unrecognized(_) => None,
        }
    }

    /// Whether the operation is still in flight.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Initialized | Self::Running | Self::Pending)
    }

    /// Whether the operation completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Unknown<{}>", self.code()),
        }
    }
}

/// Result of a single status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollStatus {
    /// Current state of the operation
    pub operation_state: OperationState,
    /// Error message reported alongside the state
    pub error_message: Option<String>,
}

impl PollStatus {
    /// A status without an error message.
    pub fn new(operation_state: OperationState) -> Self {
        Self {
            operation_state,
            error_message: None,
        }
    }

    /// A status carrying an error message.
    pub fn with_error(operation_state: OperationState, message: impl Into<String>) -> Self {
        Self {
            operation_state,
            error_message: Some(message.into()),
        }
    }
}

/// Column metadata in the seven-field DB-API shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    pub name: String,
    pub type_name: String,
    pub display_size: Option<i32>,
    pub internal_size: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub null_ok: Option<bool>,
}

impl ColumnDescription {
    /// Create a description with only name and type set.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            display_size: None,
            internal_size: None,
            precision: None,
            scale: None,
            null_ok: None,
        }
    }
}

/// Where and how a session should be opened.
#[derive(Debug, Clone)]
pub enum ConnectTarget {
    /// Direct Thrift session, authenticated by username only
    Direct {
        host: String,
        port: u16,
        username: String,
    },
    /// Session over an HTTP transport carrying custom auth headers
    Http(HttpTransport),
}

/// Opens authenticated RPC sessions.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    /// Open a session against the given target.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the session cannot be opened. Errors that
    /// carry a server message (`TransportError::Rpc`) may be retried by the
    /// connection opener.
    async fn connect(&self, target: &ConnectTarget) -> Result<Arc<dyn RpcSession>, TransportError>;
}

/// A live RPC session.
#[async_trait]
pub trait RpcSession: Send + Sync {
    /// Open a new cursor on this session.
    async fn cursor(&self) -> Result<Arc<dyn RpcCursor>, TransportError>;

    /// Close the session.
    async fn close(&self) -> Result<(), TransportError>;
}

/// A cursor executing one statement at a time.
#[async_trait]
pub trait RpcCursor: Send + Sync {
    /// Submit a statement without waiting for it to complete.
    async fn execute_async(&self, sql: &str, parameters: &[Parameter]) -> Result<(), TransportError>;

    /// Request the current status of the submitted operation.
    async fn poll(&self) -> Result<PollStatus, TransportError>;

    /// Cancel the submitted operation.
    async fn cancel(&self) -> Result<(), TransportError>;

    /// Close the cursor.
    async fn close(&self) -> Result<(), TransportError>;

    /// Fetch all remaining rows of the completed operation.
    async fn fetch_all(&self) -> Result<Vec<Row>, TransportError>;

    /// Column metadata of the completed operation.
    fn description(&self) -> Option<Vec<ColumnDescription>>;
}
