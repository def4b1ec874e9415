//! Error types for sparkhive-rs.
//!
//! This module defines domain-specific error types organized by functional area.

use crate::connection::params::ConnectionMethod;
use std::fmt;
use thiserror::Error;

/// Top-level error type encompassing all possible errors.
#[derive(Error, Debug)]
pub enum SparkError {
    /// Credential configuration errors
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Connection-related errors
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Query execution errors
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Transport protocol errors
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Statement failure reshaped by the connection manager
    #[error("Runtime Error\n  {0}")]
    Runtime(String),
}

/// Errors in the credentials used to reach the engine.
///
/// These are always raised before any network action takes place.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A field required by the chosen method is absent or empty
    #[error("The config '{field}' is required when using the {method} method to connect to Spark")]
    MissingField {
        field: &'static str,
        method: ConnectionMethod,
    },

    /// The method string does not name a supported connection method
    #[error("invalid credential method: {0}")]
    InvalidMethod(String),

    /// The tunnel URL built from the credentials does not parse
    #[error("Invalid connection url '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

/// Errors related to establishing or using a connection.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Connection attempt hit a non-transient failure
    #[error("Failed to connect: {0}")]
    ConnectFailed(String),

    /// Connection is closed
    #[error("Connection is closed")]
    ConnectionClosed,
}

/// Errors related to query execution.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The engine reported an error, or the query ended in a non-success state
    #[error("Database Error\n  {0}")]
    Database(String),

    /// No cursor has been opened on the executor
    #[error("No cursor is open; call cursor() before executing")]
    NoCursor,

    /// Operation is not valid in the current executor state
    #[error("Invalid query state: {0}")]
    InvalidState(String),

    /// Polling was abandoned through the caller's cancellation token
    #[error("Query was cancelled")]
    Cancelled,
}

/// Status envelope returned by the remote service alongside a failed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcStatus {
    /// Status code name, e.g. `ERROR_STATUS`
    pub status_code: String,
    /// Error message reported by the server
    pub error_message: Option<String>,
    /// SQLSTATE, when the server provides one
    pub sql_state: Option<String>,
}

impl RpcStatus {
    /// Create an error status with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status_code: "ERROR_STATUS".to_string(),
            error_message: Some(message.into()),
            sql_state: None,
        }
    }
}

impl fmt::Display for RpcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TStatus(statusCode={}", self.status_code)?;
        if let Some(state) = &self.sql_state {
            write!(f, ", sqlState={}", state)?;
        }
        if let Some(message) = &self.error_message {
            write!(f, ", errorMessage={}", message)?;
        }
        write!(f, ")")
    }
}

/// Errors raised by the RPC session capability.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Protocol or application failure that carries a server message
    #[error("RPC error: {message}")]
    Rpc { message: String },

    /// A call returned a non-success status envelope
    #[error("Remote call failed: {0}")]
    Status(RpcStatus),

    /// Network or operating-system level failure
    #[error("Network I/O error: {0}")]
    Io(String),

    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid response from server
    #[error("Invalid server response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    /// The server-provided message, for errors that carry one.
    ///
    /// The connection opener uses this to decide whether a failure can be
    /// retried: errors without a message are always fatal.
    pub fn message(&self) -> Option<&str> {
        match self {
            TransportError::Rpc { message } => Some(message),
            _ => None,
        }
    }

    /// Whether this is an environment-level (I/O) failure.
    pub fn is_environmental(&self) -> bool {
        matches!(self, TransportError::Io(_))
    }
}

impl SparkError {
    /// Whether the error carries any payload beyond its kind.
    pub fn has_arguments(&self) -> bool {
        !matches!(
            self,
            SparkError::Connection(ConnectionError::ConnectionClosed)
                | SparkError::Query(QueryError::NoCursor)
                | SparkError::Query(QueryError::Cancelled)
        )
    }

    /// The status envelope of a failed RPC call, if this error wraps one.
    pub fn rpc_status(&self) -> Option<&RpcStatus> {
        match self {
            SparkError::Transport(TransportError::Status(status)) => Some(status),
            _ => None,
        }
    }
}

// Conversions from external error types
impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}
