//! Connection record and lifecycle state.
//!
//! A [`Connection`] is the caller-visible handle to one logical session. It is
//! reused across statements while open and reset when closed. Opening and
//! closing are done by the connection manager.

use crate::connection::params::Credentials;
use crate::error::ConnectionError;
use crate::query::executor::QueryExecutor;
use std::fmt;
use std::sync::Arc;

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No live session
    Closed,
    /// A live session is held
    Open,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Closed => write!(f, "closed"),
            ConnectionState::Open => write!(f, "open"),
        }
    }
}

/// A named connection and, once open, its query executor.
pub struct Connection {
    name: Option<String>,
    credentials: Arc<Credentials>,
    state: ConnectionState,
    handle: Option<Arc<QueryExecutor>>,
}

impl Connection {
    /// Create a closed connection.
    pub fn new(credentials: Arc<Credentials>) -> Self {
        Self {
            name: None,
            credentials,
            state: ConnectionState::Closed,
            handle: None,
        }
    }

    /// Set the connection name used in logs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn credentials(&self) -> &Arc<Credentials> {
        &self.credentials
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// The executor of an open connection.
    pub fn handle(&self) -> Option<&Arc<QueryExecutor>> {
        self.handle.as_ref()
    }

    /// The executor, or `ConnectionClosed` if the connection is not open.
    pub fn require_handle(&self) -> Result<&Arc<QueryExecutor>, ConnectionError> {
        self.handle.as_ref().ok_or(ConnectionError::ConnectionClosed)
    }

    pub(crate) fn mark_open(&mut self, handle: Arc<QueryExecutor>) {
        self.handle = Some(handle);
        self.state = ConnectionState::Open;
    }

    /// Drop the handle and return it, leaving the connection closed.
    pub(crate) fn reset(&mut self) -> Option<Arc<QueryExecutor>> {
        self.state = ConnectionState::Closed;
        self.handle.take()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("credentials", &self.credentials)
            .field("has_handle", &self.handle.is_some())
            .finish()
    }
}
