//! Connection establishment with retry.
//!
//! A cluster that is still starting answers connection attempts with an error
//! instead of a session. [`ConnectionOpener`] retries those transient
//! failures up to `connect_retries` times, sleeping `connect_timeout` between
//! attempts, and fails fast on everything else.

use crate::connection::params::Credentials;
use crate::error::{ConnectionError, SparkError};
use crate::transport::factory::TransportFactory;
use crate::transport::protocol::{RpcSession, SessionConnector};
use std::sync::Arc;
use tracing::{debug, warn};

/// Markers in a lower-cased connect error message that indicate the cluster
/// is still starting up.
const TRANSIENT_MARKERS: &[&str] = &["pending", "temporarily_unavailable"];

/// Classification of a failed connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The cluster is starting; the attempt may be retried
    Transient,
    /// Retrying will not help
    Fatal,
}

/// Classify a connect error message.
///
/// `message` is expected to be lower-cased already.
pub fn classify_connect_failure(message: &str) -> FailureKind {
    if TRANSIENT_MARKERS.iter().any(|marker| message.contains(marker)) {
        FailureKind::Transient
    } else {
        FailureKind::Fatal
    }
}

/// Progress of a [`ConnectionOpener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenerState {
    NotAttempted,
    /// Attempt number, starting at 1
    Attempting { attempt: u32 },
    Open,
    Failed,
}

/// Opens a session, retrying transient failures.
#[derive(Debug)]
pub struct ConnectionOpener {
    factory: TransportFactory,
    state: OpenerState,
}

impl ConnectionOpener {
    pub fn new(connector: Arc<dyn SessionConnector>) -> Self {
        Self::with_factory(TransportFactory::new(connector))
    }

    pub fn with_factory(factory: TransportFactory) -> Self {
        Self {
            factory,
            state: OpenerState::NotAttempted,
        }
    }

    /// Current state of the opener.
    pub fn state(&self) -> OpenerState {
        self.state
    }

    /// Open a session, making at most `1 + connect_retries` attempts.
    ///
    /// # Errors
    ///
    /// - `SparkError::Configuration` if the credentials are incomplete; no
    ///   attempt reaches the network
    /// - `ConnectionError::ConnectFailed` on the first failure that carries
    ///   no server message or is not transient
    /// - the last `SparkError::Transport` once all attempts are used up
    pub async fn open(&mut self, creds: &Credentials) -> Result<Arc<dyn RpcSession>, SparkError> {
        let attempts = creds.connect_retries().saturating_add(1);
        let mut attempt = 1;

        loop {
            self.state = OpenerState::Attempting { attempt };

            let err = match self.factory.open_session(creds).await {
                Ok(session) => {
                    debug!(attempt, "Connection opened");
                    self.state = OpenerState::Open;
                    return Ok(session);
                }
                Err(SparkError::Transport(err)) => err,
                Err(other) => {
                    self.state = OpenerState::Failed;
                    return Err(other);
                }
            };

            let message = match err.message() {
                Some(message) => message.to_string(),
                None => return Err(self.fail(err.to_string())),
            };

            if classify_connect_failure(&message.to_lowercase()) == FailureKind::Fatal {
                return Err(self.fail(err.to_string()));
            }

            if attempt >= attempts {
                self.state = OpenerState::Failed;
                return Err(err.into());
            }

            let sleep_for = creds.connect_timeout();
            warn!(
                "Warning: {}\n\tRetrying in {} seconds ({} of {})",
                message,
                sleep_for.as_secs(),
                attempt,
                creds.connect_retries()
            );

            tokio::time::sleep(sleep_for).await;
            attempt += 1;
        }
    }

    fn fail(&mut self, reason: String) -> SparkError {
        self.state = OpenerState::Failed;
        ConnectionError::ConnectFailed(reason).into()
    }
}
