//! Transport construction for each connection method.

use crate::connection::auth::{basic_token_auth, AUTHORIZATION_HEADER};
use crate::connection::params::{ConnectionMethod, Credentials};
use crate::error::{ConfigurationError, SparkError};
use crate::transport::http::{cluster_url, HttpTransport};
use crate::transport::protocol::{ConnectTarget, RpcSession, SessionConnector};
use std::sync::Arc;
use tracing::debug;

/// Builds authenticated sessions from validated credentials.
///
/// A factory makes exactly one connection attempt per call; retrying is the
/// connection opener's job.
#[derive(Clone)]
pub struct TransportFactory {
    connector: Arc<dyn SessionConnector>,
}

impl TransportFactory {
    pub fn new(connector: Arc<dyn SessionConnector>) -> Self {
        Self { connector }
    }

    /// Validate the credentials and describe the session to open.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a field required by the method is
    /// missing or the tunnel URL is invalid. Nothing touches the network.
    pub fn build_target(creds: &Credentials) -> Result<ConnectTarget, ConfigurationError> {
        creds.validate_for_method()?;

        let missing = |field: &'static str| ConfigurationError::MissingField {
            field,
            method: creds.method(),
        };
        let host = creds.host().ok_or_else(|| missing("host"))?;

        match creds.method() {
            ConnectionMethod::Http => {
                let cluster = creds.cluster().ok_or_else(|| missing("cluster"))?;
                let token = creds.token().ok_or_else(|| missing("token"))?;

                let url = cluster_url(host, creds.port(), creds.organization(), cluster);
                debug!(url = %url, "connection url");

                let mut transport = HttpTransport::new(&url)?;
                transport.set_custom_headers([(AUTHORIZATION_HEADER, basic_token_auth(token))]);
                Ok(ConnectTarget::Http(transport))
            }
            ConnectionMethod::Thrift => {
                let username = creds.user().ok_or_else(|| missing("user"))?;
                Ok(ConnectTarget::Direct {
                    host: host.to_string(),
                    port: creds.port(),
                    username: username.to_string(),
                })
            }
        }
    }

    /// Open one session for the credentials.
    ///
    /// # Errors
    ///
    /// Returns `SparkError::Configuration` before any network action if the
    /// credentials are incomplete, or `SparkError::Transport` if the
    /// connector fails.
    pub async fn open_session(&self, creds: &Credentials) -> Result<Arc<dyn RpcSession>, SparkError> {
        let target = Self::build_target(creds)?;
        Ok(self.connector.connect(&target).await?)
    }
}

impl std::fmt::Debug for TransportFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportFactory").finish_non_exhaustive()
    }
}
