//! Connection credentials, authentication and establishment.
//!
//! This module provides credential parsing and validation, token
//! authentication for the HTTP tunnel, the retrying connection opener, and the
//! connection record the manager operates on.
//!
//! # Example
//!
//! ```no_run
//! # use sparkhive_rs::connection::{ConnectionMethod, ConnectionOpener, Credentials};
//! # use sparkhive_rs::transport::SessionConnector;
//! # use std::sync::Arc;
//! # async fn example(connector: Arc<dyn SessionConnector>) -> Result<(), Box<dyn std::error::Error>> {
//! // Using the builder
//! let creds = Credentials::builder(ConnectionMethod::Thrift)
//!     .host("localhost")
//!     .port(10001)
//!     .user("dbt")
//!     .schema("analytics")
//!     .connect_retries(3)
//!     .build();
//!
//! // Or deserialize from configuration
//! let creds: Credentials = serde_json::from_str(
//!     r#"{"method": "thrift", "host": "localhost", "port": 10001, "user": "dbt", "schema": "analytics"}"#,
//! )?;
//!
//! let mut opener = ConnectionOpener::new(connector);
//! let session = opener.open(&creds).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod opener;
pub mod params;
pub mod session;

pub use auth::SecretToken;
pub use opener::{classify_connect_failure, ConnectionOpener, FailureKind, OpenerState};
pub use params::{ConnectionMethod, CredentialField, Credentials, CredentialsBuilder};
pub use session::{Connection, ConnectionState};
