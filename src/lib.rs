//! # sparkhive-rs
//!
//! Connection and query management for Spark Thrift servers.
//!
//! The server only exposes asynchronous, poll-based execution over a Thrift
//! session, either directly or tunnelled through HTTPS. This library turns
//! that into an awaitable, retryable and cancellable query interface. The
//! Thrift codec is supplied by the host through the
//! [`SessionConnector`](transport::SessionConnector) trait.
//!
//! ## Example
//!
//! ```no_run
//! # use sparkhive_rs::*;
//! # use std::sync::Arc;
//! # async fn example(connector: Arc<dyn SessionConnector>) -> Result<(), Box<dyn std::error::Error>> {
//! // Deserialize credentials from a profile
//! let creds: Credentials = serde_json::from_str(
//!     r#"{
//!         "method": "http",
//!         "host": "myorg.sparkhost.com",
//!         "cluster": "01234-23423-coffeetime",
//!         "organization": "0123456789",
//!         "token": "dapi123",
//!         "schema": "analytics",
//!         "connect_retries": 5,
//!         "connect_timeout": 60
//!     }"#,
//! )?;
//!
//! let manager = ConnectionManager::new(connector);
//! let mut connection = Connection::new(Arc::new(creds));
//!
//! // Opens the connection on first use, retrying while the cluster starts
//! let response = manager.execute(&mut connection, "select 1", true).await?;
//! println!("{:?}", response.rows);
//!
//! manager.close(&mut connection).await?;
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod adapter;
pub mod connection;
pub mod error;
pub mod logging;
pub mod query;
pub mod transport;

#[cfg(test)]
mod test_support;

// Re-export public API
pub use adapter::{ConnectionManager, ExecutionResponse, TransactionControl, TransactionOutcome};
pub use connection::{Connection, ConnectionMethod, Credentials};
pub use error::{
    ConfigurationError, ConnectionError, QueryError, RpcStatus, SparkError, TransportError,
};
pub use query::{Parameter, QueryExecutor};
pub use transport::{RpcCursor, RpcSession, SessionConnector};
