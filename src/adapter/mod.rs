//! Caller-facing connection management.
//!
//! This module provides the [`ConnectionManager`], which opens and closes
//! connections, dispatches cancellation and runs statements, and the
//! transaction control surface the engine does not support.
//!
//! # Example
//!
//! ```no_run
//! use sparkhive_rs::adapter::ConnectionManager;
//! use sparkhive_rs::connection::{Connection, ConnectionMethod, Credentials};
//! use sparkhive_rs::transport::SessionConnector;
//! use std::sync::Arc;
//!
//! # async fn example(connector: Arc<dyn SessionConnector>) -> Result<(), Box<dyn std::error::Error>> {
//! let creds = Credentials::builder(ConnectionMethod::Http)
//!     .host("myorg.sparkhost.com")
//!     .cluster("01234-23423-coffeetime")
//!     .token("dapi123")
//!     .schema("analytics")
//!     .connect_retries(5)
//!     .build();
//!
//! let manager = ConnectionManager::new(connector);
//! let mut connection = Connection::new(Arc::new(creds)).with_name("model.users");
//!
//! let response = manager
//!     .execute(&mut connection, "select * from analytics.users", true)
//!     .await?;
//! println!("{} rows", response.rows.len());
//!
//! manager.close(&mut connection).await?;
//! # Ok(())
//! # }
//! ```

pub mod manager;
pub mod transaction;

pub use manager::{reshape_error, ConnectionManager, ExecutionResponse, ManagerConfig};
pub use transaction::{TransactionControl, TransactionOp, TransactionOutcome};
