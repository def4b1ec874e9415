//! Transport layer for Spark Thrift sessions.
//!
//! This module provides the session capability abstraction and the pieces
//! needed to reach a server through either connection method. The wire
//! protocol itself is supplied by the host through [`SessionConnector`].
//!
//! # Architecture
//!
//! The transport layer is organized into:
//! - `protocol` - Session, cursor and connector traits plus poll types
//! - `http` - HTTP tunnel endpoint with custom headers
//! - `factory` - Builds the connect target for a credential method
//!
//! # Example
//!
//! ```no_run
//! use sparkhive_rs::connection::{ConnectionMethod, Credentials};
//! use sparkhive_rs::transport::{SessionConnector, TransportFactory};
//! use std::sync::Arc;
//!
//! # async fn example(connector: Arc<dyn SessionConnector>) -> Result<(), Box<dyn std::error::Error>> {
//! let creds = Credentials::builder(ConnectionMethod::Http)
//!     .host("myorg.sparkhost.com")
//!     .cluster("01234-23423-coffeetime")
//!     .organization("0123456789")
//!     .token("dapi123")
//!     .schema("analytics")
//!     .build();
//!
//! let factory = TransportFactory::new(connector);
//! let session = factory.open_session(&creds).await?;
//! let cursor = session.cursor().await?;
//! # Ok(())
//! # }
//! ```

pub mod factory;
pub mod http;
pub mod protocol;

// Re-export commonly used types
pub use factory::TransportFactory;
pub use http::HttpTransport;
pub use protocol::{
    ColumnDescription, ConnectTarget, OperationState, PollStatus, Row, RpcCursor, RpcSession,
    SessionConnector,
};
