//! Query execution.
//!
//! The query module is organized into:
//! - `statement` - statement text and binding normalization
//! - `executor` - the submit, poll and resolve loop over one cursor
//!
//! # Example
//!
//! ```no_run
//! use sparkhive_rs::query::{Parameter, QueryExecutor};
//! use sparkhive_rs::transport::RpcSession;
//! use std::sync::Arc;
//!
//! # async fn example(session: Arc<dyn RpcSession>) -> Result<(), Box<dyn std::error::Error>> {
//! let executor = QueryExecutor::new(session);
//!
//! executor.cursor().await?;
//! executor
//!     .execute("select * from users where age > ?;", &[Parameter::from(18i64)])
//!     .await?;
//!
//! for row in executor.fetch_all().await? {
//!     println!("{:?}", row);
//! }
//! # Ok(())
//! # }
//! ```

pub mod executor;
pub mod statement;

// Re-export commonly used types
pub use executor::{poll_until_terminal, resolve_poll_status, ExecutorConfig, QueryExecutor};
pub use statement::{normalize_bindings, prepare_statement, Decimal, Parameter};
