//! AWS backend module
//!
//! Read-only access to the CloudWatch log and metric backends that answer
//! operational queries. Credentials and region come from the standard AWS
//! environment (profile, env vars, instance metadata); this subsystem issues
//! queries only and performs no provisioning.
//!
//! # Module Structure
//!
//! - [`connection`] - Shared handle bundling the log and metric clients
//!
//! # Example
//!
//! ```ignore
//! use crate::aws::connection::Connection;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let conn = Connection::new().await;
//!     let groups = conn.logs.describe_log_groups().send().await?;
//!     Ok(())
//! }
//! ```

pub mod connection;

pub use connection::Connection;
