//! stackops - component extraction and operations over deployed AWS stacks
//!
//! Takes a deployment snapshot's flat resource list, groups raw resources into
//! logical components (Endpoint, Timer, Table, Topic, Function), and answers
//! operational queries over them: CloudWatch logs with concurrent fan-out
//! retrieval, and CloudWatch metric statistics.
//!
//! Data flows one direction: resource list → [`extract::ResourceIndex`] →
//! [`extract::extract_components`] → [`component::Components`]; components
//! plus an [`aws::Connection`] feed [`ops::OperationsProvider`].

pub mod aws;
pub mod component;
pub mod config;
pub mod extract;
pub mod ops;
pub mod snapshot;

pub use component::{Component, Components, LogEntry, LogQuery, MetricRequest, VirtualType};
pub use extract::extract_components;
pub use snapshot::{ResourceRecord, Snapshot};
