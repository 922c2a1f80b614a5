//! Component Model
//!
//! Logical components synthesized from raw deployed resources, plus the query
//! and result types exchanged with the operations layer.

use crate::snapshot::ResourceRecord;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// The fixed classification a component is synthesized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum VirtualType {
    Endpoint,
    Timer,
    Table,
    Topic,
    Function,
}

impl VirtualType {
    /// The virtual type token, used when deriving component identities.
    pub fn token(&self) -> &'static str {
        match self {
            VirtualType::Endpoint => "cloud:endpoint:Endpoint",
            VirtualType::Timer => "cloud:timer:Timer",
            VirtualType::Table => "cloud:table:Table",
            VirtualType::Topic => "cloud:topic:Topic",
            VirtualType::Function => "cloud:function:Function",
        }
    }
}

impl fmt::Display for VirtualType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A synthesized logical entity grouping one or more raw resources.
///
/// `resources` maps logical role names (e.g. "restapi", "deployment") to the
/// underlying records; a role may be present but unpopulated when the backing
/// resource is not separately tracked in the snapshot. Components are created
/// once per extraction pass and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    pub vtype: VirtualType,
    pub name: String,
    pub properties: BTreeMap<String, Value>,
    pub resources: BTreeMap<String, Option<ResourceRecord>>,
}

impl Component {
    /// The synthesized identity: virtual type token plus the real resource's
    /// name, unique across one extraction pass.
    pub fn id(&self) -> String {
        format!("{}::{}", self.vtype.token(), self.name)
    }

    /// String-valued derived property, if present.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// The resource record filling a role, if populated.
    pub fn resource(&self, role: &str) -> Option<&ResourceRecord> {
        self.resources.get(role).and_then(|r| r.as_ref())
    }
}

/// All components extracted from one snapshot, keyed by synthesized identity.
pub type Components = BTreeMap<String, Component>;

/// Human-readable summary of an extracted component set.
pub struct Summary<'a>(pub &'a Components);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let of_type = |vt: VirtualType| self.0.values().filter(move |c| c.vtype == vt);

        writeln!(f, "Functions ({})", of_type(VirtualType::Function).count())?;
        for c in of_type(VirtualType::Function) {
            writeln!(f, "\t{}", c.name)?;
        }
        writeln!(f, "Endpoints ({})", of_type(VirtualType::Endpoint).count())?;
        for c in of_type(VirtualType::Endpoint) {
            writeln!(f, "\t{}: {}", c.name, c.property_str("url").unwrap_or("-"))?;
        }
        writeln!(f, "Timers    ({})", of_type(VirtualType::Timer).count())?;
        for c in of_type(VirtualType::Timer) {
            writeln!(f, "\t{}: {}", c.name, c.property_str("schedule").unwrap_or("-"))?;
        }
        writeln!(f, "Tables    ({})", of_type(VirtualType::Table).count())?;
        for c in of_type(VirtualType::Table) {
            writeln!(f, "\t{}", c.name)?;
        }
        writeln!(f, "Topics    ({})", of_type(VirtualType::Topic).count())?;
        for c in of_type(VirtualType::Topic) {
            writeln!(f, "\t{}", c.name)?;
        }
        Ok(())
    }
}

/// One timestamped unit of runtime output attributed to a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Which compute unit produced the entry.
    pub id: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub message: String,
}

/// A handle to a metric supported by a component type.
pub type MetricName = &'static str;

/// Parameters for a log retrieval. Only the default (unfiltered) query is
/// implemented; requesting a range or filter is a contract violation.
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    /// Epoch milliseconds, inclusive.
    pub start_time: Option<i64>,
    /// Epoch milliseconds, exclusive.
    pub end_time: Option<i64>,
    pub filter: Option<String>,
}

impl LogQuery {
    pub fn is_default(&self) -> bool {
        self.start_time.is_none() && self.end_time.is_none() && self.filter.is_none()
    }
}

/// Parameters for a metric statistics query.
#[derive(Debug, Clone)]
pub struct MetricRequest {
    pub metric: String,
    /// Epoch seconds, inclusive.
    pub start: i64,
    /// Epoch seconds, exclusive.
    pub end: i64,
    /// Aggregation period in seconds.
    pub period: i32,
}

/// One normalized datapoint from a metric statistics response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDataPoint {
    /// Epoch seconds.
    pub timestamp: i64,
    pub unit: String,
    pub sum: f64,
    pub sample_count: f64,
    pub average: f64,
    pub maximum: f64,
    pub minimum: f64,
}
