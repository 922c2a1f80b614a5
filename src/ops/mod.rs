//! Operations layer
//!
//! The per-component façade answering operational queries — runtime logs and
//! metric statistics — over the components produced by extraction.
//!
//! # Architecture
//!
//! - [`OperationsProvider`] - binds a connection to one component and
//!   dispatches on its virtual type
//! - [`logs`] - concurrent fan-out log retrieval with merge-and-sort
//! - [`metrics`] - per-type metric tables and the statistics query
//!
//! # Error taxonomy
//!
//! Missing cross-references and unmatched log lines degrade silently; asking
//! for an unimplemented feature (log filters, non-Function metric statistics)
//! panics, since silently ignoring the request would return misleading
//! results; unsupported-but-valid requests (logs for a Table) and backend
//! failures on metric queries come back as errors.

pub mod logs;
pub mod metrics;

use crate::aws::Connection;
use crate::component::{
    Component, Components, LogEntry, LogQuery, MetricDataPoint, MetricName, MetricRequest,
    VirtualType,
};
use anyhow::{bail, Context, Result};

/// Operational interface over one component.
pub struct OperationsProvider<'a> {
    connection: &'a Connection,
    component: &'a Component,
}

impl<'a> OperationsProvider<'a> {
    /// Bind a connection to one component instance.
    pub fn for_component(connection: &'a Connection, component: &'a Component) -> Self {
        Self {
            connection,
            component,
        }
    }

    /// Runtime logs for the component, sorted ascending by timestamp.
    ///
    /// Only Function components carry logs in the current design; any other
    /// type yields an error. Panics if the query carries a time range or
    /// filter — those are not implemented yet.
    pub async fn get_logs(&self, query: &LogQuery) -> Result<Vec<LogEntry>> {
        assert!(
            query.is_default(),
            "log queries with a time range or filter are not implemented"
        );

        match self.component.vtype {
            VirtualType::Function => {
                let id = function_id(self.component)?;
                Ok(logs::fetch_function_logs(self.connection, id).await)
            }
            other => bail!("logs are not supported for {} components", other),
        }
    }

    /// The metrics supported for this component's type.
    pub fn list_metrics(&self) -> Vec<MetricName> {
        metrics::list_metrics(self.component.vtype)
    }

    /// Statistics for one metric over a time range. See [`metrics`] for the
    /// dispatch and failure rules.
    pub async fn get_metric_statistics(
        &self,
        request: &MetricRequest,
    ) -> Result<Vec<MetricDataPoint>> {
        metrics::get_metric_statistics(self.connection, self.component, request).await
    }
}

/// Logs for every Function component in the extraction, fetched concurrently
/// and merged into one timestamp-ordered list. Functions whose underlying id
/// never resolved are skipped as a data-quality condition.
pub async fn get_stack_logs(
    connection: &Connection,
    components: &Components,
    query: &LogQuery,
) -> Result<Vec<LogEntry>> {
    assert!(
        query.is_default(),
        "log queries with a time range or filter are not implemented"
    );

    let function_ids: Vec<String> = components
        .values()
        .filter(|component| component.vtype == VirtualType::Function)
        .filter_map(|component| match function_id(component) {
            Ok(id) => Some(id.to_string()),
            Err(err) => {
                tracing::debug!("skipping function {}: {:#}", component.name, err);
                None
            }
        })
        .collect();

    Ok(logs::fetch_all_logs(connection, &function_ids).await)
}

/// The provider-side id of the compute unit backing a Function component.
fn function_id(component: &Component) -> Result<&str> {
    component
        .resource("function")
        .and_then(|res| res.output_str("id"))
        .with_context(|| {
            format!(
                "function component {} has no resolved function id",
                component.name
            )
        })
}
