//! Metric queries
//!
//! The per-virtual-type metric tables plus the CloudWatch statistics query.

use crate::aws::Connection;
use crate::component::{Component, MetricDataPoint, MetricName, MetricRequest, VirtualType};
use anyhow::{Context, Result};
use aws_sdk_cloudwatch::primitives::DateTime;
use aws_sdk_cloudwatch::types::{Datapoint, Dimension, Statistic};

/// The metrics supported for a component type. A pure function of the virtual
/// type; internal-only metrics the backend exposes (e.g. iterator age, dead
/// letter errors) are deliberately excluded.
pub fn list_metrics(vtype: VirtualType) -> Vec<MetricName> {
    match vtype {
        VirtualType::Function => vec!["Invocations", "Duration", "Errors", "Throttles"],
        VirtualType::Endpoint => vec!["4XXError", "5XXError", "Count", "Latency"],
        VirtualType::Topic => vec![
            "NumberOfMessagesPublished",
            "PublishSize",
            "NumberOfNotificationsDelivered",
            "NumberOfNotificationsFailed",
        ],
        VirtualType::Timer => vec!["Invocations", "FailedInvocations"],
        VirtualType::Table => vec![
            "ConsumedReadCapacityUnits",
            "ConsumedWriteCapacityUnits",
            "ThrottledRequests",
        ],
    }
}

/// Issue a statistics query for one component and normalize the response.
///
/// Dimension filters come from the component's underlying resource identity.
/// Only Function components are implemented; requesting statistics for any
/// other type is a contract violation and panics rather than silently
/// returning misleading data. Backend errors propagate to the caller.
pub async fn get_metric_statistics(
    connection: &Connection,
    component: &Component,
    request: &MetricRequest,
) -> Result<Vec<MetricDataPoint>> {
    let (namespace, dimensions) = match component.vtype {
        VirtualType::Function => {
            let function_id = component
                .resource("function")
                .and_then(|res| res.output_str("id"))
                .with_context(|| {
                    format!("function component {} has no resolved function id", component.name)
                })?;
            (
                "AWS/Lambda",
                vec![Dimension::builder()
                    .name("FunctionName")
                    .value(function_id)
                    .build()],
            )
        }
        other => panic!("metric statistics are not implemented for {} components", other),
    };

    let resp = connection
        .metrics
        .get_metric_statistics()
        .namespace(namespace)
        .metric_name(request.metric.as_str())
        .set_dimensions(Some(dimensions))
        .start_time(DateTime::from_secs(request.start))
        .end_time(DateTime::from_secs(request.end))
        .period(request.period)
        .statistics(Statistic::Sum)
        .statistics(Statistic::SampleCount)
        .statistics(Statistic::Average)
        .statistics(Statistic::Maximum)
        .statistics(Statistic::Minimum)
        .send()
        .await
        .with_context(|| {
            format!(
                "Failed to get {} statistics for {}",
                request.metric, component.name
            )
        })?;

    let mut points: Vec<MetricDataPoint> = resp.datapoints().iter().map(normalize).collect();
    points.sort_by_key(|point| point.timestamp);
    Ok(points)
}

fn normalize(point: &Datapoint) -> MetricDataPoint {
    MetricDataPoint {
        timestamp: point.timestamp().map(DateTime::secs).unwrap_or_default(),
        unit: point
            .unit()
            .map(|unit| unit.as_str().to_string())
            .unwrap_or_default(),
        sum: point.sum().unwrap_or_default(),
        sample_count: point.sample_count().unwrap_or_default(),
        average: point.average().unwrap_or_default(),
        maximum: point.maximum().unwrap_or_default(),
        minimum: point.minimum().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_metric_set() {
        assert_eq!(
            list_metrics(VirtualType::Function),
            vec!["Invocations", "Duration", "Errors", "Throttles"]
        );
    }

    #[test]
    fn test_endpoint_metric_set() {
        assert_eq!(
            list_metrics(VirtualType::Endpoint),
            vec!["4XXError", "5XXError", "Count", "Latency"]
        );
    }

    #[test]
    fn test_timer_metric_set() {
        assert_eq!(
            list_metrics(VirtualType::Timer),
            vec!["Invocations", "FailedInvocations"]
        );
    }

    #[test]
    fn test_every_type_has_metrics() {
        for vtype in [
            VirtualType::Endpoint,
            VirtualType::Timer,
            VirtualType::Table,
            VirtualType::Topic,
            VirtualType::Function,
        ] {
            assert!(!list_metrics(vtype).is_empty(), "{} has no metrics", vtype);
        }
    }
}
