//! Component Extraction
//!
//! Turns a deployment snapshot's flat resource list into logical components by
//! pattern-matching raw type tags against a fixed set of synthesis rules.
//!
//! # Architecture
//!
//! - [`index`] - (type, id)-keyed lookup used for cross-reference joins
//! - [`extract_components`] - single-pass extraction over the resource list
//!
//! Extraction is synchronous, deterministic for a fixed input list, and never
//! raises a user-visible error: unresolved cross-references leave role slots
//! unpopulated rather than failing the pass.

pub mod index;

pub use index::ResourceIndex;

use crate::component::{Component, Components, VirtualType};
use crate::snapshot::ResourceRecord;
use serde_json::Value;
use std::collections::BTreeMap;

// Raw resource type tags recognized by the synthesis rules.
pub const STAGE_TYPE: &str = "aws:apigateway/stage:Stage";
pub const DEPLOYMENT_TYPE: &str = "aws:apigateway/deployment:Deployment";
pub const REST_API_TYPE: &str = "aws:apigateway/restApi:RestApi";
pub const EVENT_RULE_TYPE: &str = "aws:cloudwatch/eventRule:EventRule";
pub const TABLE_TYPE: &str = "aws:dynamodb/table:Table";
pub const TOPIC_TYPE: &str = "aws:sns/topic:Topic";
pub const FUNCTION_TYPE: &str = "aws:lambda/function:Function";

// Internal resources that never produce a component. The log collector and
// the unhandled-error topic are wiring owned by the framework itself.
const LOG_COLLECTOR_SUFFIX: &str = "app-log-collector";
const UNHANDLED_ERROR_SUFFIX: &str = "unhandled-error-topic";

/// Extract logical components from a snapshot's resource list.
///
/// Builds the resource index once, then walks the list once, dispatching each
/// record's type tag against the synthesis rules. Records whose type is not
/// recognized produce no component.
pub fn extract_components(resources: &[ResourceRecord]) -> Components {
    let index = ResourceIndex::build(resources);
    let mut components = Components::new();

    for res in resources {
        let component = match res.ty.as_str() {
            STAGE_TYPE => synthesize_endpoint(res, &index),
            EVENT_RULE_TYPE => synthesize_timer(res),
            TABLE_TYPE => synthesize_table(res),
            TOPIC_TYPE => synthesize_topic(res),
            FUNCTION_TYPE => synthesize_function(res),
            _ => None,
        };

        if let Some(component) = component {
            let id = component.id();
            if let Some(previous) = components.insert(id.clone(), component) {
                // Multiple stages can resolve to the same API; the last one
                // processed wins. Surface the overwrite rather than hiding it.
                tracing::warn!(
                    "duplicate component identity {}, replacing earlier {} component",
                    id,
                    previous.vtype
                );
            }
        }
    }

    components
}

/// A stage record triggers Endpoint synthesis: join to its deployment and
/// REST API via the index and compute the invokable base URL. Identity comes
/// from the REST API's name, not the stage's, so multiple stages over one API
/// do not create duplicate endpoints.
fn synthesize_endpoint(stage: &ResourceRecord, index: &ResourceIndex) -> Option<Component> {
    let deployment = stage
        .input_str("deployment")
        .and_then(|id| index.lookup(DEPLOYMENT_TYPE, id));
    let rest_api = stage
        .input_str("restApi")
        .and_then(|id| index.lookup(REST_API_TYPE, id));

    // Degrade on a broken join: fall back to the raw reference so the
    // component still gets a stable identity.
    let name = rest_api
        .and_then(ResourceRecord::name)
        .or_else(|| stage.input_str("restApi"))
        .or_else(|| stage.name())?
        .to_string();

    let mut properties = BTreeMap::new();
    if let (Some(invoke_url), Some(stage_name)) = (
        deployment.and_then(|d| d.output_str("invokeUrl")),
        stage.input_str("stageName"),
    ) {
        properties.insert(
            "url".to_string(),
            Value::String(format!("{}{}/", invoke_url, stage_name)),
        );
    } else {
        tracing::debug!("stage {} has an unresolved deployment, no url derived", stage.id);
    }

    Some(Component {
        vtype: VirtualType::Endpoint,
        name,
        properties,
        resources: BTreeMap::from([
            ("restapi".to_string(), rest_api.cloned()),
            ("deployment".to_string(), deployment.cloned()),
            ("stage".to_string(), Some(stage.clone())),
        ]),
    })
}

/// An event rule triggers Timer synthesis. The backing target and permission
/// resources are not separately tracked in the snapshot, so their role slots
/// stay unpopulated.
fn synthesize_timer(rule: &ResourceRecord) -> Option<Component> {
    let name = named(rule)?;

    let mut properties = BTreeMap::new();
    if let Some(schedule) = rule.input_str("scheduleExpression") {
        properties.insert("schedule".to_string(), Value::String(schedule.to_string()));
    }

    Some(Component {
        vtype: VirtualType::Timer,
        name,
        properties,
        resources: BTreeMap::from([
            ("rule".to_string(), Some(rule.clone())),
            ("target".to_string(), None),
            ("permission".to_string(), None),
        ]),
    })
}

fn synthesize_table(table: &ResourceRecord) -> Option<Component> {
    let name = named(table)?;

    let mut properties = BTreeMap::new();
    if let Some(hash_key) = table.output_str("hashKey") {
        properties.insert("primaryKey".to_string(), Value::String(hash_key.to_string()));
    }

    Some(Component {
        vtype: VirtualType::Table,
        name,
        properties,
        resources: BTreeMap::from([("table".to_string(), Some(table.clone()))]),
    })
}

fn synthesize_topic(topic: &ResourceRecord) -> Option<Component> {
    let name = named(topic)?;
    if name.ends_with(UNHANDLED_ERROR_SUFFIX) {
        return None;
    }

    Some(Component {
        vtype: VirtualType::Topic,
        name,
        properties: BTreeMap::new(),
        resources: BTreeMap::from([("topic".to_string(), Some(topic.clone()))]),
    })
}

/// Function synthesis. The IAM role, role attachment, log group, log
/// subscription, and permission that back a function are not separately
/// tracked, so those role slots stay unpopulated.
fn synthesize_function(function: &ResourceRecord) -> Option<Component> {
    let name = named(function)?;
    if name.ends_with(LOG_COLLECTOR_SUFFIX) {
        return None;
    }

    Some(Component {
        vtype: VirtualType::Function,
        name,
        properties: BTreeMap::new(),
        resources: BTreeMap::from([
            ("function".to_string(), Some(function.clone())),
            ("role".to_string(), None),
            ("roleAttachment".to_string(), None),
            ("logGroup".to_string(), None),
            ("logSubscription".to_string(), None),
            ("permission".to_string(), None),
        ]),
    })
}

/// A record without a name cannot anchor a component identity; treated as a
/// data-quality condition, not a failure.
fn named(res: &ResourceRecord) -> Option<String> {
    let name = res.name().map(str::to_string);
    if name.is_none() {
        tracing::debug!("resource {} ({}) has no urnName, skipping", res.id, res.ty);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(ty: &str, id: &str, name: &str) -> ResourceRecord {
        ResourceRecord {
            ty: ty.to_string(),
            id: id.to_string(),
            inputs: BTreeMap::from([("urnName".to_string(), json!(name))]),
            outputs: BTreeMap::new(),
        }
    }

    fn endpoint_triple() -> Vec<ResourceRecord> {
        let mut stage = record(STAGE_TYPE, "stage-1", "todo-stage");
        stage
            .inputs
            .insert("deployment".to_string(), json!("deploy-1"));
        stage.inputs.insert("restApi".to_string(), json!("api-1"));
        stage.inputs.insert("stageName".to_string(), json!("prod"));

        let mut deployment = record(DEPLOYMENT_TYPE, "deploy-1", "todo-deploy");
        deployment.outputs.insert(
            "invokeUrl".to_string(),
            json!("https://xyz.execute-api.us-east-1.amazonaws.com/"),
        );

        let rest_api = record(REST_API_TYPE, "api-1", "todo");

        vec![stage, deployment, rest_api]
    }

    #[test]
    fn test_stage_triple_produces_one_endpoint() {
        let components = extract_components(&endpoint_triple());
        assert_eq!(components.len(), 1);

        let endpoint = components.values().next().unwrap();
        assert_eq!(endpoint.vtype, VirtualType::Endpoint);
        assert_eq!(endpoint.name, "todo");
        assert_eq!(
            endpoint.property_str("url"),
            Some("https://xyz.execute-api.us-east-1.amazonaws.com/prod/")
        );
        assert!(endpoint.resource("restapi").is_some());
        assert!(endpoint.resource("deployment").is_some());
        assert!(endpoint.resource("stage").is_some());
    }

    #[test]
    fn test_stage_with_missing_deployment_degrades() {
        let mut resources = endpoint_triple();
        resources.retain(|r| r.ty != DEPLOYMENT_TYPE);

        let components = extract_components(&resources);
        let endpoint = components.values().next().unwrap();
        assert_eq!(endpoint.name, "todo");
        assert_eq!(endpoint.property_str("url"), None);
        assert!(endpoint.resources.contains_key("deployment"));
        assert!(endpoint.resource("deployment").is_none());
    }

    #[test]
    fn test_two_stages_one_api_yield_one_endpoint() {
        let mut resources = endpoint_triple();
        let mut second = resources[0].clone();
        second.id = "stage-2".to_string();
        second.inputs.insert("stageName".to_string(), json!("beta"));
        resources.push(second);

        let components = extract_components(&resources);
        assert_eq!(components.len(), 1);
        // Last stage processed wins.
        let endpoint = components.values().next().unwrap();
        assert_eq!(
            endpoint.property_str("url"),
            Some("https://xyz.execute-api.us-east-1.amazonaws.com/beta/")
        );
    }

    #[test]
    fn test_event_rule_produces_timer_with_placeholder_roles() {
        let mut rule = record(EVENT_RULE_TYPE, "rule-1", "heartbeat");
        rule.inputs
            .insert("scheduleExpression".to_string(), json!("rate(5 minutes)"));

        let components = extract_components(&[rule]);
        let timer = components
            .get("cloud:timer:Timer::heartbeat")
            .expect("timer component");
        assert_eq!(timer.property_str("schedule"), Some("rate(5 minutes)"));
        assert_eq!(timer.resources.len(), 3);
        assert!(timer.resource("rule").is_some());
        assert!(timer.resources.contains_key("target"));
        assert!(timer.resource("target").is_none());
        assert!(timer.resources.contains_key("permission"));
        assert!(timer.resource("permission").is_none());
    }

    #[test]
    fn test_table_carries_primary_key() {
        let mut table = record(TABLE_TYPE, "todo-1", "todo");
        table.outputs.insert("hashKey".to_string(), json!("id"));

        let components = extract_components(&[table]);
        let table = components.get("cloud:table:Table::todo").unwrap();
        assert_eq!(table.property_str("primaryKey"), Some("id"));
    }

    #[test]
    fn test_internal_topic_is_skipped() {
        let resources = vec![
            record(TOPIC_TYPE, "arn:1", "countDown"),
            record(TOPIC_TYPE, "arn:2", "todo-unhandled-error-topic"),
        ];

        let components = extract_components(&resources);
        assert_eq!(components.len(), 1);
        assert!(components.contains_key("cloud:topic:Topic::countDown"));
    }

    #[test]
    fn test_log_collector_function_is_skipped() {
        let resources = vec![
            record(FUNCTION_TYPE, "fn-1", "worker"),
            record(FUNCTION_TYPE, "fn-2", "todo-app-log-collector"),
        ];

        let components = extract_components(&resources);
        assert_eq!(components.len(), 1);
        let function = components.get("cloud:function:Function::worker").unwrap();
        assert_eq!(function.resources.len(), 6);
        assert!(function.resource("function").is_some());
        assert!(function.resource("role").is_none());
    }

    #[test]
    fn test_unrecognized_types_are_ignored() {
        let resources = vec![record("aws:s3/bucket:Bucket", "b-1", "media")];
        assert!(extract_components(&resources).is_empty());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let mut resources = endpoint_triple();
        resources.push(record(FUNCTION_TYPE, "fn-1", "worker"));
        resources.push(record(TOPIC_TYPE, "arn:1", "countDown"));

        let first = extract_components(&resources);
        let second = extract_components(&resources);
        assert_eq!(first, second);
    }

    #[test]
    fn test_every_component_has_a_populated_role() {
        let mut resources = endpoint_triple();
        resources.push(record(FUNCTION_TYPE, "fn-1", "worker"));
        resources.push(record(TABLE_TYPE, "todo-1", "todo"));

        for component in extract_components(&resources).values() {
            assert!(
                component.resources.values().any(Option::is_some),
                "{} has no populated role",
                component.id()
            );
        }
    }
}
