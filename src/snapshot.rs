//! Deployment Snapshot
//!
//! Types for the deployment snapshot consumed by component extraction: a flat
//! list of raw resource records as captured by the IaC engine after a deploy.
//! The record shape (type tag, id, input/output property maps) is an upstream
//! contract and is not redesigned here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// A raw deployed-infrastructure record.
///
/// `inputs` holds the properties as specified at deploy time, `outputs` the
/// properties as resolved after provisioning. Records are immutable once
/// captured; this subsystem only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Hierarchical type tag, e.g. `aws:lambda/function:Function`.
    #[serde(rename = "type")]
    pub ty: String,
    /// Stable provider-assigned identifier.
    pub id: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, Value>,
    #[serde(default)]
    pub outputs: BTreeMap<String, Value>,
}

impl ResourceRecord {
    /// The record's display name, carried in the `urnName` input property.
    pub fn name(&self) -> Option<&str> {
        self.input_str("urnName")
    }

    /// String-valued input property, if present.
    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.inputs.get(key).and_then(Value::as_str)
    }

    /// String-valued output property, if present.
    pub fn output_str(&self, key: &str) -> Option<&str> {
        self.outputs.get(key).and_then(Value::as_str)
    }
}

/// A deployment snapshot: the stack name plus its flat resource list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub stack: String,
    #[serde(default)]
    pub resources: Vec<ResourceRecord>,
}

impl Snapshot {
    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot JSON {}", path.display()))
    }
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

    #[test]
    fn test_name_reads_urn_name_input() {
        let rec = record("aws:sns/topic:Topic", "arn:1", "countDown");
        assert_eq!(rec.name(), Some("countDown"));
    }

    #[test]
    fn test_name_missing_is_none() {
        let rec = ResourceRecord {
            ty: "aws:sns/topic:Topic".to_string(),
            id: "arn:1".to_string(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
        };
        assert_eq!(rec.name(), None);
    }

    #[test]
    fn test_load_reads_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(
            &path,
            r#"{"stack": "todo", "resources": [{"type": "aws:sns/topic:Topic", "id": "arn:1"}]}"#,
        )
        .unwrap();

        let snap = Snapshot::load(&path).unwrap();
        assert_eq!(snap.stack, "todo");
        assert_eq!(snap.resources.len(), 1);
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Snapshot::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read snapshot file"));
    }

    #[test]
    fn test_snapshot_deserializes_with_missing_fields() {
        let snap: Snapshot = serde_json::from_value(json!({
            "resources": [
                {"type": "aws:dynamodb/table:Table", "id": "todo-1"}
            ]
        }))
        .unwrap();
        assert_eq!(snap.stack, "");
        assert_eq!(snap.resources.len(), 1);
        assert!(snap.resources[0].inputs.is_empty());
    }
}
