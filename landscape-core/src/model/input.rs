//
// Input contracts: the flat JSON records handed over by the data-fetching
// collaborator.
//
// What this does:
// - Decodes the hierarchy array and the flow/network document with serde
// - Keeps wire names (camelCase) at the edge; everything past this file uses
//   Rust naming
// - Reports undecodable input as an InputError with a 1-based position
//
// Nothing here validates business rules. Dangling ids, duplicates and unknown
// categorical values are absorbed later by the graph model.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of the capability hierarchy.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// "L1", "L2", "L3", "System", "Root" or anything else.
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub system_code: Option<String>,
    #[serde(default)]
    pub system_count: Option<u32>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FlowNodeRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub criticality: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LinkRecord {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub role: String,
    /// Flow magnitude; absent means 1.
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowMetadata {
    /// Code of the system under review (the pinned node).
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default)]
    pub integration_middleware: Vec<String>,
    #[serde(default)]
    pub generated_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FlowInput {
    #[serde(default)]
    pub nodes: Vec<FlowNodeRecord>,
    #[serde(default)]
    pub links: Vec<LinkRecord>,
    #[serde(default)]
    pub metadata: FlowMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputError {
    pub msg: String,
    pub line: usize,   // 1-based
    pub column: usize, // 1-based
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Input error at {}:{}: {}", self.line, self.column, self.msg)
    }
}
impl std::error::Error for InputError {}

impl From<serde_json::Error> for InputError {
    fn from(e: serde_json::Error) -> Self {
        Self {
            msg: e.to_string(),
            line: e.line().max(1),
            column: e.column().max(1),
        }
    }
}

pub fn parse_hierarchy(input: &str) -> Result<Vec<HierarchyRecord>, InputError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(input)?)
}

pub fn parse_flow(input: &str) -> Result<FlowInput, InputError> {
    if input.trim().is_empty() {
        return Ok(FlowInput::default());
    }
    Ok(serde_json::from_str(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hierarchy_camel_case() {
        let json = r#"[
            {"id": "L1A", "name": "Sales", "level": "L1", "parentId": null},
            {"id": "S1", "name": "CRM", "level": "System", "parentId": "L1A",
             "systemCode": "CRM-01", "systemCount": 3, "metadata": {"owner": "ops"}}
        ]"#;
        let records = parse_hierarchy(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].parent_id, None);
        assert_eq!(records[1].parent_id.as_deref(), Some("L1A"));
        assert_eq!(records[1].system_code.as_deref(), Some("CRM-01"));
        assert_eq!(records[1].system_count, Some(3));
        assert!(records[1].metadata.as_ref().unwrap().contains_key("owner"));
    }

    #[test]
    fn test_parse_flow_defaults() {
        let json = r#"{
            "nodes": [{"id": "A", "name": "Alpha", "type": "System", "criticality": "Major"}],
            "links": [{"source": "A", "target": "B", "pattern": "API"}],
            "metadata": {"code": "A", "integrationMiddleware": ["ESB-1"]}
        }"#;
        let flow = parse_flow(json).unwrap();
        assert_eq!(flow.nodes[0].node_type, "System");
        assert_eq!(flow.links[0].value, None);
        assert_eq!(flow.links[0].role, "");
        assert_eq!(flow.metadata.code, "A");
        assert_eq!(flow.metadata.integration_middleware, vec!["ESB-1".to_string()]);
    }

    #[test]
    fn test_empty_input_is_empty_not_error() {
        assert!(parse_hierarchy("").unwrap().is_empty());
        assert!(parse_flow("  ").unwrap().nodes.is_empty());
    }

    #[test]
    fn test_malformed_input_reports_position() {
        let err = parse_hierarchy("[\n  {\"id\": }\n]").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.column >= 1);
        assert!(err.to_string().starts_with("Input error at 2:"));
    }
}
