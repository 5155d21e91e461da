//! Paint instructions for the host renderer.
//!
//! These structs are serialized to JSON and handed to the JavaScript side,
//! which draws them. Field names are camelCase on the wire.

use serde::Serialize;

use crate::interaction::{Highlight, ViewTransform};
use crate::layout::PointF;
use crate::layout::tree_layout::TreeExit;
use crate::model::InputError;

/// Decoding failure, positioned for an editor marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub message: String,
    pub line: usize,       // 1-based line number
    pub column: usize,     // 1-based column number
    pub end_line: usize,   // same as line: decode errors are single-point
    pub end_column: usize, // 1-based end column
}

impl From<&InputError> for ErrorInfo {
    fn from(e: &InputError) -> Self {
        Self {
            message: e.msg.clone(),
            line: e.line,
            column: e.column,
            end_line: e.line,
            end_column: e.column + 1, // highlight at least one character
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNodeOutput {
    pub id: String,
    pub name: String,
    pub level: String,
    pub depth: usize,
    pub x: f32,
    pub y: f32,
    /// Where the transition starts.
    pub x0: f32,
    pub y0: f32,
    pub collapsed: bool,
    pub has_children: bool,
    pub color: &'static str,
    pub highlight: Highlight,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeLinkOutput {
    pub source: String,
    pub target: String,
    pub from: PointF,
    pub to: PointF,
    pub highlight: Highlight,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeOutput {
    pub epoch: u64,
    pub transform: ViewTransform,
    pub nodes: Vec<TreeNodeOutput>,
    pub links: Vec<TreeLinkOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exits: Vec<TreeExit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowNodeOutput {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub column: usize,
    pub x0: f32,
    pub x1: f32,
    pub y0: f32,
    pub y1: f32,
    pub value: f64,
    pub total_flow: f64,
    pub color: &'static str,
    pub pinned: bool,
    pub middleware: bool,
    pub highlight: Highlight,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowLinkOutput {
    /// Stable index for hover callbacks.
    pub index: usize,
    pub source: String,
    pub target: String,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub width: f32,
    pub value: f64,
    pub pattern: String,
    pub frequency: String,
    pub role: String,
    pub color: &'static str,
    pub middleware: bool,
    pub highlight: Highlight,
    /// Present in the bordered variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<LinkBorder>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkBorder {
    pub width: f32,
    pub highlight: Highlight,
}

/// Tooltip content for a hovered flow node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDetail {
    pub id: String,
    pub name: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criticality: Option<String>,
    pub total_flow: f64,
    pub incoming: usize,
    pub outgoing: usize,
    /// Ids of directly linked nodes, in edge order, deduplicated.
    pub partners: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowMeta {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowOutput {
    pub epoch: u64,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<FlowNodeOutput>,
    /// In draw order.
    pub links: Vec<FlowLinkOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<NodeDetail>,
    pub metadata: FlowMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkNodeOutput {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub color: &'static str,
    /// The system under review.
    pub pinned: bool,
    /// Held in place by a drag.
    pub fixed: bool,
    pub highlight: Highlight,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkLinkOutput {
    pub source: String,
    pub target: String,
    pub from: PointF,
    pub to: PointF,
    pub color: &'static str,
    pub highlight: Highlight,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkOutput {
    pub epoch: u64,
    pub running: bool,
    pub transform: ViewTransform,
    pub nodes: Vec<NetworkNodeOutput>,
    pub links: Vec<NetworkLinkOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}
