//! Intents raised by a diagram for the surrounding application.
//!
//! Sessions queue them; the host drains the queue after each call and
//! dispatches by the `type` tag.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DiagramEvent {
    /// Search recomputed; ids in tree order. Empty when the query was cleared.
    #[serde(rename_all = "camelCase")]
    SearchMatch { matched_ids: Vec<String> },
    /// Navigate to this node's own diagram.
    #[serde(rename_all = "camelCase")]
    NodeActivate { node_id: String },
    #[serde(rename_all = "camelCase")]
    SystemClick { system_code: String },
}

#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    pending: Vec<DiagramEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: DiagramEvent) {
        self.pending.push(event);
    }

    pub fn drain(&mut self) -> Vec<DiagramEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
