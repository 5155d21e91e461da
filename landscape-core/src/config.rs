//! Engine configuration.
//!
//! Every field has a default; the host may pass a partial JSON object and
//! only override what it needs, e.g. `{"gesture": {"clickDurationMs": 200}}`.

use serde::{Deserialize, Serialize};

use crate::interaction::{GesturePolicy, ViewConfig};
use crate::layout::flow::FlowConfig;
use crate::layout::force::ForceConfig;
use crate::layout::tree_layout::TreeLayoutConfig;
use crate::model::InputError;
use crate::tree::DEFAULT_EXPANDED_DEPTH;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiagramConfig {
    /// Viewport size in px.
    pub width: f32,
    pub height: f32,
    /// Nodes deeper than this start collapsed.
    pub expanded_depth: usize,
    /// Duration the host uses to animate tree transitions.
    pub transition_ms: f64,
    pub tree: TreeLayoutConfig,
    pub flow: FlowConfig,
    pub force: ForceConfig,
    pub gesture: GesturePolicy,
    pub view: ViewConfig,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 600.0,
            expanded_depth: DEFAULT_EXPANDED_DEPTH,
            transition_ms: 750.0,
            tree: TreeLayoutConfig::default(),
            flow: FlowConfig::default(),
            force: ForceConfig::default(),
            gesture: GesturePolicy::default(),
            view: ViewConfig::default(),
        }
    }
}

impl DiagramConfig {
    /// Blank input means defaults.
    pub fn from_json(input: &str) -> Result<Self, InputError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(input)?)
    }
}
