//! Per-node/per-link emphasis handed to the painter.

use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Highlight {
    #[default]
    None,
    OnPath,
    Matched,
    Hovered,
}

impl Highlight {
    /// Strongest of the applicable classes; hover beats search.
    pub fn classify(hovered: bool, matched: bool, on_path: bool) -> Self {
        if hovered {
            Self::Hovered
        } else if matched {
            Self::Matched
        } else if on_path {
            Self::OnPath
        } else {
            Self::None
        }
    }

    pub fn is_emphasized(self) -> bool {
        self != Self::None
    }
}
