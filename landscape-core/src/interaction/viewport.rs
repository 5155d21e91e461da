//! Pan/zoom transform between screen pixels and graph coordinates.
//!
//! `screen = graph * k + (x, y)`.

use serde::{Deserialize, Serialize};

use crate::layout::PointF;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewConfig {
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Wheel delta to zoom exponent (base 2).
    pub wheel_sensitivity: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self { min_zoom: 0.1, max_zoom: 8.0, wheel_sensitivity: 0.002 }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ViewTransform {
    pub x: f32,
    pub y: f32,
    pub k: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, k: 1.0 }
    }
}

impl ViewTransform {
    pub fn screen_to_graph(&self, p: PointF) -> PointF {
        PointF::new((p.x - self.x) / self.k, (p.y - self.y) / self.k)
    }

    pub fn graph_to_screen(&self, p: PointF) -> PointF {
        PointF::new(p.x * self.k + self.x, p.y * self.k + self.y)
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    /// Scales by `factor` keeping the graph point under `anchor` fixed.
    pub fn zoom_at(&mut self, anchor: PointF, factor: f32, cfg: &ViewConfig) {
        let k = (self.k * factor).clamp(cfg.min_zoom, cfg.max_zoom);
        let g = self.screen_to_graph(anchor);
        self.k = k;
        self.x = anchor.x - g.x * k;
        self.y = anchor.y - g.y * k;
    }

    pub fn wheel(&mut self, anchor: PointF, delta_y: f32, cfg: &ViewConfig) {
        let factor = 2f32.powf(-delta_y * cfg.wheel_sensitivity);
        self.zoom_at(anchor, factor, cfg);
    }
}
