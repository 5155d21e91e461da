// layout
//
// Layout engines for the three diagram kinds.
//
// Goals:
// - Deterministic: same input, same positions (the force engine takes host
//   timestamps for its time budget, never wall clocks of its own)
// - Total: every engine accepts empty or malformed-but-parsed input
// - Stateless per call except for the small amount of memory an engine keeps
//   to report previous positions (tree) or velocities (force)
//
// Submodules:
// - tree_layout: horizontal tidy tree over the visible tree
// - flow: column assignment, priority ordering and sankey geometry
// - force: force-directed simulation for the network graph

use serde::{Deserialize, Serialize};

pub mod flow;
pub mod force;
pub mod tree_layout;

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub const ZERO: PointF = PointF { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &PointF) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl RectF {
    pub fn right(&self) -> f32 { self.x + self.w }
    pub fn bottom(&self) -> f32 { self.y + self.h }

    pub fn contains(&self, p: PointF) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn center(&self) -> PointF {
        PointF { x: self.x + self.w / 2.0, y: self.y + self.h / 2.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_edges() {
        let r = RectF { x: 10.0, y: 10.0, w: 20.0, h: 5.0 };
        assert!(r.contains(PointF::new(10.0, 15.0)));
        assert!(r.contains(PointF::new(30.0, 10.0)));
        assert!(!r.contains(PointF::new(30.1, 12.0)));
        assert_eq!(r.center(), PointF::new(20.0, 12.5));
    }

    #[test]
    fn test_distance() {
        assert_eq!(PointF::new(0.0, 0.0).distance(&PointF::new(3.0, 4.0)), 5.0);
    }
}
