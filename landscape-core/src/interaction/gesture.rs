// Pointer gesture disambiguation: click vs. drag.
//
// A press starts on some target. Moving beyond `click_distance` turns it
// into a drag; the move events from then on are reported as drag steps.
// Releasing without having dragged is a click, unless the time variant is
// on and the press lasted `click_duration_ms` or longer.
//
// Timestamps are whatever the host passes in (ms); nothing here reads a
// clock, so every threshold is testable with plain numbers.

use serde::{Deserialize, Serialize};

use crate::layout::PointF;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GesturePolicy {
    /// Max pointer travel (px) for a click.
    pub click_distance: f32,
    /// Max press duration for a click; None disables the time check.
    pub click_duration_ms: Option<f64>,
}

impl Default for GesturePolicy {
    fn default() -> Self {
        Self { click_distance: 5.0, click_duration_ms: None }
    }
}

impl GesturePolicy {
    pub fn time_based() -> Self {
        Self { click_distance: 5.0, click_duration_ms: Some(200.0) }
    }

    pub fn classify(&self, displacement: f32, elapsed_ms: f64) -> GestureKind {
        let near = displacement < self.click_distance;
        let quick = self.click_duration_ms.is_none_or(|limit| elapsed_ms < limit);
        if near && quick { GestureKind::Click } else { GestureKind::Drag }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum GestureKind {
    Click,
    Drag,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent<T> {
    /// Pointer moved while dragging. `first` is set on the move that crossed
    /// the click radius; `from` is then the press position.
    Drag { target: T, from: PointF, to: PointF, first: bool },
    Click { target: T, at: PointF },
    DragEnd { target: T, at: PointF },
}

#[derive(Debug, Clone)]
struct Press<T> {
    target: T,
    start: PointF,
    last: PointF,
    started_at: f64,
    dragging: bool,
}

#[derive(Debug, Clone)]
pub struct GestureController<T> {
    pub policy: GesturePolicy,
    press: Option<Press<T>>,
}

impl<T: Clone> GestureController<T> {
    pub fn new(policy: GesturePolicy) -> Self {
        Self { policy, press: None }
    }

    pub fn is_pressed(&self) -> bool {
        self.press.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.press.as_ref().is_some_and(|p| p.dragging)
    }

    pub fn target(&self) -> Option<&T> {
        self.press.as_ref().map(|p| &p.target)
    }

    /// Starts a press; an unfinished one is dropped.
    pub fn pointer_down(&mut self, target: T, pos: PointF, t: f64) {
        self.press = Some(Press { target, start: pos, last: pos, started_at: t, dragging: false });
    }

    pub fn pointer_move(&mut self, pos: PointF) -> Option<GestureEvent<T>> {
        let press = self.press.as_mut()?;
        let first = !press.dragging;
        if first && press.start.distance(&pos) < self.policy.click_distance {
            return None;
        }
        press.dragging = true;
        let from = if first { press.start } else { press.last };
        press.last = pos;
        Some(GestureEvent::Drag { target: press.target.clone(), from, to: pos, first })
    }

    pub fn pointer_up(&mut self, pos: PointF, t: f64) -> Option<GestureEvent<T>> {
        let press = self.press.take()?;
        if press.dragging {
            return Some(GestureEvent::DragEnd { target: press.target, at: pos });
        }
        match self.policy.classify(press.start.distance(&pos), t - press.started_at) {
            GestureKind::Click => Some(GestureEvent::Click { target: press.target, at: pos }),
            GestureKind::Drag => Some(GestureEvent::DragEnd { target: press.target, at: pos }),
        }
    }

    /// Abandons the press (pointer left the surface). Returns the target if a
    /// drag was in progress, so the caller can release it.
    pub fn cancel(&mut self) -> Option<T> {
        self.press.take().filter(|p| p.dragging).map(|p| p.target)
    }
}

impl<T: Clone> Default for GestureController<T> {
    fn default() -> Self {
        Self::new(GesturePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> PointF {
        PointF::new(x, y)
    }

    #[test]
    fn test_small_movement_is_click() {
        let mut g = GestureController::default();
        g.pointer_down("n1", p(0.0, 0.0), 0.0);
        assert_eq!(g.pointer_move(p(2.0, 2.0)), None);
        assert_eq!(
            g.pointer_up(p(3.0, 0.0), 1000.0),
            Some(GestureEvent::Click { target: "n1", at: p(3.0, 0.0) })
        );
        assert!(!g.is_pressed());
    }

    #[test]
    fn test_crossing_the_radius_starts_a_drag() {
        let mut g = GestureController::default();
        g.pointer_down(7u32, p(10.0, 10.0), 0.0);
        let first = g.pointer_move(p(16.0, 10.0));
        assert_eq!(
            first,
            Some(GestureEvent::Drag { target: 7, from: p(10.0, 10.0), to: p(16.0, 10.0), first: true })
        );
        // back inside the radius is still a drag
        let second = g.pointer_move(p(11.0, 10.0));
        assert_eq!(
            second,
            Some(GestureEvent::Drag { target: 7, from: p(16.0, 10.0), to: p(11.0, 10.0), first: false })
        );
        assert_eq!(g.pointer_up(p(11.0, 10.0), 50.0), Some(GestureEvent::DragEnd { target: 7, at: p(11.0, 10.0) }));
    }

    #[test]
    fn test_exactly_at_threshold_is_drag() {
        let policy = GesturePolicy::default();
        assert_eq!(policy.classify(4.99, 0.0), GestureKind::Click);
        assert_eq!(policy.classify(5.0, 0.0), GestureKind::Drag);
    }

    #[test]
    fn test_time_variant() {
        let policy = GesturePolicy::time_based();
        assert_eq!(policy.classify(0.0, 150.0), GestureKind::Click);
        assert_eq!(policy.classify(0.0, 250.0), GestureKind::Drag);
        assert_eq!(policy.classify(8.0, 10.0), GestureKind::Drag);

        let mut g = GestureController::new(policy);
        g.pointer_down("n", p(0.0, 0.0), 1000.0);
        assert!(matches!(g.pointer_up(p(0.0, 0.0), 1300.0), Some(GestureEvent::DragEnd { .. })));
    }

    #[test]
    fn test_cancel_and_stray_events() {
        let mut g: GestureController<&str> = GestureController::default();
        assert_eq!(g.pointer_move(p(50.0, 50.0)), None);
        assert_eq!(g.pointer_up(p(50.0, 50.0), 0.0), None);
        g.pointer_down("a", p(0.0, 0.0), 0.0);
        assert_eq!(g.cancel(), None);
        g.pointer_down("a", p(0.0, 0.0), 0.0);
        g.pointer_move(p(20.0, 0.0));
        assert!(g.is_dragging());
        assert_eq!(g.cancel(), Some("a"));
        assert!(!g.is_pressed());
    }
}
