// Force-directed simulation for the network view.
//
// What this does:
// - Seeds nodes on a phyllotaxis spiral around the center (deterministic)
// - Each step: springs along edges, pairwise repulsion, a pull toward the
//   center, then velocity decay and integration
// - Cools alpha toward its target; once alpha drops below alpha_min the
//   simulation is Settled and steps are no-ops
// - Dragging pins a node (fx/fy) and reheats; releasing unpins it unless the
//   config says to keep it pinned
//
// Time budgets are not handled here: the owning session schedules a budget
// task and calls stop() when it expires.

use serde::{Deserialize, Serialize};

use super::PointF;
use crate::model::{GraphModel, NodeId};

const INITIAL_RADIUS: f32 = 10.0;
/// Alpha a drag or resize reheats to.
pub const REHEAT_ALPHA: f32 = 0.3;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DragRelease {
    #[default]
    Release,
    KeepPinned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForceConfig {
    /// Pairwise repulsion strength.
    pub repulsion: f32,
    pub link_distance: f32,
    pub link_strength: f32,
    pub center_strength: f32,
    /// Fraction of velocity lost per step.
    pub velocity_decay: f32,
    pub alpha_decay: f32,
    pub alpha_min: f32,
    /// Wall-clock budget before the session forces Settled.
    pub settle_budget_ms: f64,
    pub drag_release: DragRelease,
    /// Pointer pick radius in graph units.
    pub node_radius: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            repulsion: 900.0,
            link_distance: 90.0,
            link_strength: 0.3,
            center_strength: 0.05,
            velocity_decay: 0.4,
            // 300 steps from 1.0 to 0.001
            alpha_decay: 1.0 - 0.001f32.powf(1.0 / 300.0),
            alpha_min: 0.001,
            settle_budget_ms: 3000.0,
            drag_release: DragRelease::Release,
            node_radius: 12.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum SimulationPhase {
    Running,
    Settled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimNode {
    pub nid: NodeId,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Pinned position, if any.
    pub fx: Option<f32>,
    pub fy: Option<f32>,
}

impl SimNode {
    pub fn position(&self) -> PointF {
        PointF::new(self.x, self.y)
    }

    pub fn is_pinned(&self) -> bool {
        self.fx.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ForceSimulation {
    pub config: ForceConfig,
    pub nodes: Vec<SimNode>,
    /// (source, target, source bias)
    links: Vec<(usize, usize, f32)>,
    center: PointF,
    alpha: f32,
    alpha_target: f32,
    phase: SimulationPhase,
    dragging: Option<NodeId>,
}

/// Phyllotaxis spiral: the i-th point at radius r*sqrt(0.5 + i).
pub fn initial_position(i: usize, center: PointF) -> PointF {
    let golden = std::f32::consts::PI * (3.0 - 5.0f32.sqrt());
    let r = INITIAL_RADIUS * (0.5 + i as f32).sqrt();
    let a = i as f32 * golden;
    PointF::new(center.x + r * a.cos(), center.y + r * a.sin())
}

impl ForceSimulation {
    pub fn new(model: &GraphModel, config: ForceConfig, width: f32, height: f32) -> Self {
        let center = PointF::new(width / 2.0, height / 2.0);
        let nodes = model
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let p = initial_position(i, center);
                SimNode { nid: n.nid, x: p.x, y: p.y, vx: 0.0, vy: 0.0, fx: None, fy: None }
            })
            .collect();
        let links = model
            .edges
            .iter()
            .map(|e| {
                let ds = model.adjacency.get_degree(e.from) as f32;
                let dt = model.adjacency.get_degree(e.to) as f32;
                (e.from.0, e.to.0, ds / (ds + dt).max(1.0))
            })
            .collect();
        let phase = if model.is_empty() { SimulationPhase::Settled } else { SimulationPhase::Running };
        Self {
            config,
            nodes,
            links,
            center,
            alpha: 1.0,
            alpha_target: 0.0,
            phase,
            dragging: None,
        }
    }

    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == SimulationPhase::Running
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn center(&self) -> PointF {
        self.center
    }

    pub fn dragging(&self) -> Option<NodeId> {
        self.dragging
    }

    /// Settles immediately. Positions stay where they are.
    pub fn stop(&mut self) {
        self.phase = SimulationPhase::Settled;
    }

    pub fn reheat(&mut self, alpha: f32) {
        if self.nodes.is_empty() {
            return;
        }
        self.alpha = self.alpha.max(alpha);
        self.phase = SimulationPhase::Running;
    }

    pub fn set_center(&mut self, width: f32, height: f32) {
        self.center = PointF::new(width / 2.0, height / 2.0);
    }

    /// One simulation step. Returns the phase after the step.
    pub fn step(&mut self) -> SimulationPhase {
        if self.phase == SimulationPhase::Settled {
            return self.phase;
        }
        let cfg = &self.config;
        self.alpha += (self.alpha_target - self.alpha) * cfg.alpha_decay;
        let alpha = self.alpha;

        for &(s, t, bias) in &self.links {
            let (src, tgt) = (&self.nodes[s], &self.nodes[t]);
            let mut dx = tgt.x + tgt.vx - src.x - src.vx;
            let mut dy = tgt.y + tgt.vy - src.y - src.vy;
            if dx == 0.0 && dy == 0.0 {
                dx = jiggle(t);
                dy = jiggle(s);
            }
            let l = (dx * dx + dy * dy).sqrt();
            let k = (l - cfg.link_distance) / l * alpha * cfg.link_strength;
            dx *= k;
            dy *= k;
            self.nodes[t].vx -= dx * bias;
            self.nodes[t].vy -= dy * bias;
            self.nodes[s].vx += dx * (1.0 - bias);
            self.nodes[s].vy += dy * (1.0 - bias);
        }

        let n = self.nodes.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let mut dx = self.nodes[j].x - self.nodes[i].x;
                let mut dy = self.nodes[j].y - self.nodes[i].y;
                if dx == 0.0 && dy == 0.0 {
                    dx = jiggle(j);
                    dy = jiggle(i);
                }
                let l2 = (dx * dx + dy * dy).max(1.0);
                let w = cfg.repulsion * alpha / l2;
                self.nodes[i].vx -= dx * w;
                self.nodes[i].vy -= dy * w;
                self.nodes[j].vx += dx * w;
                self.nodes[j].vy += dy * w;
            }
        }

        let (cx, cy) = (self.center.x, self.center.y);
        for node in &mut self.nodes {
            node.vx += (cx - node.x) * cfg.center_strength * alpha;
            node.vy += (cy - node.y) * cfg.center_strength * alpha;
        }

        let keep = 1.0 - cfg.velocity_decay;
        for node in &mut self.nodes {
            match (node.fx, node.fy) {
                (Some(fx), Some(fy)) => {
                    node.x = fx;
                    node.y = fy;
                    node.vx = 0.0;
                    node.vy = 0.0;
                }
                _ => {
                    node.vx *= keep;
                    node.vy *= keep;
                    node.x += node.vx;
                    node.y += node.vy;
                }
            }
        }

        if self.alpha < cfg.alpha_min && self.dragging.is_none() {
            self.phase = SimulationPhase::Settled;
        }
        self.phase
    }

    pub fn drag_start(&mut self, nid: NodeId) {
        let Some(node) = self.nodes.get_mut(nid.0) else {
            return;
        };
        node.fx = Some(node.x);
        node.fy = Some(node.y);
        self.dragging = Some(nid);
        self.alpha_target = REHEAT_ALPHA;
        self.reheat(REHEAT_ALPHA);
    }

    pub fn drag_move(&mut self, nid: NodeId, to: PointF) {
        if self.dragging != Some(nid) {
            return;
        }
        if let Some(node) = self.nodes.get_mut(nid.0) {
            node.fx = Some(to.x);
            node.fy = Some(to.y);
            node.x = to.x;
            node.y = to.y;
        }
    }

    pub fn drag_end(&mut self, nid: NodeId) {
        if self.dragging != Some(nid) {
            return;
        }
        self.dragging = None;
        self.alpha_target = 0.0;
        if self.config.drag_release == DragRelease::KeepPinned {
            return;
        }
        if let Some(node) = self.nodes.get_mut(nid.0) {
            node.fx = None;
            node.fy = None;
        }
    }

    pub fn positions(&self) -> Vec<PointF> {
        self.nodes.iter().map(SimNode::position).collect()
    }
}

/// Deterministic stand-in for d3's random jiggle on coincident points.
fn jiggle(i: usize) -> f32 {
    1e-3 * ((i % 7) as f32 + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FlowInput, FlowNodeRecord, LinkRecord};

    fn model(n: usize, links: &[(usize, usize)]) -> GraphModel {
        let id = |i: usize| format!("N{i}");
        GraphModel::from_flow(&FlowInput {
            nodes: (0..n)
                .map(|i| FlowNodeRecord {
                    id: id(i),
                    name: id(i),
                    node_type: "System".to_string(),
                    criticality: None,
                })
                .collect(),
            links: links
                .iter()
                .map(|&(s, t)| LinkRecord {
                    source: id(s),
                    target: id(t),
                    pattern: String::new(),
                    frequency: String::new(),
                    role: String::new(),
                    value: None,
                })
                .collect(),
            metadata: Default::default(),
        })
    }

    fn run(sim: &mut ForceSimulation, max_steps: usize) -> usize {
        let mut steps = 0;
        while sim.step() == SimulationPhase::Running && steps < max_steps {
            steps += 1;
        }
        steps
    }

    #[test]
    fn test_initial_positions_are_deterministic() {
        let m = model(5, &[(0, 1)]);
        let a = ForceSimulation::new(&m, ForceConfig::default(), 800.0, 600.0);
        let b = ForceSimulation::new(&m, ForceConfig::default(), 800.0, 600.0);
        assert_eq!(a.positions(), b.positions());
        let first = a.positions()[0];
        assert!((first.distance(&PointF::new(400.0, 300.0)) - 10.0 * 0.5f32.sqrt()).abs() < 1e-3);
    }

    #[test]
    fn test_settles_on_its_own() {
        let m = model(4, &[(0, 1), (1, 2), (2, 3)]);
        let mut sim = ForceSimulation::new(&m, ForceConfig::default(), 800.0, 600.0);
        let steps = run(&mut sim, 2000);
        assert!(steps < 2000);
        assert_eq!(sim.phase(), SimulationPhase::Settled);
        // settled steps are no-ops
        let before = sim.positions();
        sim.step();
        assert_eq!(sim.positions(), before);
    }

    #[test]
    fn test_linked_pair_finds_a_spring_length() {
        let m = model(2, &[(0, 1)]);
        let mut sim = ForceSimulation::new(&m, ForceConfig::default(), 800.0, 600.0);
        run(&mut sim, 2000);
        let p = sim.positions();
        let d = p[0].distance(&p[1]);
        assert!(d > 40.0 && d < 250.0, "distance {d}");
    }

    #[test]
    fn test_drag_pins_and_releases() {
        let m = model(3, &[(0, 1), (1, 2)]);
        let mut sim = ForceSimulation::new(&m, ForceConfig::default(), 800.0, 600.0);
        run(&mut sim, 2000);
        sim.drag_start(NodeId(1));
        assert!(sim.is_running());
        sim.drag_move(NodeId(1), PointF::new(10.0, 20.0));
        for _ in 0..20 {
            sim.step();
        }
        assert_eq!(sim.nodes[1].position(), PointF::new(10.0, 20.0));
        assert!(sim.is_running());
        sim.drag_end(NodeId(1));
        assert!(!sim.nodes[1].is_pinned());
        run(&mut sim, 2000);
        assert_eq!(sim.phase(), SimulationPhase::Settled);
    }

    #[test]
    fn test_keep_pinned_variant() {
        let m = model(2, &[(0, 1)]);
        let cfg = ForceConfig { drag_release: DragRelease::KeepPinned, ..Default::default() };
        let mut sim = ForceSimulation::new(&m, cfg, 800.0, 600.0);
        sim.drag_start(NodeId(0));
        sim.drag_move(NodeId(0), PointF::new(5.0, 5.0));
        sim.drag_end(NodeId(0));
        run(&mut sim, 2000);
        assert_eq!(sim.nodes[0].position(), PointF::new(5.0, 5.0));
    }

    #[test]
    fn test_stop_and_empty() {
        let m = model(3, &[]);
        let mut sim = ForceSimulation::new(&m, ForceConfig::default(), 100.0, 100.0);
        sim.stop();
        assert_eq!(sim.step(), SimulationPhase::Settled);
        let empty = ForceSimulation::new(&GraphModel::default(), ForceConfig::default(), 100.0, 100.0);
        assert_eq!(empty.phase(), SimulationPhase::Settled);
    }
}
