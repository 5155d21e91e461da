// General network diagram session (force-directed).
//
// What this does:
// - Builds the model from the flow document and starts a ForceSimulation
// - Advances the simulation one step per host tick and settles it when the
//   wall-clock budget (a SimulationBudget task) runs out
// - Picks nodes under the pointer with a HitGrid; dragging a node pins it
//   and reheats the simulation, dragging the background pans, the wheel
//   zooms around the pointer
// - A click on a node navigates unless it is the system under review
//
// Pointer positions are screen px; the ViewTransform maps them into
// simulation space.

use log::{debug, warn};

use super::events::{DiagramEvent, EventQueue};
use super::schedule::{Scheduler, TaskKind, TickOutcome};
use crate::config::DiagramConfig;
use crate::interaction::{GestureController, GestureEvent, Highlight, HitGrid, ViewTransform};
use crate::layout::PointF;
use crate::layout::flow::FlowContext;
use crate::layout::force::{ForceSimulation, REHEAT_ALPHA};
use crate::model::{GraphModel, InputError, NodeId, palette, parse_flow};
use crate::output::{ErrorInfo, NetworkLinkOutput, NetworkNodeOutput, NetworkOutput};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NetworkTarget {
    Node(NodeId),
    Background,
}

pub struct NetworkSession {
    config: DiagramConfig,
    model: GraphModel,
    ctx: FlowContext,
    sim: ForceSimulation,
    transform: ViewTransform,
    gestures: GestureController<NetworkTarget>,
    hovered: Option<NodeId>,
    scheduler: Scheduler,
    events: EventQueue,
    error: Option<InputError>,
}

impl NetworkSession {
    pub fn new(config: DiagramConfig) -> Self {
        let model = GraphModel::default();
        let sim = ForceSimulation::new(&model, config.force.clone(), config.width, config.height);
        let gestures = GestureController::new(config.gesture.clone());
        Self {
            config,
            model,
            ctx: FlowContext::default(),
            sim,
            transform: ViewTransform::default(),
            gestures,
            hovered: None,
            scheduler: Scheduler::default(),
            events: EventQueue::default(),
            error: None,
        }
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn simulation(&self) -> &ForceSimulation {
        &self.sim
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn epoch(&self) -> u64 {
        self.scheduler.epoch()
    }

    /// Replaces the graph and restarts the simulation with a fresh budget.
    pub fn set_data(&mut self, json: &str, now_ms: f64) {
        self.scheduler.bump_epoch();
        let input = match parse_flow(json) {
            Ok(input) => {
                self.error = None;
                input
            }
            Err(e) => {
                warn!("network: {e}");
                self.error = Some(e);
                Default::default()
            }
        };
        self.model = GraphModel::from_flow(&input);
        let pinned = Some(input.metadata.code.as_str()).filter(|c| !c.is_empty());
        self.ctx = FlowContext::resolve(&self.model, pinned, &input.metadata.integration_middleware);
        self.sim = ForceSimulation::new(
            &self.model,
            self.config.force.clone(),
            self.config.width,
            self.config.height,
        );
        self.hovered = None;
        self.gestures.cancel();
        self.events.clear();
        self.arm_budget(now_ms);
    }

    fn arm_budget(&mut self, now_ms: f64) {
        if self.sim.is_running() {
            self.scheduler
                .schedule(TaskKind::SimulationBudget, now_ms + self.config.force.settle_budget_ms);
        }
    }

    /// One animation frame. Stale epochs are ignored.
    pub fn tick(&mut self, now_ms: f64, epoch: u64) -> TickOutcome {
        if !self.scheduler.is_live(epoch) {
            return TickOutcome::Cancelled;
        }
        for task in self.scheduler.poll(now_ms) {
            if task != TaskKind::SimulationBudget {
                continue;
            }
            if self.sim.dragging().is_some() {
                // Never freeze a node under the cursor.
                self.arm_budget(now_ms);
            } else {
                debug!("network: settle budget spent at alpha {:.4}", self.sim.alpha());
                self.sim.stop();
            }
        }
        if self.sim.is_running() {
            self.sim.step();
        }
        if self.sim.is_running() {
            TickOutcome::Continue
        } else {
            self.scheduler.cancel(TaskKind::SimulationBudget);
            TickOutcome::Settled
        }
    }

    /// Stops the simulation where it is.
    pub fn stop(&mut self) {
        self.sim.stop();
        self.scheduler.cancel(TaskKind::SimulationBudget);
    }

    pub fn resize(&mut self, width: f32, height: f32, now_ms: f64) {
        self.config.width = width.max(0.0);
        self.config.height = height.max(0.0);
        self.sim.set_center(self.config.width, self.config.height);
        self.sim.reheat(REHEAT_ALPHA);
        self.arm_budget(now_ms);
    }

    pub fn hover(&mut self, id: Option<&str>) {
        self.hovered = id.and_then(|id| self.model.lookup(id));
    }

    fn pick(&self, screen: PointF) -> Option<NodeId> {
        let g = self.transform.screen_to_graph(screen);
        let grid = HitGrid::from_points(&self.sim.positions(), self.config.force.node_radius);
        grid.pick(g).map(|i| self.sim.nodes[i].nid)
    }

    pub fn pointer_down(&mut self, pos: PointF, now_ms: f64) {
        let target = match self.pick(pos) {
            Some(nid) => NetworkTarget::Node(nid),
            None => NetworkTarget::Background,
        };
        self.gestures.pointer_down(target, pos, now_ms);
    }

    pub fn pointer_move(&mut self, pos: PointF, now_ms: f64) {
        let Some(GestureEvent::Drag { target, from, to, first }) = self.gestures.pointer_move(pos)
        else {
            return;
        };
        match target {
            NetworkTarget::Node(nid) => {
                if first {
                    self.sim.drag_start(nid);
                }
                self.sim.drag_move(nid, self.transform.screen_to_graph(to));
                self.arm_budget(now_ms);
            }
            NetworkTarget::Background => self.transform.pan(to.x - from.x, to.y - from.y),
        }
    }

    pub fn pointer_up(&mut self, pos: PointF, now_ms: f64) {
        match self.gestures.pointer_up(pos, now_ms) {
            Some(GestureEvent::Click { target: NetworkTarget::Node(nid), .. }) => {
                if !self.ctx.is_pinned(nid) {
                    let node_id = self.model.nodes[nid.0].id.clone();
                    self.events.push(DiagramEvent::NodeActivate { node_id });
                }
            }
            Some(GestureEvent::DragEnd { target: NetworkTarget::Node(nid), .. }) => {
                self.sim.drag_end(nid);
            }
            _ => {}
        }
    }

    /// Pointer left the surface mid-gesture.
    pub fn pointer_cancel(&mut self) {
        if let Some(NetworkTarget::Node(nid)) = self.gestures.cancel() {
            self.sim.drag_end(nid);
        }
    }

    pub fn wheel(&mut self, pos: PointF, delta_y: f32) {
        self.transform.wheel(pos, delta_y, &self.config.view);
    }

    pub fn drain_events(&mut self) -> Vec<DiagramEvent> {
        self.events.drain()
    }

    /// Tears down: the simulation stops and pending ticks become stale.
    pub fn dispose(&mut self) {
        self.scheduler.bump_epoch();
        self.model = GraphModel::default();
        self.ctx = FlowContext::default();
        self.sim = ForceSimulation::new(
            &self.model,
            self.config.force.clone(),
            self.config.width,
            self.config.height,
        );
        self.hovered = None;
        self.gestures.cancel();
        self.events.clear();
        self.error = None;
    }

    fn node_highlight(&self, nid: NodeId) -> Highlight {
        match self.hovered {
            Some(h) => Highlight::classify(h == nid, false, self.model.adjacency.are_adjacent(h, nid)),
            None => Highlight::None,
        }
    }

    pub fn render(&self) -> NetworkOutput {
        let nodes = self
            .sim
            .nodes
            .iter()
            .map(|sn| {
                let node = &self.model.nodes[sn.nid.0];
                let pinned = self.ctx.is_pinned(sn.nid);
                NetworkNodeOutput {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    kind: node.kind.clone(),
                    x: sn.x,
                    y: sn.y,
                    color: if pinned {
                        palette::PINNED_COLOR
                    } else {
                        palette::criticality_color(node.criticality.as_ref())
                    },
                    pinned,
                    fixed: sn.is_pinned(),
                    highlight: self.node_highlight(sn.nid),
                }
            })
            .collect();

        let links = self
            .model
            .edges
            .iter()
            .map(|e| {
                let touches = self.hovered.is_some_and(|h| e.from == h || e.to == h);
                NetworkLinkOutput {
                    source: self.model.nodes[e.from.0].id.clone(),
                    target: self.model.nodes[e.to.0].id.clone(),
                    from: self.sim.nodes[e.from.0].position(),
                    to: self.sim.nodes[e.to.0].position(),
                    color: palette::pattern_color(&e.pattern),
                    highlight: if touches { Highlight::OnPath } else { Highlight::None },
                }
            })
            .collect();

        NetworkOutput {
            epoch: self.scheduler.epoch(),
            running: self.sim.is_running(),
            transform: self.transform,
            nodes,
            links,
            error: self.error.as_ref().map(ErrorInfo::from),
        }
    }

    pub fn render_json(&self) -> String {
        serde_json::to_string(&self.render()).unwrap_or_else(|e| {
            warn!("network: render failed: {e}");
            "{}".to_string()
        })
    }
}

impl Default for NetworkSession {
    fn default() -> Self {
        Self::new(DiagramConfig::default())
    }
}
