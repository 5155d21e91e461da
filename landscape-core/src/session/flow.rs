// Integration flow ("sankey") diagram session.
//
// What this does:
// - Decodes the flow document, resolves the pinned system and the
//   middleware ids, runs the flow layout
// - Tracks hover (node or link) and turns it into highlight classes plus a
//   tooltip payload
// - Routes pointer sequences through a GestureController: a click on a node
//   navigates (except on the pinned node), a drag moves the node vertically
// - Queues nodeActivate events for the host

use log::{debug, warn};

use super::events::{DiagramEvent, EventQueue};
use super::schedule::{Scheduler, TickOutcome};
use crate::config::DiagramConfig;
use crate::interaction::{GestureController, GestureEvent, Highlight};
use crate::layout::PointF;
use crate::layout::flow::{FlowContext, FlowLayout, FlowLayoutEngine, FlowVariant};
use crate::model::{
    Criticality, EdgeId, FlowMetadata, GraphModel, InputError, NodeId, palette, parse_flow,
};
use crate::output::{
    ErrorInfo, FlowLinkOutput, FlowMeta, FlowNodeOutput, FlowOutput, LinkBorder, NodeDetail,
};

/// What a press landed on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FlowTarget {
    Node(NodeId),
    Background,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FlowHover {
    Node(NodeId),
    Link(EdgeId),
}

pub struct FlowSession {
    config: DiagramConfig,
    model: GraphModel,
    meta: FlowMetadata,
    ctx: FlowContext,
    engine: FlowLayoutEngine,
    layout: FlowLayout,
    gestures: GestureController<FlowTarget>,
    hovered: Option<FlowHover>,
    scheduler: Scheduler,
    events: EventQueue,
    error: Option<InputError>,
}

impl FlowSession {
    pub fn new(config: DiagramConfig) -> Self {
        let engine = FlowLayoutEngine::new(config.flow.clone(), config.width, config.height);
        let gestures = GestureController::new(config.gesture.clone());
        let layout = engine.layout(&GraphModel::default(), &FlowContext::default());
        Self {
            config,
            model: GraphModel::default(),
            meta: FlowMetadata::default(),
            ctx: FlowContext::default(),
            engine,
            layout,
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

    pub fn layout(&self) -> &FlowLayout {
        &self.layout
    }

    pub fn context(&self) -> &FlowContext {
        &self.ctx
    }

    pub fn epoch(&self) -> u64 {
        self.scheduler.epoch()
    }

    pub fn set_data(&mut self, json: &str) {
        self.scheduler.bump_epoch();
        let input = match parse_flow(json) {
            Ok(input) => {
                self.error = None;
                input
            }
            Err(e) => {
                warn!("flow: {e}");
                self.error = Some(e);
                Default::default()
            }
        };
        self.model = GraphModel::from_flow(&input);
        let pinned = Some(input.metadata.code.as_str()).filter(|c| !c.is_empty());
        self.ctx = FlowContext::resolve(&self.model, pinned, &input.metadata.integration_middleware);
        if pinned.is_some() && self.ctx.pinned.is_none() {
            debug!("flow: pinned system {:?} is not in the diagram", input.metadata.code);
        }
        self.meta = input.metadata;
        self.hovered = None;
        self.gestures.cancel();
        self.events.clear();
        self.relayout();
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.engine.resize(width, height);
        self.relayout();
    }

    fn relayout(&mut self) {
        self.layout = self.engine.layout(&self.model, &self.ctx);
        debug!(
            "flow: {} columns, {} links, ky {:.3}",
            self.layout.columns.len(),
            self.layout.links.len(),
            self.layout.ky
        );
    }

    /// Hover a node by id; None or an unknown id clears the hover.
    pub fn hover_node(&mut self, id: Option<&str>) {
        self.hovered = id.and_then(|id| self.model.lookup(id)).map(FlowHover::Node);
    }

    /// Hover a link by its index in the input.
    pub fn hover_link(&mut self, index: Option<usize>) {
        self.hovered = index
            .filter(|&i| i < self.model.edges.len())
            .map(|i| FlowHover::Link(EdgeId(i)));
    }

    /// Navigation intent for a node, ignored for the pinned node.
    pub fn click(&mut self, id: &str) {
        if let Some(nid) = self.model.lookup(id) {
            self.activate(nid);
        }
    }

    fn activate(&mut self, nid: NodeId) {
        if self.ctx.is_pinned(nid) {
            return;
        }
        let node_id = self.model.nodes[nid.0].id.clone();
        self.events.push(DiagramEvent::NodeActivate { node_id });
    }

    pub fn pointer_down(&mut self, pos: PointF, now_ms: f64) {
        let target = match self.layout.node_at(pos) {
            Some(nid) => FlowTarget::Node(nid),
            None => FlowTarget::Background,
        };
        self.gestures.pointer_down(target, pos, now_ms);
    }

    pub fn pointer_move(&mut self, pos: PointF) {
        if let Some(GestureEvent::Drag { target: FlowTarget::Node(nid), from, to, .. }) =
            self.gestures.pointer_move(pos)
        {
            self.layout.move_node(&self.model, nid, to.y - from.y);
        }
    }

    pub fn pointer_up(&mut self, pos: PointF, now_ms: f64) {
        if let Some(GestureEvent::Click { target: FlowTarget::Node(nid), .. }) =
            self.gestures.pointer_up(pos, now_ms)
        {
            self.activate(nid);
        }
    }

    pub fn pointer_cancel(&mut self) {
        self.gestures.cancel();
    }

    /// Flow layouts are static; a live tick has nothing to advance.
    pub fn tick(&mut self, now_ms: f64, epoch: u64) -> TickOutcome {
        if !self.scheduler.is_live(epoch) {
            return TickOutcome::Cancelled;
        }
        self.scheduler.poll(now_ms);
        TickOutcome::Settled
    }

    pub fn drain_events(&mut self) -> Vec<DiagramEvent> {
        self.events.drain()
    }

    pub fn dispose(&mut self) {
        self.scheduler.bump_epoch();
        self.model = GraphModel::default();
        self.meta = FlowMetadata::default();
        self.ctx = FlowContext::default();
        self.hovered = None;
        self.gestures.cancel();
        self.events.clear();
        self.error = None;
        self.relayout();
    }

    pub fn node_highlight(&self, nid: NodeId) -> Highlight {
        match self.hovered {
            Some(FlowHover::Node(h)) => Highlight::classify(h == nid, false, false),
            Some(FlowHover::Link(e)) => {
                let edge = &self.model.edges[e.0];
                Highlight::classify(false, false, edge.from == nid || edge.to == nid)
            }
            None => Highlight::None,
        }
    }

    pub fn link_highlight(&self, eid: EdgeId) -> Highlight {
        match self.hovered {
            Some(FlowHover::Link(h)) => Highlight::classify(h == eid, false, false),
            Some(FlowHover::Node(n)) => {
                let edge = &self.model.edges[eid.0];
                Highlight::classify(false, false, edge.from == n || edge.to == n)
            }
            None => Highlight::None,
        }
    }

    /// Tooltip payload for the hovered node.
    pub fn detail(&self) -> Option<NodeDetail> {
        let Some(FlowHover::Node(nid)) = self.hovered else {
            return None;
        };
        let node = &self.model.nodes[nid.0];
        let mut partners: Vec<String> = Vec::new();
        let (mut incoming, mut outgoing) = (0, 0);
        for edge in self.model.incident_edges(nid) {
            if edge.to == nid {
                incoming += 1;
            } else {
                outgoing += 1;
            }
            let other = &self.model.nodes[edge.other(nid).0].id;
            if !partners.contains(other) {
                partners.push(other.clone());
            }
        }
        Some(NodeDetail {
            id: node.id.clone(),
            name: node.name.clone(),
            kind: node.kind.clone(),
            criticality: node.criticality.as_ref().map(criticality_label),
            total_flow: self.layout.nodes.get(nid.0).map_or(0.0, |n| n.total_flow),
            incoming,
            outgoing,
            partners,
        })
    }

    fn node_color(&self, nid: NodeId) -> &'static str {
        if self.ctx.is_pinned(nid) {
            palette::PINNED_COLOR
        } else if self.ctx.is_middleware(nid) {
            palette::MIDDLEWARE_COLOR
        } else {
            palette::criticality_color(self.model.nodes[nid.0].criticality.as_ref())
        }
    }

    pub fn render(&self) -> FlowOutput {
        let nodes = self
            .layout
            .nodes
            .iter()
            .map(|ext| {
                let node = &self.model.nodes[ext.nid.0];
                FlowNodeOutput {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    kind: node.kind.clone(),
                    column: ext.column,
                    x0: ext.x0,
                    x1: ext.x1,
                    y0: ext.y0,
                    y1: ext.y1,
                    value: ext.value,
                    total_flow: ext.total_flow,
                    color: self.node_color(ext.nid),
                    pinned: self.ctx.is_pinned(ext.nid),
                    middleware: self.ctx.is_middleware(ext.nid),
                    highlight: self.node_highlight(ext.nid),
                }
            })
            .collect();

        let bordered = self.config.flow.variant == FlowVariant::Bordered;
        let links = self
            .layout
            .draw_order
            .iter()
            .map(|&eid| {
                let edge = &self.model.edges[eid.0];
                let band = &self.layout.links[eid.0];
                let highlight = self.link_highlight(eid);
                FlowLinkOutput {
                    index: eid.0,
                    source: self.model.nodes[edge.from.0].id.clone(),
                    target: self.model.nodes[edge.to.0].id.clone(),
                    x0: self.layout.nodes[edge.from.0].x1,
                    y0: band.y0,
                    x1: self.layout.nodes[edge.to.0].x0,
                    y1: band.y1,
                    width: band.width,
                    value: band.value,
                    pattern: edge.pattern_label.clone(),
                    frequency: edge.frequency.clone(),
                    role: edge.role.clone(),
                    color: palette::pattern_color(&edge.pattern),
                    middleware: self.ctx.is_middleware_edge(&self.model, eid),
                    highlight,
                    border: bordered.then(|| LinkBorder {
                        width: band.width + 2.0 * self.config.flow.border_px,
                        highlight,
                    }),
                }
            })
            .collect();

        let (width, height) = self.engine.size();
        FlowOutput {
            epoch: self.scheduler.epoch(),
            width,
            height,
            nodes,
            links,
            detail: self.detail(),
            metadata: FlowMeta {
                code: self.meta.code.clone(),
                review: self.meta.review.clone(),
                generated_date: self.meta.generated_date.clone(),
            },
            error: self.error.as_ref().map(ErrorInfo::from),
        }
    }

    pub fn render_json(&self) -> String {
        serde_json::to_string(&self.render()).unwrap_or_else(|e| {
            warn!("flow: render failed: {e}");
            "{}".to_string()
        })
    }
}

impl Default for FlowSession {
    fn default() -> Self {
        Self::new(DiagramConfig::default())
    }
}

fn criticality_label(c: &Criticality) -> String {
    match c {
        Criticality::Major => "Major".to_string(),
        Criticality::Standard(tier) if tier.is_empty() => "Standard".to_string(),
        Criticality::Standard(tier) => format!("Standard-{tier}"),
        Criticality::Unknown(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"{
        "nodes": [
            {"id": "A", "name": "Alpha", "type": "System", "criticality": "Major"},
            {"id": "S2", "name": "Second", "type": "System", "criticality": "Standard-2"},
            {"id": "M-P", "name": "Bus", "type": "Middleware"},
            {"id": "S1", "name": "First", "type": "System", "criticality": "Bogus"}
        ],
        "links": [
            {"source": "A", "target": "M-P", "pattern": "API", "frequency": "Daily", "role": "Producer"},
            {"source": "M-P", "target": "S1", "pattern": "Batch", "frequency": "Hourly", "role": "Consumer"},
            {"source": "A", "target": "S2", "pattern": "File", "frequency": "Weekly", "role": "Producer", "value": 3}
        ],
        "metadata": {"code": "A", "review": "R-1", "integrationMiddleware": ["M-P"]}
    }"#;

    fn session() -> FlowSession {
        let mut s = FlowSession::default();
        s.set_data(EXAMPLE);
        s
    }

    fn center_of(s: &FlowSession, id: &str) -> PointF {
        let nid = s.model().lookup(id).unwrap();
        s.layout().node_rect(nid).center()
    }

    #[test]
    fn test_render_nodes_and_draw_order() {
        let out = session().render();
        assert_eq!(out.nodes.len(), 4);
        let a = out.nodes.iter().find(|n| n.id == "A").unwrap();
        assert!(a.pinned);
        assert_eq!(a.color, palette::PINNED_COLOR);
        let mp = out.nodes.iter().find(|n| n.id == "M-P").unwrap();
        assert!(mp.middleware);
        assert_eq!(mp.color, palette::MIDDLEWARE_COLOR);
        let s1 = out.nodes.iter().find(|n| n.id == "S1").unwrap();
        assert_eq!(s1.color, palette::NEUTRAL_COLOR);

        let order: Vec<usize> = out.links.iter().map(|l| l.index).collect();
        assert_eq!(order, vec![2, 0, 1]);
        assert!(!out.links[0].middleware);
        assert_eq!(out.links[0].value, 3.0);
        assert!(out.links.iter().all(|l| l.border.is_none()));
        assert_eq!(out.metadata.review.as_deref(), Some("R-1"));
    }

    #[test]
    fn test_hover_node_marks_incident_links() {
        let mut s = session();
        s.hover_node(Some("A"));
        let out = s.render();
        let hl = |i: usize| out.links.iter().find(|l| l.index == i).unwrap().highlight;
        assert_eq!(hl(0), Highlight::OnPath);
        assert_eq!(hl(1), Highlight::None);
        assert_eq!(hl(2), Highlight::OnPath);
        assert_eq!(out.nodes.iter().find(|n| n.id == "A").unwrap().highlight, Highlight::Hovered);

        let detail = out.detail.unwrap();
        assert_eq!((detail.incoming, detail.outgoing), (0, 2));
        assert_eq!(detail.partners, vec!["M-P".to_string(), "S2".to_string()]);
        assert_eq!(detail.criticality.as_deref(), Some("Major"));
        assert_eq!(detail.total_flow, 4.0);

        s.hover_node(None);
        assert!(s.render().detail.is_none());
    }

    #[test]
    fn test_hover_link_bordered() {
        let mut cfg = DiagramConfig::default();
        cfg.flow.variant = FlowVariant::Bordered;
        let mut s = FlowSession::new(cfg);
        s.set_data(EXAMPLE);
        s.hover_link(Some(1));
        let out = s.render();
        let link = out.links.iter().find(|l| l.index == 1).unwrap();
        assert_eq!(link.highlight, Highlight::Hovered);
        let border = link.border.as_ref().unwrap();
        assert_eq!(border.highlight, Highlight::Hovered);
        assert_eq!(border.width, link.width + 4.0);
        let other = out.links.iter().find(|l| l.index == 0).unwrap();
        assert_eq!(other.border.as_ref().unwrap().highlight, Highlight::None);
        assert_eq!(out.nodes.iter().find(|n| n.id == "S1").unwrap().highlight, Highlight::OnPath);

        s.hover_link(Some(99));
        assert!(s.render().links.iter().all(|l| l.highlight == Highlight::None));
    }

    #[test]
    fn test_click_navigates_except_pinned() {
        let mut s = session();
        let p = center_of(&s, "S1");
        s.pointer_down(p, 0.0);
        s.pointer_up(p, 50.0);
        assert_eq!(s.drain_events(), vec![DiagramEvent::NodeActivate { node_id: "S1".to_string() }]);

        let p = center_of(&s, "A");
        s.pointer_down(p, 0.0);
        s.pointer_up(p, 50.0);
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_drag_moves_node_without_navigating() {
        let mut s = session();
        let nid = s.model().lookup("S1").unwrap();
        let before = s.layout().node_rect(nid);
        let p = center_of(&s, "S1");
        s.pointer_down(p, 0.0);
        s.pointer_move(PointF::new(p.x, p.y + 30.0));
        s.pointer_up(PointF::new(p.x, p.y + 30.0), 400.0);
        let after = s.layout().node_rect(nid);
        let expected = (before.y + 30.0).min(600.0 - before.h);
        assert!((after.y - expected).abs() < 1e-3);
        assert!((after.h - before.h).abs() < 1e-3);
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_bad_json_and_stale_tick() {
        let mut s = session();
        let epoch = s.epoch();
        s.set_data("{\"nodes\": [}");
        let out = s.render();
        assert!(out.nodes.is_empty());
        assert!(out.error.is_some());
        assert_eq!(s.tick(0.0, epoch), TickOutcome::Cancelled);
        assert_eq!(s.tick(0.0, s.epoch()), TickOutcome::Settled);
    }

    #[test]
    fn test_criticality_label() {
        assert_eq!(criticality_label(&Criticality::parse("Standard-High")), "Standard-High");
        assert_eq!(criticality_label(&Criticality::parse("standard")), "Standard");
    }
}
