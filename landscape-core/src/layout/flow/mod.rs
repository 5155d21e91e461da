// Flow ("sankey") layout for integration diagrams.
//
// What this does:
// - Assigns columns by type layer, then orders each column with the priority comparator
//   (middleware first, grouped by base key, pinned-adjacent last)
// - Sizes and stacks nodes, relaxes them, routes link bands
// - Fixes the edge draw order: direct links under middleware links
// - Supports dragging a node vertically, which re-routes its bands
//
// Submodules:
// - ordering: comparator and edge draw order
// - sankey: columns and geometry

use serde::{Deserialize, Serialize};

use super::{PointF, RectF};
use crate::model::{EdgeId, GraphModel, NodeId};

pub mod ordering;
pub mod sankey;

pub use ordering::{FlowContext, TieBreak, edge_draw_order, order_column};
pub use sankey::{LinkExtent, NodeExtent};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnStrategy {
    /// One column per node type, types ranked by the links between them.
    /// Falls back to `Justify` when the types do not form layers: a single
    /// type, a link inside one type, or a cycle between types.
    #[default]
    ByType,
    /// Longest path from the sources; sinks pushed to the last column.
    Justify,
    /// Longest path from the sources.
    Left,
    /// Column = position of the node type in this list; unknown types last.
    TypeLayer(Vec<String>),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowVariant {
    #[default]
    Plain,
    /// Every link gets a wider border companion drawn under it.
    Bordered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlowConfig {
    pub node_width: f32,
    pub node_padding: f32,
    /// Height of nodes whose flow rounds to nothing.
    pub node_min_height: f32,
    /// Relaxation rounds.
    pub iterations: usize,
    pub columns: ColumnStrategy,
    pub tie_break: TieBreak,
    pub variant: FlowVariant,
    /// Extra stroke of the border companion, per side.
    pub border_px: f32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            node_width: 24.0,
            node_padding: 12.0,
            node_min_height: 4.0,
            iterations: 6,
            columns: ColumnStrategy::default(),
            tie_break: TieBreak::default(),
            variant: FlowVariant::default(),
            border_px: 2.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowLayout {
    /// Indexed by NodeId.
    pub nodes: Vec<NodeExtent>,
    /// Indexed by EdgeId.
    pub links: Vec<LinkExtent>,
    /// Per column, in priority order.
    pub columns: Vec<Vec<NodeId>>,
    pub draw_order: Vec<EdgeId>,
    /// Pixels per unit of flow.
    pub ky: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct FlowLayoutEngine {
    pub config: FlowConfig,
    width: f32,
    height: f32,
}

impl Default for FlowLayoutEngine {
    fn default() -> Self {
        Self::new(FlowConfig::default(), 960.0, 600.0)
    }
}

impl FlowLayoutEngine {
    pub fn new(config: FlowConfig, width: f32, height: f32) -> Self {
        Self { config, width: width.max(0.0), height: height.max(0.0) }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn layout(&self, model: &GraphModel, ctx: &FlowContext) -> FlowLayout {
        if model.is_empty() {
            return FlowLayout { height: self.height, ..Default::default() };
        }
        let cfg = &self.config;

        let assigned = sankey::assign_columns(model, &cfg.columns);
        let count = assigned.iter().max().map_or(0, |m| m + 1);
        let mut columns: Vec<Vec<NodeId>> = vec![Vec::new(); count];
        for node in &model.nodes {
            columns[assigned[node.nid.0]].push(node.nid);
        }
        for column in &mut columns {
            order_column(model, ctx, column, cfg.tie_break);
        }

        let geo = sankey::Geometry {
            width: self.width,
            height: self.height,
            node_width: cfg.node_width,
            node_padding: cfg.node_padding,
            node_min_height: cfg.node_min_height,
            iterations: cfg.iterations,
        };
        let (nodes, links, ky) = sankey::compute_geometry(model, &columns, &geo);

        FlowLayout {
            nodes,
            links,
            columns,
            draw_order: edge_draw_order(model, ctx),
            ky,
            height: self.height,
        }
    }
}

impl FlowLayout {
    pub fn node_rect(&self, nid: NodeId) -> RectF {
        let n = &self.nodes[nid.0];
        RectF { x: n.x0, y: n.y0, w: n.x1 - n.x0, h: n.y1 - n.y0 }
    }

    /// Topmost node under a point (last column wins on shared edges).
    pub fn node_at(&self, p: PointF) -> Option<NodeId> {
        self.nodes
            .iter()
            .rev()
            .find(|n| self.node_rect(n.nid).contains(p))
            .map(|n| n.nid)
    }

    /// Moves a node vertically, clamped to the extent, and re-routes links.
    pub fn move_node(&mut self, model: &GraphModel, nid: NodeId, dy: f32) {
        let Some(ext) = self.nodes.get_mut(nid.0) else {
            return;
        };
        let h = ext.y1 - ext.y0;
        let y0 = (ext.y0 + dy).clamp(0.0, (self.height - h).max(0.0));
        ext.y0 = y0;
        ext.y1 = y0 + h;
        sankey::route_links(model, &self.nodes, &mut self.links);
    }

    pub fn column_of(&self, nid: NodeId) -> Option<usize> {
        self.nodes.get(nid.0).map(|n| n.column)
    }
}
