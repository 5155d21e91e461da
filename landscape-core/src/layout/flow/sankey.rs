// Sankey geometry: columns, node extents, link breadths.
//
// What this does:
// - Assigns columns (by inferred type layer, longest path, justified, or
//   by an explicit type list)
// - Sizes nodes by flow value and stacks each column in priority order
// - Relaxes node positions toward their neighbors while keeping the column
//   order intact (collisions push, never swap)
// - Stacks link breadths on each node side by the opposite end's position
//
// Cycles are tolerated: depth propagation gives up after n rounds.

use std::collections::BTreeSet;

use log::{debug, warn};

use super::ColumnStrategy;
use crate::model::{EdgeId, GraphModel, NodeId};

/// Column index per node (dense, starting at 0).
pub fn assign_columns(model: &GraphModel, strategy: &ColumnStrategy) -> Vec<usize> {
    let raw = match strategy {
        ColumnStrategy::TypeLayer(layers) => model
            .nodes
            .iter()
            .map(|node| layers.iter().position(|l| *l == node.kind).unwrap_or(layers.len()))
            .collect(),
        ColumnStrategy::ByType => infer_type_layers(model).unwrap_or_else(|| {
            debug!("flow layout: node types do not form layers, justifying");
            justified_depths(model)
        }),
        ColumnStrategy::Left => longest_path_depths(model).0,
        ColumnStrategy::Justify => justified_depths(model),
    };
    compact(raw)
}

fn justified_depths(model: &GraphModel) -> Vec<usize> {
    let (depths, levels) = longest_path_depths(model);
    let mut has_outgoing = vec![false; model.nodes.len()];
    for e in &model.edges {
        has_outgoing[e.from.0] = true;
    }
    depths
        .iter()
        .enumerate()
        .map(|(i, &d)| if has_outgoing[i] { d } else { levels.saturating_sub(1) })
        .collect()
}

/// Layer per node from a longest-path ranking of the type graph. None when
/// there is one type, a link joins two nodes of one type, or types cycle.
fn infer_type_layers(model: &GraphModel) -> Option<Vec<usize>> {
    let mut kinds: Vec<&str> = Vec::new();
    let type_of: Vec<usize> = model
        .nodes
        .iter()
        .map(|node| match kinds.iter().position(|k| *k == node.kind) {
            Some(t) => t,
            None => {
                kinds.push(&node.kind);
                kinds.len() - 1
            }
        })
        .collect();
    let k = kinds.len();
    if k < 2 {
        return None;
    }

    let mut outgoing: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); k];
    let mut indegree = vec![0usize; k];
    for e in &model.edges {
        let (a, b) = (type_of[e.from.0], type_of[e.to.0]);
        if a == b {
            return None;
        }
        if outgoing[a].insert(b) {
            indegree[b] += 1;
        }
    }

    let mut rank = vec![0usize; k];
    let mut ready: Vec<usize> = (0..k).filter(|&t| indegree[t] == 0).collect();
    let mut ranked = 0;
    while let Some(t) = ready.pop() {
        ranked += 1;
        for &u in &outgoing[t] {
            rank[u] = rank[u].max(rank[t] + 1);
            indegree[u] -= 1;
            if indegree[u] == 0 {
                ready.push(u);
            }
        }
    }
    if ranked < k {
        return None;
    }
    Some(type_of.into_iter().map(|t| rank[t]).collect())
}

/// Longest path from any source, plus the number of levels reached.
fn longest_path_depths(model: &GraphModel) -> (Vec<usize>, usize) {
    let n = model.nodes.len();
    let mut outgoing: Vec<Vec<NodeId>> = vec![Vec::new(); n];
    for e in &model.edges {
        outgoing[e.from.0].push(e.to);
    }

    let mut depth = vec![0usize; n];
    let mut current: BTreeSet<usize> = (0..n).collect();
    let mut x = 0;
    while !current.is_empty() {
        if x > n {
            warn!("flow layout: cycle detected, column depths truncated");
            break;
        }
        let mut next = BTreeSet::new();
        for &i in &current {
            depth[i] = x;
            for t in &outgoing[i] {
                next.insert(t.0);
            }
        }
        current = next;
        x += 1;
    }
    (depth, x)
}

fn compact(raw: Vec<usize>) -> Vec<usize> {
    let distinct: Vec<usize> = raw.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    raw.into_iter()
        .map(|c| distinct.binary_search(&c).unwrap_or(0))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeExtent {
    pub nid: NodeId,
    pub column: usize,
    pub x0: f32,
    pub x1: f32,
    pub y0: f32,
    pub y1: f32,
    /// max(Σ in, Σ out)
    pub value: f64,
    /// Σ of incident link values.
    pub total_flow: f64,
}

impl NodeExtent {
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    fn shift(&mut self, dy: f32) {
        self.y0 += dy;
        self.y1 += dy;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkExtent {
    pub eid: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub value: f64,
    pub width: f32,
    /// Center of the band where it leaves the source.
    pub y0: f32,
    /// Center of the band where it enters the target.
    pub y1: f32,
}

pub struct Geometry {
    pub width: f32,
    pub height: f32,
    pub node_width: f32,
    pub node_padding: f32,
    pub node_min_height: f32,
    pub iterations: usize,
}

/// Lays out `columns` (each already in priority order).
pub fn compute_geometry(
    model: &GraphModel,
    columns: &[Vec<NodeId>],
    geo: &Geometry,
) -> (Vec<NodeExtent>, Vec<LinkExtent>, f32) {
    let n = model.nodes.len();
    let mut inflow = vec![0.0f64; n];
    let mut outflow = vec![0.0f64; n];
    for e in &model.edges {
        outflow[e.from.0] += e.value;
        inflow[e.to.0] += e.value;
    }

    let kx = if columns.len() > 1 {
        (geo.width - geo.node_width).max(0.0) / (columns.len() - 1) as f32
    } else {
        0.0
    };

    let ky = columns
        .iter()
        .filter_map(|col| {
            let sum: f64 = col.iter().map(|nid| inflow[nid.0].max(outflow[nid.0])).sum();
            if sum <= 0.0 {
                return None;
            }
            let free = geo.height - (col.len().saturating_sub(1)) as f32 * geo.node_padding;
            Some(free.max(0.0) / sum as f32)
        })
        .fold(f32::INFINITY, f32::min);
    let ky = if ky.is_finite() { ky } else { 0.0 };

    // Placeholder extents, replaced column by column below.
    let mut nodes: Vec<NodeExtent> = model
        .nodes
        .iter()
        .map(|node| NodeExtent {
            nid: node.nid,
            column: 0,
            x0: 0.0,
            x1: 0.0,
            y0: 0.0,
            y1: 0.0,
            value: inflow[node.nid.0].max(outflow[node.nid.0]),
            total_flow: inflow[node.nid.0] + outflow[node.nid.0],
        })
        .collect();

    for (c, col) in columns.iter().enumerate() {
        let x0 = c as f32 * kx;
        let mut y = 0.0;
        for nid in col {
            let ext = &mut nodes[nid.0];
            ext.column = c;
            ext.x0 = x0;
            ext.x1 = x0 + geo.node_width;
            ext.y0 = y;
            ext.y1 = y + (ext.value as f32 * ky).max(geo.node_min_height);
            y = ext.y1 + geo.node_padding;
        }
        resolve_collisions(&mut nodes, col, geo);
    }

    let mut alpha = 1.0f32;
    for _ in 0..geo.iterations {
        alpha *= 0.99;
        relax(model, &mut nodes, columns, geo, alpha, true);
        relax(model, &mut nodes, columns, geo, alpha, false);
    }

    let mut links: Vec<LinkExtent> = model
        .edges
        .iter()
        .map(|e| LinkExtent {
            eid: e.eid,
            source: e.from,
            target: e.to,
            value: e.value,
            width: e.value as f32 * ky,
            y0: 0.0,
            y1: 0.0,
        })
        .collect();
    route_links(model, &nodes, &mut links);

    (nodes, links, ky)
}

/// Moves each node toward the value-weighted center of its neighbors on one
/// side (incoming when sweeping right, outgoing when sweeping left).
fn relax(
    model: &GraphModel,
    nodes: &mut [NodeExtent],
    columns: &[Vec<NodeId>],
    geo: &Geometry,
    alpha: f32,
    left_to_right: bool,
) {
    let order: Vec<usize> = if left_to_right {
        (1..columns.len()).collect()
    } else {
        (0..columns.len().saturating_sub(1)).rev().collect()
    };
    for c in order {
        for &nid in &columns[c] {
            let mut weighted = 0.0f64;
            let mut total = 0.0f64;
            for e in model.incident_edges(nid) {
                let other = e.other(nid);
                let upstream = e.to == nid;
                if upstream != left_to_right {
                    continue;
                }
                weighted += nodes[other.0].center() as f64 * e.value;
                total += e.value;
            }
            if total <= 0.0 {
                continue;
            }
            let target = (weighted / total) as f32;
            let dy = (target - nodes[nid.0].center()) * alpha;
            nodes[nid.0].shift(dy);
        }
        resolve_collisions(nodes, &columns[c], geo);
    }
}

/// Pushes overlapping nodes apart without changing their order in `column`.
pub fn resolve_collisions(nodes: &mut [NodeExtent], column: &[NodeId], geo: &Geometry) {
    let mut y = 0.0f32;
    for nid in column {
        let ext = &mut nodes[nid.0];
        if ext.y0 < y {
            ext.shift(y - ext.y0);
        }
        y = ext.y1 + geo.node_padding;
    }

    let mut y = geo.height;
    for nid in column.iter().rev() {
        let ext = &mut nodes[nid.0];
        if ext.y1 > y {
            ext.shift(y - ext.y1);
        }
        y = ext.y0 - geo.node_padding;
    }

    // Column taller than the extent: top-align instead of spilling above 0.
    let spills = column.first().is_some_and(|first| nodes[first.0].y0 < 0.0);
    if spills {
        let mut y = 0.0f32;
        for nid in column {
            let ext = &mut nodes[nid.0];
            if ext.y0 < y {
                ext.shift(y - ext.y0);
            }
            y = ext.y1 + geo.node_padding;
        }
    }
}

/// Stacks link bands on each node: outgoing bands by target position,
/// incoming bands by source position.
pub fn route_links(model: &GraphModel, nodes: &[NodeExtent], links: &mut [LinkExtent]) {
    for ext in nodes {
        let mut outgoing: Vec<EdgeId> = Vec::new();
        let mut incoming: Vec<EdgeId> = Vec::new();
        for &eid in model.adjacency.get_incident(ext.nid) {
            if links[eid.0].source == ext.nid {
                outgoing.push(eid);
            } else {
                incoming.push(eid);
            }
        }
        outgoing.sort_by(|a, b| {
            let ya = nodes[links[a.0].target.0].y0;
            let yb = nodes[links[b.0].target.0].y0;
            ya.total_cmp(&yb).then(a.cmp(b))
        });
        incoming.sort_by(|a, b| {
            let ya = nodes[links[a.0].source.0].y0;
            let yb = nodes[links[b.0].source.0].y0;
            ya.total_cmp(&yb).then(a.cmp(b))
        });

        let mut y = ext.y0;
        for eid in outgoing {
            let w = links[eid.0].width;
            links[eid.0].y0 = y + w / 2.0;
            y += w;
        }
        let mut y = ext.y0;
        for eid in incoming {
            let w = links[eid.0].width;
            links[eid.0].y1 = y + w / 2.0;
            y += w;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::flow::ordering::tests::{link, node};
    use crate::model::FlowInput;

    fn model(nodes: &[&str], links: &[(&str, &str)]) -> GraphModel {
        GraphModel::from_flow(&FlowInput {
            nodes: nodes.iter().map(|id| node(id, "System")).collect(),
            links: links.iter().map(|(s, t)| link(s, t)).collect(),
            metadata: Default::default(),
        })
    }

    fn geo() -> Geometry {
        Geometry {
            width: 400.0,
            height: 200.0,
            node_width: 20.0,
            node_padding: 10.0,
            node_min_height: 2.0,
            iterations: 6,
        }
    }

    fn columns_of(m: &GraphModel, cols: &[usize]) -> Vec<Vec<NodeId>> {
        let k = cols.iter().max().map_or(0, |m| m + 1);
        let mut out = vec![Vec::new(); k];
        for node in &m.nodes {
            out[cols[node.nid.0]].push(node.nid);
        }
        out
    }

    #[test]
    fn test_justify_pushes_sinks_right() {
        // A -> B -> C, A -> D: D is a sink and moves to the last column
        let m = model(&["A", "B", "C", "D"], &[("A", "B"), ("B", "C"), ("A", "D")]);
        assert_eq!(assign_columns(&m, &ColumnStrategy::Justify), vec![0, 1, 2, 2]);
        assert_eq!(assign_columns(&m, &ColumnStrategy::Left), vec![0, 1, 2, 1]);
    }

    #[test]
    fn test_type_layer_columns() {
        let mut m = model(&["A", "B", "C"], &[]);
        m.nodes[0].kind = "Consumer".to_string();
        m.nodes[1].kind = "Hub".to_string();
        m.nodes[2].kind = "Unlisted".to_string();
        let layers = ColumnStrategy::TypeLayer(vec!["Hub".to_string(), "Consumer".to_string()]);
        assert_eq!(assign_columns(&m, &layers), vec![1, 0, 2]);
    }

    #[test]
    fn test_by_type_layers_follow_links() {
        // Source -> Hub -> Sink; the isolated hub F stays in the hub column
        let mut m = model(&["A", "B", "C", "F"], &[("A", "B"), ("B", "C")]);
        for (i, kind) in ["Source", "Hub", "Sink", "Hub"].iter().enumerate() {
            m.nodes[i].kind = kind.to_string();
        }
        assert_eq!(assign_columns(&m, &ColumnStrategy::ByType), vec![0, 1, 2, 1]);
        assert_eq!(assign_columns(&m, &ColumnStrategy::Justify), vec![0, 1, 2, 2]);
    }

    #[test]
    fn test_by_type_falls_back_to_justify() {
        // one type only
        let m = model(&["A", "B", "C", "D"], &[("A", "B"), ("B", "C"), ("A", "D")]);
        assert_eq!(assign_columns(&m, &ColumnStrategy::ByType), vec![0, 1, 2, 2]);

        // types that cycle
        let mut m = model(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        for (i, kind) in ["System", "Middleware", "System"].iter().enumerate() {
            m.nodes[i].kind = kind.to_string();
        }
        assert_eq!(
            assign_columns(&m, &ColumnStrategy::ByType),
            assign_columns(&m, &ColumnStrategy::Justify)
        );
    }

    #[test]
    fn test_cycle_does_not_hang() {
        let m = model(&["A", "B"], &[("A", "B"), ("B", "A")]);
        let cols = assign_columns(&m, &ColumnStrategy::Justify);
        assert_eq!(cols.len(), 2);
    }

    #[test]
    fn test_values_and_no_overlap() {
        let m = model(&["A", "B", "C"], &[("A", "C"), ("B", "C")]);
        let cols = assign_columns(&m, &ColumnStrategy::Justify);
        let columns = columns_of(&m, &cols);
        let (nodes, links, ky) = compute_geometry(&m, &columns, &geo());
        assert!(ky > 0.0);
        let c = &nodes[2];
        assert_eq!(c.value, 2.0);
        assert_eq!(c.total_flow, 2.0);
        assert!((c.height() - 2.0 * ky).abs() < 1e-3);
        let (a, b) = (&nodes[0], &nodes[1]);
        assert!(a.y1 + 10.0 <= b.y0 + 1e-3, "A and B overlap");
        assert!(b.y1 <= 200.0 + 1e-3);
        // C's incoming bands are stacked A over B
        assert!(links[0].y1 < links[1].y1);
        assert!((links[1].y1 - links[0].y1 - links[0].width).abs() < 1e-3);
    }

    #[test]
    fn test_isolated_node_uses_min_height() {
        let m = model(&["A"], &[]);
        let columns = vec![vec![NodeId(0)]];
        let (nodes, _, ky) = compute_geometry(&m, &columns, &geo());
        assert_eq!(ky, 0.0);
        assert_eq!(nodes[0].height(), 2.0);
    }

    #[test]
    fn test_collisions_keep_order() {
        let column = vec![NodeId(2), NodeId(0), NodeId(1)];
        let mut nodes: Vec<NodeExtent> = (0..3)
            .map(|i| NodeExtent {
                nid: NodeId(i),
                column: 0,
                x0: 0.0,
                x1: 20.0,
                y0: 50.0,
                y1: 90.0,
                value: 1.0,
                total_flow: 1.0,
            })
            .collect();
        resolve_collisions(&mut nodes, &column, &geo());
        assert!(nodes[2].y1 + 10.0 <= nodes[0].y0 + 1e-3);
        assert!(nodes[0].y1 + 10.0 <= nodes[1].y0 + 1e-3);
        assert!(nodes[1].y1 <= 200.0 + 1e-3);
    }
}
