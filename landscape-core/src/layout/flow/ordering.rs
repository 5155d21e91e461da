// Priority ordering for flow columns.
//
// Within a column, nodes sort by:
// 1. Middleware-touching (is middleware, or has an edge to one) first
// 2. Base key: a middleware node's id prefix before the first '-'; any other
//    node borrows the key of the first middleware it is linked to (edge
//    order); nodes with neither share the empty key. Keys sort ascending.
// 3. Nodes linked directly to the pinned node go after those that are not
// 4. Remaining ties by node type (optional), then input order
//
// Everything is derived from the model and the context, so the same inputs
// always produce the same order.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{EdgeId, GraphModel, NodeId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TieBreak {
    /// Lexicographic node type, then input order.
    #[default]
    NodeType,
    /// Input order only.
    Stable,
}

/// The focal system and the integration hubs around it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowContext {
    pub pinned: Option<NodeId>,
    pub middleware: HashSet<NodeId>,
}

impl FlowContext {
    /// Resolves ids against the model; unknown ids are ignored.
    pub fn resolve(model: &GraphModel, pinned: Option<&str>, middleware: &[String]) -> Self {
        Self {
            pinned: pinned.and_then(|id| model.lookup(id)),
            middleware: middleware.iter().filter_map(|id| model.lookup(id)).collect(),
        }
    }

    pub fn is_middleware(&self, nid: NodeId) -> bool {
        self.middleware.contains(&nid)
    }

    pub fn is_pinned(&self, nid: NodeId) -> bool {
        self.pinned == Some(nid)
    }

    /// An edge is a middleware edge when either end is middleware.
    pub fn is_middleware_edge(&self, model: &GraphModel, eid: EdgeId) -> bool {
        let e = &model.edges[eid.0];
        self.is_middleware(e.from) || self.is_middleware(e.to)
    }
}

/// Prefix of a middleware id before its first '-'.
pub fn middleware_base_key(id: &str) -> &str {
    id.split('-').next().unwrap_or(id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub touching: bool,
    pub base: String,
    pub direct_to_pinned: bool,
    pub kind: String,
    pub index: usize,
}

pub fn order_key(model: &GraphModel, ctx: &FlowContext, nid: NodeId) -> OrderKey {
    let node = &model.nodes[nid.0];
    let first_middleware = model
        .incident_edges(nid)
        .map(|e| e.other(nid))
        .find(|&other| ctx.is_middleware(other));

    let base = if ctx.is_middleware(nid) {
        middleware_base_key(&node.id).to_string()
    } else if let Some(m) = first_middleware {
        middleware_base_key(&model.nodes[m.0].id).to_string()
    } else {
        String::new()
    };

    let direct_to_pinned = match ctx.pinned {
        Some(p) if p != nid => model.adjacency.are_adjacent(nid, p),
        _ => false,
    };

    OrderKey {
        touching: ctx.is_middleware(nid) || first_middleware.is_some(),
        base,
        direct_to_pinned,
        kind: node.kind.clone(),
        index: nid.0,
    }
}

pub fn compare_keys(a: &OrderKey, b: &OrderKey, tie: TieBreak) -> Ordering {
    b.touching
        .cmp(&a.touching)
        .then_with(|| a.base.cmp(&b.base))
        .then_with(|| a.direct_to_pinned.cmp(&b.direct_to_pinned))
        .then_with(|| match tie {
            TieBreak::NodeType => a.kind.cmp(&b.kind),
            TieBreak::Stable => Ordering::Equal,
        })
        .then_with(|| a.index.cmp(&b.index))
}

/// Sorts one column in place.
pub fn order_column(model: &GraphModel, ctx: &FlowContext, column: &mut [NodeId], tie: TieBreak) {
    let mut keyed: Vec<(OrderKey, NodeId)> =
        column.iter().map(|&nid| (order_key(model, ctx, nid), nid)).collect();
    keyed.sort_by(|a, b| compare_keys(&a.0, &b.0, tie));
    for (slot, (_, nid)) in column.iter_mut().zip(keyed) {
        *slot = nid;
    }
}

/// Direct edges first, middleware edges after; input order within each.
pub fn edge_draw_order(model: &GraphModel, ctx: &FlowContext) -> Vec<EdgeId> {
    let (direct, middleware): (Vec<EdgeId>, Vec<EdgeId>) = model
        .edges
        .iter()
        .map(|e| e.eid)
        .partition(|&eid| !ctx.is_middleware_edge(model, eid));
    direct.into_iter().chain(middleware).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{FlowInput, FlowMetadata, FlowNodeRecord, LinkRecord};

    pub(crate) fn node(id: &str, kind: &str) -> FlowNodeRecord {
        FlowNodeRecord {
            id: id.to_string(),
            name: id.to_string(),
            node_type: kind.to_string(),
            criticality: None,
        }
    }

    pub(crate) fn link(source: &str, target: &str) -> LinkRecord {
        LinkRecord {
            source: source.to_string(),
            target: target.to_string(),
            pattern: "API".to_string(),
            frequency: "Daily".to_string(),
            role: "Producer".to_string(),
            value: None,
        }
    }

    /// A (pinned) -> M-P (middleware) -> S1, and A -> S2 directly.
    pub(crate) fn middleware_example() -> FlowInput {
        FlowInput {
            nodes: vec![
                node("A", "System"),
                node("S2", "System"),
                node("M-P", "Middleware"),
                node("S1", "System"),
            ],
            links: vec![link("A", "M-P"), link("M-P", "S1"), link("A", "S2")],
            metadata: FlowMetadata {
                code: "A".to_string(),
                integration_middleware: vec!["M-P".to_string()],
                ..Default::default()
            },
        }
    }

    fn ids(model: &GraphModel, column: &[NodeId]) -> Vec<String> {
        column.iter().map(|n| model.nodes[n.0].id.clone()).collect()
    }

    #[test]
    fn test_middleware_example() {
        let input = middleware_example();
        let model = GraphModel::from_flow(&input);
        let ctx = FlowContext::resolve(&model, Some("A"), &input.metadata.integration_middleware);
        let mut column: Vec<NodeId> = ["S2", "M-P", "S1"].iter().map(|id| model.lookup(id).unwrap()).collect();
        order_column(&model, &ctx, &mut column, TieBreak::Stable);
        let order = ids(&model, &column);
        let pos = |id: &str| order.iter().position(|x| x == id).unwrap();
        assert!(pos("M-P") < pos("S2"));
        assert!(pos("S1") < pos("S2"));
    }

    #[test]
    fn test_base_key_groups_sorted() {
        let input = FlowInput {
            nodes: vec![
                node("X", "System"),
                node("ZB-1", "Middleware"),
                node("Y", "System"),
                node("AB-2", "Middleware"),
            ],
            links: vec![link("X", "ZB-1"), link("Y", "AB-2")],
            metadata: Default::default(),
        };
        let model = GraphModel::from_flow(&input);
        let mw = vec!["ZB-1".to_string(), "AB-2".to_string()];
        let ctx = FlowContext::resolve(&model, None, &mw);
        let mut column: Vec<NodeId> = model.nodes.iter().map(|n| n.nid).collect();
        order_column(&model, &ctx, &mut column, TieBreak::NodeType);
        // AB group before ZB group; inside a group "Middleware" < "System"
        assert_eq!(ids(&model, &column), vec!["AB-2", "Y", "ZB-1", "X"]);
        assert_eq!(order_key(&model, &ctx, model.lookup("Y").unwrap()).base, "AB");
    }

    #[test]
    fn test_direct_to_pinned_goes_last_in_group() {
        let input = FlowInput {
            nodes: vec![node("P", "System"), node("D", "System"), node("N", "System")],
            links: vec![link("P", "D")],
            metadata: Default::default(),
        };
        let model = GraphModel::from_flow(&input);
        let ctx = FlowContext::resolve(&model, Some("P"), &[]);
        let mut column: Vec<NodeId> = model.nodes.iter().map(|n| n.nid).collect();
        order_column(&model, &ctx, &mut column, TieBreak::Stable);
        // pinned itself is not "direct to pinned"
        assert_eq!(ids(&model, &column), vec!["P", "N", "D"]);
    }

    #[test]
    fn test_ordering_is_deterministic() {
        let input = middleware_example();
        let model = GraphModel::from_flow(&input);
        let ctx = FlowContext::resolve(&model, Some("A"), &input.metadata.integration_middleware);
        let run = || {
            let mut column: Vec<NodeId> = model.nodes.iter().rev().map(|n| n.nid).collect();
            order_column(&model, &ctx, &mut column, TieBreak::NodeType);
            column
        };
        let first = run();
        for _ in 0..10 {
            assert_eq!(run(), first);
        }
    }

    #[test]
    fn test_edge_draw_order_puts_middleware_last() {
        let input = middleware_example();
        let model = GraphModel::from_flow(&input);
        let ctx = FlowContext::resolve(&model, Some("A"), &input.metadata.integration_middleware);
        let order = edge_draw_order(&model, &ctx);
        assert_eq!(order, vec![EdgeId(2), EdgeId(0), EdgeId(1)]);
    }

    #[test]
    fn test_base_key_without_dash() {
        assert_eq!(middleware_base_key("ESB"), "ESB");
        assert_eq!(middleware_base_key("ESB-EU-1"), "ESB");
    }
}
