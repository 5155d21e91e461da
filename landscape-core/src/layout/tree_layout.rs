// Horizontal tidy tree layout.
//
// What this does:
// - Places the visible tree left-to-right: x follows depth, y follows breadth
// - Computes breadth bottom-up by merging subtree contours, so no two nodes on
//   the same level get closer than the separation for their relationship
//   (siblings 1.0, cousins 1.2 rows)
// - Centers each parent over its first and last child; the root sits at 0
// - Remembers the last position per node id so the host can animate from
//   x0/y0 to x/y, and reports nodes that left the visible set as exits

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::PointF;
use crate::tree::{HierarchyTree, TreeNodeId, VisibleTree};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeLayoutConfig {
    /// Horizontal distance between depth columns.
    pub depth_step: f32,
    /// Vertical size of one breadth unit.
    pub row_step: f32,
    pub sibling_separation: f32,
    pub cousin_separation: f32,
}

impl Default for TreeLayoutConfig {
    fn default() -> Self {
        Self {
            depth_step: 180.0,
            row_step: 28.0,
            sibling_separation: 1.0,
            cousin_separation: 1.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedTreeNode {
    #[serde(skip)]
    pub tid: TreeNodeId,
    pub id: String,
    pub depth: usize,
    pub x: f32,
    pub y: f32,
    pub x0: f32,
    pub y0: f32,
    /// Has hidden children.
    pub collapsed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeLink {
    pub source: String,
    pub target: String,
    pub from: PointF,
    pub to: PointF,
}

/// A node that was visible in the previous layout and no longer is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeExit {
    pub id: String,
    pub from: PointF,
    /// Where it collapses into: its nearest visible ancestor.
    pub to: PointF,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TreeLayout {
    /// Same order as the visible tree (preorder).
    pub nodes: Vec<PlacedTreeNode>,
    pub links: Vec<TreeLink>,
    pub exits: Vec<TreeExit>,
}

impl TreeLayout {
    pub fn position(&self, id: &str) -> Option<PointF> {
        self.nodes.iter().find(|n| n.id == id).map(|n| PointF::new(n.x, n.y))
    }
}

#[derive(Debug, Clone, Default)]
pub struct TreeLayoutEngine {
    pub config: TreeLayoutConfig,
    previous: HashMap<String, PointF>,
}

impl TreeLayoutEngine {
    pub fn new(config: TreeLayoutConfig) -> Self {
        Self { config, previous: HashMap::new() }
    }

    /// Forget remembered positions (data reload).
    pub fn reset(&mut self) {
        self.previous.clear();
    }

    fn separation(&self, level: usize) -> f32 {
        // Facing nodes from different child subtrees are siblings only on the
        // children's own level.
        if level == 0 {
            self.config.sibling_separation
        } else {
            self.config.cousin_separation
        }
    }

    /// Breadth of every visible node, in visible-tree order.
    fn breadths(&self, visible: &VisibleTree) -> Vec<f32> {
        let n = visible.len();
        // contour[level] = (leftmost, rightmost) breadth relative to the node
        let mut contours: Vec<Vec<(f32, f32)>> = vec![Vec::new(); n];
        let mut rel = vec![0.0f32; n];

        // Preorder reversed visits children before parents.
        for i in (0..n).rev() {
            let children = &visible.nodes[i].children;
            let mut contour = vec![(0.0, 0.0)];
            if !children.is_empty() {
                let mut acc: Vec<(f32, f32)> = Vec::new();
                let mut offsets = Vec::with_capacity(children.len());
                for &c in children {
                    let child = std::mem::take(&mut contours[c]);
                    let offset = if acc.is_empty() {
                        0.0
                    } else {
                        acc.iter()
                            .zip(child.iter())
                            .enumerate()
                            .map(|(level, (a, b))| a.1 - b.0 + self.separation(level))
                            .fold(f32::MIN, f32::max)
                    };
                    merge_contour(&mut acc, &child, offset);
                    offsets.push(offset);
                }
                let mid = (offsets[0] + offsets[offsets.len() - 1]) / 2.0;
                for (&c, &o) in children.iter().zip(&offsets) {
                    rel[c] = o - mid;
                }
                contour.extend(acc.into_iter().map(|(l, r)| (l - mid, r - mid)));
            }
            contours[i] = contour;
        }

        let mut breadth = vec![0.0f32; n];
        for i in 1..n {
            if let Some(p) = visible.nodes[i].parent {
                breadth[i] = breadth[p] + rel[i];
            }
        }
        breadth
    }

    pub fn layout(&mut self, tree: &HierarchyTree, visible: &VisibleTree) -> TreeLayout {
        let breadth = self.breadths(visible);
        let cfg = &self.config;

        let mut current: HashMap<TreeNodeId, PointF> = HashMap::with_capacity(visible.len());
        for (vn, b) in visible.nodes.iter().zip(&breadth) {
            current.insert(vn.tid, PointF::new(vn.depth as f32 * cfg.depth_step, b * cfg.row_step));
        }

        let mut nodes = Vec::with_capacity(visible.len());
        for vn in &visible.nodes {
            let node = tree.node(vn.tid);
            let pos = current[&vn.tid];
            let origin = self
                .previous
                .get(&node.id)
                .copied()
                .or_else(|| {
                    tree.ancestors(vn.tid)
                        .find_map(|a| self.previous.get(&tree.node(a).id).copied())
                })
                .unwrap_or(pos);
            nodes.push(PlacedTreeNode {
                tid: vn.tid,
                id: node.id.clone(),
                depth: vn.depth,
                x: pos.x,
                y: pos.y,
                x0: origin.x,
                y0: origin.y,
                collapsed: vn.collapsed,
            });
        }

        let links = visible
            .nodes
            .iter()
            .filter_map(|vn| {
                let p = visible.nodes[vn.parent?].tid;
                Some(TreeLink {
                    source: tree.node(p).id.clone(),
                    target: tree.node(vn.tid).id.clone(),
                    from: current[&p],
                    to: current[&vn.tid],
                })
            })
            .collect();

        let root_pos = current.get(&tree.root).copied().unwrap_or(PointF::ZERO);
        let mut exits: Vec<TreeExit> = self
            .previous
            .iter()
            .filter(|(id, _)| tree.get(id).is_none_or(|t| !current.contains_key(&t)))
            .map(|(id, &from)| {
                let to = tree
                    .get(id)
                    .and_then(|t| tree.ancestors(t).find_map(|a| current.get(&a).copied()))
                    .unwrap_or(root_pos);
                TreeExit { id: id.clone(), from, to }
            })
            .collect();
        exits.sort_by(|a, b| a.id.cmp(&b.id));

        self.previous = nodes
            .iter()
            .map(|n| (n.id.clone(), PointF::new(n.x, n.y)))
            .collect();

        TreeLayout { nodes, links, exits }
    }
}

fn merge_contour(acc: &mut Vec<(f32, f32)>, child: &[(f32, f32)], offset: f32) {
    for (level, &(l, r)) in child.iter().enumerate() {
        if level < acc.len() {
            acc[level].1 = r + offset;
        } else {
            acc.push((l + offset, r + offset));
        }
    }
}
