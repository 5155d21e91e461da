//
// Expanded/collapsed state per tree node, and the visible tree derived from it.
//
// Each node has exactly one authoritative child list (in HierarchyTree) and a
// NodeState. Visible children are `children` when Expanded and nothing when
// Collapsed; hidden children are the complement. Leaves are always reported
// Expanded and ignore transitions.

use serde::Serialize;

use super::builder::{HierarchyTree, TreeNodeId};

/// Nodes deeper than this start collapsed under the default policy.
pub const DEFAULT_EXPANDED_DEPTH: usize = 1;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum NodeState {
    Expanded,
    Collapsed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visibility {
    states: Vec<NodeState>,
    root: TreeNodeId,
}

impl Visibility {
    /// Everything expanded.
    pub fn expanded(tree: &HierarchyTree) -> Self {
        Self {
            states: vec![NodeState::Expanded; tree.len()],
            root: tree.root,
        }
    }

    /// Nodes with depth > `max_expanded_depth` start collapsed; the root and
    /// the levels above stay open.
    pub fn with_default_policy(tree: &HierarchyTree, max_expanded_depth: usize) -> Self {
        let states = tree
            .nodes
            .iter()
            .map(|n| {
                if n.depth > max_expanded_depth && !n.is_leaf() {
                    NodeState::Collapsed
                } else {
                    NodeState::Expanded
                }
            })
            .collect();
        Self { states, root: tree.root }
    }

    pub fn state(&self, tid: TreeNodeId) -> NodeState {
        self.states.get(tid.0).copied().unwrap_or(NodeState::Expanded)
    }

    pub fn is_collapsed(&self, tid: TreeNodeId) -> bool {
        self.state(tid) == NodeState::Collapsed
    }

    /// Flip one node. Returns false (and does nothing) for leaves.
    pub fn toggle(&mut self, tree: &HierarchyTree, tid: TreeNodeId) -> bool {
        if tid.0 >= self.states.len() || tree.node(tid).is_leaf() {
            return false;
        }
        self.states[tid.0] = match self.states[tid.0] {
            NodeState::Expanded => NodeState::Collapsed,
            NodeState::Collapsed => NodeState::Expanded,
        };
        true
    }

    pub fn set(&mut self, tree: &HierarchyTree, tid: TreeNodeId, state: NodeState) {
        if tid.0 >= self.states.len() || tree.node(tid).is_leaf() {
            return;
        }
        self.states[tid.0] = state;
    }

    pub fn expand_all(&mut self) {
        self.states.fill(NodeState::Expanded);
    }

    /// Collapses every node with children except the root, which has no
    /// collapse affordance.
    pub fn collapse_all(&mut self, tree: &HierarchyTree) {
        for node in &tree.nodes {
            if node.tid != self.root && !node.is_leaf() {
                self.states[node.tid.0] = NodeState::Collapsed;
            }
        }
    }

    pub fn expand_subtree(&mut self, tree: &HierarchyTree, tid: TreeNodeId) {
        self.set_subtree(tree, tid, NodeState::Expanded);
    }

    /// Collapses `tid` and its descendants. Collapsing the root's subtree
    /// leaves the root itself open.
    pub fn collapse_subtree(&mut self, tree: &HierarchyTree, tid: TreeNodeId) {
        self.set_subtree(tree, tid, NodeState::Collapsed);
        if tid == self.root {
            self.states[self.root.0] = NodeState::Expanded;
        }
    }

    fn set_subtree(&mut self, tree: &HierarchyTree, tid: TreeNodeId, state: NodeState) {
        let mut stack = vec![tid];
        while let Some(current) = stack.pop() {
            self.set(tree, current, state);
            stack.extend(tree.node(current).children.iter().copied());
        }
    }

    pub fn visible_children<'t>(&self, tree: &'t HierarchyTree, tid: TreeNodeId) -> &'t [TreeNodeId] {
        match self.state(tid) {
            NodeState::Expanded => tree.node(tid).children.as_slice(),
            NodeState::Collapsed => &[],
        }
    }

    pub fn hidden_children<'t>(&self, tree: &'t HierarchyTree, tid: TreeNodeId) -> &'t [TreeNodeId] {
        match self.state(tid) {
            NodeState::Expanded => &[],
            NodeState::Collapsed => tree.node(tid).children.as_slice(),
        }
    }
}

/// One node of the derived visible tree.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleNode {
    pub tid: TreeNodeId,
    /// Index of the parent inside `VisibleTree::nodes`.
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub depth: usize,
    /// Has structural children that are currently hidden.
    pub collapsed: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisibleTree {
    /// Preorder; index 0 is the root when non-empty.
    pub nodes: Vec<VisibleNode>,
}

impl VisibleTree {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, tid: TreeNodeId) -> bool {
        self.nodes.iter().any(|n| n.tid == tid)
    }

    pub fn tids(&self) -> impl Iterator<Item = TreeNodeId> + '_ {
        self.nodes.iter().map(|n| n.tid)
    }
}

/// Pure projection of the tree through the visibility map.
pub fn derive_visible_tree(tree: &HierarchyTree, visibility: &Visibility) -> VisibleTree {
    let mut out = VisibleTree::default();
    if tree.is_empty() {
        return out;
    }

    let mut stack: Vec<(TreeNodeId, Option<usize>)> = vec![(tree.root, None)];
    while let Some((tid, parent)) = stack.pop() {
        let index = out.nodes.len();
        let node = tree.node(tid);
        out.nodes.push(VisibleNode {
            tid,
            parent,
            children: Vec::new(),
            depth: node.depth,
            collapsed: !visibility.hidden_children(tree, tid).is_empty(),
        });
        if let Some(p) = parent {
            out.nodes[p].children.push(index);
        }
        for &child in visibility.visible_children(tree, tid).iter().rev() {
            stack.push((child, Some(index)));
        }
    }
    out
}
