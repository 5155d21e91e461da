//
// Search: query -> matched nodes, their ancestor path, and the visibility
// that reveals them.
//
// What this does:
// - Matches node names by case-insensitive substring
// - Collects every ancestor of every match into the path (root excluded)
// - Rebuilds visibility from scratch: only the root and path nodes are open
//
// A matched node with descendants ends up collapsed unless one of those
// descendants also matches; in that case the matched node is itself an
// ancestor of a match, so it is on the path and open.

use std::collections::HashSet;

use serde::Serialize;

use super::builder::{HierarchyTree, TreeNodeId};
use super::visibility::{NodeState, Visibility};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchState {
    pub query: String,
    pub matched: HashSet<TreeNodeId>,
    pub path: HashSet<TreeNodeId>,
}

impl SearchState {
    pub fn is_match(&self, tid: TreeNodeId) -> bool {
        self.matched.contains(&tid)
    }

    pub fn is_on_path(&self, tid: TreeNodeId) -> bool {
        self.path.contains(&tid)
    }

    /// Matched ids in tree preorder.
    pub fn matched_ids(&self, tree: &HierarchyTree) -> Vec<String> {
        tree.ids()
            .filter(|t| self.matched.contains(t))
            .map(|t| tree.node(t).id.clone())
            .collect()
    }

    pub fn path_ids(&self, tree: &HierarchyTree) -> Vec<String> {
        tree.ids()
            .filter(|t| self.path.contains(t))
            .map(|t| tree.node(t).id.clone())
            .collect()
    }
}

/// Returns None for an empty or whitespace-only query.
pub fn run_search(tree: &HierarchyTree, query: &str) -> Option<SearchState> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    let matched: HashSet<TreeNodeId> = tree
        .nodes
        .iter()
        .filter(|n| !(tree.synthetic_root && n.tid == tree.root))
        .filter(|n| n.name.to_lowercase().contains(&needle))
        .map(|n| n.tid)
        .collect();

    let mut path = HashSet::new();
    for &tid in &matched {
        for ancestor in tree.ancestors(tid) {
            if ancestor == tree.root {
                break;
            }
            // Shared ancestors: once one is in, the rest of its chain is too.
            if !path.insert(ancestor) {
                break;
            }
        }
    }

    Some(SearchState {
        query: query.trim().to_string(),
        matched,
        path,
    })
}

/// Visibility for an active search: everything collapsed, then the path
/// re-opened.
pub fn search_visibility(tree: &HierarchyTree, search: &SearchState) -> Visibility {
    let mut vis = Visibility::expanded(tree);
    vis.collapse_all(tree);
    for &tid in &search.path {
        vis.set(tree, tid, NodeState::Expanded);
    }
    vis
}
