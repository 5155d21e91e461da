//
// Hierarchy builder: flat parent/child records -> one rooted tree.
//
// What this does:
// - Picks the root: a parentless "Root"-level record (system-specific view)
//   is promoted; otherwise a synthetic root is created, with its id
//   underscore-prefixed until it is not taken by a record
// - Attaches every other record to its parent by id, in input order
// - Walks from the root in preorder, assigning dense TreeNodeIds and depths
// - Anything not reached from the root (dangling parent ids, records that
//   only point at each other) is left out and listed in `dropped`
//
// The walk only follows child lists and every record sits in at most one
// child list, so the result cannot contain a cycle.

use std::collections::HashMap;

use log::{debug, warn};
use serde::Serialize;

use crate::model::{GraphModel, NodeId, NodeLevel};

pub const SYNTHETIC_ROOT_ID: &str = "root";
pub const SYNTHETIC_ROOT_LABEL: &str = "Capabilities";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TreeNodeId(pub usize);

#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub tid: TreeNodeId,
    pub id: String,
    pub name: String,
    pub level: NodeLevel,
    pub parent: Option<TreeNodeId>,
    pub children: Vec<TreeNodeId>,
    pub depth: usize,
    pub system_code: Option<String>,
    pub system_count: Option<u32>,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HierarchyTree {
    pub root: TreeNodeId,
    /// Preorder: parents always precede their children.
    pub nodes: Vec<TreeNode>,
    #[serde(skip)]
    pub index_by_id: HashMap<String, TreeNodeId>,
    /// Record ids that could not be reached from the root.
    pub dropped: Vec<String>,
    /// True when the root is the synthetic "root" node, not a promoted record.
    pub synthetic_root: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Attach {
    Root,
    Node(NodeId),
}

pub fn build_tree(model: &GraphModel) -> HierarchyTree {
    let marker = model
        .nodes
        .iter()
        .find(|n| n.parent_id.is_none() && n.level == NodeLevel::Root)
        .map(|n| n.nid);

    let mut root_children: Vec<NodeId> = Vec::new();
    let mut children: Vec<Vec<NodeId>> = vec![Vec::new(); model.nodes.len()];

    for node in &model.nodes {
        if Some(node.nid) == marker {
            continue;
        }
        let attach = match node.parent_id.as_deref() {
            None => Some(Attach::Root),
            Some(pid) => match model.lookup(pid) {
                Some(p) if Some(p) == marker => Some(Attach::Root),
                Some(p) => Some(Attach::Node(p)),
                None => None,
            },
        };
        match attach {
            Some(Attach::Root) => root_children.push(node.nid),
            Some(Attach::Node(p)) => children[p.0].push(node.nid),
            None => {}
        }
    }

    let root_node = match marker {
        Some(m) => {
            let n = &model.nodes[m.0];
            TreeNode {
                tid: TreeNodeId(0),
                id: n.id.clone(),
                name: n.name.clone(),
                level: NodeLevel::Root,
                parent: None,
                children: Vec::new(),
                depth: 0,
                system_code: n.system_code.clone(),
                system_count: n.system_count,
            }
        }
        None => TreeNode {
            tid: TreeNodeId(0),
            id: synthetic_root_id(model),
            name: SYNTHETIC_ROOT_LABEL.to_string(),
            level: NodeLevel::Root,
            parent: None,
            children: Vec::new(),
            depth: 0,
            system_code: None,
            system_count: None,
        },
    };

    let mut nodes = vec![root_node];
    let mut index_by_id = HashMap::new();
    index_by_id.insert(nodes[0].id.clone(), TreeNodeId(0));
    let mut reached = vec![false; model.nodes.len()];
    if let Some(m) = marker {
        reached[m.0] = true;
    }

    // Explicit stack keeps deep hierarchies off the call stack.
    let mut stack: Vec<(NodeId, TreeNodeId, usize)> = root_children
        .iter()
        .rev()
        .map(|&nid| (nid, TreeNodeId(0), 1))
        .collect();

    while let Some((nid, parent, depth)) = stack.pop() {
        if reached[nid.0] {
            continue;
        }
        reached[nid.0] = true;

        let src = &model.nodes[nid.0];
        let tid = TreeNodeId(nodes.len());
        nodes.push(TreeNode {
            tid,
            id: src.id.clone(),
            name: src.name.clone(),
            level: src.level.clone(),
            parent: Some(parent),
            children: Vec::new(),
            depth,
            system_code: src.system_code.clone(),
            system_count: src.system_count,
        });
        nodes[parent.0].children.push(tid);
        index_by_id.insert(src.id.clone(), tid);

        for &child in children[nid.0].iter().rev() {
            stack.push((child, tid, depth + 1));
        }
    }

    let dropped: Vec<String> = model
        .nodes
        .iter()
        .filter(|n| !reached[n.nid.0])
        .map(|n| n.id.clone())
        .collect();
    if !dropped.is_empty() {
        debug!("hierarchy: {} records unreachable from root: {:?}", dropped.len(), dropped);
    }

    HierarchyTree {
        root: TreeNodeId(0),
        nodes,
        index_by_id,
        dropped,
        synthetic_root: marker.is_none(),
    }
}

fn synthetic_root_id(model: &GraphModel) -> String {
    let mut id = SYNTHETIC_ROOT_ID.to_string();
    while model.lookup(&id).is_some() {
        id.insert_str(0, "__");
    }
    if id != SYNTHETIC_ROOT_ID {
        warn!("hierarchy: a record already uses id {SYNTHETIC_ROOT_ID:?}; synthetic root is {id:?}");
    }
    id
}

impl HierarchyTree {
    pub fn node(&self, tid: TreeNodeId) -> &TreeNode {
        &self.nodes[tid.0]
    }

    pub fn get(&self, id: &str) -> Option<TreeNodeId> {
        self.index_by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Only the synthetic root: there was nothing to build from.
    pub fn is_empty(&self) -> bool {
        self.synthetic_root && self.nodes.len() == 1
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Parent chain of `tid`, nearest first, root last. Excludes `tid`.
    pub fn ancestors(&self, tid: TreeNodeId) -> Ancestors<'_> {
        Ancestors { tree: self, next: self.nodes[tid.0].parent }
    }

    pub fn ids(&self) -> impl Iterator<Item = TreeNodeId> + '_ {
        self.nodes.iter().map(|n| n.tid)
    }
}

pub struct Ancestors<'a> {
    tree: &'a HierarchyTree,
    next: Option<TreeNodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = TreeNodeId;

    fn next(&mut self) -> Option<TreeNodeId> {
        let current = self.next?;
        self.next = self.tree.nodes[current.0].parent;
        Some(current)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::HierarchyRecord;

    pub(crate) fn rec(id: &str, level: &str, parent: Option<&str>) -> HierarchyRecord {
        HierarchyRecord {
            id: id.to_string(),
            name: id.to_string(),
            level: level.to_string(),
            parent_id: parent.map(str::to_string),
            system_code: None,
            system_count: None,
            metadata: None,
        }
    }

    /// root -> L1A -> L2A -> L3A, the worked example hierarchy.
    pub(crate) fn chain() -> Vec<HierarchyRecord> {
        vec![
            rec("L1A", "L1", None),
            rec("L2A", "L2", Some("L1A")),
            rec("L3A", "L3", Some("L2A")),
        ]
    }

    pub(crate) fn build(records: &[HierarchyRecord]) -> HierarchyTree {
        build_tree(&GraphModel::from_hierarchy(records))
    }

    #[test]
    fn test_synthetic_root_collects_top_level() {
        let tree = build(&[rec("A", "L1", None), rec("B", "L1", None), rec("A1", "L2", Some("A"))]);
        assert!(tree.synthetic_root);
        assert_eq!(tree.node(tree.root).id, SYNTHETIC_ROOT_ID);
        assert_eq!(tree.node(tree.root).name, SYNTHETIC_ROOT_LABEL);
        let top: Vec<&str> = tree.node(tree.root).children.iter().map(|&c| tree.node(c).id.as_str()).collect();
        assert_eq!(top, vec!["A", "B"]);
        assert_eq!(tree.node(tree.get("A1").unwrap()).depth, 2);
    }

    #[test]
    fn test_children_listed_before_parent_still_attach() {
        let tree = build(&[rec("C", "L3", Some("B")), rec("B", "L2", Some("A")), rec("A", "L1", None)]);
        assert!(tree.dropped.is_empty());
        let c = tree.get("C").unwrap();
        assert_eq!(tree.node(c).depth, 3);
        let chain: Vec<&str> = tree.ancestors(c).map(|a| tree.node(a).id.as_str()).collect();
        assert_eq!(chain, vec!["B", "A", "root"]);
    }

    #[test]
    fn test_system_root_is_promoted() {
        let tree = build(&[
            rec("SYS", "Root", None),
            rec("L1A", "L1", Some("SYS")),
            rec("L1B", "L1", Some("SYS")),
            rec("L2A", "L2", Some("L1A")),
        ]);
        assert!(!tree.synthetic_root);
        assert_eq!(tree.node(tree.root).id, "SYS");
        assert_eq!(tree.len(), 4);
        let top: Vec<&str> = tree.node(tree.root).children.iter().map(|&c| tree.node(c).id.as_str()).collect();
        assert_eq!(top, vec!["L1A", "L1B"]);
        // the marker is never its own child
        assert!(tree.nodes.iter().filter(|n| n.id == "SYS").count() == 1);
        assert!(tree.get("root").is_none());
    }

    #[test]
    fn test_record_named_root_keeps_ids_unique() {
        let tree = build(&[rec("root", "L1", None), rec("c", "L2", Some("root"))]);
        assert!(tree.synthetic_root);
        assert_eq!(tree.node(tree.root).id, "__root");
        let ids: Vec<&str> = tree.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["__root", "root", "c"]);
        assert_eq!(tree.get("__root"), Some(tree.root));
        assert_eq!(tree.node(tree.get("root").unwrap()).depth, 1);

        let both = build(&[rec("root", "L1", None), rec("__root", "L1", None)]);
        assert_eq!(both.node(both.root).id, "____root");
        assert_eq!(both.index_by_id.len(), both.len());
    }

    #[test]
    fn test_dangling_parent_and_cycle_are_dropped() {
        let tree = build(&[
            rec("A", "L1", None),
            rec("ORPHAN", "L2", Some("MISSING")),
            rec("X", "L2", Some("Y")),
            rec("Y", "L2", Some("X")),
            rec("SELF", "L2", Some("SELF")),
        ]);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.dropped, vec!["ORPHAN", "X", "Y", "SELF"]);
    }

    #[test]
    fn test_empty_input_gives_bare_root() {
        let tree = build(&[]);
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.max_depth(), 0);
    }

    #[test]
    fn test_preorder_parents_first() {
        let tree = build(&chain());
        for node in &tree.nodes {
            if let Some(p) = node.parent {
                assert!(p.0 < node.tid.0);
            }
        }
        assert_eq!(tree.max_depth(), 3);
    }
}
