mod builder;
mod search;
mod visibility;

pub use builder::{
    Ancestors, HierarchyTree, SYNTHETIC_ROOT_ID, SYNTHETIC_ROOT_LABEL, TreeNode, TreeNodeId,
    build_tree,
};
pub use search::{SearchState, run_search, search_visibility};
pub use visibility::{
    DEFAULT_EXPANDED_DEPTH, NodeState, VisibleNode, VisibleTree, Visibility, derive_visible_tree,
};

#[cfg(test)]
pub(crate) use builder::tests as builder_tests;
