mod adjacency;
mod graph;
mod input;
pub mod palette;

pub use adjacency::Adjacency;
pub use graph::{
    Criticality, EdgeId, GraphEdge, GraphModel, GraphNode, IntegrationPattern, NodeId, NodeLevel,
    link_value,
};
pub use input::{
    FlowInput, FlowMetadata, FlowNodeRecord, HierarchyRecord, InputError, LinkRecord,
    parse_flow, parse_hierarchy,
};
