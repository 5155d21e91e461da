//
// Graph model: flat input records -> indexed node/edge collections.
//
// What this does:
// - Assigns every distinct record id a dense NodeId (input order)
// - Skips duplicate ids (first one wins) and remembers them
// - Resolves link endpoints from id -> NodeId, skipping dangling ends and
//   self loops
// - Parses categorical strings into enums with an open fallback
// - Builds adjacency for the layout engines
//
// Nothing here fails: anomalies are logged and counted, never raised.

use std::collections::HashMap;

use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use super::adjacency::Adjacency;
use super::input::{FlowInput, HierarchyRecord};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EdgeId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum NodeLevel {
    Root,
    L1,
    L2,
    L3,
    System,
    Other(String),
}

impl NodeLevel {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "Root" | "root" => Self::Root,
            "L1" => Self::L1,
            "L2" => Self::L2,
            "L3" => Self::L3,
            "System" | "system" => Self::System,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Root => "Root",
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
            Self::System => "System",
            Self::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Criticality {
    Major,
    /// "Standard-<tier>", tier kept verbatim.
    Standard(String),
    Unknown(String),
}

impl Criticality {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.eq_ignore_ascii_case("major") {
            Self::Major
        } else if let Some(tier) = s.strip_prefix("Standard-") {
            Self::Standard(tier.to_string())
        } else if s.eq_ignore_ascii_case("standard") {
            Self::Standard(String::new())
        } else {
            Self::Unknown(s.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum IntegrationPattern {
    Api,
    Batch,
    File,
    WebService,
    Messaging,
    Other(String),
}

impl IntegrationPattern {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" | "rest" | "rest api" => Self::Api,
            "batch" => Self::Batch,
            "file" | "file transfer" | "sftp" => Self::File,
            "web service" | "webservice" | "soap" => Self::WebService,
            "mq" | "messaging" | "event" | "queue" => Self::Messaging,
            _ => Self::Other(s.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub nid: NodeId,
    pub id: String,
    pub name: String,
    /// Raw level (hierarchy) or type (flow) string.
    pub kind: String,
    pub level: NodeLevel,
    pub parent_id: Option<String>,
    pub criticality: Option<Criticality>,
    pub system_code: Option<String>,
    pub system_count: Option<u32>,
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphEdge {
    pub eid: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub pattern: IntegrationPattern,
    pub pattern_label: String,
    pub frequency: String,
    pub role: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub index_by_id: HashMap<String, NodeId>,
    pub adjacency: Adjacency,
    /// Ids that appeared more than once; only the first record was kept.
    pub duplicates: Vec<String>,
    /// Links dropped for dangling endpoints or self loops.
    pub skipped_links: usize,
}

/// Absent or non-finite values mean 1; negative magnitudes clamp to 0.
pub fn link_value(raw: Option<f64>) -> f64 {
    match raw {
        Some(v) if v.is_finite() => v.max(0.0),
        _ => 1.0,
    }
}

impl GraphModel {
    pub fn from_hierarchy(records: &[HierarchyRecord]) -> Self {
        let mut ctx = ModelCtx::default();
        for r in records {
            ctx.push_node(GraphNode {
                nid: NodeId(0),
                id: r.id.clone(),
                name: r.name.clone(),
                kind: r.level.clone(),
                level: NodeLevel::parse(&r.level),
                parent_id: r.parent_id.clone().filter(|p| !p.is_empty()),
                criticality: None,
                system_code: r.system_code.clone(),
                system_count: r.system_count,
                metadata: r.metadata.clone(),
            });
        }
        let model = ctx.finish();
        debug!(
            "hierarchy model: {} nodes, {} duplicates",
            model.nodes.len(),
            model.duplicates.len()
        );
        model
    }

    pub fn from_flow(input: &FlowInput) -> Self {
        let mut ctx = ModelCtx::default();
        for n in &input.nodes {
            ctx.push_node(GraphNode {
                nid: NodeId(0),
                id: n.id.clone(),
                name: if n.name.is_empty() { n.id.clone() } else { n.name.clone() },
                kind: n.node_type.clone(),
                level: NodeLevel::parse(&n.node_type),
                parent_id: None,
                criticality: n.criticality.as_deref().map(Criticality::parse),
                system_code: None,
                system_count: None,
                metadata: None,
            });
        }

        for l in &input.links {
            let (Some(&from), Some(&to)) =
                (ctx.index_by_id.get(&l.source), ctx.index_by_id.get(&l.target))
            else {
                debug!("skipping link {} -> {}: unknown endpoint", l.source, l.target);
                ctx.skipped_links += 1;
                continue;
            };
            if from == to {
                debug!("skipping self link on {}", l.source);
                ctx.skipped_links += 1;
                continue;
            }
            let eid = EdgeId(ctx.edges.len());
            ctx.edges.push(GraphEdge {
                eid,
                from,
                to,
                pattern: IntegrationPattern::parse(&l.pattern),
                pattern_label: l.pattern.clone(),
                frequency: l.frequency.clone(),
                role: l.role.clone(),
                value: link_value(l.value),
            });
        }

        let model = ctx.finish();
        debug!(
            "flow model: {} nodes, {} edges, {} links skipped",
            model.nodes.len(),
            model.edges.len(),
            model.skipped_links
        );
        model
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index_by_id.get(id).map(|nid| &self.nodes[nid.0])
    }

    pub fn lookup(&self, id: &str) -> Option<NodeId> {
        self.index_by_id.get(id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Edges touching a node, in edge input order.
    pub fn incident_edges(&self, nid: NodeId) -> impl Iterator<Item = &GraphEdge> {
        self.adjacency
            .get_incident(nid)
            .iter()
            .map(move |eid| &self.edges[eid.0])
    }
}

impl GraphEdge {
    /// The endpoint that is not `nid`.
    pub fn other(&self, nid: NodeId) -> NodeId {
        if self.from == nid { self.to } else { self.from }
    }
}

#[derive(Default)]
struct ModelCtx {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    index_by_id: HashMap<String, NodeId>,
    duplicates: Vec<String>,
    skipped_links: usize,
}

impl ModelCtx {
    fn push_node(&mut self, mut node: GraphNode) {
        if self.index_by_id.contains_key(&node.id) {
            warn!("duplicate node id {:?}; keeping the first record", node.id);
            self.duplicates.push(node.id);
            return;
        }
        let nid = NodeId(self.nodes.len());
        node.nid = nid;
        self.index_by_id.insert(node.id.clone(), nid);
        self.nodes.push(node);
    }

    fn finish(self) -> GraphModel {
        let adjacency = Adjacency::from_edges(self.nodes.len(), &self.edges);
        GraphModel {
            nodes: self.nodes,
            edges: self.edges,
            index_by_id: self.index_by_id,
            adjacency,
            duplicates: self.duplicates,
            skipped_links: self.skipped_links,
        }
    }
}
