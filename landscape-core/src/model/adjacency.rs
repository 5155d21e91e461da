// Adjacency and edge weight computation for the flow and network engines.
//
// Builds data structures that describe node connectivity, used to:
// 1. Classify nodes by what they touch (middleware, the pinned node)
// 2. Walk incident edges in input order (base key derivation)
// 3. Weight relaxation in the flow layout
// 4. Produce per-node degree for the network view

use std::collections::HashMap;

use super::graph::{EdgeId, GraphEdge, NodeId};

/// Adjacency information for one graph.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    /// For each node, list of (neighbor, edge_count).
    /// Edges are counted bidirectionally (both from→to and to→from).
    pub neighbors: HashMap<NodeId, Vec<(NodeId, usize)>>,

    /// Total degree (edge count) per node.
    pub degree: HashMap<NodeId, usize>,

    /// Incident edges per node, in edge input order.
    pub incident: Vec<Vec<EdgeId>>,
}

impl Adjacency {
    /// Build adjacency from a model's edges.
    pub fn from_edges(node_count: usize, edges: &[GraphEdge]) -> Self {
        // Count edges between pairs
        let mut pair_counts: HashMap<(NodeId, NodeId), usize> = HashMap::new();
        let mut incident: Vec<Vec<EdgeId>> = vec![Vec::new(); node_count];

        for edge in edges {
            // Normalize pair order for bidirectional counting
            let pair = if edge.from.0 <= edge.to.0 {
                (edge.from, edge.to)
            } else {
                (edge.to, edge.from)
            };
            *pair_counts.entry(pair).or_default() += 1;

            if let Some(list) = incident.get_mut(edge.from.0) {
                list.push(edge.eid);
            }
            if edge.to != edge.from {
                if let Some(list) = incident.get_mut(edge.to.0) {
                    list.push(edge.eid);
                }
            }
        }

        let mut neighbors: HashMap<NodeId, Vec<(NodeId, usize)>> = HashMap::new();
        let mut degree: HashMap<NodeId, usize> = HashMap::new();

        for ((a, b), count) in pair_counts {
            neighbors.entry(a).or_default().push((b, count));
            if a != b {
                neighbors.entry(b).or_default().push((a, count));
            }

            *degree.entry(a).or_default() += count;
            if a != b {
                *degree.entry(b).or_default() += count;
            }
        }

        // HashMap iteration order is arbitrary; sort so callers are deterministic.
        for list in neighbors.values_mut() {
            list.sort_by_key(|(nid, _)| *nid);
        }

        Self { neighbors, degree, incident }
    }

    /// Get the neighbors of a node, or empty slice if none.
    pub fn get_neighbors(&self, nid: NodeId) -> &[(NodeId, usize)] {
        self.neighbors.get(&nid).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Get total degree (edge count) for a node.
    pub fn get_degree(&self, nid: NodeId) -> usize {
        self.degree.get(&nid).copied().unwrap_or(0)
    }

    pub fn get_incident(&self, nid: NodeId) -> &[EdgeId] {
        self.incident.get(nid.0).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn are_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.get_neighbors(a).iter().any(|(n, _)| *n == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::graph::IntegrationPattern;

    fn edge(eid: usize, from: usize, to: usize) -> GraphEdge {
        GraphEdge {
            eid: EdgeId(eid),
            from: NodeId(from),
            to: NodeId(to),
            pattern: IntegrationPattern::Api,
            pattern_label: "API".to_string(),
            frequency: String::new(),
            role: String::new(),
            value: 1.0,
        }
    }

    #[test]
    fn test_adjacency_degrees() {
        // A -> B -> C, plus a second A -> B
        let edges = vec![edge(0, 0, 1), edge(1, 1, 2), edge(2, 0, 1)];
        let adj = Adjacency::from_edges(3, &edges);

        assert_eq!(adj.get_degree(NodeId(0)), 2);
        assert_eq!(adj.get_degree(NodeId(1)), 3);
        assert_eq!(adj.get_degree(NodeId(2)), 1);
        assert_eq!(adj.get_neighbors(NodeId(1)), &[(NodeId(0), 2), (NodeId(2), 1)]);
        assert!(adj.are_adjacent(NodeId(2), NodeId(1)));
        assert!(!adj.are_adjacent(NodeId(0), NodeId(2)));
    }

    #[test]
    fn test_incident_keeps_edge_order() {
        let edges = vec![edge(0, 1, 2), edge(1, 0, 1), edge(2, 1, 3)];
        let adj = Adjacency::from_edges(4, &edges);
        assert_eq!(adj.get_incident(NodeId(1)), &[EdgeId(0), EdgeId(1), EdgeId(2)]);
        assert_eq!(adj.get_incident(NodeId(3)), &[EdgeId(2)]);
        assert!(adj.get_incident(NodeId(9)).is_empty());
    }
}
