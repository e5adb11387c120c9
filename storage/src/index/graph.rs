use gaialab_core::model::{EdgeType, GraphEdge, GraphNode, NodeType};
use gaialab_core::numeric::clamp01;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Per-request knowledge graph: node arena, flat edge list and an
/// id -> incident-edge index. Nodes keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    nodes: Vec<GraphNode>,
    node_index: HashMap<String, usize>,
    edges: Vec<GraphEdge>,
    incident: HashMap<String, Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes_by_type: BTreeMap<NodeType, usize>,
    pub edges_by_type: BTreeMap<EdgeType, usize>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node. Returns `false` (and keeps the existing node) when the id
    /// is already taken.
    pub fn add_node(&mut self, mut node: GraphNode) -> bool {
        if self.node_index.contains_key(&node.id) {
            return false;
        }
        node.degree = 0;
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Id of the node, creating it with `payload` if absent.
    pub fn ensure_node(&mut self, node_type: NodeType, name: &str, payload: Value) -> String {
        let node = GraphNode::new(node_type, name, payload);
        let id = node.id.clone();
        self.add_node(node);
        id
    }

    /// Append an edge after clamping its weight. Edges with a missing
    /// endpoint are rejected.
    pub fn add_edge(&mut self, mut edge: GraphEdge) -> bool {
        if !self.contains(&edge.from) || !self.contains(&edge.to) {
            return false;
        }
        edge.weight = clamp01(edge.weight);
        let idx = self.edges.len();
        self.incident.entry(edge.from.clone()).or_default().push(idx);
        if edge.to != edge.from {
            self.incident.entry(edge.to.clone()).or_default().push(idx);
        }
        self.edges.push(edge);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn nodes_of_type(&self, node_type: NodeType) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(move |n| n.node_type == node_type)
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn incident_edges<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.incident
            .get(id)
            .map(|idxs| idxs.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&idx| &self.edges[idx])
    }

    /// Incident edges of one type, in either direction.
    pub fn incident_of_type<'a>(
        &'a self,
        id: &str,
        edge_type: EdgeType,
    ) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.incident_edges(id)
            .filter(move |e| e.edge_type == edge_type)
    }

    /// 1-hop neighbor ids, regardless of edge type or direction.
    pub fn neighbors(&self, id: &str) -> BTreeSet<&str> {
        self.incident_edges(id)
            .filter_map(|e| e.other_end(id))
            .filter(|other| *other != id)
            .collect()
    }

    /// Neighbors reached through edges of `edge_type`.
    pub fn neighbors_via(&self, id: &str, edge_type: EdgeType) -> BTreeSet<&str> {
        self.incident_of_type(id, edge_type)
            .filter_map(|e| e.other_end(id))
            .filter(|other| *other != id)
            .collect()
    }

    /// All edges of `edge_type` joining `a` and `b`, in either direction.
    /// Parallel edges are returned individually.
    pub fn edges_between<'a>(
        &'a self,
        a: &'a str,
        b: &'a str,
        edge_type: EdgeType,
    ) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.incident_of_type(a, edge_type)
            .filter(move |e| e.connects(a, b))
    }

    pub fn has_edge_between(&self, a: &str, b: &str, edge_type: EdgeType) -> bool {
        self.edges_between(a, b, edge_type).next().is_some()
    }

    /// Rebuild every node's degree from the full edge list.
    pub fn recompute_degrees(&mut self) {
        for node in &mut self.nodes {
            node.degree = 0;
        }
        for edge in &self.edges {
            if let Some(&idx) = self.node_index.get(&edge.from) {
                self.nodes[idx].degree += 1;
            }
            if edge.to != edge.from {
                if let Some(&idx) = self.node_index.get(&edge.to) {
                    self.nodes[idx].degree += 1;
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn summary(&self) -> GraphSummary {
        let mut summary = GraphSummary {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            ..GraphSummary::default()
        };
        for node in &self.nodes {
            *summary.nodes_by_type.entry(node.node_type).or_default() += 1;
        }
        for edge in &self.edges {
            *summary.edges_by_type.entry(edge.edge_type).or_default() += 1;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from: &str, to: &str, edge_type: EdgeType, weight: f64) -> GraphEdge {
        GraphEdge::new(from, to, edge_type, weight, "test", "test")
    }

    #[test]
    fn test_node_ids_are_unique() {
        let mut graph = KnowledgeGraph::new();
        assert!(graph.add_node(GraphNode::new(NodeType::Gene, "TP53", Value::Null)));
        assert!(!graph.add_node(GraphNode::new(NodeType::Gene, "TP53", Value::Null)));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_edge_weight_is_clamped_and_dangling_edges_rejected() {
        let mut graph = KnowledgeGraph::new();
        let a = graph.ensure_node(NodeType::Gene, "A", Value::Null);
        let b = graph.ensure_node(NodeType::Gene, "B", Value::Null);

        assert!(graph.add_edge(edge(&a, &b, EdgeType::InteractsWith, 1.4)));
        assert!(!graph.add_edge(edge(&a, "gene:missing", EdgeType::InteractsWith, 0.5)));
        assert_eq!(graph.edges()[0].weight, 1.0);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_neighbors_are_undirected() {
        let mut graph = KnowledgeGraph::new();
        let a = graph.ensure_node(NodeType::Gene, "A", Value::Null);
        let b = graph.ensure_node(NodeType::Gene, "B", Value::Null);
        let p = graph.ensure_node(NodeType::Pathway, "P", Value::Null);
        graph.add_edge(edge(&a, &b, EdgeType::InteractsWith, 0.9));
        graph.add_edge(edge(&b, &p, EdgeType::ParticipatesIn, 0.5));

        let neighbors = graph.neighbors(&b);
        assert_eq!(neighbors.len(), 2);
        assert!(neighbors.contains(a.as_str()));
        assert!(neighbors.contains(p.as_str()));
        assert_eq!(graph.neighbors_via(&b, EdgeType::ParticipatesIn).len(), 1);
    }

    #[test]
    fn test_parallel_edges_are_kept_and_degrees_recomputed() {
        let mut graph = KnowledgeGraph::new();
        let g = graph.ensure_node(NodeType::Gene, "BRCA1", Value::Null);
        let d = graph.ensure_node(NodeType::Disease, "breast cancer", Value::Null);
        graph.add_edge(edge(&g, &d, EdgeType::AssociatedWith, 0.8));
        graph.add_edge(edge(&g, &d, EdgeType::AssociatedWith, 0.6));
        graph.recompute_degrees();

        assert_eq!(graph.edges_between(&d, &g, EdgeType::AssociatedWith).count(), 2);
        assert_eq!(graph.node(&g).unwrap().degree, 2);
        assert_eq!(graph.node(&d).unwrap().degree, 2);

        let summary = graph.summary();
        assert_eq!(summary.edges_by_type[&EdgeType::AssociatedWith], 2);
        assert_eq!(summary.nodes_by_type[&NodeType::Gene], 1);
    }
}
