//! Candidate hypothesis generators.
//!
//! Each generator is a pure function over the per-request graph. Candidates
//! leave here with a generator score, novelty and evidence; confidence and
//! ranking are assigned later by the scorer.

pub mod link_prediction;
pub mod pathway;
pub mod repurposing;
pub mod synergy;

use gaialab_core::model::{gene_node_id, node_id, EdgeType, Hypothesis, NodeType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use storage::KnowledgeGraph;
use tracing::debug;

pub struct GenerationContext<'a> {
    pub graph: &'a KnowledgeGraph,
    pub genes: &'a [String],
    pub disease: &'a str,
}

impl<'a> GenerationContext<'a> {
    pub fn new(graph: &'a KnowledgeGraph, genes: &'a [String], disease: &'a str) -> Self {
        Self {
            graph,
            genes,
            disease,
        }
    }

    pub fn disease_id(&self) -> String {
        node_id(NodeType::Disease, self.disease.trim())
    }

    /// Node ids of the input genes present in the graph, in input order.
    pub fn input_gene_ids(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.genes
            .iter()
            .map(|g| gene_node_id(g))
            .filter(|id| self.graph.contains(id))
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }

    /// Strongest `associated_with` weight between `node` and the disease.
    pub fn association_weight(&self, node: &str) -> Option<f64> {
        let disease_id = self.disease_id();
        self.graph
            .edges_between(node, &disease_id, EdgeType::AssociatedWith)
            .map(|e| e.weight)
            .fold(None, |best: Option<f64>, w| Some(best.map_or(w, |b| b.max(w))))
    }
}

/// Display name of a node, falling back to the id.
pub(crate) fn display_name(graph: &KnowledgeGraph, id: &str) -> String {
    graph
        .node(id)
        .map(|n| n.name.clone())
        .unwrap_or_else(|| id.to_string())
}

/// Descending by score; equal scores keep insertion order.
pub(crate) fn sort_by_score(candidates: &mut [Hypothesis]) {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCounts {
    pub gene_disease_link: usize,
    pub drug_repurposing: usize,
    pub drug_synergy: usize,
    pub pathway_involvement: usize,
}

impl CandidateCounts {
    pub fn total(&self) -> usize {
        self.gene_disease_link + self.drug_repurposing + self.drug_synergy + self.pathway_involvement
    }
}

/// Run all four generators in a fixed order.
pub fn generate_candidates(ctx: &GenerationContext<'_>) -> (Vec<Hypothesis>, CandidateCounts) {
    let links = link_prediction::generate(ctx);
    let repurposing = repurposing::generate(ctx);
    let synergy = synergy::generate(ctx);
    let pathways = pathway::generate(ctx);

    let counts = CandidateCounts {
        gene_disease_link: links.len(),
        drug_repurposing: repurposing.len(),
        drug_synergy: synergy.len(),
        pathway_involvement: pathways.len(),
    };
    debug!("Generated candidates: {:?}", counts);

    let mut candidates = Vec::with_capacity(counts.total());
    candidates.extend(links);
    candidates.extend(repurposing);
    candidates.extend(synergy);
    candidates.extend(pathways);
    (candidates, counts)
}
