use super::{display_name, sort_by_score, GenerationContext};
use gaialab_core::model::{
    EdgeType, EvidenceItem, Hypothesis, HypothesisSubject, HypothesisType, NodeType,
};
use gaialab_core::numeric::{clamp01, mean};
use std::collections::BTreeSet;

pub const MIN_SCORE: f64 = 0.6;
pub const MAX_CANDIDATES: usize = 5;
pub const NOVELTY: f64 = 0.85;
const MAX_EVIDENCE_BOOST: f64 = 0.3;

/// Drugs without a `treats` edge to the disease whose targets overlap the
/// disease-associated genes.
pub fn generate(ctx: &GenerationContext<'_>) -> Vec<Hypothesis> {
    let graph = ctx.graph;
    let disease_id = ctx.disease_id();
    if !graph.contains(&disease_id) {
        return Vec::new();
    }

    let disease_genes: BTreeSet<&str> = graph
        .neighbors_via(&disease_id, EdgeType::AssociatedWith)
        .into_iter()
        .filter(|id| {
            graph
                .node(id)
                .is_some_and(|n| n.node_type == NodeType::Gene)
        })
        .collect();
    if disease_genes.is_empty() {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    for drug in graph.nodes_of_type(NodeType::Drug) {
        if graph.has_edge_between(&drug.id, &disease_id, EdgeType::Treats) {
            continue;
        }
        let targets = graph.neighbors_via(&drug.id, EdgeType::Targets);
        if targets.is_empty() {
            continue;
        }
        let overlap: Vec<&str> = targets.intersection(&disease_genes).copied().collect();
        if overlap.is_empty() {
            continue;
        }

        let association_weights: Vec<f64> = overlap
            .iter()
            .map(|gene| ctx.association_weight(gene).unwrap_or(0.0))
            .collect();
        let mean_association = mean(&association_weights);
        let overlap_ratio = overlap.len() as f64 / targets.len() as f64;
        let boost = (MAX_EVIDENCE_BOOST * mean_association).min(MAX_EVIDENCE_BOOST);
        let score = clamp01(overlap_ratio + boost);
        if score <= MIN_SCORE {
            continue;
        }

        let gene_names: Vec<String> = overlap.iter().map(|id| display_name(graph, id)).collect();
        let mut evidence: Vec<EvidenceItem> = overlap
            .iter()
            .flat_map(|gene| graph.edges_between(&drug.id, *gene, EdgeType::Targets))
            .map(|edge| {
                EvidenceItem::from_edge(
                    edge,
                    format!("{} targets {}", drug.name, display_name(graph, &edge.to)),
                )
            })
            .collect();
        for (gene, weight) in overlap.iter().zip(&association_weights) {
            evidence.push(
                EvidenceItem::new(
                    "knowledge_graph",
                    format!("{} is associated with {}", display_name(graph, gene), ctx.disease),
                )
                .weighted(*weight),
            );
        }

        let subject = HypothesisSubject {
            drug: Some(drug.name.clone()),
            disease: Some(ctx.disease.to_string()),
            drug_approved: drug.payload_bool("approved"),
            ..HypothesisSubject::default()
        };
        candidates.push(
            Hypothesis::candidate(
                HypothesisType::DrugRepurposing,
                format!("{} could be repurposed for {}", drug.name, ctx.disease),
                subject,
                format!(
                    "{} targets {} associated with {}",
                    drug.name,
                    gene_names.join(", "),
                    ctx.disease
                ),
                score,
                NOVELTY,
                evidence,
            )
            .with_direct_evidence(mean_association),
        );
    }

    sort_by_score(&mut candidates);
    candidates.truncate(MAX_CANDIDATES);
    candidates
}
