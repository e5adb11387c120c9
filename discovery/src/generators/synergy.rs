use super::{sort_by_score, GenerationContext};
use gaialab_core::model::{
    EdgeType, EvidenceItem, GraphNode, Hypothesis, HypothesisSubject, HypothesisType, NodeType,
};
use std::collections::BTreeSet;
use storage::KnowledgeGraph;

pub const MIN_SCORE: f64 = 0.7;
pub const MAX_CANDIDATES: usize = 3;
pub const NOVELTY: f64 = 0.95;
const RANKED_DRUGS: usize = 12;
const PAIRED_DRUGS: usize = 10;
const PHASE_FACTOR: f64 = 1.5;
const COMPLEMENTARITY_WEIGHT: f64 = 0.7;
const INTERACTION_WEIGHT: f64 = 0.3;

/// potency + 1.5 * phase, with phase normalized to `[0, 1]`.
fn drug_priority(drug: &GraphNode) -> f64 {
    let potency = drug.payload_f64("potency").unwrap_or(0.0);
    let phase = drug.payload_f64("max_phase").unwrap_or(0.0) / 4.0;
    potency + PHASE_FACTOR * phase
}

/// |A Δ B| / |A ∪ B|.
pub fn complementarity(a: &BTreeSet<&str>, b: &BTreeSet<&str>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.symmetric_difference(b).count() as f64 / union as f64
}

/// Strongest `interacts_with` edge between a target of one drug and a target
/// of the other.
pub fn cross_interaction(
    graph: &KnowledgeGraph,
    a: &BTreeSet<&str>,
    b: &BTreeSet<&str>,
) -> f64 {
    let mut best = 0.0_f64;
    for ta in a {
        for tb in b {
            if ta == tb {
                continue;
            }
            for edge in graph.edges_between(ta, tb, EdgeType::InteractsWith) {
                best = best.max(edge.weight);
            }
        }
    }
    best
}

pub fn generate(ctx: &GenerationContext<'_>) -> Vec<Hypothesis> {
    let graph = ctx.graph;

    let mut ranked: Vec<(&GraphNode, BTreeSet<&str>)> = graph
        .nodes_of_type(NodeType::Drug)
        .map(|drug| (drug, graph.neighbors_via(&drug.id, EdgeType::Targets)))
        .filter(|(_, targets)| !targets.is_empty())
        .collect();
    ranked.sort_by(|(a, _), (b, _)| drug_priority(b).total_cmp(&drug_priority(a)));
    ranked.truncate(RANKED_DRUGS);

    let paired = &ranked[..ranked.len().min(PAIRED_DRUGS)];
    let mut candidates = Vec::new();
    for (i, (drug_a, targets_a)) in paired.iter().enumerate() {
        for (drug_b, targets_b) in &paired[i + 1..] {
            let complement = complementarity(targets_a, targets_b);
            let interaction = cross_interaction(graph, targets_a, targets_b);
            let score = COMPLEMENTARITY_WEIGHT * complement + INTERACTION_WEIGHT * interaction;
            if score <= MIN_SCORE {
                continue;
            }

            let mut evidence = Vec::new();
            for (drug, targets) in [(drug_a, targets_a), (drug_b, targets_b)] {
                for target in targets {
                    for edge in graph.edges_between(&drug.id, target, EdgeType::Targets) {
                        evidence.push(EvidenceItem::from_edge(
                            edge,
                            format!("{} targets {target}", drug.name),
                        ));
                    }
                }
            }
            evidence.push(
                EvidenceItem::new(
                    "knowledge_graph",
                    format!(
                        "Target complementarity {complement:.2}, cross-target interaction {interaction:.2}"
                    ),
                )
                .weighted(score),
            );

            let subject = HypothesisSubject {
                drug: Some(drug_a.name.clone()),
                partner_drug: Some(drug_b.name.clone()),
                disease: Some(ctx.disease.to_string()),
                drug_approved: drug_a.payload_bool("approved") && drug_b.payload_bool("approved"),
                ..HypothesisSubject::default()
            };
            candidates.push(Hypothesis::candidate(
                HypothesisType::DrugSynergy,
                format!(
                    "{} and {} act synergistically against {}",
                    drug_a.name, drug_b.name, ctx.disease
                ),
                subject,
                format!(
                    "Complementary target coverage ({} + {} targets) with cross-talk between target sets",
                    targets_a.len(),
                    targets_b.len()
                ),
                score,
                NOVELTY,
                evidence,
            ));
        }
    }

    sort_by_score(&mut candidates);
    candidates.truncate(MAX_CANDIDATES);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complementarity_of_disjoint_and_identical_sets() {
        let a: BTreeSet<&str> = ["x", "y"].into_iter().collect();
        let b: BTreeSet<&str> = ["z"].into_iter().collect();
        assert_eq!(complementarity(&a, &b), 1.0);
        assert_eq!(complementarity(&a, &a), 0.0);
        let c: BTreeSet<&str> = ["y", "z"].into_iter().collect();
        assert!((complementarity(&a, &c) - 2.0 / 3.0).abs() < 1e-9);
    }
}
