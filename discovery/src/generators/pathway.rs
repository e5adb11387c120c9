use super::{display_name, sort_by_score, GenerationContext};
use gaialab_core::model::{
    EdgeType, EvidenceItem, Hypothesis, HypothesisSubject, HypothesisType, NodeType,
};
use gaialab_core::numeric::mean;
use std::collections::BTreeSet;

pub const MIN_SCORE: f64 = 0.6;
pub const MAX_CANDIDATES: usize = 5;
pub const NOVELTY: f64 = 0.75;

/// Pathways covering a large share of the input genes.
pub fn generate(ctx: &GenerationContext<'_>) -> Vec<Hypothesis> {
    let graph = ctx.graph;
    let input_ids = ctx.input_gene_ids();
    if input_ids.is_empty() {
        return Vec::new();
    }
    let inputs: BTreeSet<&str> = input_ids.iter().map(String::as_str).collect();

    let mut candidates = Vec::new();
    for pathway in graph.nodes_of_type(NodeType::Pathway) {
        let members: Vec<&str> = graph
            .neighbors_via(&pathway.id, EdgeType::ParticipatesIn)
            .into_iter()
            .filter(|id| inputs.contains(id))
            .collect();
        let coverage = members.len() as f64 / inputs.len() as f64;
        if coverage <= MIN_SCORE {
            continue;
        }

        let mut evidence = Vec::new();
        for gene in &members {
            for edge in graph.edges_between(gene, &pathway.id, EdgeType::ParticipatesIn) {
                evidence.push(EvidenceItem::from_edge(
                    edge,
                    format!("{} participates in {}", display_name(graph, gene), pathway.name),
                ));
            }
        }
        let enrichment = mean(
            &evidence
                .iter()
                .filter_map(|e| e.weight)
                .collect::<Vec<_>>(),
        );
        let gene_names: Vec<String> = members.iter().map(|id| display_name(graph, id)).collect();

        let subject = HypothesisSubject {
            pathway: Some(pathway.name.clone()),
            disease: Some(ctx.disease.to_string()),
            ..HypothesisSubject::default()
        };
        candidates.push(
            Hypothesis::candidate(
                HypothesisType::PathwayInvolvement,
                format!("{} is dysregulated in {}", pathway.name, ctx.disease),
                subject,
                format!(
                    "{} of {} input genes ({}) participate in {}",
                    members.len(),
                    inputs.len(),
                    gene_names.join(", "),
                    pathway.name
                ),
                coverage,
                NOVELTY,
                evidence,
            )
            .with_direct_evidence(enrichment),
        );
    }

    sort_by_score(&mut candidates);
    candidates.truncate(MAX_CANDIDATES);
    candidates
}
