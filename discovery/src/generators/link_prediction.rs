use super::{display_name, sort_by_score, GenerationContext};
use gaialab_core::model::{
    EdgeType, EvidenceItem, Hypothesis, HypothesisSubject, HypothesisType,
};
use gaialab_core::numeric::clamp01;
use std::collections::BTreeSet;

pub const MIN_SCORE: f64 = 0.45;
pub const MIN_NOVELTY: f64 = 0.5;
const MAX_SHARED_NAMES: usize = 3;

/// Direct gene-disease association evidence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectAssociation {
    pub max_weight: f64,
    pub source_count: usize,
    pub validated_count: usize,
    pub evidence: Vec<EvidenceItem>,
}

impl DirectAssociation {
    pub fn novelty(&self) -> f64 {
        if self.source_count == 0 {
            0.9
        } else if self.max_weight <= 0.2 && self.source_count <= 1 {
            0.75
        } else if self.max_weight <= 0.5 && self.source_count <= 3 {
            0.6
        } else {
            0.3
        }
    }
}

pub fn direct_association(ctx: &GenerationContext<'_>, gene_id: &str) -> DirectAssociation {
    let disease_id = ctx.disease_id();
    let mut summary = DirectAssociation::default();
    for edge in ctx
        .graph
        .edges_between(gene_id, &disease_id, EdgeType::AssociatedWith)
    {
        summary.max_weight = summary.max_weight.max(edge.weight);
        summary.source_count += 1;
        if edge.evidence.as_ref().is_some_and(|e| e.validated) {
            summary.validated_count += 1;
        }
        let description = match edge.evidence.as_ref().and_then(|e| e.pmid.as_deref()) {
            Some(pmid) => format!("{} association (PMID {pmid})", edge.source_type),
            None => format!("{} association from {}", edge.source_type, edge.source),
        };
        summary.evidence.push(EvidenceItem::from_edge(edge, description));
    }
    summary
}

/// Jaccard similarity of the two raw neighbor sets.
pub fn jaccard(a: &BTreeSet<&str>, b: &BTreeSet<&str>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

pub fn generate(ctx: &GenerationContext<'_>) -> Vec<Hypothesis> {
    let disease_id = ctx.disease_id();
    if !ctx.graph.contains(&disease_id) {
        return Vec::new();
    }
    let disease_neighbors = ctx.graph.neighbors(&disease_id);

    let mut candidates = Vec::new();
    for gene_id in ctx.input_gene_ids() {
        let direct = direct_association(ctx, &gene_id);
        let gene_neighbors = ctx.graph.neighbors(&gene_id);
        let similarity = jaccard(&gene_neighbors, &disease_neighbors);
        let indirect = clamp01(similarity * 2.0);
        let score = direct.max_weight.max(indirect);
        let novelty = direct.novelty();
        if score <= MIN_SCORE || novelty < MIN_NOVELTY {
            continue;
        }

        let gene = display_name(ctx.graph, &gene_id);
        let shared: Vec<String> = gene_neighbors
            .intersection(&disease_neighbors)
            .take(MAX_SHARED_NAMES)
            .map(|id| display_name(ctx.graph, id))
            .collect();

        let mechanism = if indirect >= direct.max_weight && !shared.is_empty() {
            format!(
                "{gene} shares network neighbors with {} ({})",
                ctx.disease,
                shared.join(", ")
            )
        } else {
            format!(
                "Direct association evidence from {} source(s), {} validated",
                direct.source_count, direct.validated_count
            )
        };

        let mut evidence = direct.evidence.clone();
        if indirect > 0.0 {
            evidence.push(
                EvidenceItem::new(
                    "knowledge_graph",
                    format!("Neighbor overlap with {} (Jaccard {similarity:.2})", ctx.disease),
                )
                .weighted(indirect),
            );
        }

        let subject = HypothesisSubject {
            gene: Some(gene.clone()),
            disease: Some(ctx.disease.to_string()),
            ..HypothesisSubject::default()
        };
        candidates.push(
            Hypothesis::candidate(
                HypothesisType::GeneDiseaseLink,
                format!("{gene} contributes to {} pathogenesis", ctx.disease),
                subject,
                mechanism,
                score,
                novelty,
                evidence,
            )
            .with_direct_evidence(direct.max_weight),
        );
    }

    sort_by_score(&mut candidates);
    candidates
}
