use crate::classifier::AnnotatedPaper;
use crate::fetch::UpstreamSnapshot;
use gaialab_core::ingest::{DrugCollection, DrugRecord, GeneRecord};
use gaialab_core::model::{
    gene_node_id, node_id, normalize_symbol, EdgeEvidence, EdgeType, GraphEdge, NodeType,
};
use gaialab_core::numeric::{clamp01, finite_or_zero, parse_weight};
use regex::Regex;
use serde_json::json;
use std::collections::HashMap;
use storage::KnowledgeGraph;
use tracing::{debug, info};

const DEFAULT_PATHWAY_WEIGHT: f64 = 0.5;
const DEFAULT_TARGET_WEIGHT: f64 = 0.5;
const VALIDATED_INTERACTION_BONUS: f64 = 0.1;
const CROSS_VALIDATED_BONUS: f64 = 0.15;
const TITLE_MENTION_WEIGHT: f64 = 0.6;
const ABSTRACT_MENTION_WEIGHT: f64 = 0.3;

/// Drug merged across upstream sources.
#[derive(Debug, Clone)]
struct MergedDrug {
    record: DrugRecord,
    sources: Vec<String>,
}

/// Assembles the per-request knowledge graph from a fetched snapshot.
///
/// Construction never fails: a collection missing from the snapshot simply
/// contributes no nodes or edges.
#[derive(Debug, Clone)]
pub struct KnowledgeGraphBuilder {
    genes: Vec<String>,
    disease: String,
}

impl KnowledgeGraphBuilder {
    pub fn new(genes: &[String], disease: impl Into<String>) -> Self {
        let genes = genes
            .iter()
            .map(|g| normalize_symbol(g))
            .filter(|g| !g.is_empty())
            .collect();
        Self {
            genes,
            disease: disease.into().trim().to_string(),
        }
    }

    pub fn disease_id(&self) -> String {
        node_id(NodeType::Disease, &self.disease)
    }

    pub fn build(&self, snapshot: &UpstreamSnapshot, papers: &[AnnotatedPaper]) -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();

        let input_genes = self.seed_genes(&mut graph, &snapshot.genes);
        self.add_pathways(&mut graph, snapshot, &input_genes);
        let drugs = dedupe_drugs(&snapshot.drugs);
        self.add_drug_targets(&mut graph, &drugs);
        self.add_interactions(&mut graph, snapshot);

        let disease_id = graph.ensure_node(
            NodeType::Disease,
            &self.disease,
            json!({ "label": self.disease }),
        );
        self.add_treats(&mut graph, &drugs, &disease_id);
        self.add_clinical(&mut graph, snapshot, &disease_id);
        self.add_literature(&mut graph, papers, &disease_id);

        graph.recompute_degrees();

        let summary = graph.summary();
        info!(
            "Knowledge graph built for {} ({} genes): {} nodes, {} edges",
            self.disease,
            self.genes.len(),
            summary.node_count,
            summary.edge_count
        );
        debug!(
            "Graph composition: nodes {:?}, edges {:?}",
            summary.nodes_by_type, summary.edges_by_type
        );
        graph
    }

    /// One gene node per input gene. Returns normalized symbol -> node id.
    fn seed_genes(
        &self,
        graph: &mut KnowledgeGraph,
        annotations: &[GeneRecord],
    ) -> HashMap<String, String> {
        let by_symbol: HashMap<String, &GeneRecord> = annotations
            .iter()
            .map(|a| (normalize_symbol(&a.symbol), a))
            .collect();

        let mut input_genes = HashMap::new();
        for gene in &self.genes {
            let payload = match by_symbol.get(gene) {
                Some(annotation) => json!({
                    "input": true,
                    "full_name": annotation.name,
                    "description": annotation.description,
                    "source": annotation.source,
                }),
                None => json!({ "input": true }),
            };
            let id = graph.ensure_node(NodeType::Gene, gene, payload);
            input_genes.insert(gene.clone(), id);
        }
        input_genes
    }

    fn add_pathways(
        &self,
        graph: &mut KnowledgeGraph,
        snapshot: &UpstreamSnapshot,
        input_genes: &HashMap<String, String>,
    ) {
        for pathway in &snapshot.pathways {
            let weight = parse_weight(
                pathway
                    .p_value
                    .filter(|p| *p > 0.0)
                    .map(|p| -p.log10() / 10.0),
                DEFAULT_PATHWAY_WEIGHT,
            );
            let pathway_node = graph.ensure_node(
                NodeType::Pathway,
                &pathway.name,
                json!({
                    "pathway_id": pathway.id,
                    "p_value": pathway.p_value,
                    "source": pathway.source,
                    "genes": pathway.genes,
                }),
            );
            for gene in &pathway.genes {
                if let Some(gene_id) = input_genes.get(&normalize_symbol(gene)) {
                    graph.add_edge(GraphEdge::new(
                        gene_id.clone(),
                        pathway_node.clone(),
                        EdgeType::ParticipatesIn,
                        weight,
                        pathway.source.clone(),
                        "pathway_enrichment",
                    ));
                }
            }
        }
    }

    fn add_drug_targets(&self, graph: &mut KnowledgeGraph, drugs: &[MergedDrug]) {
        for drug in drugs {
            let record = &drug.record;
            let drug_id = graph.ensure_node(
                NodeType::Drug,
                &record.name,
                json!({
                    "potency": record.potency,
                    "max_phase": record.max_phase,
                    "approved": record.approved,
                    "indications": record.indications,
                    "sources": drug.sources,
                }),
            );
            let weight = parse_weight(
                record
                    .potency
                    .filter(|p| p.is_finite())
                    .or_else(|| record.max_phase.filter(|p| p.is_finite()).map(|p| p / 4.0)),
                DEFAULT_TARGET_WEIGHT,
            );

            for target in &record.targets {
                let target_id = resolve_symbol(graph, target);
                graph.add_edge(GraphEdge::new(
                    drug_id.clone(),
                    target_id,
                    EdgeType::Targets,
                    weight,
                    drug.sources.join(","),
                    "drug_target",
                ));
            }
        }
    }

    fn add_interactions(&self, graph: &mut KnowledgeGraph, snapshot: &UpstreamSnapshot) {
        for interaction in &snapshot.interactions {
            if normalize_symbol(&interaction.gene_a) == normalize_symbol(&interaction.gene_b) {
                continue;
            }
            let raw = finite_or_zero(interaction.confidence);
            let mut confidence = if raw > 1.0 { raw / 1000.0 } else { raw };
            if interaction.validated {
                confidence += VALIDATED_INTERACTION_BONUS;
            }
            let a = resolve_symbol(graph, &interaction.gene_a);
            let b = resolve_symbol(graph, &interaction.gene_b);
            graph.add_edge(
                GraphEdge::new(
                    a,
                    b,
                    EdgeType::InteractsWith,
                    confidence,
                    interaction.source.clone(),
                    "protein_interaction",
                )
                .with_evidence(EdgeEvidence {
                    validated: interaction.validated,
                    confidence: clamp01(confidence),
                    pmid: None,
                    polarity: None,
                }),
            );
        }
    }

    fn add_treats(&self, graph: &mut KnowledgeGraph, drugs: &[MergedDrug], disease_id: &str) {
        let disease = self.disease.to_lowercase();
        if disease.is_empty() {
            return;
        }
        for drug in drugs {
            let record = &drug.record;
            let indicated = record
                .indications
                .iter()
                .any(|i| i.to_lowercase().contains(&disease));
            if !indicated {
                continue;
            }
            let weight = if record.approved {
                1.0
            } else {
                clamp01(record.max_phase.map(finite_or_zero).unwrap_or(0.0) / 4.0)
            };
            graph.add_edge(GraphEdge::new(
                node_id(NodeType::Drug, &record.name),
                disease_id,
                EdgeType::Treats,
                weight,
                drug.sources.join(","),
                "drug_indication",
            ));
        }
    }

    fn add_clinical(&self, graph: &mut KnowledgeGraph, snapshot: &UpstreamSnapshot, disease_id: &str) {
        for record in &snapshot.clinical {
            let gene_id = resolve_symbol(graph, &record.gene);
            let mut score = finite_or_zero(record.score);
            if record.cross_validated {
                score += CROSS_VALIDATED_BONUS;
            }
            graph.add_edge(
                GraphEdge::new(
                    gene_id,
                    disease_id,
                    EdgeType::AssociatedWith,
                    score,
                    record.source.clone(),
                    "clinical_association",
                )
                .with_evidence(EdgeEvidence {
                    validated: record.cross_validated,
                    confidence: clamp01(record.score),
                    pmid: record.pmid.clone(),
                    polarity: None,
                }),
            );
        }
    }

    /// Co-mention edges, one per (paper, input gene). Kept apart from clinical
    /// edges even when both join the same pair.
    fn add_literature(&self, graph: &mut KnowledgeGraph, papers: &[AnnotatedPaper], disease_id: &str) {
        let matchers: Vec<(String, Regex)> = self
            .genes
            .iter()
            .filter_map(|gene| {
                let pattern = format!(r"\b{}\b", regex::escape(gene));
                Regex::new(&pattern)
                    .ok()
                    .map(|re| (gene_node_id(gene), re))
            })
            .collect();

        for paper in papers {
            let record = &paper.record;
            for (gene_id, matcher) in &matchers {
                let weight = if matcher.is_match(&record.title) {
                    TITLE_MENTION_WEIGHT
                } else if matcher.is_match(&record.abstract_text) {
                    ABSTRACT_MENTION_WEIGHT
                } else {
                    continue;
                };
                graph.add_edge(
                    GraphEdge::new(
                        gene_id.clone(),
                        disease_id,
                        EdgeType::AssociatedWith,
                        weight,
                        "literature",
                        "literature",
                    )
                    .with_evidence(EdgeEvidence {
                        validated: false,
                        confidence: weight,
                        pmid: Some(record.pmid.clone()),
                        polarity: Some(paper.classification.polarity),
                    }),
                );
            }
        }
    }
}

/// Gene node if one exists, else protein node, creating the protein if needed.
/// Symbols are matched case-insensitively.
fn resolve_symbol(graph: &mut KnowledgeGraph, symbol: &str) -> String {
    let symbol = normalize_symbol(symbol);
    let gene_id = gene_node_id(&symbol);
    if graph.contains(&gene_id) {
        return gene_id;
    }
    graph.ensure_node(NodeType::Protein, &symbol, json!({ "symbol": symbol }))
}

/// Flatten all drug sources, merging by case-insensitive name. First-seen
/// order and spelling win.
fn dedupe_drugs(collections: &[DrugCollection]) -> Vec<MergedDrug> {
    let mut merged: Vec<MergedDrug> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for collection in collections {
        for drug in &collection.drugs {
            let key = drug.name.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            match by_name.get(&key) {
                Some(&idx) => {
                    let existing = &mut merged[idx];
                    for target in &drug.targets {
                        if !existing
                            .record
                            .targets
                            .iter()
                            .any(|t| t.eq_ignore_ascii_case(target))
                        {
                            existing.record.targets.push(target.clone());
                        }
                    }
                    existing.record.potency = max_option(existing.record.potency, drug.potency);
                    existing.record.max_phase =
                        max_option(existing.record.max_phase, drug.max_phase);
                    existing.record.approved |= drug.approved;
                    for indication in &drug.indications {
                        if !existing.record.indications.contains(indication) {
                            existing.record.indications.push(indication.clone());
                        }
                    }
                    if !existing.sources.contains(&collection.source) {
                        existing.sources.push(collection.source.clone());
                    }
                }
                None => {
                    let mut record = drug.clone();
                    record.name = drug.name.trim().to_string();
                    by_name.insert(key, merged.len());
                    merged.push(MergedDrug {
                        record,
                        sources: vec![collection.source.clone()],
                    });
                }
            }
        }
    }
    merged
}

fn max_option(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a.filter(|v| v.is_finite()), b.filter(|v| v.is_finite())) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, y) => x.or(y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_merges_case_insensitively() {
        let mut a = DrugRecord::new("Olaparib", vec!["PARP1".to_string()]);
        a.potency = Some(0.4);
        a.max_phase = Some(4.0);
        let mut b = DrugRecord::new("OLAPARIB", vec!["PARP2".to_string(), "parp1".to_string()]);
        b.potency = Some(0.9);
        b.approved = true;

        let merged = dedupe_drugs(&[
            DrugCollection {
                source: "chembl".to_string(),
                drugs: vec![a],
            },
            DrugCollection {
                source: "dgidb".to_string(),
                drugs: vec![b],
            },
        ]);

        assert_eq!(merged.len(), 1);
        let drug = &merged[0];
        assert_eq!(drug.record.name, "Olaparib");
        assert_eq!(drug.record.targets, vec!["PARP1", "PARP2"]);
        assert_eq!(drug.record.potency, Some(0.9));
        assert_eq!(drug.record.max_phase, Some(4.0));
        assert!(drug.record.approved);
        assert_eq!(drug.sources, vec!["chembl", "dgidb"]);
    }

    #[test]
    fn test_symbol_prefers_gene_then_protein() {
        let mut graph = KnowledgeGraph::new();
        graph.ensure_node(NodeType::Gene, "TP53", json!({}));
        assert_eq!(resolve_symbol(&mut graph, "TP53"), "gene:TP53");
        assert_eq!(resolve_symbol(&mut graph, "MDM2"), "protein:MDM2");
        assert_eq!(resolve_symbol(&mut graph, "MDM2"), "protein:MDM2");
        assert_eq!(resolve_symbol(&mut graph, "tp53"), "gene:TP53");
        assert_eq!(resolve_symbol(&mut graph, " mdm2"), "protein:MDM2");
        assert_eq!(graph.node_count(), 2);
    }
}
