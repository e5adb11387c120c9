use discovery::generators::{
    generate_candidates, link_prediction, pathway, repurposing, synergy, GenerationContext,
};
use gaialab_core::model::{node_id, EdgeType, GraphEdge, HypothesisType, NodeType};
use serde_json::{json, Value};
use storage::KnowledgeGraph;

const DISEASE: &str = "breast cancer";

fn genes() -> Vec<String> {
    vec!["BRCA1".to_string(), "TP53".to_string()]
}

fn edge(from: &str, to: &str, edge_type: EdgeType, weight: f64) -> GraphEdge {
    GraphEdge::new(from, to, edge_type, weight, "fixture", "fixture")
}

/// BRCA1 is a known disease gene; TP53 is only linked through the network.
/// Olaparib already treats the disease, Talazoparib does not.
fn fixture_graph() -> KnowledgeGraph {
    let mut graph = KnowledgeGraph::new();
    let brca1 = graph.ensure_node(NodeType::Gene, "BRCA1", json!({ "input": true }));
    let tp53 = graph.ensure_node(NodeType::Gene, "TP53", json!({ "input": true }));
    let disease = graph.ensure_node(NodeType::Disease, DISEASE, Value::Null);
    let talazoparib =
        graph.ensure_node(NodeType::Drug, "Talazoparib", json!({ "potency": 0.9 }));
    let olaparib = graph.ensure_node(
        NodeType::Drug,
        "Olaparib",
        json!({ "max_phase": 4.0, "approved": true }),
    );
    let idasanutlin =
        graph.ensure_node(NodeType::Drug, "Idasanutlin", json!({ "max_phase": 3.0 }));
    let repair = graph.ensure_node(NodeType::Pathway, "DNA repair", Value::Null);

    graph.add_edge(edge(&brca1, &disease, EdgeType::AssociatedWith, 0.8));
    graph.add_edge(edge(&talazoparib, &brca1, EdgeType::Targets, 0.9));
    graph.add_edge(edge(&olaparib, &brca1, EdgeType::Targets, 1.0));
    graph.add_edge(edge(&olaparib, &disease, EdgeType::Treats, 1.0));
    graph.add_edge(edge(&idasanutlin, &tp53, EdgeType::Targets, 0.75));
    graph.add_edge(edge(&brca1, &tp53, EdgeType::InteractsWith, 0.6));
    graph.add_edge(edge(&brca1, &repair, EdgeType::ParticipatesIn, 0.5));
    graph.add_edge(edge(&tp53, &repair, EdgeType::ParticipatesIn, 0.5));
    graph.recompute_degrees();
    graph
}

#[test]
fn test_repurposing_scores_overlap_with_association_boost() {
    let graph = fixture_graph();
    let genes = genes();
    let ctx = GenerationContext::new(&graph, &genes, DISEASE);

    let candidates = repurposing::generate(&ctx);
    assert_eq!(candidates.len(), 1);
    let h = &candidates[0];
    assert_eq!(h.hypothesis_type, HypothesisType::DrugRepurposing);
    assert_eq!(h.subject.drug.as_deref(), Some("Talazoparib"));
    // overlap ratio 1.0, association 0.8
    assert!(h.score >= 0.8);
    assert!(h.score > repurposing::MIN_SCORE);
    assert!((h.direct_evidence_score - 0.8).abs() < 1e-9);
    assert_eq!(h.novelty, repurposing::NOVELTY);
}

#[test]
fn test_repurposing_never_proposes_existing_treatments() {
    let graph = fixture_graph();
    let genes = genes();
    let ctx = GenerationContext::new(&graph, &genes, DISEASE);

    let (candidates, _) = generate_candidates(&ctx);
    let treating: Vec<String> = graph
        .neighbors_via(&node_id(NodeType::Disease, DISEASE), EdgeType::Treats)
        .into_iter()
        .filter_map(|id| graph.node(id).map(|n| n.name.clone()))
        .collect();
    assert_eq!(treating, vec!["Olaparib".to_string()]);

    for h in candidates
        .iter()
        .filter(|h| h.hypothesis_type == HypothesisType::DrugRepurposing)
    {
        let drug = h.subject.drug.clone().unwrap_or_default();
        assert!(!treating.contains(&drug), "{drug} already treats {DISEASE}");
    }
}

#[test]
fn test_link_prediction_skips_well_known_genes() {
    let graph = fixture_graph();
    let genes = genes();
    let ctx = GenerationContext::new(&graph, &genes, DISEASE);

    let candidates = link_prediction::generate(&ctx);
    let subjects: Vec<_> = candidates
        .iter()
        .filter_map(|h| h.subject.gene.as_deref())
        .collect();
    // BRCA1 has a strong direct edge, so its novelty falls to 0.3
    assert_eq!(subjects, vec!["TP53"]);

    let tp53 = &candidates[0];
    // TP53 neighbors {BRCA1, Idasanutlin, DNA repair}, disease {BRCA1, Olaparib}
    assert!((tp53.score - 0.5).abs() < 1e-9);
    assert_eq!(tp53.novelty, 0.9);
    assert_eq!(tp53.direct_evidence_score, 0.0);
    assert!(tp53.mechanism.contains("BRCA1"));
}

#[test]
fn test_synergy_pairs_complementary_targets() {
    let graph = fixture_graph();
    let genes = genes();
    let ctx = GenerationContext::new(&graph, &genes, DISEASE);

    let candidates = synergy::generate(&ctx);
    assert!(!candidates.is_empty());
    assert!(candidates.len() <= synergy::MAX_CANDIDATES);
    for h in &candidates {
        assert!(h.score > synergy::MIN_SCORE);
        let pair = [
            h.subject.drug.as_deref().unwrap_or_default(),
            h.subject.partner_drug.as_deref().unwrap_or_default(),
        ];
        // only BRCA1 x TP53 pairs have disjoint target sets
        assert!(pair.contains(&"Idasanutlin"), "{pair:?}");
        // 0.7 * 1.0 + 0.3 * 0.6
        assert!((h.score - 0.88).abs() < 1e-9);
    }
}

#[test]
fn test_pathway_coverage() {
    let graph = fixture_graph();
    let genes = genes();
    let ctx = GenerationContext::new(&graph, &genes, DISEASE);

    let candidates = pathway::generate(&ctx);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].subject.pathway.as_deref(), Some("DNA repair"));
    assert_eq!(candidates[0].score, 1.0);
    assert_eq!(candidates[0].evidence.len(), 2);
}

#[test]
fn test_missing_disease_node_yields_no_disease_hypotheses() {
    let graph = fixture_graph();
    let genes = genes();
    let ctx = GenerationContext::new(&graph, &genes, "ovarian cancer");

    let (_, counts) = generate_candidates(&ctx);
    assert_eq!(counts.gene_disease_link, 0);
    assert_eq!(counts.drug_repurposing, 0);
}
