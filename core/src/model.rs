use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Gene,
    Disease,
    Drug,
    Pathway,
    Protein,
    Phenotype,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Gene => "gene",
            NodeType::Disease => "disease",
            NodeType::Drug => "drug",
            NodeType::Pathway => "pathway",
            NodeType::Protein => "protein",
            NodeType::Phenotype => "phenotype",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Causes,
    Treats,
    Targets,
    ParticipatesIn,
    InteractsWith,
    AssociatedWith,
    Regulates,
    SynergizesWith,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Support,
    Contradict,
    Mixed,
    Neutral,
}

/// Builds the canonical `"<type>:<name>"` node id.
pub fn node_id(node_type: NodeType, name: &str) -> String {
    format!("{}:{}", node_type.as_str(), name)
}

/// Gene symbols are matched trimmed and upper-cased everywhere.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Node id of the gene with this symbol, in any casing.
pub fn gene_node_id(symbol: &str) -> String {
    node_id(NodeType::Gene, &normalize_symbol(symbol))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub node_type: NodeType,
    pub name: String,
    pub payload: Value,
    /// Maintained by the graph; recomputed from the edge list.
    pub degree: usize,
}

impl GraphNode {
    pub fn new(node_type: NodeType, name: impl Into<String>, payload: Value) -> Self {
        let name = name.into();
        Self {
            id: node_id(node_type, &name),
            node_type,
            name,
            payload,
            degree: 0,
        }
    }

    pub fn payload_f64(&self, key: &str) -> Option<f64> {
        self.payload
            .get(key)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
    }

    pub fn payload_bool(&self, key: &str) -> bool {
        self.payload.get(key).and_then(Value::as_bool).unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeEvidence {
    pub validated: bool,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pmid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polarity: Option<Polarity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub edge_type: EdgeType,
    pub weight: f64,
    pub source: String,
    pub source_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<EdgeEvidence>,
}

impl GraphEdge {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        edge_type: EdgeType,
        weight: f64,
        source: impl Into<String>,
        source_type: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            edge_type,
            weight,
            source: source.into(),
            source_type: source_type.into(),
            evidence: None,
        }
    }

    pub fn with_evidence(mut self, evidence: EdgeEvidence) -> Self {
        self.evidence = Some(evidence);
        self
    }

    /// The endpoint opposite to `id`, if `id` is one of the endpoints.
    pub fn other_end(&self, id: &str) -> Option<&str> {
        if self.from == id {
            Some(&self.to)
        } else if self.to == id {
            Some(&self.from)
        } else {
            None
        }
    }

    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisType {
    GeneDiseaseLink,
    DrugRepurposing,
    DrugSynergy,
    PathwayInvolvement,
    MechanismOfAction,
    BiomarkerPrediction,
}

impl HypothesisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HypothesisType::GeneDiseaseLink => "gene_disease_link",
            HypothesisType::DrugRepurposing => "drug_repurposing",
            HypothesisType::DrugSynergy => "drug_synergy",
            HypothesisType::PathwayInvolvement => "pathway_involvement",
            HypothesisType::MechanismOfAction => "mechanism_of_action",
            HypothesisType::BiomarkerPrediction => "biomarker_prediction",
        }
    }
}

/// Entities a hypothesis is about. Unused slots stay `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HypothesisSubject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gene: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disease: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_drug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pathway: Option<String>,
    #[serde(default)]
    pub drug_approved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub source: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pmid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polarity: Option<Polarity>,
}

impl EvidenceItem {
    pub fn new(source: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            description: description.into(),
            weight: None,
            pmid: None,
            polarity: None,
        }
    }

    pub fn weighted(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn from_edge(edge: &GraphEdge, description: impl Into<String>) -> Self {
        let evidence = edge.evidence.as_ref();
        Self {
            source: edge.source.clone(),
            description: description.into(),
            weight: Some(edge.weight),
            pmid: evidence.and_then(|e| e.pmid.clone()),
            polarity: evidence.and_then(|e| e.polarity),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentalDesign {
    pub approach: String,
    pub steps: Vec<String>,
    pub controls: Vec<String>,
    pub readouts: Vec<String>,
    pub timeline: String,
    pub estimated_cost: String,
    pub success_criteria: Vec<String>,
    pub predicted_outcome: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub hypothesis_type: HypothesisType,
    pub statement: String,
    pub subject: HypothesisSubject,
    pub mechanism: String,
    /// Generator score before multi-factor scoring.
    pub score: f64,
    pub direct_evidence_score: f64,
    pub evidence: Vec<EvidenceItem>,
    pub support_count: usize,
    pub contradict_count: usize,
    pub novelty: f64,
    pub confidence: f64,
    pub impact: f64,
    pub plausibility: f64,
    pub total_score: f64,
    pub rank: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental_design: Option<ExperimentalDesign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_id: Option<String>,
}

impl Hypothesis {
    /// A fresh candidate as emitted by a generator. Support/contradict counts
    /// are derived from the evidence polarities.
    pub fn candidate(
        hypothesis_type: HypothesisType,
        statement: impl Into<String>,
        subject: HypothesisSubject,
        mechanism: impl Into<String>,
        score: f64,
        novelty: f64,
        evidence: Vec<EvidenceItem>,
    ) -> Self {
        let support_count = evidence
            .iter()
            .filter(|e| e.polarity == Some(Polarity::Support))
            .count();
        let contradict_count = evidence
            .iter()
            .filter(|e| e.polarity == Some(Polarity::Contradict))
            .count();
        Self {
            hypothesis_type,
            statement: statement.into(),
            subject,
            mechanism: mechanism.into(),
            score,
            direct_evidence_score: 0.0,
            evidence,
            support_count,
            contradict_count,
            novelty,
            confidence: 0.0,
            impact: 0.0,
            plausibility: 0.0,
            total_score: 0.0,
            rank: 0,
            experimental_design: None,
            validation_id: None,
        }
    }

    pub fn with_direct_evidence(mut self, score: f64) -> Self {
        self.direct_evidence_score = score;
        self
    }

    /// Pmids cited by this hypothesis's evidence, in first-seen order.
    pub fn cited_pmids(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.evidence
            .iter()
            .filter_map(|e| e.pmid.clone())
            .filter(|pmid| seen.insert(pmid.clone()))
            .collect()
    }
}

/// A narrative claim produced by the synthesis collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    pub statement: String,
    pub cited_pmids: Vec<String>,
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_format() {
        let node = GraphNode::new(NodeType::Gene, "BRCA1", Value::Null);
        assert_eq!(node.id, "gene:BRCA1");
        assert_eq!(node.degree, 0);
        assert_eq!(node_id(NodeType::Disease, "breast cancer"), "disease:breast cancer");
    }

    #[test]
    fn test_gene_node_id_ignores_case() {
        assert_eq!(gene_node_id(" brca1 "), "gene:BRCA1");
        assert_eq!(gene_node_id("Tp53"), gene_node_id("TP53"));
    }

    #[test]
    fn test_candidate_counts_polarities() {
        let mut support = EvidenceItem::new("literature", "supporting paper");
        support.polarity = Some(Polarity::Support);
        let mut contra = EvidenceItem::new("literature", "null result");
        contra.polarity = Some(Polarity::Contradict);
        let neutral = EvidenceItem::new("pathway", "shared pathway");

        let hypothesis = Hypothesis::candidate(
            HypothesisType::GeneDiseaseLink,
            "X is linked to Y",
            HypothesisSubject::default(),
            "mechanism",
            0.5,
            0.9,
            vec![support, contra, neutral],
        );
        assert_eq!(hypothesis.support_count, 1);
        assert_eq!(hypothesis.contradict_count, 1);
    }

    #[test]
    fn test_hypothesis_type_serializes_snake_case() {
        let encoded = serde_json::to_string(&HypothesisType::DrugRepurposing).unwrap();
        assert_eq!(encoded, "\"drug_repurposing\"");
    }
}
