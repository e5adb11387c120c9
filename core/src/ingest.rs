//! Normalized records returned by the upstream collaborators.
//!
//! Every field that an upstream API may omit is optional or defaulted so a
//! partially populated payload still deserializes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneRecord {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathwayRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub p_value: Option<f64>,
    #[serde(default)]
    pub genes: Vec<String>,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteratureRecord {
    pub pmid: String,
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub citation_count: Option<u64>,
    #[serde(default)]
    pub influential_citation_count: Option<u64>,
    #[serde(default)]
    pub publication_types: Vec<String>,
    #[serde(default)]
    pub journal: Option<String>,
}

impl LiteratureRecord {
    pub fn new(pmid: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            pmid: pmid.into(),
            title: title.into(),
            abstract_text: String::new(),
            year: None,
            citation_count: None,
            influential_citation_count: None,
            publication_types: Vec::new(),
            journal: None,
        }
    }

    /// Title and abstract joined for pattern matching.
    pub fn full_text(&self) -> String {
        if self.abstract_text.is_empty() {
            self.title.clone()
        } else {
            format!("{}. {}", self.title, self.abstract_text)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugRecord {
    pub name: String,
    #[serde(default)]
    pub targets: Vec<String>,
    /// Potency already normalized to `[0, 1]` by the upstream client.
    #[serde(default)]
    pub potency: Option<f64>,
    #[serde(default)]
    pub max_phase: Option<f64>,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub indications: Vec<String>,
}

impl DrugRecord {
    pub fn new(name: impl Into<String>, targets: Vec<String>) -> Self {
        Self {
            name: name.into(),
            targets,
            potency: None,
            max_phase: None,
            approved: false,
            indications: Vec::new(),
        }
    }
}

/// Drugs from one upstream source (compound database, interaction database, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugCollection {
    pub source: String,
    pub drugs: Vec<DrugRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub gene_a: String,
    pub gene_b: String,
    /// Either `[0, 1]` or per-mille `[0, 1000]`.
    pub confidence: f64,
    #[serde(default)]
    pub validated: bool,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalRecord {
    pub gene: String,
    pub disease: String,
    pub score: f64,
    #[serde(default)]
    pub cross_validated: bool,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub pmid: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literature_record_accepts_sparse_payload() {
        let raw = r#"{"pmid": "123", "title": "BRCA1 and repair", "abstract": "Text."}"#;
        let record: LiteratureRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.abstract_text, "Text.");
        assert!(record.publication_types.is_empty());
        assert_eq!(record.full_text(), "BRCA1 and repair. Text.");
    }
}
