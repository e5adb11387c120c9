//! Evidence polarity classifier.
//!
//! Pure and stateless: each paper's title, abstract and publication types are
//! scanned once against fixed pattern tables. The output feeds both the graph
//! builder (polarity on literature edges) and the evidence ledger.

pub mod polarity;
pub mod study;

use gaialab_core::ingest::LiteratureRecord;
use gaialab_core::model::Polarity;
use serde::{Deserialize, Serialize};

pub use polarity::{ContradictionTag, Severity};
pub use study::{JournalTier, StudyDesign, StudyType, TrialPhase};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperClassification {
    pub polarity: Polarity,
    pub support_signals: usize,
    pub contradict_signals: usize,
    pub contradiction_tags: Vec<ContradictionTag>,
    pub severity: Severity,
    pub study_type: StudyType,
    pub study_design: StudyDesign,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_phase: Option<TrialPhase>,
    pub journal_tier: JournalTier,
    pub retracted: bool,
    pub fact_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPaper {
    pub record: LiteratureRecord,
    pub classification: PaperClassification,
}

impl AnnotatedPaper {
    pub fn pmid(&self) -> &str {
        &self.record.pmid
    }
}

pub fn classify_paper(record: &LiteratureRecord) -> PaperClassification {
    let text = record.full_text();
    let publication_types = record.publication_types.join("; ");

    let signals = polarity::count_signals(&text);
    let polarity = signals.polarity();
    let contradiction_tags = polarity::contradiction_tags(&text, polarity);
    let severity = Severity::from_tags(&contradiction_tags);

    PaperClassification {
        polarity,
        support_signals: signals.support,
        contradict_signals: signals.contradict,
        severity,
        contradiction_tags,
        study_type: study::study_type(&text, &record.publication_types),
        study_design: study::study_design(&text, &record.publication_types),
        sample_size: study::sample_size(&text),
        trial_phase: study::trial_phase(&format!("{text} {publication_types}")),
        journal_tier: record
            .journal
            .as_deref()
            .map(study::journal_tier)
            .unwrap_or(JournalTier::Unknown),
        retracted: study::is_retracted(&record.title, &record.publication_types),
        fact_count: study::fact_count(&record.abstract_text),
    }
}

pub fn annotate(records: Vec<LiteratureRecord>) -> Vec<AnnotatedPaper> {
    records
        .into_iter()
        .map(|record| {
            let classification = classify_paper(&record);
            AnnotatedPaper {
                record,
                classification,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_association_title_is_support_without_tags() {
        let paper = LiteratureRecord::new("100", "BRCA1 is associated with breast cancer");
        let c = classify_paper(&paper);
        assert_eq!(c.polarity, Polarity::Support);
        assert!(c.contradiction_tags.is_empty());
        assert_eq!(c.severity, Severity::Low);
        assert!(!c.retracted);
    }

    #[test]
    fn test_both_pattern_sets_classify_as_mixed() {
        let mut paper = LiteratureRecord::new("101", "TP53 promotes tumor growth in mice");
        paper.abstract_text =
            "However, the effect was not significant in a human cohort of 240 patients."
                .to_string();
        let c = classify_paper(&paper);
        assert_eq!(c.polarity, Polarity::Mixed);
        assert!(c.contradiction_tags.contains(&ContradictionTag::Statistical));
        assert_eq!(c.severity, Severity::High);
        assert_eq!(c.study_type, StudyType::Mixed);
        assert_eq!(c.sample_size, Some(240));
    }

    #[test]
    fn test_failed_replication_is_contradict() {
        let mut paper = LiteratureRecord::new("102", "Failed to replicate the EGFR finding");
        paper.abstract_text = "We found no association between EGFR variants and risk.".to_string();
        paper.journal = Some("PLoS ONE".to_string());
        let c = classify_paper(&paper);
        assert_eq!(c.polarity, Polarity::Contradict);
        assert!(c.contradiction_tags.contains(&ContradictionTag::Replication));
        assert!(c.contradiction_tags.contains(&ContradictionTag::NoAssociation));
        assert_eq!(c.journal_tier, JournalTier::Tier3);
    }

    #[test]
    fn test_retraction_and_phase_from_publication_types() {
        let mut paper = LiteratureRecord::new("103", "Olaparib in BRCA-mutated cancer");
        paper.publication_types = vec![
            "Clinical Trial, Phase III".to_string(),
            "Retracted Publication".to_string(),
        ];
        let c = classify_paper(&paper);
        assert!(c.retracted);
        assert_eq!(c.trial_phase, Some(TrialPhase::Phase3));
        assert_eq!(c.study_type, StudyType::Clinical);
    }

    #[test]
    fn test_annotate_preserves_order() {
        let papers = annotate(vec![
            LiteratureRecord::new("1", "A promotes B"),
            LiteratureRecord::new("2", "Nothing to see"),
        ]);
        assert_eq!(papers[0].pmid(), "1");
        assert_eq!(papers[1].classification.polarity, Polarity::Neutral);
    }
}
