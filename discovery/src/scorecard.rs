//! Trust scorecard: a compact summary of the evidence ledger.

use crate::ledger::{BadgeLabel, EvidenceLedger};
use gaialab_core::model::{Insight, Polarity};
use serde::{Deserialize, Serialize};

const STRONG_CONSENSUS: f64 = 0.7;
const MODERATE_CONSENSUS: f64 = 0.4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolarityCounts {
    pub support: usize,
    pub contradict: usize,
    pub mixed: usize,
    pub neutral: usize,
}

impl PolarityCounts {
    fn add(&mut self, polarity: Polarity) {
        match polarity {
            Polarity::Support => self.support += 1,
            Polarity::Contradict => self.contradict += 1,
            Polarity::Mixed => self.mixed += 1,
            Polarity::Neutral => self.neutral += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightCoverage {
    pub insight_id: String,
    pub supporting: usize,
    pub contradicting: usize,
    pub mixed: usize,
    pub badge: BadgeLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusLevel {
    Strong,
    Moderate,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consensus {
    /// Evidence-weighted share of support; mixed papers count half each way.
    pub ratio: f64,
    pub level: ConsensusLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustScorecard {
    pub total_papers: usize,
    pub retracted_papers: usize,
    pub polarity: PolarityCounts,
    pub insights: Vec<InsightCoverage>,
    pub consensus: Consensus,
}

pub fn consensus(ledger: &EvidenceLedger) -> Consensus {
    let mut support = 0.0;
    let mut contradict = 0.0;
    for paper in &ledger.papers {
        match paper.polarity {
            Polarity::Support => support += paper.evidence_score,
            Polarity::Contradict => contradict += paper.evidence_score,
            Polarity::Mixed => {
                support += 0.5 * paper.evidence_score;
                contradict += 0.5 * paper.evidence_score;
            }
            Polarity::Neutral => {}
        }
    }
    let total = support + contradict;
    let ratio = if total > 0.0 { support / total } else { 0.0 };
    let level = if ratio >= STRONG_CONSENSUS {
        ConsensusLevel::Strong
    } else if ratio >= MODERATE_CONSENSUS {
        ConsensusLevel::Moderate
    } else {
        ConsensusLevel::Low
    };
    Consensus { ratio, level }
}

pub fn build_trust_scorecard(ledger: &EvidenceLedger, insights: &[Insight]) -> TrustScorecard {
    let mut polarity = PolarityCounts::default();
    for paper in &ledger.papers {
        polarity.add(paper.polarity);
    }

    let coverage = insights
        .iter()
        .map(|insight| {
            match ledger.insight_links.iter().find(|l| l.id == insight.id) {
                Some(link) => InsightCoverage {
                    insight_id: insight.id.clone(),
                    supporting: link.supporting.len(),
                    contradicting: link.contradicting.len(),
                    mixed: link.mixed.len(),
                    badge: link.badge.label,
                },
                None => InsightCoverage {
                    insight_id: insight.id.clone(),
                    supporting: 0,
                    contradicting: 0,
                    mixed: 0,
                    badge: BadgeLabel::Sparse,
                },
            }
        })
        .collect();

    TrustScorecard {
        total_papers: ledger.papers.len(),
        retracted_papers: ledger.papers.iter().filter(|p| p.retracted).count(),
        polarity,
        insights: coverage,
        consensus: consensus(ledger),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::EvidenceRecord;
    use ingestion::classifier::{JournalTier, Severity, StudyDesign, StudyType};

    fn paper(pmid: &str, polarity: Polarity, evidence_score: f64) -> EvidenceRecord {
        EvidenceRecord {
            pmid: pmid.to_string(),
            title: format!("paper {pmid}"),
            year: None,
            journal: None,
            polarity,
            contradiction_tags: Vec::new(),
            severity: Severity::Low,
            study_type: StudyType::Unknown,
            study_design: StudyDesign::Unknown,
            sample_size: None,
            journal_tier: JournalTier::Unknown,
            trial_phase: None,
            retracted: false,
            evidence_score,
        }
    }

    fn ledger(papers: Vec<EvidenceRecord>) -> EvidenceLedger {
        EvidenceLedger {
            papers,
            ..EvidenceLedger::default()
        }
    }

    #[test]
    fn test_strong_consensus_at_seventy_percent() {
        // mixed paper adds 1.0 to each side: 7.0 support vs 3.0 against
        let consensus = consensus(&ledger(vec![
            paper("1", Polarity::Support, 6.0),
            paper("2", Polarity::Mixed, 2.0),
            paper("3", Polarity::Contradict, 2.0),
            paper("4", Polarity::Neutral, 5.0),
        ]));
        assert_eq!(consensus.ratio, 0.7);
        assert_eq!(consensus.level, ConsensusLevel::Strong);
    }

    #[test]
    fn test_moderate_consensus_at_forty_percent() {
        let consensus = consensus(&ledger(vec![
            paper("1", Polarity::Support, 2.0),
            paper("2", Polarity::Mixed, 4.0),
            paper("3", Polarity::Contradict, 4.0),
        ]));
        assert_eq!(consensus.ratio, 0.4);
        assert_eq!(consensus.level, ConsensusLevel::Moderate);
    }

    #[test]
    fn test_low_consensus_below_forty_percent() {
        let low = consensus(&ledger(vec![
            paper("1", Polarity::Support, 1.0),
            paper("2", Polarity::Contradict, 3.0),
        ]));
        assert_eq!(low.ratio, 0.25);
        assert_eq!(low.level, ConsensusLevel::Low);

        let empty = consensus(&ledger(Vec::new()));
        assert_eq!(empty.ratio, 0.0);
        assert_eq!(empty.level, ConsensusLevel::Low);
    }

    #[test]
    fn test_scorecard_counts_and_unlinked_insights() {
        let mut retracted = paper("2", Polarity::Contradict, 0.15);
        retracted.retracted = true;
        let ledger = ledger(vec![paper("1", Polarity::Support, 3.0), retracted]);
        let insights = vec![Insight {
            id: "insight-9".to_string(),
            statement: "unlinked".to_string(),
            cited_pmids: Vec::new(),
            confidence: 0.3,
        }];

        let scorecard = build_trust_scorecard(&ledger, &insights);
        assert_eq!(scorecard.total_papers, 2);
        assert_eq!(scorecard.retracted_papers, 1);
        assert_eq!(scorecard.polarity.support, 1);
        assert_eq!(scorecard.polarity.contradict, 1);
        assert_eq!(scorecard.insights[0].badge, BadgeLabel::Sparse);
    }
}
