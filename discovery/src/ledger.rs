//! Evidence ledger: one scored record per cited paper, plus the links from
//! insights and hypotheses to the papers they cite.

use gaialab_core::config::LedgerConfig;
use gaialab_core::model::{Hypothesis, Insight, Polarity};
use gaialab_core::numeric::{clamp01, mean};
use ingestion::classifier::{
    AnnotatedPaper, ContradictionTag, JournalTier, Severity, StudyDesign, StudyType, TrialPhase,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub const EVIDENCE_SCORE_FLOOR: f64 = 0.15;
pub const RETRACTION_PENALTY: f64 = 2.5;
const BASE_SCORE: f64 = 1.0;
/// Evidence score mapped to `[0, 1]` for badge quality.
const EVIDENCE_SCORE_SCALE: f64 = 6.0;
const MAX_SIGNAL_CONTRIBUTION: f64 = 0.5;

const MAX_CONTRADICTION_PENALTY: f64 = 0.4;
const BADGE_RETRACTION_PENALTY: f64 = 0.5;
const CONTENTIOUS_RATIO: f64 = 0.6;
const HIGH_BADGE: f64 = 0.75;
const MODERATE_BADGE: f64 = 0.55;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerOptions {
    /// Recency is measured against this year.
    pub reference_year: i32,
    pub max_papers: usize,
}

impl LedgerOptions {
    pub fn new(reference_year: i32) -> Self {
        Self {
            reference_year,
            max_papers: 200,
        }
    }

    pub fn from_config(config: &LedgerConfig, reference_year: i32) -> Self {
        Self {
            reference_year,
            max_papers: config.max_papers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub pmid: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    pub polarity: Polarity,
    pub contradiction_tags: Vec<ContradictionTag>,
    pub severity: Severity,
    pub study_type: StudyType,
    pub study_design: StudyDesign,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u64>,
    pub journal_tier: JournalTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_phase: Option<TrialPhase>,
    pub retracted: bool,
    pub evidence_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeLabel {
    High,
    Moderate,
    Preliminary,
    Contentious,
    Retracted,
    Sparse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustBadge {
    pub label: BadgeLabel,
    /// Support quality after penalties.
    pub score: f64,
    pub contradiction_ratio: f64,
}

/// An insight or hypothesis with its cited papers split by polarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceLink {
    pub id: String,
    pub statement: String,
    pub supporting: Vec<String>,
    pub contradicting: Vec<String>,
    pub mixed: Vec<String>,
    pub neutral: Vec<String>,
    pub badge: TrustBadge,
    pub rationale: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceLedger {
    pub papers: Vec<EvidenceRecord>,
    pub insight_links: Vec<EvidenceLink>,
    pub hypothesis_links: Vec<EvidenceLink>,
}

impl EvidenceLedger {
    pub fn paper(&self, pmid: &str) -> Option<&EvidenceRecord> {
        self.papers.iter().find(|p| p.pmid == pmid)
    }
}

// ---------------------------------------------------------------------------
// Per-paper evidence score
// ---------------------------------------------------------------------------

fn recency_boost(year: Option<i32>, reference_year: i32) -> f64 {
    let Some(year) = year else {
        return 0.0;
    };
    match reference_year - year {
        age if age <= 2 => 0.5,
        age if age <= 5 => 0.3,
        age if age <= 10 => 0.1,
        _ => 0.0,
    }
}

fn study_type_boost(study_type: StudyType) -> f64 {
    match study_type {
        StudyType::MetaAnalysis => 1.0,
        StudyType::Clinical => 0.8,
        StudyType::Mixed => 0.6,
        StudyType::Review => 0.4,
        StudyType::Preclinical => 0.3,
        StudyType::Unknown => 0.0,
    }
}

fn study_design_boost(design: StudyDesign) -> f64 {
    match design {
        StudyDesign::RandomizedControlled => 1.0,
        StudyDesign::Cohort => 0.6,
        StudyDesign::CaseControl => 0.4,
        StudyDesign::CrossSectional => 0.3,
        StudyDesign::Animal => 0.2,
        StudyDesign::CaseReport | StudyDesign::InVitro => 0.1,
        StudyDesign::Unknown => 0.0,
    }
}

fn polarity_boost(polarity: Polarity) -> f64 {
    match polarity {
        Polarity::Support => 0.3,
        Polarity::Neutral => 0.0,
        Polarity::Mixed => -0.1,
        Polarity::Contradict => -0.2,
    }
}

fn journal_boost(tier: JournalTier) -> f64 {
    match tier {
        JournalTier::Tier1 => 1.0,
        JournalTier::Tier2 => 0.6,
        JournalTier::Tier3 => 0.2,
        JournalTier::Unknown => 0.0,
    }
}

fn phase_boost(phase: Option<TrialPhase>) -> f64 {
    phase.map(|p| f64::from(p.number()) * 0.25).unwrap_or(0.0)
}

/// Composite paper quality. Always at least [`EVIDENCE_SCORE_FLOOR`].
pub fn evidence_score(paper: &AnnotatedPaper, reference_year: i32) -> f64 {
    let record = &paper.record;
    let c = &paper.classification;

    let citations = (record.citation_count.unwrap_or(0) as f64).ln_1p() * 0.6;
    let influential = (record.influential_citation_count.unwrap_or(0) as f64).ln_1p() * 0.8;
    let sample = c
        .sample_size
        .map(|n| (n as f64 + 1.0).log10() * 0.3)
        .unwrap_or(0.0);
    let facts = (0.2 * c.fact_count as f64).min(1.0);
    let signals = (0.1 * c.support_signals as f64).min(MAX_SIGNAL_CONTRIBUTION)
        - (0.1 * c.contradict_signals as f64).min(MAX_SIGNAL_CONTRIBUTION);

    let mut score = BASE_SCORE
        + citations
        + influential
        + sample
        + facts
        + signals
        + recency_boost(record.year, reference_year)
        + study_type_boost(c.study_type)
        + study_design_boost(c.study_design)
        + polarity_boost(c.polarity)
        + journal_boost(c.journal_tier)
        + phase_boost(c.trial_phase);
    if c.retracted {
        score -= RETRACTION_PENALTY;
    }
    if score.is_finite() {
        score.max(EVIDENCE_SCORE_FLOOR)
    } else {
        EVIDENCE_SCORE_FLOOR
    }
}

fn evidence_record(paper: &AnnotatedPaper, reference_year: i32) -> EvidenceRecord {
    let record = &paper.record;
    let c = &paper.classification;
    EvidenceRecord {
        pmid: record.pmid.clone(),
        title: record.title.clone(),
        year: record.year,
        journal: record.journal.clone(),
        polarity: c.polarity,
        contradiction_tags: c.contradiction_tags.clone(),
        severity: c.severity,
        study_type: c.study_type,
        study_design: c.study_design,
        sample_size: c.sample_size,
        journal_tier: c.journal_tier,
        trial_phase: c.trial_phase,
        retracted: c.retracted,
        evidence_score: evidence_score(paper, reference_year),
    }
}

// ---------------------------------------------------------------------------
// Badges and rationale
// ---------------------------------------------------------------------------

fn tier_quality(tier: JournalTier) -> f64 {
    match tier {
        JournalTier::Tier1 => 1.0,
        JournalTier::Tier2 => 0.7,
        JournalTier::Tier3 => 0.4,
        JournalTier::Unknown => 0.2,
    }
}

fn support_quality(record: &EvidenceRecord) -> f64 {
    let phase = record
        .trial_phase
        .map(|p| f64::from(p.number()) / 4.0)
        .unwrap_or(0.0);
    0.4 * tier_quality(record.journal_tier)
        + 0.3 * phase
        + 0.3 * clamp01(record.evidence_score / EVIDENCE_SCORE_SCALE)
}

pub fn trust_badge(
    supporting: &[&EvidenceRecord],
    contradicting: &[&EvidenceRecord],
    any_retracted: bool,
) -> TrustBadge {
    let cited = supporting.len() + contradicting.len();
    let contradiction_ratio = if cited == 0 {
        0.0
    } else {
        contradicting.len() as f64 / cited as f64
    };
    if supporting.is_empty() {
        return TrustBadge {
            label: BadgeLabel::Sparse,
            score: 0.0,
            contradiction_ratio,
        };
    }

    let quality = mean(
        &supporting
            .iter()
            .copied()
            .map(support_quality)
            .collect::<Vec<_>>(),
    );
    let contradiction_penalty = (contradiction_ratio * 0.5).min(MAX_CONTRADICTION_PENALTY);
    let retraction_penalty = if any_retracted {
        BADGE_RETRACTION_PENALTY
    } else {
        0.0
    };
    let score = clamp01(quality - contradiction_penalty - retraction_penalty);

    let label = if any_retracted {
        BadgeLabel::Retracted
    } else if contradiction_ratio >= CONTENTIOUS_RATIO {
        BadgeLabel::Contentious
    } else if score >= HIGH_BADGE {
        BadgeLabel::High
    } else if score >= MODERATE_BADGE {
        BadgeLabel::Moderate
    } else {
        BadgeLabel::Preliminary
    };
    TrustBadge {
        label,
        score,
        contradiction_ratio,
    }
}

fn describe(record: &EvidenceRecord) -> String {
    let mut parts = Vec::new();
    if let Some(journal) = &record.journal {
        parts.push(journal.clone());
    }
    if let Some(year) = record.year {
        parts.push(year.to_string());
    }
    parts.push(format!("score {:.2}", record.evidence_score));
    format!("PMID {} ({})", record.pmid, parts.join(", "))
}

fn strongest<'a>(records: &[&'a EvidenceRecord]) -> Option<&'a EvidenceRecord> {
    records
        .iter()
        .copied()
        .max_by(|a, b| a.evidence_score.total_cmp(&b.evidence_score))
}

fn rationale(
    supporting: &[&EvidenceRecord],
    contradicting: &[&EvidenceRecord],
    badge: &TrustBadge,
) -> String {
    let support = match strongest(supporting) {
        Some(r) => format!("Strongest support: {}", describe(r)),
        None => "No supporting papers".to_string(),
    };
    let contradiction = match strongest(contradicting) {
        Some(r) => format!("strongest contradiction: {}", describe(r)),
        None => "no contradicting papers".to_string(),
    };
    format!(
        "{support}; {contradiction}. {} supporting, {} contradicting (ratio {:.2}).",
        supporting.len(),
        contradicting.len(),
        badge.contradiction_ratio
    )
}

fn link(
    id: String,
    statement: &str,
    cited: &[String],
    records: &HashMap<&str, &EvidenceRecord>,
) -> EvidenceLink {
    let mut supporting = Vec::new();
    let mut contradicting = Vec::new();
    let mut mixed = Vec::new();
    let mut neutral = Vec::new();
    let mut seen = HashSet::new();
    for pmid in cited {
        if !seen.insert(pmid.as_str()) {
            continue;
        }
        let Some(record) = records.get(pmid.as_str()).copied() else {
            continue;
        };
        match record.polarity {
            Polarity::Support => supporting.push(record),
            Polarity::Contradict => contradicting.push(record),
            Polarity::Mixed => mixed.push(record),
            Polarity::Neutral => neutral.push(record),
        }
    }

    let any_retracted = supporting
        .iter()
        .chain(&contradicting)
        .chain(&mixed)
        .chain(&neutral)
        .any(|r| r.retracted);
    let badge = trust_badge(&supporting, &contradicting, any_retracted);
    let rationale = rationale(&supporting, &contradicting, &badge);
    let pmids = |rs: &[&EvidenceRecord]| rs.iter().map(|r| r.pmid.clone()).collect::<Vec<_>>();

    EvidenceLink {
        id,
        statement: statement.to_string(),
        supporting: pmids(&supporting),
        contradicting: pmids(&contradicting),
        mixed: pmids(&mixed),
        neutral: pmids(&neutral),
        badge,
        rationale,
    }
}

fn hypothesis_link_id(hypothesis: &Hypothesis, idx: usize) -> String {
    hypothesis
        .validation_id
        .clone()
        .unwrap_or_else(|| format!("hypothesis-{}", idx + 1))
}

/// Score every paper cited by `insights` or `hypotheses` and link each claim
/// to its papers. Citations of unknown PMIDs are ignored.
pub fn build_evidence_ledger(
    papers: &[AnnotatedPaper],
    insights: &[Insight],
    hypotheses: &[Hypothesis],
    options: &LedgerOptions,
) -> EvidenceLedger {
    let by_pmid: HashMap<&str, &AnnotatedPaper> =
        papers.iter().map(|p| (p.pmid(), p)).collect();

    let mut cited_order: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    let hypothesis_pmids: Vec<Vec<String>> = hypotheses.iter().map(Hypothesis::cited_pmids).collect();
    let all_cited = insights
        .iter()
        .flat_map(|i| i.cited_pmids.iter())
        .chain(hypothesis_pmids.iter().flatten());
    for pmid in all_cited {
        if by_pmid.contains_key(pmid.as_str()) && seen.insert(pmid.clone()) {
            cited_order.push(pmid.clone());
        }
    }

    let mut records: Vec<EvidenceRecord> = cited_order
        .iter()
        .filter_map(|pmid| by_pmid.get(pmid.as_str()))
        .map(|paper| evidence_record(paper, options.reference_year))
        .collect();
    records.sort_by(|a, b| b.evidence_score.total_cmp(&a.evidence_score));
    records.truncate(options.max_papers);

    let lookup: HashMap<&str, &EvidenceRecord> =
        records.iter().map(|r| (r.pmid.as_str(), r)).collect();

    let insight_links = insights
        .iter()
        .map(|insight| link(insight.id.clone(), &insight.statement, &insight.cited_pmids, &lookup))
        .collect();
    let hypothesis_links = hypotheses
        .iter()
        .zip(&hypothesis_pmids)
        .enumerate()
        .map(|(idx, (h, cited))| link(hypothesis_link_id(h, idx), &h.statement, cited, &lookup))
        .collect();

    debug!(
        "Evidence ledger: {} papers, {} insights, {} hypotheses",
        records.len(),
        insights.len(),
        hypotheses.len()
    );

    EvidenceLedger {
        papers: records,
        insight_links,
        hypothesis_links,
    }
}
