//! Multi-factor hypothesis scoring.
//!
//! Confidence is built from evidence strength, the generator score and direct
//! evidence, shifted by historical per-type accuracy once enough validations
//! exist, then reduced by a contradiction penalty. Total score blends
//! confidence, novelty, impact and plausibility.

use crate::options::GenerationOptions;
use gaialab_core::model::{EvidenceItem, Hypothesis, HypothesisType, Polarity};
use gaialab_core::numeric::{clamp01, finite_or_zero};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use storage::AccuracyStats;

pub const MIN_CALIBRATION_SAMPLES: usize = 5;
const UNWEIGHTED_EVIDENCE: f64 = 0.2;
const EVIDENCE_SATURATION: f64 = 3.0;
const CALIBRATION_GAIN: f64 = 0.2;
const MAX_CONTRADICTION_PENALTY: f64 = 0.3;
const MAX_SUPPORT_BONUS: f64 = 0.2;
const SUPPORT_BONUS_STEP: f64 = 0.05;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeHistory {
    pub total: usize,
    /// Fraction in `[0, 1]`.
    pub accuracy: f64,
}

/// Per-type accuracy as seen by the scorer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalStats {
    pub accuracy_by_type: BTreeMap<HypothesisType, TypeHistory>,
    #[serde(default)]
    pub version: u64,
}

impl From<&AccuracyStats> for HistoricalStats {
    fn from(stats: &AccuracyStats) -> Self {
        Self {
            accuracy_by_type: stats
                .by_type
                .iter()
                .map(|(kind, acc)| {
                    (
                        *kind,
                        TypeHistory {
                            total: acc.total,
                            accuracy: clamp01(acc.accuracy / 100.0),
                        },
                    )
                })
                .collect(),
            version: stats.version,
        }
    }
}

impl HistoricalStats {
    /// Confidence shift for `kind`, or `None` below the sample threshold.
    pub fn calibration_shift(&self, kind: HypothesisType) -> Option<f64> {
        self.accuracy_by_type
            .get(&kind)
            .filter(|h| h.total >= MIN_CALIBRATION_SAMPLES)
            .map(|h| (h.accuracy - 0.5) * CALIBRATION_GAIN)
    }
}

/// Weighted evidence mass per polarity. Items without a polarity are neutral.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PolarityBreakdown {
    pub support: f64,
    pub contradict: f64,
    pub mixed: f64,
    pub neutral: f64,
}

impl PolarityBreakdown {
    pub fn from_evidence(evidence: &[EvidenceItem]) -> Self {
        let mut breakdown = Self::default();
        for item in evidence {
            let weight = item_weight(item);
            match item.polarity {
                Some(Polarity::Support) => breakdown.support += weight,
                Some(Polarity::Contradict) => breakdown.contradict += weight,
                Some(Polarity::Mixed) => breakdown.mixed += weight,
                Some(Polarity::Neutral) | None => breakdown.neutral += weight,
            }
        }
        breakdown
    }

    pub fn total(&self) -> f64 {
        self.support + self.contradict + self.mixed + self.neutral
    }

    pub fn contradiction_penalty(&self) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        let contradict_ratio = self.contradict / total;
        let mixed_ratio = self.mixed / total;
        (0.5 * contradict_ratio + 0.2 * mixed_ratio).min(MAX_CONTRADICTION_PENALTY)
    }
}

fn item_weight(item: &EvidenceItem) -> f64 {
    item.weight
        .filter(|w| w.is_finite())
        .map(|w| w.max(0.0))
        .unwrap_or(UNWEIGHTED_EVIDENCE)
}

pub fn evidence_strength(evidence: &[EvidenceItem]) -> f64 {
    clamp01(evidence.iter().map(item_weight).sum::<f64>() / EVIDENCE_SATURATION)
}

pub fn impact(hypothesis: &Hypothesis) -> f64 {
    match hypothesis.hypothesis_type {
        HypothesisType::DrugSynergy => 0.9,
        HypothesisType::DrugRepurposing if hypothesis.subject.drug_approved => 0.95,
        HypothesisType::DrugRepurposing => 0.8,
        HypothesisType::GeneDiseaseLink => 0.7,
        _ => 0.6,
    }
}

/// Fill in confidence, impact, plausibility and total score. Returns whether
/// historical calibration was applied.
pub fn score_hypothesis(hypothesis: &mut Hypothesis, history: &HistoricalStats) -> bool {
    let candidate_score = clamp01(hypothesis.score);
    let direct = clamp01(hypothesis.direct_evidence_score);
    let novelty = clamp01(hypothesis.novelty);
    let strength = evidence_strength(&hypothesis.evidence);
    let penalty = PolarityBreakdown::from_evidence(&hypothesis.evidence).contradiction_penalty();

    let raw = 0.7 * strength + 0.2 * candidate_score + 0.1 * direct;
    let shift = history.calibration_shift(hypothesis.hypothesis_type);
    let calibrated = raw + shift.unwrap_or(0.0);
    let confidence = clamp01(calibrated - penalty);

    let support_bonus =
        (SUPPORT_BONUS_STEP * hypothesis.support_count as f64).min(MAX_SUPPORT_BONUS);
    let plausibility = clamp01(
        0.4 * confidence + 0.3 * strength + 0.2 * candidate_score + 0.1 * direct + support_bonus,
    );
    let impact = impact(hypothesis);

    hypothesis.score = candidate_score;
    hypothesis.direct_evidence_score = direct;
    hypothesis.novelty = novelty;
    hypothesis.confidence = confidence;
    hypothesis.impact = impact;
    hypothesis.plausibility = plausibility;
    hypothesis.total_score = clamp01(finite_or_zero(
        0.35 * confidence + 0.25 * novelty + 0.25 * impact + 0.15 * plausibility,
    ));
    shift.is_some()
}

/// Threshold, order by total score (stable), truncate and assign dense ranks.
pub fn rank_hypotheses(
    mut hypotheses: Vec<Hypothesis>,
    options: &GenerationOptions,
) -> Vec<Hypothesis> {
    hypotheses.retain(|h| {
        h.confidence >= options.min_confidence && h.novelty >= options.novelty_threshold
    });
    hypotheses.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
    hypotheses.truncate(options.max_hypotheses);
    for (idx, hypothesis) in hypotheses.iter_mut().enumerate() {
        hypothesis.rank = idx + 1;
    }
    hypotheses
}
