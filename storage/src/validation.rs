//! Durable validation records and the accuracy statistics derived from them.

use gaialab_core::model::{Hypothesis, HypothesisType};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Confidence / novelty bucket edges used by recalibration passes.
pub const BUCKET_EDGES: [(f64, f64, &str); 4] = [
    (0.0, 0.5, "low"),
    (0.5, 0.7, "medium"),
    (0.7, 0.85, "high"),
    (0.85, 1.0, "very_high"),
];

pub const RECALIBRATION_INTERVAL: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValidationOutcome {
    #[default]
    NotTested,
    Pending,
    Confirmed,
    Rejected,
    Partial,
}

impl ValidationOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ValidationOutcome::Confirmed | ValidationOutcome::Rejected | ValidationOutcome::Partial
        )
    }

    /// `not_tested -> {pending, confirmed, rejected, partial}` and
    /// `pending -> {confirmed, rejected, partial}`.
    pub fn can_transition_to(&self, next: ValidationOutcome) -> bool {
        match self {
            ValidationOutcome::NotTested => next != ValidationOutcome::NotTested,
            ValidationOutcome::Pending => next.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ValidationContext {
    pub genes: Vec<String>,
    pub disease: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ValidationDetails {
    pub outcome: ValidationOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental_results: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Engagement {
    pub views: u64,
    pub exports: u64,
    pub shares: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub id: String,
    pub hypothesis: Hypothesis,
    pub context: ValidationContext,
    pub created_at: String,
    #[serde(default)]
    pub validation: ValidationDetails,
    #[serde(default)]
    pub engagement: Engagement,
}

/// Input to `ValidationTracker::record_validation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationUpdate {
    pub outcome: ValidationOutcome,
    #[serde(default)]
    pub experimental_results: Option<String>,
    #[serde(default)]
    pub validated_by: Option<String>,
    #[serde(default)]
    pub pmid: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ValidationUpdate {
    pub fn outcome(outcome: ValidationOutcome) -> Self {
        Self {
            outcome,
            experimental_results: None,
            validated_by: None,
            pmid: None,
            notes: None,
        }
    }
}

/// Deterministic record id: first 16 hex chars of SHA-256 over
/// `type|statement|created_at`.
pub fn record_id(hypothesis_type: HypothesisType, statement: &str, created_at: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(hypothesis_type.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(statement.as_bytes());
    hasher.update(b"|");
    hasher.update(created_at.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct OutcomeCounts {
    pub confirmed: usize,
    pub rejected: usize,
    pub partial: usize,
}

impl OutcomeCounts {
    fn observe(&mut self, outcome: ValidationOutcome) {
        match outcome {
            ValidationOutcome::Confirmed => self.confirmed += 1,
            ValidationOutcome::Rejected => self.rejected += 1,
            ValidationOutcome::Partial => self.partial += 1,
            ValidationOutcome::NotTested | ValidationOutcome::Pending => {}
        }
    }

    pub fn total(&self) -> usize {
        self.confirmed + self.rejected + self.partial
    }

    /// `(confirmed + 0.5 * partial) / total` as a percentage.
    pub fn accuracy_percent(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.confirmed as f64 + 0.5 * self.partial as f64) / total as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAccuracy {
    pub total: usize,
    pub confirmed: usize,
    pub rejected: usize,
    pub partial: usize,
    /// Percent.
    pub accuracy: f64,
}

impl From<OutcomeCounts> for TypeAccuracy {
    fn from(counts: OutcomeCounts) -> Self {
        Self {
            total: counts.total(),
            confirmed: counts.confirmed,
            rejected: counts.rejected,
            partial: counts.partial,
            accuracy: counts.accuracy_percent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketAccuracy {
    pub label: String,
    pub lower: f64,
    pub upper: f64,
    pub total: usize,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recalibration {
    pub at_validation_count: usize,
    pub confidence_buckets: Vec<BucketAccuracy>,
    pub novelty_buckets: Vec<BucketAccuracy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AccuracyStats {
    /// Bumped on every tracker mutation.
    pub version: u64,
    pub total_generated: usize,
    pub total_validated: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub rejected: usize,
    pub partial: usize,
    /// Percent.
    pub accuracy: f64,
    pub by_type: BTreeMap<HypothesisType, TypeAccuracy>,
    pub trust_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_recalibration: Option<Recalibration>,
}

/// `min(validations / 1000, 1) * 50 + (accuracy / 100) * 50`.
pub fn trust_score(total_validated: usize, accuracy_percent: f64) -> f64 {
    let volume = (total_validated as f64 / 1000.0).min(1.0);
    volume * 50.0 + (accuracy_percent / 100.0) * 50.0
}

/// Recompute stats from the full log. Pure: the same records, version and
/// prior recalibration always produce the same stats.
pub fn compute_accuracy_stats(
    records: &[ValidationRecord],
    version: u64,
    last_recalibration: Option<Recalibration>,
) -> AccuracyStats {
    let mut overall = OutcomeCounts::default();
    let mut per_type: BTreeMap<HypothesisType, OutcomeCounts> = BTreeMap::new();
    let mut pending = 0;
    let mut updated_at: Option<&str> = None;

    for record in records {
        let outcome = record.validation.outcome;
        if outcome == ValidationOutcome::Pending {
            pending += 1;
        }
        overall.observe(outcome);
        if outcome.is_terminal() {
            per_type
                .entry(record.hypothesis.hypothesis_type)
                .or_default()
                .observe(outcome);
        }
        if let Some(at) = record.validation.validated_at.as_deref() {
            if updated_at.is_none_or(|current| at > current) {
                updated_at = Some(at);
            }
        }
    }

    let accuracy = overall.accuracy_percent();
    AccuracyStats {
        version,
        total_generated: records.len(),
        total_validated: overall.total(),
        pending,
        confirmed: overall.confirmed,
        rejected: overall.rejected,
        partial: overall.partial,
        accuracy,
        by_type: per_type
            .into_iter()
            .map(|(kind, counts)| (kind, TypeAccuracy::from(counts)))
            .collect(),
        trust_score: trust_score(overall.total(), accuracy),
        updated_at: updated_at.map(str::to_string),
        last_recalibration,
    }
}

/// Confidence and novelty bucket breakdowns over validated records.
pub fn compute_recalibration(records: &[ValidationRecord]) -> Recalibration {
    let validated: Vec<&ValidationRecord> = records
        .iter()
        .filter(|r| r.validation.outcome.is_terminal())
        .collect();

    let bucketize = |value_of: &dyn Fn(&Hypothesis) -> f64| -> Vec<BucketAccuracy> {
        BUCKET_EDGES
            .iter()
            .enumerate()
            .map(|(idx, (lower, upper, label))| {
                let last = idx == BUCKET_EDGES.len() - 1;
                let mut counts = OutcomeCounts::default();
                for record in &validated {
                    let value = value_of(&record.hypothesis);
                    let inside = value >= *lower && (value < *upper || (last && value <= *upper));
                    if inside {
                        counts.observe(record.validation.outcome);
                    }
                }
                BucketAccuracy {
                    label: label.to_string(),
                    lower: *lower,
                    upper: *upper,
                    total: counts.total(),
                    accuracy: counts.accuracy_percent(),
                }
            })
            .collect()
    };

    Recalibration {
        at_validation_count: validated.len(),
        confidence_buckets: bucketize(&|h: &Hypothesis| h.confidence),
        novelty_buckets: bucketize(&|h: &Hypothesis| h.novelty),
    }
}
