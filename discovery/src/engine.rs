use crate::design::design_experiment;
use crate::generators::{generate_candidates, CandidateCounts, GenerationContext};
use crate::options::{validate_inputs, GenerationOptions, OptionsValidationError};
use crate::scoring::{rank_hypotheses, score_hypothesis, HistoricalStats};
use chrono::{SecondsFormat, Utc};
use gaialab_core::error::{ErrorCode, GaialabError};
use gaialab_core::model::{Hypothesis, HypothesisType};
use gaialab_core::numeric::mean;
use ingestion::classifier::{annotate, AnnotatedPaper};
use ingestion::{fetch_snapshot, Collection, KnowledgeGraphBuilder, UpstreamSnapshot, UpstreamSource};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use storage::validation::ValidationContext;
use storage::{GraphSummary, TrackerError, ValidationTracker};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] OptionsValidationError),
    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),
}

impl GaialabError for DiscoveryError {
    fn error_code(&self) -> ErrorCode {
        match self {
            DiscoveryError::InvalidRequest(_) => ErrorCode::InvalidArgument,
            DiscoveryError::Tracker(err) => err.error_code(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub candidates: CandidateCounts,
    pub scored: usize,
    pub returned: usize,
    pub by_type: BTreeMap<HypothesisType, usize>,
    pub mean_confidence: f64,
    pub mean_total_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub genes: Vec<String>,
    pub disease: String,
    pub generated_at: String,
    pub graph: GraphSummary,
    pub degraded_sources: Vec<Collection>,
    pub calibrated_types: Vec<HypothesisType>,
    pub stats_version: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisReport {
    pub hypotheses: Vec<Hypothesis>,
    pub stats: GenerationStats,
    pub metadata: ReportMetadata,
}

/// Generates, scores and records hypotheses for a gene list and disease.
pub struct HypothesisEngine {
    source: Arc<dyn UpstreamSource>,
    tracker: Arc<ValidationTracker>,
}

impl HypothesisEngine {
    pub fn new(source: Arc<dyn UpstreamSource>, tracker: Arc<ValidationTracker>) -> Self {
        Self { source, tracker }
    }

    pub fn tracker(&self) -> &Arc<ValidationTracker> {
        &self.tracker
    }

    pub async fn generate_hypotheses(
        &self,
        genes: &[String],
        disease: &str,
        options: &GenerationOptions,
    ) -> Result<HypothesisReport, DiscoveryError> {
        options.validate()?;
        validate_inputs(genes, disease)?;

        let snapshot = fetch_snapshot(self.source.as_ref(), genes, disease).await;
        let papers = annotate(snapshot.literature.clone());
        self.generate_from_snapshot(genes, disease, &snapshot, &papers, options)
            .await
    }

    /// Everything after the upstream fetch: graph build, generation, scoring,
    /// experiment design and tracking.
    pub async fn generate_from_snapshot(
        &self,
        genes: &[String],
        disease: &str,
        snapshot: &UpstreamSnapshot,
        papers: &[AnnotatedPaper],
        options: &GenerationOptions,
    ) -> Result<HypothesisReport, DiscoveryError> {
        options.validate()?;
        validate_inputs(genes, disease)?;
        let disease = disease.trim();

        let graph = KnowledgeGraphBuilder::new(genes, disease).build(snapshot, papers);
        let ctx = GenerationContext::new(&graph, genes, disease);
        let (mut candidates, counts) = generate_candidates(&ctx);

        let history = HistoricalStats::from(&self.tracker.accuracy_stats().await);
        let mut calibrated = BTreeSet::new();
        for candidate in &mut candidates {
            if score_hypothesis(candidate, &history) {
                calibrated.insert(candidate.hypothesis_type);
            }
        }
        let scored = candidates.len();

        let mut hypotheses = rank_hypotheses(candidates, options);
        if options.include_experiment_design {
            for hypothesis in &mut hypotheses {
                hypothesis.experimental_design = Some(design_experiment(hypothesis));
            }
        }

        let context = ValidationContext {
            genes: genes.to_vec(),
            disease: disease.to_string(),
        };
        for hypothesis in &mut hypotheses {
            let id = self
                .tracker
                .record_hypothesis(hypothesis, context.clone())
                .await?;
            hypothesis.validation_id = Some(id);
        }

        let mut by_type = BTreeMap::new();
        for hypothesis in &hypotheses {
            *by_type.entry(hypothesis.hypothesis_type).or_insert(0) += 1;
        }
        let confidences: Vec<f64> = hypotheses.iter().map(|h| h.confidence).collect();
        let totals: Vec<f64> = hypotheses.iter().map(|h| h.total_score).collect();
        let stats = GenerationStats {
            candidates: counts,
            scored,
            returned: hypotheses.len(),
            by_type,
            mean_confidence: mean(&confidences),
            mean_total_score: mean(&totals),
        };

        info!(
            "Generated {} hypotheses for {} ({} candidates, {} calibrated types)",
            stats.returned,
            disease,
            stats.scored,
            calibrated.len()
        );

        let metadata = ReportMetadata {
            genes: genes.to_vec(),
            disease: disease.to_string(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            graph: graph.summary(),
            degraded_sources: snapshot.degraded.clone(),
            calibrated_types: calibrated.into_iter().collect(),
            stats_version: history.version,
        };

        Ok(HypothesisReport {
            hypotheses,
            stats,
            metadata,
        })
    }
}
