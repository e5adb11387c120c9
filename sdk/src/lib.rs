//! One-call analysis over a gene list and disease: upstream fetch under a
//! deadline, classification, hypothesis generation and tracking, narrative
//! synthesis, evidence ledger and trust scorecard.

use chrono::{Datelike, Utc};
use discovery::options::validate_inputs;
use discovery::{
    build_evidence_ledger, build_trust_scorecard, DiscoveryError, EvidenceLedger,
    GenerationOptions, HypothesisEngine, HypothesisReport, LedgerOptions, OptionsValidationError,
    TrustScorecard,
};
use gaialab_core::config::AppConfig;
use gaialab_core::error::{ErrorCode, GaialabError};
use gaialab_core::model::Insight;
use ingestion::classifier::{annotate, AnnotatedPaper};
use ingestion::{fetch_snapshot, UpstreamSource};
use serde::{Deserialize, Serialize};
use slm::{NarrativeSynthesizer, PaperDigest, SynthesisRequest, TemplateSynthesizer};
use std::sync::Arc;
use std::time::Duration;
use storage::{JsonFileValidationStore, StoreError, TrackerError, ValidationTracker};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] OptionsValidationError),
    #[error("upstream fetch exceeded {0} ms")]
    DeadlineExceeded(u64),
    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),
    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl GaialabError for SdkError {
    fn error_code(&self) -> ErrorCode {
        match self {
            SdkError::InvalidRequest(_) => ErrorCode::InvalidArgument,
            SdkError::DeadlineExceeded(_) => ErrorCode::DeadlineExceeded,
            SdkError::Discovery(err) => err.error_code(),
            SdkError::Tracker(err) => err.error_code(),
            SdkError::Store(_) => ErrorCode::Internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub genes: Vec<String>,
    pub disease: String,
    /// Falls back to the configured discovery defaults.
    #[serde(default)]
    pub options: Option<GenerationOptions>,
    /// Recency in the evidence ledger is measured against this year; the
    /// current year when absent.
    #[serde(default)]
    pub reference_year: Option<i32>,
}

impl AnalysisRequest {
    pub fn new(genes: Vec<String>, disease: impl Into<String>) -> Self {
        Self {
            genes,
            disease: disease.into(),
            options: None,
            reference_year: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub hypotheses: HypothesisReport,
    pub insights: Vec<Insight>,
    pub ledger: EvidenceLedger,
    pub scorecard: TrustScorecard,
}

pub struct GaiaLab {
    config: AppConfig,
    source: Arc<dyn UpstreamSource>,
    engine: HypothesisEngine,
    synthesizer: Arc<dyn NarrativeSynthesizer>,
}

impl GaiaLab {
    pub fn new(
        config: AppConfig,
        source: Arc<dyn UpstreamSource>,
        tracker: Arc<ValidationTracker>,
        synthesizer: Arc<dyn NarrativeSynthesizer>,
    ) -> Self {
        let engine = HypothesisEngine::new(source.clone(), tracker);
        Self {
            config,
            source,
            engine,
            synthesizer,
        }
    }

    /// Validation log and stats under `config.storage`, template synthesis.
    pub async fn open(
        config: AppConfig,
        source: Arc<dyn UpstreamSource>,
    ) -> Result<Self, SdkError> {
        let store = JsonFileValidationStore::open(
            config.storage.validation_log_path(),
            config.storage.stats_path(),
        )
        .await?;
        let tracker = Arc::new(ValidationTracker::open(Arc::new(store)).await?);
        Ok(Self::new(
            config,
            source,
            tracker,
            Arc::new(TemplateSynthesizer::default()),
        ))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn tracker(&self) -> &Arc<ValidationTracker> {
        self.engine.tracker()
    }

    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisReport, SdkError> {
        let options = request
            .options
            .clone()
            .unwrap_or_else(|| GenerationOptions::from(&self.config.discovery));
        options.validate()?;
        validate_inputs(&request.genes, &request.disease)?;
        let disease = request.disease.trim();

        let deadline_ms = self.config.upstream.fetch_deadline_ms;
        let snapshot = tokio::time::timeout(
            Duration::from_millis(deadline_ms),
            fetch_snapshot(self.source.as_ref(), &request.genes, disease),
        )
        .await
        .map_err(|_| SdkError::DeadlineExceeded(deadline_ms))?;

        let papers = annotate(snapshot.literature.clone());
        let hypotheses = self
            .engine
            .generate_from_snapshot(&request.genes, disease, &snapshot, &papers, &options)
            .await?;

        let insights = self.synthesize(&request.genes, disease, &papers).await;

        let reference_year = request.reference_year.unwrap_or_else(|| Utc::now().year());
        let ledger_options = LedgerOptions::from_config(&self.config.ledger, reference_year);
        let ledger = build_evidence_ledger(
            &papers,
            &insights,
            &hypotheses.hypotheses,
            &ledger_options,
        );
        let scorecard = build_trust_scorecard(&ledger, &insights);

        info!(
            "Analysis for {}: {} hypotheses, {} insights, {} papers, consensus {:?}",
            disease,
            hypotheses.hypotheses.len(),
            insights.len(),
            ledger.papers.len(),
            scorecard.consensus.level
        );

        Ok(AnalysisReport {
            hypotheses,
            insights,
            ledger,
            scorecard,
        })
    }

    /// Synthesis failures degrade to no insights.
    async fn synthesize(
        &self,
        genes: &[String],
        disease: &str,
        papers: &[AnnotatedPaper],
    ) -> Vec<Insight> {
        let request = SynthesisRequest {
            genes: genes.to_vec(),
            disease: disease.to_string(),
            papers: papers
                .iter()
                .map(|p| PaperDigest {
                    pmid: p.record.pmid.clone(),
                    title: p.record.title.clone(),
                    abstract_text: p.record.abstract_text.clone(),
                    polarity: p.classification.polarity,
                })
                .collect(),
        };
        match self.synthesizer.synthesize(&request).await {
            Ok(insights) => insights,
            Err(e) => {
                warn!("Narrative synthesis failed: {:#}", e);
                Vec::new()
            }
        }
    }
}
