use gaialab_core::config::DiscoveryConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_MIN_CONFIDENCE: f64 = 0.3;
const DEFAULT_MAX_HYPOTHESES: usize = 10;
const DEFAULT_NOVELTY_THRESHOLD: f64 = 0.5;
const MAX_HYPOTHESES_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GenerationOptions {
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default = "default_max_hypotheses")]
    pub max_hypotheses: usize,
    #[serde(default = "default_novelty_threshold")]
    pub novelty_threshold: f64,
    #[serde(default = "default_include_experiment_design")]
    pub include_experiment_design: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            max_hypotheses: DEFAULT_MAX_HYPOTHESES,
            novelty_threshold: DEFAULT_NOVELTY_THRESHOLD,
            include_experiment_design: true,
        }
    }
}

impl From<&DiscoveryConfig> for GenerationOptions {
    fn from(config: &DiscoveryConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            max_hypotheses: config.max_hypotheses,
            novelty_threshold: config.novelty_threshold,
            include_experiment_design: config.include_experiment_design,
        }
    }
}

const fn default_min_confidence() -> f64 {
    DEFAULT_MIN_CONFIDENCE
}

const fn default_max_hypotheses() -> usize {
    DEFAULT_MAX_HYPOTHESES
}

const fn default_novelty_threshold() -> f64 {
    DEFAULT_NOVELTY_THRESHOLD
}

const fn default_include_experiment_design() -> bool {
    true
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OptionsValidationError {
    #[error("genes must contain at least one non-empty symbol")]
    EmptyGenes,
    #[error("disease must not be empty")]
    EmptyDisease,
    #[error("min_confidence must be within [0, 1], got {0}")]
    InvalidMinConfidence(f64),
    #[error("novelty_threshold must be within [0, 1], got {0}")]
    InvalidNoveltyThreshold(f64),
    #[error("max_hypotheses must be between 1 and 100, got {0}")]
    InvalidMaxHypotheses(usize),
}

fn in_unit_range(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

impl GenerationOptions {
    pub fn parse_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn validate(&self) -> Result<(), OptionsValidationError> {
        if !in_unit_range(self.min_confidence) {
            return Err(OptionsValidationError::InvalidMinConfidence(
                self.min_confidence,
            ));
        }
        if !in_unit_range(self.novelty_threshold) {
            return Err(OptionsValidationError::InvalidNoveltyThreshold(
                self.novelty_threshold,
            ));
        }
        if self.max_hypotheses == 0 || self.max_hypotheses > MAX_HYPOTHESES_LIMIT {
            return Err(OptionsValidationError::InvalidMaxHypotheses(
                self.max_hypotheses,
            ));
        }
        Ok(())
    }
}

/// Checks the request inputs that sit outside the options struct.
pub fn validate_inputs(genes: &[String], disease: &str) -> Result<(), OptionsValidationError> {
    if genes.iter().all(|g| g.trim().is_empty()) {
        return Err(OptionsValidationError::EmptyGenes);
    }
    if disease.trim().is_empty() {
        return Err(OptionsValidationError::EmptyDisease);
    }
    Ok(())
}
