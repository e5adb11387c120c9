pub mod design;
pub mod engine;
pub mod generators;
pub mod ledger;
pub mod options;
pub mod scorecard;
pub mod scoring;

pub use design::design_experiment;
pub use engine::{DiscoveryError, GenerationStats, HypothesisEngine, HypothesisReport, ReportMetadata};
pub use ledger::{build_evidence_ledger, EvidenceLedger, LedgerOptions, TrustBadge};
pub use options::{GenerationOptions, OptionsValidationError};
pub use scorecard::{build_trust_scorecard, TrustScorecard};
pub use scoring::HistoricalStats;
