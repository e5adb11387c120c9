use crate::store::{StoreError, ValidationStore};
use crate::validation::{
    compute_accuracy_stats, compute_recalibration, record_id, AccuracyStats, Engagement,
    ValidationContext, ValidationDetails, ValidationRecord, ValidationUpdate,
    RECALIBRATION_INTERVAL,
};
use chrono::{DateTime, SecondsFormat, Utc};
use gaialab_core::error::{ErrorCode, GaialabError};
use gaialab_core::model::Hypothesis;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl GaialabError for TrackerError {
    fn error_code(&self) -> ErrorCode {
        match self {
            TrackerError::Store(err) => err.error_code(),
        }
    }
}

struct TrackerState {
    records: Vec<ValidationRecord>,
    index: HashMap<String, usize>,
    stats: AccuracyStats,
}

impl TrackerState {
    fn from_records(records: Vec<ValidationRecord>, stats: AccuracyStats) -> Self {
        let index = records
            .iter()
            .enumerate()
            .map(|(idx, record)| (record.id.clone(), idx))
            .collect();
        Self {
            records,
            index,
            stats,
        }
    }
}

/// Log of generated hypotheses and their experimental outcomes.
///
/// `record_hypothesis` and `record_validation` are the only mutators. Both
/// persist the record, then recompute the accuracy stats from the full log
/// under a new version.
pub struct ValidationTracker {
    store: Arc<dyn ValidationStore>,
    write_lock: Mutex<()>,
    state: RwLock<TrackerState>,
}

impl ValidationTracker {
    /// Load the log from `store` and rebuild stats from it.
    pub async fn open(store: Arc<dyn ValidationStore>) -> Result<Self, TrackerError> {
        let records = store.read_all().await?;
        let stored_stats = store.read_stats().await?;
        let (version, last_recalibration) = stored_stats
            .map(|stats| (stats.version, stats.last_recalibration))
            .unwrap_or((0, None));
        let stats = compute_accuracy_stats(&records, version, last_recalibration);

        info!(
            "Validation tracker opened: {} records, {} validated",
            stats.total_generated, stats.total_validated
        );

        Ok(Self {
            store,
            write_lock: Mutex::new(()),
            state: RwLock::new(TrackerState::from_records(records, stats)),
        })
    }

    pub async fn record_hypothesis(
        &self,
        hypothesis: &Hypothesis,
        context: ValidationContext,
    ) -> Result<String, TrackerError> {
        self.record_hypothesis_at(hypothesis, context, Utc::now())
            .await
    }

    /// Persist an immutable snapshot of `hypothesis` created at `created_at`.
    /// Recording the same hypothesis at the same instant is a no-op that
    /// returns the existing id.
    pub async fn record_hypothesis_at(
        &self,
        hypothesis: &Hypothesis,
        context: ValidationContext,
        created_at: DateTime<Utc>,
    ) -> Result<String, TrackerError> {
        let _guard = self.write_lock.lock().await;

        let created_at = created_at.to_rfc3339_opts(SecondsFormat::Micros, true);
        let id = record_id(hypothesis.hypothesis_type, &hypothesis.statement, &created_at);
        if self.state.read().await.index.contains_key(&id) {
            return Ok(id);
        }

        let mut snapshot = hypothesis.clone();
        snapshot.validation_id = Some(id.clone());
        let record = ValidationRecord {
            id: id.clone(),
            hypothesis: snapshot,
            context,
            created_at,
            validation: ValidationDetails::default(),
            engagement: Engagement::default(),
        };

        self.store.append(record.clone()).await?;

        let mut state = self.state.write().await;
        let next_idx = state.records.len();
        state.index.insert(id.clone(), next_idx);
        state.records.push(record);
        self.refresh_stats(&mut state, false).await;

        info!(
            "Recorded {} hypothesis {}",
            hypothesis.hypothesis_type.as_str(),
            id
        );
        Ok(id)
    }

    /// Record an experimental outcome. Returns `Ok(false)` for an unknown id or
    /// a transition the outcome state machine does not allow.
    pub async fn record_validation(
        &self,
        id: &str,
        update: ValidationUpdate,
    ) -> Result<bool, TrackerError> {
        let _guard = self.write_lock.lock().await;

        let mut record = {
            let state = self.state.read().await;
            match state.index.get(id) {
                Some(&idx) => state.records[idx].clone(),
                None => {
                    warn!("Validation for unknown hypothesis id {}", id);
                    return Ok(false);
                }
            }
        };

        let current = record.validation.outcome;
        if !current.can_transition_to(update.outcome) {
            warn!(
                "Refusing validation transition {:?} -> {:?} for {}",
                current, update.outcome, id
            );
            return Ok(false);
        }

        record.validation = ValidationDetails {
            outcome: update.outcome,
            experimental_results: update.experimental_results,
            validated_by: update.validated_by,
            pmid: update.pmid,
            notes: update.notes,
            validated_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        };

        self.store.append(record.clone()).await?;

        let mut state = self.state.write().await;
        let idx = state.index.get(id).copied();
        if let Some(idx) = idx {
            state.records[idx] = record;
        }
        let terminal = update.outcome.is_terminal();
        self.refresh_stats(&mut state, terminal).await;

        info!(
            "Recorded validation {:?} for {} (accuracy {:.1}%)",
            update.outcome, id, state.stats.accuracy
        );
        Ok(true)
    }

    pub async fn accuracy_stats(&self) -> AccuracyStats {
        self.state.read().await.stats.clone()
    }

    /// Stats recomputed from the current log without bumping the version.
    pub async fn recompute_stats(&self) -> AccuracyStats {
        let state = self.state.read().await;
        compute_accuracy_stats(
            &state.records,
            state.stats.version,
            state.stats.last_recalibration.clone(),
        )
    }

    pub async fn get(&self, id: &str) -> Option<ValidationRecord> {
        let state = self.state.read().await;
        state.index.get(id).map(|&idx| state.records[idx].clone())
    }

    pub async fn records(&self) -> Vec<ValidationRecord> {
        self.state.read().await.records.clone()
    }

    /// The log is already durable here, so a failed stats write is logged
    /// and the in-memory stats still advance.
    async fn refresh_stats(&self, state: &mut TrackerState, validation_write: bool) {
        let version = state.stats.version + 1;
        let mut stats = compute_accuracy_stats(
            &state.records,
            version,
            state.stats.last_recalibration.clone(),
        );

        if validation_write
            && stats.total_validated > 0
            && stats.total_validated % RECALIBRATION_INTERVAL == 0
        {
            let recalibration = compute_recalibration(&state.records);
            info!(
                "Recalibration pass at {} validations",
                recalibration.at_validation_count
            );
            stats.last_recalibration = Some(recalibration);
        }

        state.stats = stats;
        if let Err(e) = self.store.write_stats(&state.stats).await {
            warn!(
                "Failed to persist accuracy stats v{}: {}",
                state.stats.version, e
            );
        }
    }
}
