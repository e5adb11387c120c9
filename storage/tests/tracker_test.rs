use async_trait::async_trait;
use gaialab_core::model::{Hypothesis, HypothesisSubject, HypothesisType};
use std::sync::Arc;
use storage::validation::ValidationContext;
use storage::{
    AccuracyStats, InMemoryValidationStore, JsonFileValidationStore, StoreError,
    ValidationOutcome, ValidationRecord, ValidationStore, ValidationTracker, ValidationUpdate,
};
use tempfile::tempdir;

fn hypothesis(kind: HypothesisType, statement: &str, confidence: f64) -> Hypothesis {
    let mut h = Hypothesis::candidate(
        kind,
        statement,
        HypothesisSubject::default(),
        "mechanism",
        0.6,
        0.9,
        Vec::new(),
    );
    h.confidence = confidence;
    h
}

fn context() -> ValidationContext {
    ValidationContext {
        genes: vec!["BRCA1".to_string()],
        disease: "breast cancer".to_string(),
    }
}

async fn memory_tracker() -> ValidationTracker {
    ValidationTracker::open(Arc::new(InMemoryValidationStore::new()))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_record_hypothesis_snapshots_and_counts() {
    let tracker = memory_tracker().await;
    let h = hypothesis(HypothesisType::GeneDiseaseLink, "BRCA1 drives X", 0.7);

    let id = tracker.record_hypothesis(&h, context()).await.unwrap();
    let record = tracker.get(&id).await.unwrap();

    assert_eq!(record.hypothesis.statement, "BRCA1 drives X");
    assert_eq!(record.hypothesis.validation_id.as_deref(), Some(id.as_str()));
    assert_eq!(record.validation.outcome, ValidationOutcome::NotTested);
    assert_eq!(record.engagement.views, 0);

    let stats = tracker.accuracy_stats().await;
    assert_eq!(stats.total_generated, 1);
    assert_eq!(stats.total_validated, 0);
    assert_eq!(stats.version, 1);
}

#[tokio::test]
async fn test_unknown_id_is_a_recoverable_failure() {
    let tracker = memory_tracker().await;
    let ok = tracker
        .record_validation(
            "does-not-exist",
            ValidationUpdate::outcome(ValidationOutcome::Confirmed),
        )
        .await
        .unwrap();
    assert!(!ok);
    assert_eq!(tracker.accuracy_stats().await.version, 0);
}

#[tokio::test]
async fn test_terminal_outcomes_cannot_be_overwritten() {
    let tracker = memory_tracker().await;
    let h = hypothesis(HypothesisType::DrugSynergy, "A + B synergize", 0.8);
    let id = tracker.record_hypothesis(&h, context()).await.unwrap();

    assert!(tracker
        .record_validation(&id, ValidationUpdate::outcome(ValidationOutcome::Pending))
        .await
        .unwrap());
    assert!(tracker
        .record_validation(&id, ValidationUpdate::outcome(ValidationOutcome::Rejected))
        .await
        .unwrap());
    assert!(!tracker
        .record_validation(&id, ValidationUpdate::outcome(ValidationOutcome::Confirmed))
        .await
        .unwrap());

    let record = tracker.get(&id).await.unwrap();
    assert_eq!(record.validation.outcome, ValidationOutcome::Rejected);
}

#[tokio::test]
async fn test_per_type_accuracy_after_five_validations() {
    let tracker = memory_tracker().await;
    let outcomes = [
        ValidationOutcome::Confirmed,
        ValidationOutcome::Confirmed,
        ValidationOutcome::Confirmed,
        ValidationOutcome::Confirmed,
        ValidationOutcome::Rejected,
    ];
    for (i, outcome) in outcomes.iter().enumerate() {
        let h = hypothesis(
            HypothesisType::GeneDiseaseLink,
            &format!("GENE{i} is linked to breast cancer"),
            0.6,
        );
        let id = tracker.record_hypothesis(&h, context()).await.unwrap();
        let mut update = ValidationUpdate::outcome(*outcome);
        update.validated_by = Some("lab-7".to_string());
        update.pmid = Some(format!("{}", 1000 + i));
        assert!(tracker.record_validation(&id, update).await.unwrap());
    }

    let stats = tracker.accuracy_stats().await;
    let per_type = &stats.by_type[&HypothesisType::GeneDiseaseLink];
    assert_eq!(per_type.total, 5);
    assert!((per_type.accuracy - 80.0).abs() < 1e-9);
    assert!((stats.accuracy - 80.0).abs() < 1e-9);
    assert!((stats.trust_score - (0.005 * 50.0 + 40.0)).abs() < 1e-9);
    assert!(stats.last_recalibration.is_none());
}

#[tokio::test]
async fn test_tenth_validation_triggers_recalibration() {
    let tracker = memory_tracker().await;
    for i in 0..10 {
        let h = hypothesis(
            HypothesisType::PathwayInvolvement,
            &format!("pathway {i}"),
            if i < 5 { 0.4 } else { 0.9 },
        );
        let id = tracker.record_hypothesis(&h, context()).await.unwrap();
        let outcome = if i < 5 {
            ValidationOutcome::Rejected
        } else {
            ValidationOutcome::Confirmed
        };
        tracker
            .record_validation(&id, ValidationUpdate::outcome(outcome))
            .await
            .unwrap();
        if i < 9 {
            assert!(tracker.accuracy_stats().await.last_recalibration.is_none());
        }
    }

    let stats = tracker.accuracy_stats().await;
    let recalibration = stats.last_recalibration.expect("recalibration after 10");
    assert_eq!(recalibration.at_validation_count, 10);
    assert_eq!(recalibration.confidence_buckets[0].total, 5);
    assert_eq!(recalibration.confidence_buckets[0].accuracy, 0.0);
    assert_eq!(recalibration.confidence_buckets[3].accuracy, 100.0);
}

#[tokio::test]
async fn test_recompute_is_idempotent() {
    let tracker = memory_tracker().await;
    let id = tracker
        .record_hypothesis(
            &hypothesis(HypothesisType::DrugRepurposing, "D for breast cancer", 0.7),
            context(),
        )
        .await
        .unwrap();
    tracker
        .record_validation(&id, ValidationUpdate::outcome(ValidationOutcome::Partial))
        .await
        .unwrap();

    let first = tracker.recompute_stats().await;
    let second = tracker.recompute_stats().await;
    assert_eq!(first, second);
    assert_eq!(first, tracker.accuracy_stats().await);
}

#[tokio::test]
async fn test_concurrent_validations_on_different_ids() {
    let tracker = Arc::new(memory_tracker().await);
    let mut ids = Vec::new();
    for i in 0..8 {
        let h = hypothesis(HypothesisType::DrugSynergy, &format!("pair {i}"), 0.8);
        ids.push(tracker.record_hypothesis(&h, context()).await.unwrap());
    }

    let mut handles = Vec::new();
    for (i, id) in ids.into_iter().enumerate() {
        let tracker = Arc::clone(&tracker);
        handles.push(tokio::spawn(async move {
            let outcome = if i % 2 == 0 {
                ValidationOutcome::Confirmed
            } else {
                ValidationOutcome::Rejected
            };
            tracker
                .record_validation(&id, ValidationUpdate::outcome(outcome))
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap());
    }

    let stats = tracker.accuracy_stats().await;
    assert_eq!(stats.total_validated, 8);
    assert!((stats.accuracy - 50.0).abs() < 1e-9);
    // 8 hypothesis writes + 8 validation writes
    assert_eq!(stats.version, 16);
}

#[tokio::test]
async fn test_json_store_survives_restart() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("validation_log.json");
    let stats_path = dir.path().join("accuracy_stats.json");

    let id = {
        let store = Arc::new(JsonFileValidationStore::open(&log, &stats_path).await.unwrap());
        let tracker = ValidationTracker::open(store).await.unwrap();
        let id = tracker
            .record_hypothesis(
                &hypothesis(HypothesisType::GeneDiseaseLink, "TP53 and X", 0.5),
                context(),
            )
            .await
            .unwrap();
        tracker
            .record_validation(&id, ValidationUpdate::outcome(ValidationOutcome::Confirmed))
            .await
            .unwrap();
        id
    };

    let store = Arc::new(JsonFileValidationStore::open(&log, &stats_path).await.unwrap());
    let persisted_stats = store.read_stats().await.unwrap().unwrap();
    assert_eq!(persisted_stats.version, 2);

    let tracker = ValidationTracker::open(store).await.unwrap();
    let record = tracker.get(&id).await.unwrap();
    assert_eq!(record.validation.outcome, ValidationOutcome::Confirmed);

    let stats = tracker.accuracy_stats().await;
    assert_eq!(stats.version, 2);
    assert_eq!(stats.total_validated, 1);
    assert!((stats.accuracy - 100.0).abs() < 1e-9);
}

/// Log writes succeed, stats writes always fail.
struct StatsWriteFails {
    inner: InMemoryValidationStore,
}

#[async_trait]
impl ValidationStore for StatsWriteFails {
    async fn append(&self, record: ValidationRecord) -> Result<(), StoreError> {
        self.inner.append(record).await
    }

    async fn read_all(&self) -> Result<Vec<ValidationRecord>, StoreError> {
        self.inner.read_all().await
    }

    async fn write_stats(&self, _stats: &AccuracyStats) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::other("disk full")))
    }

    async fn read_stats(&self) -> Result<Option<AccuracyStats>, StoreError> {
        self.inner.read_stats().await
    }
}

#[tokio::test]
async fn test_stats_write_failure_keeps_durable_validation() {
    let store = Arc::new(StatsWriteFails {
        inner: InMemoryValidationStore::new(),
    });
    let tracker = ValidationTracker::open(store.clone()).await.unwrap();

    let id = tracker
        .record_hypothesis(
            &hypothesis(HypothesisType::DrugRepurposing, "Olaparib for Y", 0.8),
            context(),
        )
        .await
        .unwrap();
    let accepted = tracker
        .record_validation(&id, ValidationUpdate::outcome(ValidationOutcome::Confirmed))
        .await
        .unwrap();
    assert!(accepted);

    let stats = tracker.accuracy_stats().await;
    assert_eq!(stats.version, 2);
    assert_eq!(stats.total_validated, 1);

    let logged = store.read_all().await.unwrap();
    assert_eq!(
        logged.last().unwrap().validation.outcome,
        ValidationOutcome::Confirmed
    );
    assert!(store.read_stats().await.unwrap().is_none());
}
