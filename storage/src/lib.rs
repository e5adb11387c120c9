pub mod index;
pub mod store;
pub mod tracker;
pub mod validation;

pub use index::{GraphSummary, KnowledgeGraph};
pub use store::{InMemoryValidationStore, JsonFileValidationStore, StoreError, ValidationStore};
pub use tracker::{TrackerError, ValidationTracker};
pub use validation::{AccuracyStats, ValidationOutcome, ValidationRecord, ValidationUpdate};
