pub mod graph;

pub use graph::{GraphSummary, KnowledgeGraph};
