pub mod builder;
pub mod classifier;
pub mod fetch;
pub mod source;

pub use builder::KnowledgeGraphBuilder;
pub use classifier::{classify_paper, AnnotatedPaper, PaperClassification};
pub use fetch::{fetch_snapshot, UpstreamSnapshot};
pub use source::{Collection, StaticSource, UpstreamSource};
