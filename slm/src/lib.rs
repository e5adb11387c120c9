pub mod synthesis;

pub use synthesis::{
    NarrativeSynthesizer, PaperDigest, SynthesisError, SynthesisRequest, TemplateSynthesizer,
};
