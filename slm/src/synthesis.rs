use async_trait::async_trait;
use gaialab_core::model::{Insight, Polarity};
use gaialab_core::numeric::clamp01;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("synthesis request has no genes")]
    NoGenes,
}

/// What the synthesizer sees of a classified paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperDigest {
    pub pmid: String,
    pub title: String,
    #[serde(default)]
    pub abstract_text: String,
    pub polarity: Polarity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub genes: Vec<String>,
    pub disease: String,
    pub papers: Vec<PaperDigest>,
}

/// Turns classified literature into narrative insights that cite PMIDs.
#[async_trait]
pub trait NarrativeSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> anyhow::Result<Vec<Insight>>;
}

/// One insight per gene with literature, citing supporting papers first.
pub struct TemplateSynthesizer {
    max_citations: usize,
}

impl TemplateSynthesizer {
    pub fn new(max_citations: usize) -> Self {
        Self {
            max_citations: max_citations.max(1),
        }
    }
}

impl Default for TemplateSynthesizer {
    fn default() -> Self {
        Self::new(5)
    }
}

fn mentions(paper: &PaperDigest, gene: &str) -> bool {
    [paper.title.as_str(), paper.abstract_text.as_str()]
        .iter()
        .flat_map(|text| text.split(|c: char| !c.is_ascii_alphanumeric()))
        .any(|token| token.eq_ignore_ascii_case(gene))
}

fn citation_rank(polarity: Polarity) -> u8 {
    match polarity {
        Polarity::Support => 0,
        Polarity::Mixed => 1,
        Polarity::Contradict => 2,
        Polarity::Neutral => 3,
    }
}

#[async_trait]
impl NarrativeSynthesizer for TemplateSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> anyhow::Result<Vec<Insight>> {
        if request.genes.is_empty() {
            return Err(SynthesisError::NoGenes.into());
        }

        let mut insights = Vec::new();
        for gene in &request.genes {
            let mut related: Vec<&PaperDigest> = request
                .papers
                .iter()
                .filter(|p| mentions(p, gene))
                .collect();
            if related.is_empty() {
                continue;
            }
            related.sort_by_key(|p| citation_rank(p.polarity));

            let total = related.len();
            let support = related
                .iter()
                .filter(|p| p.polarity == Polarity::Support)
                .count();
            let contradict = related
                .iter()
                .filter(|p| p.polarity == Polarity::Contradict)
                .count();
            let mixed = related
                .iter()
                .filter(|p| p.polarity == Polarity::Mixed)
                .count();

            let statement = if contradict > support {
                format!(
                    "Evidence linking {gene} to {} is contested: {contradict} of {total} papers report no effect",
                    request.disease
                )
            } else {
                format!(
                    "{gene} is linked to {} in {support} of {total} papers",
                    request.disease
                )
            };

            insights.push(Insight {
                id: format!("insight-{}", insights.len() + 1),
                statement,
                cited_pmids: related
                    .iter()
                    .take(self.max_citations)
                    .map(|p| p.pmid.clone())
                    .collect(),
                confidence: clamp01((support as f64 + 0.5 * mixed as f64) / total as f64),
            });
        }

        debug!(
            "Template synthesis produced {} insights from {} papers",
            insights.len(),
            request.papers.len()
        );
        Ok(insights)
    }
}
