use async_trait::async_trait;
use gaialab_core::ingest::{
    ClinicalRecord, DrugCollection, GeneRecord, InteractionRecord, LiteratureRecord,
    PathwayRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    GeneAnnotations,
    PathwayEnrichment,
    Literature,
    Drugs,
    Interactions,
    ClinicalAssociations,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::GeneAnnotations,
        Collection::PathwayEnrichment,
        Collection::Literature,
        Collection::Drugs,
        Collection::Interactions,
        Collection::ClinicalAssociations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::GeneAnnotations => "gene_annotations",
            Collection::PathwayEnrichment => "pathway_enrichment",
            Collection::Literature => "literature",
            Collection::Drugs => "drugs",
            Collection::Interactions => "interactions",
            Collection::ClinicalAssociations => "clinical_associations",
        }
    }
}

/// The upstream data clients. Each method is fetched independently and may
/// fail on its own.
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    async fn gene_annotations(&self, genes: &[String]) -> anyhow::Result<Vec<GeneRecord>>;
    async fn pathway_enrichment(&self, genes: &[String]) -> anyhow::Result<Vec<PathwayRecord>>;
    async fn literature(
        &self,
        genes: &[String],
        disease: &str,
    ) -> anyhow::Result<Vec<LiteratureRecord>>;
    async fn drugs(&self, genes: &[String]) -> anyhow::Result<Vec<DrugCollection>>;
    async fn interactions(&self, genes: &[String]) -> anyhow::Result<Vec<InteractionRecord>>;
    async fn clinical_associations(
        &self,
        genes: &[String],
        disease: &str,
    ) -> anyhow::Result<Vec<ClinicalRecord>>;
}

/// Serves fixed collections. Collections listed in `failing` return an error,
/// which makes it handy for exercising degraded fetches.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub genes: Vec<GeneRecord>,
    pub pathways: Vec<PathwayRecord>,
    pub literature: Vec<LiteratureRecord>,
    pub drugs: Vec<DrugCollection>,
    pub interactions: Vec<InteractionRecord>,
    pub clinical: Vec<ClinicalRecord>,
    pub failing: HashSet<Collection>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, collection: Collection) -> Self {
        self.failing.insert(collection);
        self
    }

    fn check(&self, collection: Collection) -> anyhow::Result<()> {
        if self.failing.contains(&collection) {
            anyhow::bail!("{} source unavailable", collection.as_str());
        }
        Ok(())
    }
}

#[async_trait]
impl UpstreamSource for StaticSource {
    async fn gene_annotations(&self, _genes: &[String]) -> anyhow::Result<Vec<GeneRecord>> {
        self.check(Collection::GeneAnnotations)?;
        Ok(self.genes.clone())
    }

    async fn pathway_enrichment(&self, _genes: &[String]) -> anyhow::Result<Vec<PathwayRecord>> {
        self.check(Collection::PathwayEnrichment)?;
        Ok(self.pathways.clone())
    }

    async fn literature(
        &self,
        _genes: &[String],
        _disease: &str,
    ) -> anyhow::Result<Vec<LiteratureRecord>> {
        self.check(Collection::Literature)?;
        Ok(self.literature.clone())
    }

    async fn drugs(&self, _genes: &[String]) -> anyhow::Result<Vec<DrugCollection>> {
        self.check(Collection::Drugs)?;
        Ok(self.drugs.clone())
    }

    async fn interactions(&self, _genes: &[String]) -> anyhow::Result<Vec<InteractionRecord>> {
        self.check(Collection::Interactions)?;
        Ok(self.interactions.clone())
    }

    async fn clinical_associations(
        &self,
        _genes: &[String],
        _disease: &str,
    ) -> anyhow::Result<Vec<ClinicalRecord>> {
        self.check(Collection::ClinicalAssociations)?;
        Ok(self.clinical.clone())
    }
}
