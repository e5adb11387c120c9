use crate::source::{Collection, UpstreamSource};
use gaialab_core::ingest::{
    ClinicalRecord, DrugCollection, GeneRecord, InteractionRecord, LiteratureRecord,
    PathwayRecord,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Everything fetched for one request. Collections that failed upstream are
/// empty and listed in `degraded`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamSnapshot {
    pub genes: Vec<GeneRecord>,
    pub pathways: Vec<PathwayRecord>,
    pub literature: Vec<LiteratureRecord>,
    pub drugs: Vec<DrugCollection>,
    pub interactions: Vec<InteractionRecord>,
    pub clinical: Vec<ClinicalRecord>,
    pub degraded: Vec<Collection>,
}

fn or_degraded<T: Default>(
    collection: Collection,
    result: anyhow::Result<T>,
    degraded: &mut Vec<Collection>,
) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("Upstream {} fetch failed: {:#}", collection.as_str(), e);
            degraded.push(collection);
            T::default()
        }
    }
}

/// Fetch all six collections concurrently. Never fails: a failing source
/// contributes an empty collection.
pub async fn fetch_snapshot(
    source: &dyn UpstreamSource,
    genes: &[String],
    disease: &str,
) -> UpstreamSnapshot {
    let (gene_res, pathway_res, literature_res, drug_res, interaction_res, clinical_res) = tokio::join!(
        source.gene_annotations(genes),
        source.pathway_enrichment(genes),
        source.literature(genes, disease),
        source.drugs(genes),
        source.interactions(genes),
        source.clinical_associations(genes, disease),
    );

    let mut degraded = Vec::new();
    let genes_out = or_degraded(Collection::GeneAnnotations, gene_res, &mut degraded);
    let pathways = or_degraded(Collection::PathwayEnrichment, pathway_res, &mut degraded);
    let literature = or_degraded(Collection::Literature, literature_res, &mut degraded);
    let drugs = or_degraded(Collection::Drugs, drug_res, &mut degraded);
    let interactions = or_degraded(Collection::Interactions, interaction_res, &mut degraded);
    let clinical = or_degraded(Collection::ClinicalAssociations, clinical_res, &mut degraded);

    info!(
        "Fetched upstream snapshot for {} genes: {} pathways, {} papers, {} drug sources, {} interactions, {} clinical ({} degraded)",
        genes.len(),
        pathways.len(),
        literature.len(),
        drugs.len(),
        interactions.len(),
        clinical.len(),
        degraded.len()
    );

    UpstreamSnapshot {
        genes: genes_out,
        pathways,
        literature,
        drugs,
        interactions,
        clinical,
        degraded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;
    use gaialab_core::ingest::LiteratureRecord;

    #[tokio::test]
    async fn test_failing_source_degrades_without_error() {
        let mut source = StaticSource::new().failing(Collection::Drugs);
        source
            .literature
            .push(LiteratureRecord::new("1", "BRCA1 is associated with breast cancer"));

        let genes = vec!["BRCA1".to_string()];
        let snapshot = fetch_snapshot(&source, &genes, "breast cancer").await;

        assert_eq!(snapshot.literature.len(), 1);
        assert!(snapshot.drugs.is_empty());
        assert_eq!(snapshot.degraded, vec![Collection::Drugs]);
    }
}
