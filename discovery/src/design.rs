use gaialab_core::model::{ExperimentalDesign, Hypothesis, HypothesisType};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn or_placeholder<'a>(value: &'a Option<String>, placeholder: &'a str) -> &'a str {
    value.as_deref().unwrap_or(placeholder)
}

fn likelihood(hypothesis: &Hypothesis) -> &'static str {
    match hypothesis.confidence {
        c if c >= 0.75 => "high",
        c if c >= 0.5 => "moderate",
        _ => "low",
    }
}

fn predicted_outcome(hypothesis: &Hypothesis, effect: &str) -> String {
    format!(
        "{} likelihood of {effect} (confidence {:.2}, score {:.2})",
        likelihood(hypothesis),
        hypothesis.confidence,
        hypothesis.score
    )
}

fn crispr_knockout(hypothesis: &Hypothesis) -> ExperimentalDesign {
    let gene = or_placeholder(&hypothesis.subject.gene, "the target gene");
    let disease = or_placeholder(&hypothesis.subject.disease, "the disease model");
    ExperimentalDesign {
        approach: format!("CRISPR-Cas9 knockout of {gene} in {disease} cell models"),
        steps: vec![
            format!("Design 3-4 sgRNAs against early coding exons of {gene}"),
            "Transduce Cas9-expressing disease-relevant cell lines".to_string(),
            format!("Confirm {gene} loss by western blot and amplicon sequencing"),
            "Profile proliferation, apoptosis and disease-specific phenotypes".to_string(),
            format!("Rescue with sgRNA-resistant {gene} cDNA"),
        ],
        controls: strings(&[
            "Non-targeting sgRNA",
            "Safe-harbor locus (AAVS1) cut control",
            "Parental untransduced cells",
        ]),
        readouts: strings(&[
            "Cell viability (CellTiter-Glo)",
            "Colony formation",
            "RNA-seq of knockout vs control",
        ]),
        timeline: "8-12 weeks".to_string(),
        estimated_cost: "$15,000-$30,000".to_string(),
        success_criteria: vec![
            format!("≥50% {gene} protein reduction"),
            "Phenotype reproduced by ≥2 independent sgRNAs".to_string(),
            "Phenotype reversed by rescue construct".to_string(),
        ],
        predicted_outcome: predicted_outcome(
            hypothesis,
            &format!("a {disease}-relevant phenotype after {gene} loss"),
        ),
    }
}

fn combination_screen(hypothesis: &Hypothesis) -> ExperimentalDesign {
    let drug = or_placeholder(&hypothesis.subject.drug, "drug A");
    let partner = or_placeholder(&hypothesis.subject.partner_drug, "drug B");
    ExperimentalDesign {
        approach: format!("Dose-matrix combination screen of {drug} and {partner}"),
        steps: vec![
            format!("Establish single-agent IC50 curves for {drug} and {partner}"),
            "Run a 6x6 dose matrix in triplicate across 3 disease cell lines".to_string(),
            "Compute Bliss independence and Loewe additivity synergy scores".to_string(),
            "Validate the best ratio in a 3D spheroid model".to_string(),
        ],
        controls: vec![
            format!("{drug} monotherapy"),
            format!("{partner} monotherapy"),
            "Vehicle (DMSO)".to_string(),
        ],
        readouts: strings(&[
            "Cell viability",
            "Synergy scores (Bliss, Loewe, ZIP)",
            "Caspase 3/7 activity",
        ]),
        timeline: "6-10 weeks".to_string(),
        estimated_cost: "$10,000-$25,000".to_string(),
        success_criteria: strings(&[
            "Bliss excess > 0.1 in ≥2 cell lines",
            "Combination index < 0.8 at clinically achievable doses",
        ]),
        predicted_outcome: predicted_outcome(hypothesis, "synergistic growth inhibition"),
    }
}

fn in_vitro_efficacy(hypothesis: &Hypothesis) -> ExperimentalDesign {
    let drug = or_placeholder(&hypothesis.subject.drug, "the candidate drug");
    let disease = or_placeholder(&hypothesis.subject.disease, "the disease");
    let sourcing = if hypothesis.subject.drug_approved {
        "Source clinical-grade compound"
    } else {
        "Source research-grade compound and confirm purity"
    };
    ExperimentalDesign {
        approach: format!("In-vitro efficacy of {drug} in {disease} models"),
        steps: vec![
            sourcing.to_string(),
            format!("Treat a panel of {disease} cell lines across an 8-point dose range"),
            "Confirm on-target engagement by target phosphorylation or thermal shift".to_string(),
            "Compare against standard-of-care reference compound".to_string(),
        ],
        controls: strings(&[
            "Vehicle control",
            "Standard-of-care positive control",
            "Non-disease cell line for selectivity",
        ]),
        readouts: strings(&["IC50 / EC50", "Target engagement", "Apoptosis markers"]),
        timeline: "4-8 weeks".to_string(),
        estimated_cost: "$8,000-$20,000".to_string(),
        success_criteria: strings(&[
            "IC50 within clinically achievable plasma concentrations",
            "≥3-fold selectivity over non-disease cells",
        ]),
        predicted_outcome: predicted_outcome(hypothesis, &format!("efficacy against {disease}")),
    }
}

fn pathway_profiling(hypothesis: &Hypothesis) -> ExperimentalDesign {
    let pathway = or_placeholder(&hypothesis.subject.pathway, "the pathway");
    let disease = or_placeholder(&hypothesis.subject.disease, "the disease");
    ExperimentalDesign {
        approach: format!("Activity profiling of {pathway} in {disease} samples"),
        steps: vec![
            format!("Collect matched {disease} and normal tissue or cell samples"),
            format!("Quantify {pathway} member expression by RNA-seq or targeted panel"),
            "Measure pathway output by phospho-proteomics or reporter assay".to_string(),
            "Perturb a pathway node pharmacologically and re-measure".to_string(),
        ],
        controls: strings(&[
            "Matched normal samples",
            "Housekeeping gene normalization",
            "Unrelated pathway as negative control",
        ]),
        readouts: strings(&[
            "Pathway enrichment score",
            "Phospho-protein levels",
            "Reporter activity",
        ]),
        timeline: "6-12 weeks".to_string(),
        estimated_cost: "$12,000-$35,000".to_string(),
        success_criteria: strings(&[
            "Significant pathway enrichment (FDR < 0.05)",
            "Perturbation shifts disease phenotype",
        ]),
        predicted_outcome: predicted_outcome(
            hypothesis,
            &format!("{pathway} dysregulation in {disease}"),
        ),
    }
}

fn generic(hypothesis: &Hypothesis) -> ExperimentalDesign {
    ExperimentalDesign {
        approach: "Targeted validation study".to_string(),
        steps: strings(&[
            "Define a measurable primary endpoint",
            "Select a disease-relevant model system",
            "Run perturbation and control arms in triplicate",
            "Analyze with pre-registered statistics",
        ]),
        controls: strings(&["Vehicle or mock control", "Positive control"]),
        readouts: strings(&["Primary endpoint measurement"]),
        timeline: "8-16 weeks".to_string(),
        estimated_cost: "$10,000-$40,000".to_string(),
        success_criteria: strings(&["Statistically significant effect (p < 0.05)"]),
        predicted_outcome: predicted_outcome(hypothesis, "confirming the hypothesis"),
    }
}

/// Protocol template for the hypothesis type.
pub fn design_experiment(hypothesis: &Hypothesis) -> ExperimentalDesign {
    match hypothesis.hypothesis_type {
        HypothesisType::GeneDiseaseLink => crispr_knockout(hypothesis),
        HypothesisType::DrugSynergy => combination_screen(hypothesis),
        HypothesisType::DrugRepurposing => in_vitro_efficacy(hypothesis),
        HypothesisType::PathwayInvolvement => pathway_profiling(hypothesis),
        HypothesisType::MechanismOfAction | HypothesisType::BiomarkerPrediction => {
            generic(hypothesis)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gaialab_core::model::HypothesisSubject;

    fn hypothesis(kind: HypothesisType, subject: HypothesisSubject) -> Hypothesis {
        let mut h = Hypothesis::candidate(kind, "s", subject, "m", 0.7, 0.9, Vec::new());
        h.confidence = 0.8;
        h
    }

    #[test]
    fn test_template_follows_type() {
        let subject = HypothesisSubject {
            gene: Some("BRCA1".to_string()),
            disease: Some("breast cancer".to_string()),
            ..HypothesisSubject::default()
        };
        let design = design_experiment(&hypothesis(HypothesisType::GeneDiseaseLink, subject));
        assert!(design.approach.starts_with("CRISPR-Cas9 knockout of BRCA1"));
        assert!(design.predicted_outcome.starts_with("high likelihood"));
        assert!(design.predicted_outcome.contains("confidence 0.80"));

        let design = design_experiment(&hypothesis(
            HypothesisType::BiomarkerPrediction,
            HypothesisSubject::default(),
        ));
        assert_eq!(design.approach, "Targeted validation study");
    }

    #[test]
    fn test_design_is_deterministic() {
        let subject = HypothesisSubject {
            drug: Some("Olaparib".to_string()),
            partner_drug: Some("Alpelisib".to_string()),
            ..HypothesisSubject::default()
        };
        let h = hypothesis(HypothesisType::DrugSynergy, subject);
        assert_eq!(design_experiment(&h), design_experiment(&h));
        assert!(design_experiment(&h).controls[0].contains("Olaparib"));
    }
}
