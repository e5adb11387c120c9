use gaialab_core::model::Polarity;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static POSITIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(associated with|correlat(?:es|ed) with|promotes?|promoted|induces?|induced|activates?|activated|drives?|driven by|contributes? to|enhances?|enhanced|increases? (?:the )?risk|predicts?|linked to|mediates?|mediated by|required for|upregulat\w*|overexpress\w*|significantly (?:higher|lower|increased|decreased|reduced|improved|associated))\b",
    )
    .unwrap()
});

static NEGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(no (?:significant )?(?:association|correlation|relationship|difference|effect|evidence)|not (?:significantly )?(?:associated|correlated|linked)|not (?:statistically )?significant|non-?significant|failed to (?:replicate|confirm|reproduce|show|demonstrate)|did not (?:replicate|confirm|reach|differ|improve|show)|could not (?:be )?(?:replicated|reproduced|confirmed)|was not (?:observed|detected|found)|no longer significant|inconsistent with|contrary to|unrelated to|null (?:result|finding|association)s?)\b",
    )
    .unwrap()
});

const NEGATORS: [&str; 5] = ["not", "no", "never", "nor", "without"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionTag {
    NoAssociation,
    Statistical,
    Replication,
    Heterogeneity,
    Population,
    Model,
    Methodological,
    DoseTime,
    Directionality,
    Endpoint,
    PublicationBias,
    Underpowered,
    TranslationGap,
    EarlyPhase,
    Unspecified,
}

impl ContradictionTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContradictionTag::NoAssociation => "no_association",
            ContradictionTag::Statistical => "statistical",
            ContradictionTag::Replication => "replication",
            ContradictionTag::Heterogeneity => "heterogeneity",
            ContradictionTag::Population => "population",
            ContradictionTag::Model => "model",
            ContradictionTag::Methodological => "methodological",
            ContradictionTag::DoseTime => "dose_time",
            ContradictionTag::Directionality => "directionality",
            ContradictionTag::Endpoint => "endpoint",
            ContradictionTag::PublicationBias => "publication_bias",
            ContradictionTag::Underpowered => "underpowered",
            ContradictionTag::TranslationGap => "translation_gap",
            ContradictionTag::EarlyPhase => "early_phase",
            ContradictionTag::Unspecified => "unspecified",
        }
    }

    fn is_high_severity(&self) -> bool {
        matches!(
            self,
            ContradictionTag::Replication
                | ContradictionTag::NoAssociation
                | ContradictionTag::Statistical
                | ContradictionTag::Directionality
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Moderate,
    High,
}

impl Severity {
    pub fn from_tags(tags: &[ContradictionTag]) -> Self {
        if tags.iter().any(ContradictionTag::is_high_severity) {
            Severity::High
        } else if tags.is_empty() {
            Severity::Low
        } else {
            Severity::Moderate
        }
    }
}

/// Tag rules in evaluation order. Every rule is tried; matches accumulate.
static CONTRADICTION_RULES: LazyLock<Vec<(ContradictionTag, Regex)>> = LazyLock::new(|| {
    [
        (
            ContradictionTag::NoAssociation,
            r"(?i)\b(no (?:significant )?(?:association|correlation|relationship)|not (?:significantly )?(?:associated|correlated|linked)|unrelated to|null association)\b",
        ),
        (
            ContradictionTag::Statistical,
            r"(?i)(\bnot (?:statistically )?significant\b|\bnon-?significant\b|\bno longer significant\b|\bp\s*[>≥]\s*0?\.05\b|\bdid not reach (?:statistical )?significance\b)",
        ),
        (
            ContradictionTag::Replication,
            r"(?i)\b(fail(?:ed|s)? to (?:replicate|reproduce|confirm)|not (?:be )?replicated|could not (?:be )?(?:replicated|reproduced)|did not replicate|irreproducib\w*|non-?replication)\b",
        ),
        (
            ContradictionTag::Heterogeneity,
            r"(?i)\b(heterogene\w*|inconsistent (?:results|findings|effects)|conflicting (?:results|findings|evidence|data)|mixed (?:results|findings|evidence))\b",
        ),
        (
            ContradictionTag::Population,
            r"(?i)\b((?:population|ethnicity|ancestry|sex|gender)[- ]specific|only in (?:women|men|asian|european|african|caucasian)\w*|differ(?:s|ed)? (?:across|between|among) (?:populations|ethnic groups|cohorts|ancestries))\b",
        ),
        (
            ContradictionTag::Model,
            r"(?i)\b((?:in|across) (?:a )?(?:single|one) (?:cell line|model)|model[- ](?:dependent|specific)|(?:not|only) (?:observed|seen|replicated) in (?:mice|mouse models?|rats|cell lines?|xenografts?|animal models?)|species differences?)\b",
        ),
        (
            ContradictionTag::Methodological,
            r"(?i)\b(confound\w*|selection bias|recall bias|measurement error|methodological (?:limitations?|flaws?|concerns?|issues?)|retrospective design|lack of (?:a )?control group)\b",
        ),
        (
            ContradictionTag::DoseTime,
            r"(?i)\b((?:dose|time)[- ]dependen(?:t|ce)|only at (?:high|higher|supraphysiological) (?:doses?|concentrations?)|transient(?:ly)?|short[- ]term (?:only|effects?))\b",
        ),
        (
            ContradictionTag::Directionality,
            r"(?i)\b((?:reverse|opposite|inverse) (?:causation|direction|effect|association|relationship)|protective (?:effect|role|association)|bidirectional)\b",
        ),
        (
            ContradictionTag::Endpoint,
            r"(?i)\b((?:primary|secondary|surrogate) end ?point (?:was )?not (?:met|reached)|did not (?:meet|improve) (?:the )?(?:primary end ?point|overall survival|progression-free survival)|no (?:improvement|benefit) in (?:overall|progression-free) survival)\b",
        ),
        (
            ContradictionTag::PublicationBias,
            r"(?i)\b(publication bias|funnel plot asymmetry|small[- ]study effects?)\b",
        ),
        (
            ContradictionTag::Underpowered,
            r"(?i)\b(underpowered|(?:small|limited) sample sizes?|insufficient (?:statistical )?power|low (?:statistical )?power)\b",
        ),
        (
            ContradictionTag::TranslationGap,
            r"(?i)\b((?:did|does) not translate|failed to translate|translational gap|not (?:recapitulated|observed|reproduced) in (?:humans|patients|clinical (?:trials|settings?)))\b",
        ),
        (
            ContradictionTag::EarlyPhase,
            r"(?i)\b(phase (?:0|1|i)(?: trial| study)?|first[- ]in[- ]human|pilot (?:study|trial)|feasibility (?:study|trial)|preliminary (?:results|data|findings|evidence))\b",
        ),
    ]
    .into_iter()
    .map(|(tag, pattern)| (tag, Regex::new(pattern).unwrap()))
    .collect()
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    pub support: usize,
    pub contradict: usize,
}

impl Signals {
    pub fn polarity(&self) -> Polarity {
        match (self.support > 0, self.contradict > 0) {
            (true, true) => Polarity::Mixed,
            (true, false) => Polarity::Support,
            (false, true) => Polarity::Contradict,
            (false, false) => Polarity::Neutral,
        }
    }
}

fn preceded_by_negator(text: &str, start: usize) -> bool {
    text[..start]
        .split_whitespace()
        .next_back()
        .map(|word| {
            let word = word.to_ascii_lowercase();
            NEGATORS.contains(&word.as_str())
        })
        .unwrap_or(false)
}

/// Count assertive and negating phrases. A positive phrase directly after a
/// negator ("not associated with") is left to the negative set.
pub fn count_signals(text: &str) -> Signals {
    let support = POSITIVE
        .find_iter(text)
        .filter(|m| !preceded_by_negator(text, m.start()))
        .count();
    let contradict = NEGATIVE.find_iter(text).count();
    Signals {
        support,
        contradict,
    }
}

pub fn contradiction_tags(text: &str, polarity: Polarity) -> Vec<ContradictionTag> {
    let mut tags: Vec<ContradictionTag> = CONTRADICTION_RULES
        .iter()
        .filter(|(_, rule)| rule.is_match(text))
        .map(|(tag, _)| *tag)
        .collect();

    if tags.is_empty() && matches!(polarity, Polarity::Contradict | Polarity::Mixed) {
        tags.push(ContradictionTag::Unspecified);
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negated_positive_is_not_support() {
        let signals = count_signals("Variant X was not associated with risk");
        assert_eq!(signals.support, 0);
        assert_eq!(signals.contradict, 1);
        assert_eq!(signals.polarity(), Polarity::Contradict);
    }

    #[test]
    fn test_mixed_wins_over_counts() {
        let signals = count_signals(
            "A promotes B. A activates C. A drives D. However A did not replicate in E.",
        );
        assert_eq!(signals.support, 3);
        assert_eq!(signals.polarity(), Polarity::Mixed);
    }

    #[test]
    fn test_unspecified_only_for_contradicting_papers() {
        assert_eq!(
            contradiction_tags("nothing here", Polarity::Contradict),
            vec![ContradictionTag::Unspecified]
        );
        assert!(contradiction_tags("nothing here", Polarity::Support).is_empty());
    }

    #[test]
    fn test_tags_are_additive() {
        let tags = contradiction_tags(
            "Results were heterogeneous and underpowered; publication bias was likely.",
            Polarity::Mixed,
        );
        assert_eq!(
            tags,
            vec![
                ContradictionTag::Heterogeneity,
                ContradictionTag::PublicationBias,
                ContradictionTag::Underpowered,
            ]
        );
        assert_eq!(Severity::from_tags(&tags), Severity::Moderate);
    }

    #[test]
    fn test_phase_one_is_early_phase_but_phase_two_is_not() {
        assert!(contradiction_tags("a phase I trial", Polarity::Support)
            .contains(&ContradictionTag::EarlyPhase));
        assert!(contradiction_tags("a phase II trial", Polarity::Support).is_empty());
    }
}
