use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyType {
    MetaAnalysis,
    Review,
    Clinical,
    Preclinical,
    Mixed,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyDesign {
    RandomizedControlled,
    Cohort,
    CaseControl,
    CrossSectional,
    CaseReport,
    InVitro,
    Animal,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrialPhase {
    #[serde(rename = "phase_1")]
    Phase1,
    #[serde(rename = "phase_2")]
    Phase2,
    #[serde(rename = "phase_3")]
    Phase3,
    #[serde(rename = "phase_4")]
    Phase4,
}

impl TrialPhase {
    pub fn number(&self) -> u8 {
        match self {
            TrialPhase::Phase1 => 1,
            TrialPhase::Phase2 => 2,
            TrialPhase::Phase3 => 3,
            TrialPhase::Phase4 => 4,
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "1" | "i" => Some(TrialPhase::Phase1),
            "2" | "ii" => Some(TrialPhase::Phase2),
            "3" | "iii" => Some(TrialPhase::Phase3),
            "4" | "iv" => Some(TrialPhase::Phase4),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalTier {
    Tier1,
    Tier2,
    Tier3,
    Unknown,
}

static META: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(meta-?analys[ie]s|systematic review|pooled analysis)\b").unwrap()
});
static REVIEW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(review|overview|state of the art)\b").unwrap());
static CLINICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(patients?|participants|subjects|individuals|cohort|case-control|randomi[sz]ed|clinical (?:trial|study|cohort))\b").unwrap()
});
static PRECLINICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(mice|mouse|murine|rats?|in vitro|in vivo|cell lines?|xenografts?|zebrafish|organoids?|knockout|knockdown)\b").unwrap()
});

static DESIGN_RULES: LazyLock<Vec<(StudyDesign, Regex)>> = LazyLock::new(|| {
    [
        (
            StudyDesign::RandomizedControlled,
            r"(?i)\b(randomi[sz]ed (?:controlled |clinical |placebo-controlled )?(?:trial|study)|rct)\b",
        ),
        (
            StudyDesign::Cohort,
            r"(?i)\b((?:prospective|retrospective|longitudinal|population-based) (?:cohort|study)|cohort study)\b",
        ),
        (StudyDesign::CaseControl, r"(?i)\bcase[- ]control\b"),
        (StudyDesign::CrossSectional, r"(?i)\bcross[- ]sectional\b"),
        (StudyDesign::CaseReport, r"(?i)\bcase (?:report|series)\b"),
        (
            StudyDesign::Animal,
            r"(?i)\b(mice|mouse models?|murine|rats?|xenografts?|zebrafish)\b",
        ),
        (
            StudyDesign::InVitro,
            r"(?i)\b(in vitro|cell lines?|cultured cells)\b",
        ),
    ]
    .into_iter()
    .map(|(design, pattern)| (design, Regex::new(pattern).unwrap()))
    .collect()
});

static N_EQUALS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bn\s*=\s*(\d{1,3}(?:,\d{3})+|\d+)").unwrap());
static N_CONTEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(patients|participants|subjects|cases|controls|individuals|cohort|samples|women|men|children|adults|enrolled|recruited)\b").unwrap()
});
static N_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3}(?:,\d{3})+|\d+)\s+(?:patients|subjects|participants|individuals|cases|women|men|children|adults|volunteers|controls)\b").unwrap()
});

static PHASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bphase\s*(iv|iii|ii|i|[1-4])(?:\s*/\s*(iv|iii|ii|i|[1-4]))?\b").unwrap()
});

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());
static QUANTITATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\bp\s*[<=>≤≥]\s*0?\.\d+|\d+(?:\.\d+)?\s*%|\b(?:hr|or|rr)\s*[=:]\s*\d+(?:\.\d+)?|\b(?:hazard ratio|odds ratio|relative risk|risk ratio)\s*(?:[=:,]|of)?\s*\d+(?:\.\d+)?)").unwrap()
});

const SAMPLE_RANGE: std::ops::RangeInclusive<u64> = 5..=200_000;
const CONTEXT_WINDOW: usize = 60;

const TIER1: &[&str] = &[
    "nature",
    "science",
    "cell",
    "lancet",
    "the lancet",
    "new england journal of medicine",
    "n engl j med",
    "jama",
    "bmj",
    "nature medicine",
    "nature genetics",
    "nature biotechnology",
    "nature reviews cancer",
    "nature reviews drug discovery",
    "cancer cell",
    "cancer discovery",
    "lancet oncology",
    "jama oncology",
    "journal of clinical oncology",
    "cell metabolism",
    "immunity",
];

const TIER2: &[&str] = &[
    "cancer research",
    "clinical cancer research",
    "plos medicine",
    "plos biology",
    "blood",
    "oncogene",
    "nucleic acids research",
    "genome research",
    "genome biology",
    "american journal of human genetics",
    "nature communications",
    "proceedings of the national academy of sciences",
    "proceedings of the national academy of sciences of the united states of america",
    "pnas",
    "elife",
    "embo journal",
    "the embo journal",
    "journal of the national cancer institute",
    "annals of oncology",
    "gastroenterology",
    "hepatology",
    "circulation",
    "diabetes",
    "brain",
    "neuron",
    "molecular cell",
    "cell reports",
    "science translational medicine",
    "journal of clinical investigation",
    "the journal of clinical investigation",
];

const TIER3: &[&str] = &[
    "plos one",
    "scientific reports",
    "oncotarget",
    "cureus",
    "medicine",
    "peerj",
    "heliyon",
    "molecules",
    "cancers",
    "international journal of molecular sciences",
    "oncology letters",
    "oncology reports",
    "molecular medicine reports",
    "experimental and therapeutic medicine",
];

const TIER3_PREFIXES: &[&str] = &["frontiers in ", "bmc "];

fn publication_type_contains(publication_types: &[String], needle: &str) -> bool {
    publication_types
        .iter()
        .any(|t| t.to_ascii_lowercase().contains(needle))
}

/// Priority: meta-analysis, review, both clinical and preclinical signals,
/// clinical only, preclinical only.
pub fn study_type(text: &str, publication_types: &[String]) -> StudyType {
    if META.is_match(text)
        || publication_type_contains(publication_types, "meta-analysis")
        || publication_type_contains(publication_types, "systematic review")
    {
        return StudyType::MetaAnalysis;
    }
    if publication_type_contains(publication_types, "review") || REVIEW.is_match(text) {
        return StudyType::Review;
    }

    let clinical = CLINICAL.is_match(text)
        || publication_type_contains(publication_types, "clinical trial")
        || publication_type_contains(publication_types, "observational study");
    let preclinical = PRECLINICAL.is_match(text);
    match (clinical, preclinical) {
        (true, true) => StudyType::Mixed,
        (true, false) => StudyType::Clinical,
        (false, true) => StudyType::Preclinical,
        (false, false) => StudyType::Unknown,
    }
}

pub fn study_design(text: &str, publication_types: &[String]) -> StudyDesign {
    if publication_type_contains(publication_types, "randomized controlled trial") {
        return StudyDesign::RandomizedControlled;
    }
    if publication_type_contains(publication_types, "case reports") {
        return StudyDesign::CaseReport;
    }
    DESIGN_RULES
        .iter()
        .find(|(_, rule)| rule.is_match(text))
        .map(|(design, _)| *design)
        .unwrap_or(StudyDesign::Unknown)
}

fn parse_count(raw: &str) -> Option<u64> {
    raw.replace(',', "").parse().ok()
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx < text.len() && !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

fn context_window(text: &str, start: usize, end: usize) -> &str {
    let from = floor_char_boundary(text, start.saturating_sub(CONTEXT_WINDOW));
    let to = ceil_char_boundary(text, (end + CONTEXT_WINDOW).min(text.len()));
    &text[from..to]
}

/// Largest plausible sample size mentioned in the text.
pub fn sample_size(text: &str) -> Option<u64> {
    let from_equals = N_EQUALS.captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        if !N_CONTEXT.is_match(context_window(text, whole.start(), whole.end())) {
            return None;
        }
        parse_count(caps.get(1)?.as_str())
    });
    let from_counts = N_COUNT
        .captures_iter(text)
        .filter_map(|caps| parse_count(caps.get(1)?.as_str()));

    from_equals
        .chain(from_counts)
        .filter(|n| SAMPLE_RANGE.contains(n))
        .max()
}

/// Highest trial phase mentioned; "phase I/II" counts as phase 2.
pub fn trial_phase(text: &str) -> Option<TrialPhase> {
    PHASE
        .captures_iter(text)
        .flat_map(|caps| {
            [caps.get(1), caps.get(2)]
                .into_iter()
                .flatten()
                .filter_map(|m| TrialPhase::parse(m.as_str()))
                .collect::<Vec<_>>()
        })
        .max()
}

fn normalize_journal(journal: &str) -> String {
    journal
        .to_lowercase()
        .replace(['.', ':', ','], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn journal_tier(journal: &str) -> JournalTier {
    let name = normalize_journal(journal);
    if name.is_empty() {
        return JournalTier::Unknown;
    }
    if TIER1.contains(&name.as_str()) {
        JournalTier::Tier1
    } else if TIER2.contains(&name.as_str()) {
        JournalTier::Tier2
    } else if TIER3.contains(&name.as_str())
        || TIER3_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
    {
        JournalTier::Tier3
    } else {
        JournalTier::Unknown
    }
}

pub fn is_retracted(title: &str, publication_types: &[String]) -> bool {
    if publication_type_contains(publication_types, "retracted publication")
        || publication_type_contains(publication_types, "retraction of publication")
    {
        return true;
    }
    let title = title.trim_start_matches(['[', '(', ' ']).to_ascii_lowercase();
    title.starts_with("retracted")
}

/// Abstract sentences that report a quantitative result.
pub fn fact_count(abstract_text: &str) -> usize {
    SENTENCE_END
        .split(abstract_text)
        .filter(|sentence| QUANTITATIVE.is_match(sentence))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_study_type_priority() {
        assert_eq!(
            study_type("A meta-analysis of 12 cohort studies in patients", &[]),
            StudyType::MetaAnalysis
        );
        assert_eq!(
            study_type("Xenograft mice and patients", &[]),
            StudyType::Mixed
        );
        assert_eq!(study_type("Knockdown in cell lines", &[]), StudyType::Preclinical);
        assert_eq!(study_type("Nothing informative", &[]), StudyType::Unknown);
        assert_eq!(
            study_type("Nothing informative", &["Review".to_string()]),
            StudyType::Review
        );
    }

    #[test]
    fn test_study_design_rules() {
        assert_eq!(
            study_design("A randomized controlled trial of X", &[]),
            StudyDesign::RandomizedControlled
        );
        assert_eq!(
            study_design("a prospective cohort of nurses", &[]),
            StudyDesign::Cohort
        );
        assert_eq!(study_design("in murine models", &[]), StudyDesign::Animal);
        assert_eq!(study_design("plain text", &[]), StudyDesign::Unknown);
    }

    #[test]
    fn test_sample_size_takes_largest_in_range() {
        assert_eq!(
            sample_size("We enrolled patients (n = 1,250) and 40 controls."),
            Some(1250)
        );
        assert_eq!(sample_size("Only 3 patients were seen."), None);
        assert_eq!(sample_size("n = 500 without any context words here"), None);
        assert_eq!(sample_size("a cohort of 900000 individuals"), None);
    }

    #[test]
    fn test_trial_phase_normalization() {
        assert_eq!(trial_phase("a Phase III study"), Some(TrialPhase::Phase3));
        assert_eq!(trial_phase("phase 2 and phase IV"), Some(TrialPhase::Phase4));
        assert_eq!(trial_phase("phase I/II trial"), Some(TrialPhase::Phase2));
        assert_eq!(trial_phase("no trial"), None);
    }

    #[test]
    fn test_journal_tiers() {
        assert_eq!(journal_tier("Nature"), JournalTier::Tier1);
        assert_eq!(journal_tier("N. Engl. J. Med."), JournalTier::Tier1);
        assert_eq!(journal_tier("Cancer Research"), JournalTier::Tier2);
        assert_eq!(journal_tier("Frontiers in Oncology"), JournalTier::Tier3);
        assert_eq!(journal_tier("BMC Cancer"), JournalTier::Tier3);
        assert_eq!(journal_tier("Journal of Obscure Results"), JournalTier::Unknown);
    }

    #[test]
    fn test_retraction_from_title() {
        assert!(is_retracted("RETRACTED: KRAS drives everything", &[]));
        assert!(is_retracted("[Retracted] Something", &[]));
        assert!(!is_retracted("Retraction watch is unrelated", &[]));
    }

    #[test]
    fn test_fact_count() {
        let text = "Risk increased by 35%. The HR was 1.8 (p < 0.01). We discuss mechanisms.";
        assert_eq!(fact_count(text), 2);
    }
}
