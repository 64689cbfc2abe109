//! Normalized policy records and the facet vocabularies they are filtered on.
//!
//! Every enumeration serializes as the kebab-case slug used by the dataset
//! (`costa-rica`, `school-feeding`, `quasi-experimental`, ...) and carries a
//! human label for display.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Shared surface of every enumerated facet vocabulary.
pub trait FacetValue: Copy + Eq + Ord + Sized + 'static {
    /// Every value in declaration order.
    const ALL: &'static [Self];

    /// Dataset / URL slug.
    fn slug(self) -> &'static str;

    /// Display label.
    fn label(self) -> &'static str;

    fn from_slug(slug: &str) -> Option<Self> {
        let needle = slug.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.slug().eq_ignore_ascii_case(needle))
    }
}

macro_rules! facet_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => ($slug:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $slug)]
                $variant,
            )+
        }

        impl FacetValue for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn slug(self) -> &'static str {
                match self {
                    $(Self::$variant => $slug,)+
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownSlug;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as FacetValue>::from_slug(s).ok_or_else(|| UnknownSlug {
                    kind: stringify!($name),
                    slug: s.to_string(),
                })
            }
        }
    };
}

/// Returned when a slug does not name any value of a facet vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{slug}`")]
pub struct UnknownSlug {
    pub kind: &'static str,
    pub slug: String,
}

facet_enum! {
    /// The twenty Latin American countries covered by the catalog.
    Country {
        Argentina => ("argentina", "Argentina"),
        Bolivia => ("bolivia", "Bolivia"),
        Brazil => ("brazil", "Brazil"),
        Chile => ("chile", "Chile"),
        Colombia => ("colombia", "Colombia"),
        CostaRica => ("costa-rica", "Costa Rica"),
        Cuba => ("cuba", "Cuba"),
        DominicanRepublic => ("dominican-republic", "Dominican Republic"),
        Ecuador => ("ecuador", "Ecuador"),
        ElSalvador => ("el-salvador", "El Salvador"),
        Guatemala => ("guatemala", "Guatemala"),
        Haiti => ("haiti", "Haiti"),
        Honduras => ("honduras", "Honduras"),
        Mexico => ("mexico", "Mexico"),
        Nicaragua => ("nicaragua", "Nicaragua"),
        Panama => ("panama", "Panama"),
        Paraguay => ("paraguay", "Paraguay"),
        Peru => ("peru", "Peru"),
        Uruguay => ("uruguay", "Uruguay"),
        Venezuela => ("venezuela", "Venezuela"),
    }
}

facet_enum! {
    PolicyType {
        Cct => ("cct", "Conditional Cash Transfers"),
        SchoolFeeding => ("school-feeding", "School Feeding"),
        DigitalInclusion => ("digital-inclusion", "Digital Inclusion"),
        TeacherReform => ("teacher-reform", "Teacher Reform"),
        Vouchers => ("vouchers", "Vouchers/School Choice"),
        HigherEdAccess => ("higher-ed-access", "Higher Education Access"),
        EarlyChildhood => ("early-childhood", "Early Childhood"),
        ExtendedDay => ("extended-day", "Extended School Day"),
        IndigenousEd => ("indigenous-ed", "Indigenous Education"),
        Tutoring => ("tutoring", "Tutoring & Remediation"),
        Curriculum => ("curriculum", "Curriculum Reform"),
        Infrastructure => ("infrastructure", "Infrastructure"),
        Governance => ("governance", "Governance & Management"),
    }
}

facet_enum! {
    AffectedPopulation {
        EarlyChildhood => ("early-childhood", "Early Childhood (0-5)"),
        Primary => ("primary", "Primary School"),
        Secondary => ("secondary", "Secondary School"),
        Tertiary => ("tertiary", "Higher Education"),
        Indigenous => ("indigenous", "Indigenous Communities"),
        Rural => ("rural", "Rural Areas"),
        LowIncome => ("low-income", "Low-Income Families"),
        WomenGirls => ("women-girls", "Women & Girls"),
        Teachers => ("teachers", "Teachers"),
        All => ("all", "General Population"),
    }
}

facet_enum! {
    /// Evidence tiers, strongest first. `Ord` follows this order.
    EvidenceQuality {
        High => ("high", "High"),
        Moderate => ("moderate", "Moderate"),
        Emerging => ("emerging", "Emerging"),
        Low => ("low", "Low"),
        None => ("none", "No Evidence"),
    }
}

impl EvidenceQuality {
    pub fn description(self) -> &'static str {
        match self {
            Self::High => {
                "Multiple RCTs or rigorous quasi-experimental studies with consistent findings"
            }
            Self::Moderate => {
                "At least one well-designed RCT or multiple high-quality quasi-experimental studies"
            }
            Self::Emerging => {
                "Promising evidence from quasi-experimental studies or early-stage RCTs"
            }
            Self::Low => "Limited evidence, primarily descriptive or correlational studies",
            Self::None => "No systematic evaluation evidence available",
        }
    }

    /// High and moderate tiers count as rigorous evidence in catalog stats.
    pub fn is_rigorous(self) -> bool {
        matches!(self, Self::High | Self::Moderate)
    }
}

facet_enum! {
    StudyMethodology {
        Rct => ("rct", "Randomized Controlled Trial"),
        QuasiExperimental => ("quasi-experimental", "Quasi-Experimental"),
        RegressionDiscontinuity => ("regression-discontinuity", "Regression Discontinuity"),
        DifferenceInDifferences => ("difference-in-differences", "Difference-in-Differences"),
        InstrumentalVariables => ("instrumental-variables", "Instrumental Variables"),
        PropensityScore => ("propensity-score", "Propensity Score Matching"),
        Descriptive => ("descriptive", "Descriptive"),
        Qualitative => ("qualitative", "Qualitative"),
        SystematicReview => ("systematic-review", "Systematic Review"),
        MetaAnalysis => ("meta-analysis", "Meta-Analysis"),
    }
}

/// Measured effect reported for a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub metric: String,
    pub effect: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationStudy {
    pub authors: String,
    pub year: i32,
    pub title: String,
    pub methodology: StudyMethodology,
    #[serde(default, deserialize_with = "lenient_text")]
    pub journal: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub doi: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub url: Option<String>,
    #[serde(default)]
    pub key_finding: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub authors: String,
    pub year: i32,
    pub title: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub doi: Option<String>,
}

/// One catalog entry. Loaded once and never mutated.
///
/// Unknown fields are ignored. Optional fields that are missing, empty, or of
/// the wrong JSON type deserialize as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name_local: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub acronym: Option<String>,

    pub country: Country,
    pub year_start: i32,
    #[serde(default, deserialize_with = "lenient_year")]
    pub year_end: Option<i32>,
    #[serde(default)]
    pub is_active: bool,

    #[serde(default)]
    pub policy_types: Vec<PolicyType>,
    #[serde(default)]
    pub affected_populations: Vec<AffectedPopulation>,

    #[serde(default)]
    pub summary_short: String,
    #[serde(default)]
    pub summary_long: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub mechanisms: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub coverage: Option<String>,

    pub evidence_quality: EvidenceQuality,
    #[serde(default)]
    pub impact_summary: String,
    #[serde(default)]
    pub key_outcomes: Vec<Outcome>,
    #[serde(default)]
    pub evaluations: Vec<EvaluationStudy>,
    #[serde(default)]
    pub key_references: Vec<Reference>,
}

impl Policy {
    /// "2004–present" or "1997–2014".
    pub fn year_span(&self) -> String {
        match self.year_end {
            Some(end) if end != self.year_start => format!("{}–{end}", self.year_start),
            Some(_) => self.year_start.to_string(),
            None if self.is_active => format!("{}–present", self.year_start),
            None => self.year_start.to_string(),
        }
    }

    /// Name with acronym appended when one is known.
    pub fn display_name(&self) -> String {
        match &self.acronym {
            Some(acronym) => format!("{} ({acronym})", self.name),
            None => self.name.clone(),
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
