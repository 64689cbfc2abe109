//! Facet filtering over the policy collection.
//!
//! A record passes when every facet admits it (AND across facets). Within a
//! facet the selected values are OR'ed. An empty selection admits everything:
//! it is the neutral state of a facet, never "match nothing".

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::types::{AffectedPopulation, Country, EvidenceQuality, Policy, PolicyType};

/// Lower bound of the default year window.
pub const DEFAULT_YEAR_FLOOR: i32 = 1950;

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Closed year interval `[start, end]`. Serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// An inverted range contains no years, so nothing overlaps it.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Whether a policy's active period overlaps this window.
    ///
    /// Only an explicit `year_end` is checked against the lower bound: a policy
    /// with no end year overlaps every window that reaches its start year, no
    /// matter how early it began.
    pub fn overlaps(&self, policy: &Policy) -> bool {
        if self.is_empty() {
            return false;
        }
        if policy.year_start > self.end {
            return false;
        }
        match policy.year_end {
            Some(year_end) => year_end >= self.start,
            None => true,
        }
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::new(DEFAULT_YEAR_FLOOR, current_year())
    }
}

impl From<[i32; 2]> for YearRange {
    fn from([start, end]: [i32; 2]) -> Self {
        Self::new(start, end)
    }
}

impl From<YearRange> for [i32; 2] {
    fn from(range: YearRange) -> Self {
        [range.start, range.end]
    }
}

/// User-selected filter state. A plain value: it can be rebuilt from a URL or
/// a session snapshot and used directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    pub search_query: String,
    pub countries: BTreeSet<Country>,
    pub policy_types: BTreeSet<PolicyType>,
    pub affected_populations: BTreeSet<AffectedPopulation>,
    pub evidence_quality: BTreeSet<EvidenceQuality>,
    pub active_only: bool,
    pub year_range: YearRange,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search_query: String::new(),
            countries: BTreeSet::new(),
            policy_types: BTreeSet::new(),
            affected_populations: BTreeSet::new(),
            evidence_quality: BTreeSet::new(),
            active_only: false,
            year_range: YearRange::default(),
        }
    }
}

/// Whether a facet selection admits a record carrying `values`.
///
/// An empty selection admits every record. Otherwise at least one of the
/// record's values must be selected.
pub fn selection_admits<T: Ord>(selection: &BTreeSet<T>, values: &[T]) -> bool {
    selection.is_empty() || values.iter().any(|v| selection.contains(v))
}

/// Whitespace-only queries are a search no-op, so they do not count.
fn has_query(query: &str) -> bool {
    !query.trim().is_empty()
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

impl FilterCriteria {
    /// True when a record passes every facet. `search_query` is not consulted.
    pub fn matches(&self, policy: &Policy) -> bool {
        selection_admits(&self.countries, std::slice::from_ref(&policy.country))
            && selection_admits(&self.policy_types, &policy.policy_types)
            && selection_admits(&self.affected_populations, &policy.affected_populations)
            && selection_admits(
                &self.evidence_quality,
                std::slice::from_ref(&policy.evidence_quality),
            )
            && (!self.active_only || policy.is_active)
            && self.year_range.overlaps(policy)
    }

    /// Copy of these criteria with the text query cleared.
    pub fn facets_only(&self) -> Self {
        Self {
            search_query: String::new(),
            ..self.clone()
        }
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn toggle_country(&mut self, country: Country) {
        toggle(&mut self.countries, country);
    }

    pub fn toggle_policy_type(&mut self, policy_type: PolicyType) {
        toggle(&mut self.policy_types, policy_type);
    }

    pub fn toggle_affected_population(&mut self, population: AffectedPopulation) {
        toggle(&mut self.affected_populations, population);
    }

    pub fn toggle_evidence_quality(&mut self, quality: EvidenceQuality) {
        toggle(&mut self.evidence_quality, quality);
    }

    pub fn set_active_only(&mut self, active: bool) {
        self.active_only = active;
    }

    pub fn set_year_range(&mut self, range: YearRange) {
        self.year_range = range;
    }

    /// Reset every field to its default.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when nothing has been selected, so an empty result means an empty
    /// catalog rather than over-narrow criteria.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn has_active_filters(&self) -> bool {
        has_query(&self.search_query)
            || !self.countries.is_empty()
            || !self.policy_types.is_empty()
            || !self.affected_populations.is_empty()
            || !self.evidence_quality.is_empty()
            || self.active_only
            || self.year_range != YearRange::default()
    }

    /// One per selected facet value, plus one each for a search query,
    /// active-only, and a non-default year window.
    pub fn active_filter_count(&self) -> usize {
        usize::from(has_query(&self.search_query))
            + self.countries.len()
            + self.policy_types.len()
            + self.affected_populations.len()
            + self.evidence_quality.len()
            + usize::from(self.active_only)
            + usize::from(self.year_range != YearRange::default())
    }
}

/// Records passing every facet of `criteria`, in input order.
pub fn filter_policies<'a>(records: &'a [Policy], criteria: &FilterCriteria) -> Vec<&'a Policy> {
    let passed: Vec<&Policy> = records.iter().filter(|p| criteria.matches(p)).collect();
    tracing::debug!(
        total = records.len(),
        passed = passed.len(),
        active_filters = criteria.active_filter_count(),
        "facet_filter"
    );
    passed
}
