//! Facet candidate counts and catalog-wide stats.
//!
//! Counts are "universe counts": they are tallied over whatever collection is
//! passed in, independent of any active selection. The catalog passes the
//! full, unfiltered collection so the counts never collapse to zero as the
//! user narrows the view.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::model::types::{AffectedPopulation, Country, EvidenceQuality, Policy, PolicyType};

/// Per-value record counts for every facet.
///
/// Only values that occur at least once are present in the maps; use the
/// accessor methods to read a zero for absent values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetCounts {
    pub countries: BTreeMap<Country, usize>,
    pub policy_types: BTreeMap<PolicyType, usize>,
    pub affected_populations: BTreeMap<AffectedPopulation, usize>,
    pub evidence_quality: BTreeMap<EvidenceQuality, usize>,
}

impl FacetCounts {
    /// Single pass over `records`, touching each record's facet values once.
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a Policy>) -> Self {
        let mut counts = Self::default();
        for policy in records {
            *counts.countries.entry(policy.country).or_insert(0) += 1;
            for policy_type in &policy.policy_types {
                *counts.policy_types.entry(*policy_type).or_insert(0) += 1;
            }
            for population in &policy.affected_populations {
                *counts.affected_populations.entry(*population).or_insert(0) += 1;
            }
            *counts
                .evidence_quality
                .entry(policy.evidence_quality)
                .or_insert(0) += 1;
        }
        counts
    }

    pub fn country(&self, country: Country) -> usize {
        self.countries.get(&country).copied().unwrap_or(0)
    }

    pub fn policy_type(&self, policy_type: PolicyType) -> usize {
        self.policy_types.get(&policy_type).copied().unwrap_or(0)
    }

    pub fn affected_population(&self, population: AffectedPopulation) -> usize {
        self.affected_populations
            .get(&population)
            .copied()
            .unwrap_or(0)
    }

    pub fn evidence(&self, quality: EvidenceQuality) -> usize {
        self.evidence_quality.get(&quality).copied().unwrap_or(0)
    }
}

/// Headline numbers for the whole catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    /// Distinct countries with at least one policy.
    pub country_count: usize,
    pub active_count: usize,
    /// Policies rated high or moderate.
    pub high_evidence_count: usize,
}

impl CatalogStats {
    pub fn compute<'a>(records: impl IntoIterator<Item = &'a Policy>) -> Self {
        let mut countries = HashSet::new();
        let mut stats = Self::default();
        for policy in records {
            countries.insert(policy.country);
            stats.active_count += usize::from(policy.is_active);
            stats.high_evidence_count += usize::from(policy.evidence_quality.is_rigorous());
        }
        stats.country_count = countries.len();
        stats
    }
}
