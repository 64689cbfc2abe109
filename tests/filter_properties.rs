mod util;

use proptest::prelude::*;
use std::collections::BTreeSet;

use policy_atlas::model::types::{Country, EvidenceQuality, FacetValue, Policy};
use policy_atlas::search::{FacetCounts, FilterCriteria, YearRange, filter_policies, search_policies};
use util::synthetic_policy;

fn collection() -> impl Strategy<Value = Vec<Policy>> {
    prop::collection::vec(0usize..400, 0..40)
        .prop_map(|seeds| seeds.into_iter().map(synthetic_policy).collect())
}

fn countries() -> impl Strategy<Value = Vec<Country>> {
    prop::sample::subsequence(Country::ALL.to_vec(), 0..=6)
}

/// Input index of every output record; panics if an output is not an input.
fn positions(input: &[Policy], output: &[&Policy]) -> Vec<usize> {
    output
        .iter()
        .map(|out| {
            input
                .iter()
                .position(|p| std::ptr::eq(p, *out))
                .expect("output record comes from input")
        })
        .collect()
}

proptest! {
    #[test]
    fn default_criteria_is_identity(records in collection()) {
        let out = filter_policies(&records, &FilterCriteria::default());
        prop_assert_eq!(positions(&records, &out), (0..records.len()).collect::<Vec<_>>());
    }

    #[test]
    fn output_keeps_input_order(records in collection(), selected in countries(), active in any::<bool>()) {
        let mut criteria = FilterCriteria::default();
        criteria.countries = selected.into_iter().collect();
        criteria.active_only = active;
        let out = filter_policies(&records, &criteria);
        let idx = positions(&records, &out);
        prop_assert!(idx.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(out.iter().all(|p| criteria.matches(p)));
    }

    #[test]
    fn widening_a_selection_never_shrinks_results(
        records in collection(),
        narrow in countries(),
        extra in countries(),
    ) {
        prop_assume!(!narrow.is_empty());
        let mut small = FilterCriteria::default();
        small.countries = narrow.iter().copied().collect();
        let mut wide = small.clone();
        wide.countries.extend(extra);

        let small_ids: BTreeSet<usize> = positions(&records, &filter_policies(&records, &small)).into_iter().collect();
        let wide_ids: BTreeSet<usize> = positions(&records, &filter_policies(&records, &wide)).into_iter().collect();
        prop_assert!(small_ids.is_subset(&wide_ids));
    }

    #[test]
    fn extra_constraints_never_grow_results(
        records in collection(),
        start in 1940i32..2030,
        len in 0i32..40,
    ) {
        let base = filter_policies(&records, &FilterCriteria::default());
        let mut narrowed = FilterCriteria::default();
        narrowed.set_active_only(true);
        narrowed.set_year_range(YearRange::new(start, start + len));
        narrowed.toggle_evidence_quality(EvidenceQuality::High);
        let out = filter_policies(&records, &narrowed);
        let base_ids: BTreeSet<usize> = positions(&records, &base).into_iter().collect();
        let out_ids: BTreeSet<usize> = positions(&records, &out).into_iter().collect();
        prop_assert!(out_ids.is_subset(&base_ids));
    }

    #[test]
    fn inverted_year_range_matches_nothing(records in collection(), start in 1951i32..2030, gap in 1i32..30) {
        let mut criteria = FilterCriteria::default();
        criteria.set_year_range(YearRange::new(start, start - gap));
        prop_assert!(filter_policies(&records, &criteria).is_empty());
    }

    #[test]
    fn country_counts_sum_to_collection_size(records in collection()) {
        let counts = FacetCounts::tally(&records);
        let sum: usize = Country::ALL.iter().map(|c| counts.country(*c)).sum();
        prop_assert_eq!(sum, records.len());
        let evidence: usize = EvidenceQuality::ALL.iter().map(|e| counts.evidence(*e)).sum();
        prop_assert_eq!(evidence, records.len());
    }

    #[test]
    fn search_returns_a_subset_without_duplicates(records in collection(), query in "[a-z ]{0,12}") {
        let refs: Vec<&Policy> = records.iter().collect();
        let out = search_policies(&refs, &query);
        let idx = positions(&records, &out);
        let unique: BTreeSet<usize> = idx.iter().copied().collect();
        prop_assert_eq!(unique.len(), idx.len());
        if query.trim().is_empty() {
            prop_assert_eq!(idx, (0..records.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn exact_country_label_is_always_found(seed in 0usize..400) {
        let records = vec![synthetic_policy(seed)];
        let refs: Vec<&Policy> = records.iter().collect();
        let label = records[0].country.label().to_lowercase();
        prop_assert_eq!(search_policies(&refs, &label).len(), 1);
    }
}
