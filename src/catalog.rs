//! The read-only policy catalog and the browse pipeline over it.
//!
//! A [`Catalog`] is loaded once (from the dataset compiled into the binary or
//! from a JSON file) and never mutated. [`Catalog::browse`] runs one criteria
//! snapshot through the pipeline; a [`Browser`] does the same but keeps the
//! search index of the last facet selection so that changing only the text
//! query does not rebuild it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::model::types::Policy;
use crate::search::facets::{CatalogStats, FacetCounts};
use crate::search::filter::{FilterCriteria, filter_policies};
use crate::search::fuzzy::{SearchHit, SearchIndex, SearchOptions};

/// Dataset compiled into the binary.
const EMBEDDED_DATASET: &str = include_str!("../data/policies.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read dataset at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Dataset is not a JSON array of policies: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Invalid policy record #{index} ({id}): {source}")]
    InvalidRecord {
        index: usize,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Duplicate policy id `{0}`")]
    DuplicateId(String),
}

/// Immutable policy collection plus the facet counts and stats derived from it.
#[derive(Debug, Clone)]
pub struct Catalog {
    policies: Vec<Policy>,
    facet_counts: FacetCounts,
    stats: CatalogStats,
    search_options: SearchOptions,
}

impl Catalog {
    pub fn from_policies(policies: Vec<Policy>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(policies.len());
        for policy in &policies {
            if !seen.insert(policy.id.as_str()) {
                return Err(CatalogError::DuplicateId(policy.id.clone()));
            }
        }
        let facet_counts = FacetCounts::tally(&policies);
        let stats = CatalogStats::compute(&policies);
        Ok(Self {
            policies,
            facet_counts,
            stats,
            search_options: SearchOptions::default(),
        })
    }

    /// Parse a JSON array of policy records.
    ///
    /// Records are decoded one at a time so a bad record is reported by
    /// position and id instead of as a bare byte offset.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: Vec<serde_json::Value> =
            serde_json::from_str(json).map_err(CatalogError::Malformed)?;
        let policies = raw
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                let id = value
                    .get("id")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("<no id>")
                    .to_string();
                serde_json::from_value::<Policy>(value)
                    .map_err(|source| CatalogError::InvalidRecord { index, id, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_policies(policies)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            policies = catalog.len(),
            "dataset_loaded"
        );
        Ok(catalog)
    }

    /// The dataset shipped inside the binary.
    pub fn embedded() -> Result<Self, CatalogError> {
        let catalog = Self::from_json(EMBEDDED_DATASET)?;
        tracing::debug!(policies = catalog.len(), "dataset_loaded");
        Ok(catalog)
    }

    pub fn with_search_options(mut self, options: SearchOptions) -> Self {
        self.search_options = options;
        self
    }

    pub fn search_options(&self) -> SearchOptions {
        self.search_options
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Policy> {
        self.policies.iter().find(|p| p.id == id)
    }

    /// Universe counts: tallied over the whole catalog, ignoring any selection.
    pub fn facet_counts(&self) -> &FacetCounts {
        &self.facet_counts
    }

    pub fn stats(&self) -> CatalogStats {
        self.stats
    }

    /// Run `criteria` through the pipeline once, building a fresh index.
    pub fn browse(&self, criteria: &FilterCriteria) -> BrowseResult<'_> {
        self.browser().browse(criteria)
    }

    pub fn browser(&self) -> Browser<'_> {
        Browser {
            catalog: self,
            cached: None,
            index_builds: 0,
        }
    }
}

/// Result snapshot handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct BrowseResult<'a> {
    pub hits: Vec<SearchHit<'a>>,
    pub total_count: usize,
    pub filtered_count: usize,
    pub stats: CatalogStats,
    /// False when the criteria were all defaults, so an empty result means an
    /// empty catalog rather than over-narrow filters.
    pub criteria_applied: bool,
}

impl<'a> BrowseResult<'a> {
    pub fn policies(&self) -> Vec<&'a Policy> {
        self.hits.iter().map(|hit| hit.policy).collect()
    }
}

/// Stateful front door to the pipeline that reuses the search index while
/// the facet selection is unchanged.
#[derive(Debug)]
pub struct Browser<'a> {
    catalog: &'a Catalog,
    cached: Option<(FilterCriteria, SearchIndex<'a>)>,
    index_builds: usize,
}

impl<'a> Browser<'a> {
    pub fn browse(&mut self, criteria: &FilterCriteria) -> BrowseResult<'a> {
        let facets = criteria.facets_only();
        let reuse = matches!(&self.cached, Some((key, _)) if *key == facets);
        if !reuse {
            let subset = filter_policies(&self.catalog.policies, &facets);
            let index = SearchIndex::build(&subset, self.catalog.search_options);
            self.index_builds += 1;
            self.cached = Some((facets, index));
        }

        let hits = match &self.cached {
            Some((_, index)) => index.ranked(&criteria.search_query),
            None => Vec::new(),
        };
        tracing::debug!(
            reused_index = reuse,
            filtered = hits.len(),
            total = self.catalog.len(),
            "browse"
        );
        BrowseResult {
            filtered_count: hits.len(),
            hits,
            total_count: self.catalog.len(),
            stats: self.catalog.stats,
            criteria_applied: criteria.has_active_filters(),
        }
    }

    /// How many search indexes this browser has built so far.
    pub fn index_builds(&self) -> usize {
        self.index_builds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{Country, EvidenceQuality};

    fn ids(policies: &[&Policy]) -> Vec<String> {
        policies.iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn embedded_dataset_loads() {
        let catalog = Catalog::embedded().unwrap();
        assert!(catalog.len() >= 10);
        assert!(catalog.get("uy-plan-ceibal").is_some());
        assert!(catalog.get("nope").is_none());
    }

    #[test]
    fn default_browse_returns_catalog_in_order() {
        let catalog = Catalog::embedded().unwrap();
        let result = catalog.browse(&FilterCriteria::default());
        let expected: Vec<String> = catalog.policies().iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids(&result.policies()), expected);
        assert_eq!(result.total_count, catalog.len());
        assert_eq!(result.filtered_count, catalog.len());
        assert!(!result.criteria_applied);
    }

    #[test]
    fn facets_apply_before_search() {
        let catalog = Catalog::embedded().unwrap();
        let mut criteria = FilterCriteria::default();
        criteria.set_search_query("Plan Ceibal");
        let unfiltered = catalog.browse(&criteria);
        assert_eq!(
            unfiltered.policies().first().map(|p| p.id.as_str()),
            Some("uy-plan-ceibal")
        );

        criteria.toggle_country(Country::Argentina);
        let filtered = catalog.browse(&criteria);
        assert!(
            filtered
                .policies()
                .iter()
                .all(|p| p.country == Country::Argentina)
        );
        assert!(filtered.policies().iter().all(|p| p.id != "uy-plan-ceibal"));
    }

    #[test]
    fn browser_reuses_index_while_facets_unchanged() {
        let catalog = Catalog::embedded().unwrap();
        let mut browser = catalog.browser();
        let mut criteria = FilterCriteria::default();
        criteria.toggle_evidence_quality(EvidenceQuality::High);

        browser.browse(&criteria);
        criteria.set_search_query("cash");
        browser.browse(&criteria);
        criteria.set_search_query("transfers");
        browser.browse(&criteria);
        assert_eq!(browser.index_builds(), 1);

        criteria.set_active_only(true);
        browser.browse(&criteria);
        assert_eq!(browser.index_builds(), 2);
    }

    #[test]
    fn empty_result_is_distinguishable_from_no_criteria() {
        let catalog = Catalog::from_policies(Vec::new()).unwrap();
        let none = catalog.browse(&FilterCriteria::default());
        assert!(none.hits.is_empty());
        assert!(!none.criteria_applied);

        let catalog = Catalog::embedded().unwrap();
        let mut criteria = FilterCriteria::default();
        criteria.toggle_country(Country::Haiti);
        criteria.toggle_evidence_quality(EvidenceQuality::High);
        let narrowed = catalog.browse(&criteria);
        assert!(narrowed.hits.is_empty());
        assert!(narrowed.criteria_applied);
    }

    #[test]
    fn whitespace_query_on_empty_catalog_is_not_applied_criteria() {
        let catalog = Catalog::from_policies(Vec::new()).unwrap();
        let mut criteria = FilterCriteria::default();
        criteria.set_search_query("   ");
        let result = catalog.browse(&criteria);
        assert!(result.hits.is_empty());
        assert!(!result.criteria_applied);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let json = r#"[
            {"id":"x","name":"A","country":"peru","yearStart":2000,"evidenceQuality":"low"},
            {"id":"x","name":"B","country":"chile","yearStart":2001,"evidenceQuality":"none"}
        ]"#;
        let err = Catalog::from_json(json).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(ref id) if id == "x"));
    }

    #[test]
    fn bad_record_is_reported_by_position_and_id() {
        let json = r#"[
            {"id":"ok","name":"A","country":"peru","yearStart":2000,"evidenceQuality":"low"},
            {"id":"bad","name":"B","country":"narnia","yearStart":2001,"evidenceQuality":"none"}
        ]"#;
        let err = Catalog::from_json(json).unwrap_err();
        match err {
            CatalogError::InvalidRecord { index, id, .. } => {
                assert_eq!(index, 1);
                assert_eq!(id, "bad");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }

    #[test]
    fn load_reads_external_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policies.json");
        std::fs::write(
            &path,
            r#"[{"id":"cu-lit","name":"Literacy Campaign","country":"cuba","yearStart":1961,"yearEnd":1961,"evidenceQuality":"low","extra":1}]"#,
        )
        .unwrap();
        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.facet_counts().country(Country::Cuba), 1);
    }
}
