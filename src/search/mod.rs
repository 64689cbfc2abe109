//! Filter-and-search pipeline.
//!
//! - **[`filter`]**: facet criteria and the stable facet filter.
//! - **[`fuzzy`]**: weighted fuzzy text search and its disposable index.
//! - **[`facets`]**: universe facet counts and catalog stats.
//! - **[`canonicalize`]**: text folding shared by queries and indexed fields.
//! - **[`query_string`]**: URL query encoding of filter criteria.
//!
//! Facet filtering always runs first and text search only ranks the facet
//! survivors, so a strong text match can never bring back a record the
//! facets excluded.

pub mod canonicalize;
pub mod facets;
pub mod filter;
pub mod fuzzy;
pub mod query_string;

pub use facets::{CatalogStats, FacetCounts};
pub use filter::{FilterCriteria, YearRange, filter_policies};
pub use fuzzy::{SearchField, SearchHit, SearchIndex, SearchOptions, search_policies};
