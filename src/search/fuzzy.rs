//! Weighted fuzzy text search over a set of policies.
//!
//! Each record contributes a fixed set of weighted text fields. A query
//! matches a field value when some window of the value, starting at any
//! character, is within `threshold * query_len` edits of the query
//! (Levenshtein distance via `strsim`). Where in the value the window sits
//! does not matter, so a fragment inside a compound word ("preescolar") is
//! found as readily as a whole word.
//!
//! Scores follow the usual 0 (perfect) to 1 (no match) convention. A record is
//! kept when at least one of its field values matches; its aggregate score is
//! the product of `score ^ (weight * norm)` over every matching value, where
//! `norm = 1 / sqrt(tokens in value)` so a hit in a short field (a name)
//! outranks the same hit buried in a long summary. Results are ordered by
//! ascending aggregate score, ties broken by input position.

use serde::Serialize;
use std::cmp::Ordering;

use super::canonicalize::{canonicalize_for_search, token_count};
use crate::model::types::Policy;

/// Default permissiveness: up to 30% of the query may be edited.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Queries (and matched fragments) shorter than this never match.
pub const MIN_MATCH_CHARS: usize = 2;

/// Stand-in for a zero field score so exact hits still rank by weight.
const EXACT_SCORE: f64 = f64::EPSILON;

/// Text fields consulted by search, with their relative weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchField {
    Name,
    NameLocal,
    Acronym,
    SummaryShort,
    SummaryLong,
    Objectives,
    ImpactSummary,
}

impl SearchField {
    pub const ALL: [Self; 7] = [
        Self::Name,
        Self::NameLocal,
        Self::Acronym,
        Self::SummaryShort,
        Self::SummaryLong,
        Self::Objectives,
        Self::ImpactSummary,
    ];

    pub fn weight(self) -> f64 {
        match self {
            Self::Name => 0.30,
            Self::NameLocal => 0.20,
            Self::Acronym => 0.25,
            Self::SummaryShort => 0.10,
            Self::SummaryLong | Self::Objectives | Self::ImpactSummary => 0.05,
        }
    }

    /// Values of this field on `policy`. Absent optionals contribute nothing.
    fn values(self, policy: &Policy) -> Vec<&str> {
        match self {
            Self::Name => vec![policy.name.as_str()],
            Self::NameLocal => policy.name_local.as_deref().into_iter().collect(),
            Self::Acronym => policy.acronym.as_deref().into_iter().collect(),
            Self::SummaryShort => vec![policy.summary_short.as_str()],
            Self::SummaryLong => vec![policy.summary_long.as_str()],
            Self::Objectives => policy.objectives.iter().map(String::as_str).collect(),
            Self::ImpactSummary => vec![policy.impact_summary.as_str()],
        }
    }
}

/// Tunables for matching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Maximum field score (edits / query length) that still counts as a match.
    pub threshold: f64,
    pub min_match_chars: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_match_chars: MIN_MATCH_CHARS,
        }
    }
}

/// A canonicalized field value ready for matching.
#[derive(Debug, Clone)]
struct PreparedText {
    text: String,
    /// Byte offset of every char, plus `text.len()` as a final sentinel.
    boundaries: Vec<usize>,
    norm: f64,
}

impl PreparedText {
    fn new(raw: &str) -> Option<Self> {
        let text = canonicalize_for_search(raw);
        if text.is_empty() {
            return None;
        }
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());

        let norm = 1.0 / (token_count(&text) as f64).sqrt();
        Some(Self {
            text,
            boundaries,
            norm,
        })
    }

    fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    fn window(&self, start: usize, len: usize) -> &str {
        &self.text[self.boundaries[start]..self.boundaries[start + len]]
    }
}

/// A canonicalized query.
#[derive(Debug, Clone)]
struct Pattern {
    text: String,
    len: usize,
}

/// Fewest edits turning `pattern` into some window of `value`, if that count
/// keeps the field score within `options.threshold`.
fn best_edit_distance(
    pattern: &Pattern,
    value: &PreparedText,
    options: SearchOptions,
) -> Option<usize> {
    if value.text.contains(&pattern.text) {
        return Some(0);
    }

    let max_edits = (options.threshold * pattern.len as f64).floor() as usize;
    if max_edits == 0 {
        return None;
    }

    let shortest = pattern
        .len
        .saturating_sub(max_edits)
        .max(options.min_match_chars);
    let longest = pattern.len + max_edits;
    let available = value.char_len();

    let mut best: Option<usize> = None;
    for start in 0..available {
        let room = available - start;
        if room < shortest {
            break;
        }
        for len in shortest..=longest.min(room) {
            let distance = strsim::levenshtein(&pattern.text, value.window(start, len));
            if distance <= max_edits && best.is_none_or(|b| distance < b) {
                best = Some(distance);
                if distance == 1 {
                    return best;
                }
            }
        }
    }
    best
}

#[derive(Debug, Clone)]
struct IndexedRecord<'a> {
    policy: &'a Policy,
    fields: Vec<(SearchField, PreparedText)>,
}

/// One ranked search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit<'a> {
    pub policy: &'a Policy,
    /// Aggregate score; lower is better, 0.0 for pass-through results.
    pub score: f64,
    /// Fields with at least one matching value, in field order, deduplicated.
    pub matched_fields: Vec<SearchField>,
    #[serde(skip)]
    position: usize,
}

/// Disposable search index over a fixed sequence of policies.
///
/// Build once per record sequence and reuse it across queries.
#[derive(Debug, Clone)]
pub struct SearchIndex<'a> {
    records: Vec<IndexedRecord<'a>>,
    options: SearchOptions,
    total_weight: f64,
}

impl<'a> SearchIndex<'a> {
    pub fn build(records: &[&'a Policy], options: SearchOptions) -> Self {
        let records: Vec<IndexedRecord<'a>> = records
            .iter()
            .map(|&policy| {
                let fields = SearchField::ALL
                    .iter()
                    .flat_map(|field| {
                        field
                            .values(policy)
                            .into_iter()
                            .filter_map(PreparedText::new)
                            .map(move |text| (*field, text))
                    })
                    .collect();
                IndexedRecord { policy, fields }
            })
            .collect();
        let total_weight = SearchField::ALL.iter().map(|f| f.weight()).sum();
        tracing::debug!(records = records.len(), "search_index_built");
        Self {
            records,
            options,
            total_weight,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    /// Ranked hits for `query`. A blank query returns every record, in input
    /// order, with a zero score.
    pub fn ranked(&self, query: &str) -> Vec<SearchHit<'a>> {
        if query.trim().is_empty() {
            return self
                .records
                .iter()
                .enumerate()
                .map(|(position, record)| SearchHit {
                    policy: record.policy,
                    score: 0.0,
                    matched_fields: Vec::new(),
                    position,
                })
                .collect();
        }

        let text = canonicalize_for_search(query);
        let pattern = Pattern {
            len: text.chars().count(),
            text,
        };
        if pattern.len < self.options.min_match_chars {
            tracing::debug!(query, "query_below_min_match_chars");
            return Vec::new();
        }

        let mut hits: Vec<SearchHit<'a>> = self
            .records
            .iter()
            .enumerate()
            .filter_map(|(position, record)| self.score_record(&pattern, record, position))
            .collect();
        hits.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        tracing::debug!(
            query,
            candidates = self.records.len(),
            hits = hits.len(),
            "fuzzy_search"
        );
        hits
    }

    /// Policies matching `query`, best first. A blank query is a pass-through.
    pub fn search(&self, query: &str) -> Vec<&'a Policy> {
        self.ranked(query).into_iter().map(|hit| hit.policy).collect()
    }

    fn score_record(
        &self,
        pattern: &Pattern,
        record: &IndexedRecord<'a>,
        position: usize,
    ) -> Option<SearchHit<'a>> {
        let mut total = 1.0_f64;
        let mut matched_fields: Vec<SearchField> = Vec::new();
        for (field, text) in &record.fields {
            let Some(edits) = best_edit_distance(pattern, text, self.options) else {
                continue;
            };
            let score = if edits == 0 {
                EXACT_SCORE
            } else {
                edits as f64 / pattern.len as f64
            };
            let weight = field.weight() / self.total_weight;
            total *= score.powf(weight * text.norm);
            if !matched_fields.contains(field) {
                matched_fields.push(*field);
            }
        }
        if matched_fields.is_empty() {
            return None;
        }
        Some(SearchHit {
            policy: record.policy,
            score: total,
            matched_fields,
            position,
        })
    }
}

/// One-shot search: build an index over `records` and query it.
pub fn search_policies<'a>(records: &[&'a Policy], query: &str) -> Vec<&'a Policy> {
    if query.trim().is_empty() {
        return records.to_vec();
    }
    SearchIndex::build(records, SearchOptions::default()).search(query)
}
