//! Query-string encoding of [`FilterCriteria`], for shareable links.
//!
//! ```text
//! ?q=ceibal&countries=uruguay,argentina&types=digital-inclusion&active=true&yearStart=2000
//! ```
//!
//! Only non-default fields are written. Decoding is forgiving: unknown keys,
//! unknown slugs and unparsable years are dropped (and logged) rather than
//! rejected, so a stale or hand-edited link still opens.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use itertools::Itertools;

use super::filter::{FilterCriteria, YearRange};
use crate::model::types::FacetValue;

const KEY_QUERY: &str = "q";
const KEY_COUNTRIES: &str = "countries";
const KEY_TYPES: &str = "types";
const KEY_POPULATIONS: &str = "populations";
const KEY_EVIDENCE: &str = "evidence";
const KEY_ACTIVE: &str = "active";
const KEY_YEAR_START: &str = "yearStart";
const KEY_YEAR_END: &str = "yearEnd";

fn push_pair(out: &mut String, key: &str, value: &str) {
    if !out.is_empty() {
        out.push('&');
    }
    let _ = write!(out, "{key}={}", urlencoding::encode(value));
}

fn push_set<T: FacetValue>(out: &mut String, key: &str, set: &BTreeSet<T>) {
    if !set.is_empty() {
        let joined = set.iter().map(|v| v.slug()).join(",");
        push_pair(out, key, &joined);
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

fn parse_set<T: FacetValue>(key: &str, value: &str) -> BTreeSet<T> {
    value
        .split(',')
        .map(str::trim)
        .filter(|slug| !slug.is_empty())
        .filter_map(|slug| {
            let parsed = T::from_slug(slug);
            if parsed.is_none() {
                tracing::warn!(key, slug, "query_string_rejected_value");
            }
            parsed
        })
        .collect()
}

fn parse_year(key: &str, value: &str, fallback: i32) -> i32 {
    value.trim().parse().unwrap_or_else(|_| {
        tracing::warn!(key, value, "query_string_rejected_value");
        fallback
    })
}

impl FilterCriteria {
    /// Encode the non-default fields as `key=value` pairs (no leading `?`).
    pub fn to_query_string(&self) -> String {
        let defaults = YearRange::default();
        let mut out = String::new();
        if !self.search_query.is_empty() {
            push_pair(&mut out, KEY_QUERY, &self.search_query);
        }
        push_set(&mut out, KEY_COUNTRIES, &self.countries);
        push_set(&mut out, KEY_TYPES, &self.policy_types);
        push_set(&mut out, KEY_POPULATIONS, &self.affected_populations);
        push_set(&mut out, KEY_EVIDENCE, &self.evidence_quality);
        if self.active_only {
            push_pair(&mut out, KEY_ACTIVE, "true");
        }
        if self.year_range.start != defaults.start {
            push_pair(&mut out, KEY_YEAR_START, &self.year_range.start.to_string());
        }
        if self.year_range.end != defaults.end {
            push_pair(&mut out, KEY_YEAR_END, &self.year_range.end.to_string());
        }
        out
    }

    /// Decode criteria from a query string, with or without a leading `?`.
    /// Missing keys keep their defaults.
    pub fn from_query_string(input: &str) -> Self {
        let mut criteria = Self::default();
        let trimmed = input.trim().trim_start_matches('?');
        for pair in trimmed.split('&').filter(|p| !p.is_empty()) {
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(raw_key);
            let value = decode_component(raw_value);
            match key.as_str() {
                KEY_QUERY => criteria.search_query = value,
                KEY_COUNTRIES => criteria.countries = parse_set(KEY_COUNTRIES, &value),
                KEY_TYPES => criteria.policy_types = parse_set(KEY_TYPES, &value),
                KEY_POPULATIONS => {
                    criteria.affected_populations = parse_set(KEY_POPULATIONS, &value);
                }
                KEY_EVIDENCE => criteria.evidence_quality = parse_set(KEY_EVIDENCE, &value),
                KEY_ACTIVE => criteria.active_only = value == "true",
                KEY_YEAR_START => {
                    criteria.year_range.start =
                        parse_year(KEY_YEAR_START, &value, criteria.year_range.start);
                }
                KEY_YEAR_END => {
                    criteria.year_range.end =
                        parse_year(KEY_YEAR_END, &value, criteria.year_range.end);
                }
                other => tracing::debug!(key = other, "query_string_unknown_key"),
            }
        }
        criteria
    }
}
