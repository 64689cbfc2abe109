//! Plain-text rendering of browse results, policy detail and facet tables.

use std::fmt::Write as _;

use itertools::Itertools;

use super::theme::Theme;
use crate::catalog::BrowseResult;
use crate::model::types::{
    AffectedPopulation, Country, EvidenceQuality, FacetValue, Policy, PolicyType,
};
use crate::search::facets::{CatalogStats, FacetCounts};

fn labels<T: FacetValue>(values: &[T]) -> String {
    values.iter().map(|v| v.label()).join(", ")
}

/// Compact card used in result lists.
pub fn render_card(policy: &Policy, theme: Theme) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", theme.heading(&policy.display_name()));
    let meta = format!("{} · {}", policy.country.label(), policy.year_span());
    let _ = writeln!(
        out,
        "  {} · Evidence: {}",
        theme.muted(&meta),
        theme.evidence(policy.evidence_quality)
    );
    if !policy.policy_types.is_empty() {
        let _ = writeln!(out, "  {}", labels(&policy.policy_types));
    }
    if !policy.summary_short.is_empty() {
        let _ = writeln!(out, "  {}", policy.summary_short);
    }
    out
}

/// Result list with a count header and an empty-state message.
pub fn render_results(result: &BrowseResult<'_>, theme: Theme, show_scores: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        theme.muted(&format!(
            "Showing {} of {} policies",
            result.filtered_count, result.total_count
        ))
    );
    if result.hits.is_empty() {
        let message = if result.criteria_applied {
            "No policies match the current filters. Try removing some."
        } else {
            "The catalog is empty."
        };
        let _ = writeln!(out, "\n{message}");
        return out;
    }
    for hit in &result.hits {
        out.push('\n');
        out.push_str(&render_card(hit.policy, theme));
        if show_scores && !hit.matched_fields.is_empty() {
            let fields = hit
                .matched_fields
                .iter()
                .map(|f| format!("{f:?}"))
                .join(", ");
            let _ = writeln!(
                out,
                "  {}",
                theme.muted(&format!("score {:.4} via {fields}", hit.score))
            );
        }
    }
    out
}

fn section(out: &mut String, theme: Theme, title: &str) {
    let _ = write!(out, "\n{}\n", theme.heading(title));
}

/// Full policy view.
pub fn render_detail(policy: &Policy, theme: Theme) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", theme.heading(&policy.display_name()));
    if let Some(local) = &policy.name_local {
        let _ = writeln!(out, "{}", theme.muted(local));
    }
    let status = if policy.is_active { "Active" } else { "Ended" };
    let _ = writeln!(
        out,
        "\nCountry: {}   Years: {}   Status: {status}",
        policy.country.label(),
        policy.year_span()
    );
    if !policy.policy_types.is_empty() {
        let _ = writeln!(out, "Types: {}", labels(&policy.policy_types));
    }
    if !policy.affected_populations.is_empty() {
        let _ = writeln!(out, "Populations: {}", labels(&policy.affected_populations));
    }
    let _ = writeln!(
        out,
        "Evidence: {} - {}",
        theme.evidence(policy.evidence_quality),
        policy.evidence_quality.description()
    );

    let prose = [
        ("Summary", policy.summary_long.as_str()),
        ("Mechanisms", policy.mechanisms.as_str()),
        ("Coverage", policy.coverage.as_deref().unwrap_or_default()),
        ("Impact", policy.impact_summary.as_str()),
    ];
    for (title, body) in prose {
        if !body.is_empty() {
            section(&mut out, theme, title);
            let _ = writeln!(out, "  {body}");
        }
    }

    if !policy.objectives.is_empty() {
        section(&mut out, theme, "Objectives");
        for objective in &policy.objectives {
            let _ = writeln!(out, "  - {objective}");
        }
    }

    if !policy.key_outcomes.is_empty() {
        section(&mut out, theme, "Key outcomes");
        for outcome in &policy.key_outcomes {
            let _ = write!(out, "  - {}: {}", outcome.metric, outcome.effect);
            if let Some(source) = &outcome.source {
                let _ = write!(out, " ({source})");
            }
            out.push('\n');
        }
    }

    if !policy.evaluations.is_empty() {
        section(&mut out, theme, "Evaluations");
        for study in &policy.evaluations {
            let _ = write!(out, "  - {} ({}). {}.", study.authors, study.year, study.title);
            if let Some(journal) = &study.journal {
                let _ = write!(out, " {journal}.");
            }
            let _ = writeln!(out, " [{}]", study.methodology.label());
            if !study.key_finding.is_empty() {
                let _ = writeln!(out, "    Finding: {}", study.key_finding);
            }
            if let Some(link) = study.doi.as_ref().or(study.url.as_ref()) {
                let _ = writeln!(out, "    {}", theme.muted(link));
            }
        }
    }

    if !policy.key_references.is_empty() {
        section(&mut out, theme, "References");
        for reference in &policy.key_references {
            let _ = write!(
                out,
                "  - {} ({}). {}.",
                reference.authors, reference.year, reference.title
            );
            if !reference.source.is_empty() {
                let _ = write!(out, " {}.", reference.source);
            }
            out.push('\n');
            if let Some(link) = reference.doi.as_ref().or(reference.url.as_ref()) {
                let _ = writeln!(out, "    {}", theme.muted(link));
            }
        }
    }
    out
}

fn facet_table<T: FacetValue>(out: &mut String, theme: Theme, title: &str, count: impl Fn(T) -> usize) {
    section(out, theme, title);
    for value in T::ALL {
        let _ = writeln!(out, "  {:<28} {:>4}", value.label(), count(*value));
    }
}

/// Every facet value with its universe count, zeros included.
pub fn render_facets(counts: &FacetCounts, theme: Theme) -> String {
    let mut out = String::new();
    facet_table::<Country>(&mut out, theme, "Countries", |v| counts.country(v));
    facet_table::<PolicyType>(&mut out, theme, "Policy types", |v| counts.policy_type(v));
    facet_table::<AffectedPopulation>(&mut out, theme, "Affected populations", |v| {
        counts.affected_population(v)
    });
    facet_table::<EvidenceQuality>(&mut out, theme, "Evidence quality", |v| counts.evidence(v));
    out
}

pub fn render_stats(stats: &CatalogStats, total: usize, theme: Theme) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", theme.heading("Catalog"));
    let _ = writeln!(out, "  Policies                {total:>4}");
    let _ = writeln!(out, "  Countries               {:>4}", stats.country_count);
    let _ = writeln!(out, "  Active                  {:>4}", stats.active_count);
    let _ = writeln!(out, "  High/moderate evidence  {:>4}", stats.high_evidence_count);
    out
}
