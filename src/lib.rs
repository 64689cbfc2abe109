pub mod catalog;
pub mod config;
pub mod model;
pub mod search;
pub mod session;
pub mod ui;

use std::io::{IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;

use catalog::{Catalog, CatalogError};
use config::{AtlasConfig, ConfigError};
use model::types::{AffectedPopulation, Country, EvidenceQuality, PolicyType};
use search::filter::{FilterCriteria, YearRange};
use session::{SessionSnapshot, SessionStore};
use ui::render;
use ui::theme::Theme;

/// Version of the `--json` output contract.
pub const API_VERSION: u32 = 1;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "atlas",
    version,
    about = "Browse and search a catalog of Latin American education policies"
)]
pub struct Cli {
    /// Policy dataset (JSON array); defaults to the embedded catalog
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit machine-readable JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    #[arg(long, value_enum, default_value_t = ColorChoice::Auto, global = true)]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List policies matching the given filters, best matches first
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Show at most this many results
        #[arg(long)]
        limit: Option<usize>,

        /// Print match scores and matched fields
        #[arg(long)]
        scores: bool,
    },
    /// Show one policy in full
    Show {
        /// Policy id, e.g. `uy-plan-ceibal`
        id: String,
    },
    /// Facet values with the number of policies carrying each
    Facets,
    /// Headline catalog numbers
    Stats,
    /// Print the URL query string for the given filters
    Url {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Delete the remembered filter session
    Forget,
    /// Report the JSON contract and build metadata
    ApiVersion,
    /// Generate shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate man page to stdout
    Man,
}

/// Filter flags shared by `list` and `url`.
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Free-text query
    pub query: Vec<String>,

    /// Restrict to a country slug (repeatable)
    #[arg(long = "country", value_name = "SLUG")]
    pub countries: Vec<Country>,

    /// Restrict to a policy type slug (repeatable)
    #[arg(long = "type", value_name = "SLUG")]
    pub policy_types: Vec<PolicyType>,

    /// Restrict to an affected population slug (repeatable)
    #[arg(long = "population", value_name = "SLUG")]
    pub populations: Vec<AffectedPopulation>,

    /// Restrict to an evidence tier (repeatable)
    #[arg(long = "evidence", value_name = "TIER")]
    pub evidence: Vec<EvidenceQuality>,

    /// Only policies still in force
    #[arg(long)]
    pub active: bool,

    /// First year of the window
    #[arg(long, value_name = "YEAR")]
    pub from: Option<i32>,

    /// Last year of the window
    #[arg(long, value_name = "YEAR")]
    pub to: Option<i32>,

    /// Seed the filters from a URL query string
    #[arg(long, value_name = "QUERY", conflicts_with = "resume")]
    pub url: Option<String>,

    /// Seed the filters from the remembered session
    #[arg(long)]
    pub resume: bool,

    /// Remember the resulting filters for a later `--resume`
    #[arg(long)]
    pub remember: bool,
}

impl FilterArgs {
    /// Seed criteria (query string or session) with the explicit flags on top.
    /// Flags add to a seeded selection rather than toggling it.
    pub fn criteria(&self, store: &SessionStore) -> FilterCriteria {
        let mut criteria = if let Some(query) = &self.url {
            FilterCriteria::from_query_string(query)
        } else if self.resume {
            match store.load() {
                Some(snapshot) => snapshot.into_criteria(),
                None => {
                    tracing::warn!(path = %store.path().display(), "nothing to resume");
                    FilterCriteria::default()
                }
            }
        } else {
            FilterCriteria::default()
        };

        let query = self.query.join(" ");
        if !query.trim().is_empty() {
            criteria.set_search_query(query);
        }
        criteria.countries.extend(self.countries.iter().copied());
        criteria.policy_types.extend(self.policy_types.iter().copied());
        criteria
            .affected_populations
            .extend(self.populations.iter().copied());
        criteria.evidence_quality.extend(self.evidence.iter().copied());
        if self.active {
            criteria.set_active_only(true);
        }
        if self.from.is_some() || self.to.is_some() {
            let current = criteria.year_range;
            criteria.set_year_range(YearRange::new(
                self.from.unwrap_or(current.start),
                self.to.unwrap_or(current.end),
            ));
        }
        criteria
    }
}

#[derive(Debug, Error)]
#[error("no policy with id `{0}`")]
pub struct UnknownPolicy(pub String);

/// Failure surfaced to the user, with a stable exit code.
#[derive(Debug, Error, Serialize)]
#[error("{message}")]
pub struct CliError {
    pub code: i32,
    pub kind: &'static str,
    pub message: String,
    pub hint: Option<String>,
    pub retryable: bool,
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        let message = format!("{err:#}");
        if err.chain().any(|cause| cause.is::<UnknownPolicy>()) {
            Self {
                code: 3,
                kind: "unknown-policy",
                message,
                hint: Some("run `atlas list` to see valid ids".into()),
                retryable: false,
            }
        } else if err
            .chain()
            .any(|cause| cause.is::<CatalogError>() || cause.is::<ConfigError>())
        {
            Self {
                code: 4,
                kind: "data",
                message,
                hint: Some("check --data / --config and the ATLAS_* environment".into()),
                retryable: false,
            }
        } else {
            Self {
                code: 1,
                kind: "internal",
                message,
                hint: None,
                retryable: false,
            }
        }
    }
}

impl CliError {
    /// Print to stderr: a single JSON line in robot mode, prose otherwise.
    pub fn report(&self, json: bool) {
        if json {
            let payload = serde_json::json!({ "error": self });
            eprintln!("{payload}");
        } else {
            eprintln!("error: {}", self.message);
            if let Some(hint) = &self.hint {
                eprintln!("hint: {hint}");
            }
        }
    }
}

pub fn run(cli: Cli) -> Result<(), CliError> {
    execute(cli).map_err(CliError::from)
}

fn execute(cli: Cli) -> Result<()> {
    let theme = resolve_theme(cli.color);

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "atlas", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Man => {
            let man = clap_mangen::Man::new(Cli::command());
            man.render(&mut std::io::stdout())?;
            return Ok(());
        }
        Commands::ApiVersion => {
            return print_json(&serde_json::json!({
                "api_version": API_VERSION,
                "contract_version": API_VERSION.to_string(),
                "crate_version": env!("CARGO_PKG_VERSION"),
                "build_timestamp": option_env!("VERGEN_BUILD_TIMESTAMP"),
                "target": option_env!("VERGEN_CARGO_TARGET_TRIPLE"),
            }));
        }
        _ => {}
    }

    let mut config = AtlasConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(path) = cli.data {
        config.data_path = Some(path);
    }
    let store = SessionStore::new(config.session_path());

    match cli.command {
        Commands::List {
            filters,
            limit,
            scores,
        } => {
            let catalog = load_catalog(&config)?;
            let criteria = filters.criteria(&store);
            remember(&filters, &store, &criteria)?;
            let mut result = catalog.browse(&criteria);
            if let Some(limit) = limit {
                result.hits.truncate(limit);
            }
            if cli.json {
                print_json(&ListPayload {
                    query_string: criteria.to_query_string(),
                    active_filter_count: criteria.active_filter_count(),
                    criteria: &criteria,
                    result: &result,
                })
            } else {
                print_text(&render::render_results(&result, theme, scores))
            }
        }
        Commands::Show { id } => {
            let catalog = load_catalog(&config)?;
            let policy = catalog.get(&id).ok_or(UnknownPolicy(id))?;
            if cli.json {
                print_json(policy)
            } else {
                print_text(&render::render_detail(policy, theme))
            }
        }
        Commands::Facets => {
            let catalog = load_catalog(&config)?;
            if cli.json {
                print_json(catalog.facet_counts())
            } else {
                print_text(&render::render_facets(catalog.facet_counts(), theme))
            }
        }
        Commands::Stats => {
            let catalog = load_catalog(&config)?;
            if cli.json {
                print_json(&serde_json::json!({
                    "total_count": catalog.len(),
                    "stats": catalog.stats(),
                }))
            } else {
                print_text(&render::render_stats(&catalog.stats(), catalog.len(), theme))
            }
        }
        Commands::Url { filters } => {
            let criteria = filters.criteria(&store);
            remember(&filters, &store, &criteria)?;
            let query_string = criteria.to_query_string();
            if cli.json {
                print_json(&serde_json::json!({
                    "query_string": query_string,
                    "criteria": criteria,
                }))
            } else {
                print_text(&format!("{query_string}\n"))
            }
        }
        Commands::Forget => {
            let removed = store.clear().context("clearing session")?;
            if cli.json {
                print_json(&serde_json::json!({
                    "removed": removed,
                    "path": store.path(),
                }))
            } else if removed {
                print_text("Forgot the remembered filters.\n")
            } else {
                print_text("No remembered filters.\n")
            }
        }
        Commands::ApiVersion | Commands::Completions { .. } | Commands::Man => Ok(()),
    }
}

#[derive(Serialize)]
struct ListPayload<'r, 'a> {
    query_string: String,
    active_filter_count: usize,
    criteria: &'r FilterCriteria,
    #[serde(flatten)]
    result: &'r catalog::BrowseResult<'a>,
}

fn load_catalog(config: &AtlasConfig) -> Result<Catalog> {
    let catalog = match &config.data_path {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("loading dataset {}", path.display()))?,
        None => Catalog::embedded().context("loading embedded dataset")?,
    };
    Ok(catalog.with_search_options(config.search.options()))
}

fn remember(filters: &FilterArgs, store: &SessionStore, criteria: &FilterCriteria) -> Result<()> {
    if filters.remember {
        store
            .save(&SessionSnapshot::from(criteria))
            .context("saving session")?;
    }
    Ok(())
}

fn resolve_theme(choice: ColorChoice) -> Theme {
    let enabled = match choice {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => {
            std::io::stdout().is_terminal() && dotenvy::var("NO_COLOR").is_err()
        }
    };
    colored::control::set_override(enabled);
    if enabled { Theme::colored() } else { Theme::plain() }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn print_text(text: &str) -> Result<()> {
    let mut out = std::io::stdout().lock();
    out.write_all(text.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (SessionStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (SessionStore::new(dir.path().join("session.json")), dir)
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_add_to_url_seed() {
        let (store, _dir) = store();
        let args = FilterArgs {
            url: Some("countries=uruguay&q=ceibal".into()),
            countries: vec![Country::Argentina],
            from: Some(2000),
            ..FilterArgs::default()
        };
        let criteria = args.criteria(&store);
        assert_eq!(criteria.search_query, "ceibal");
        assert!(criteria.countries.contains(&Country::Uruguay));
        assert!(criteria.countries.contains(&Country::Argentina));
        assert_eq!(criteria.year_range.start, 2000);
        assert_eq!(criteria.year_range.end, YearRange::default().end);
    }

    #[test]
    fn resume_without_snapshot_is_default() {
        let (store, _dir) = store();
        let args = FilterArgs {
            resume: true,
            ..FilterArgs::default()
        };
        assert!(args.criteria(&store).is_default());
    }

    #[test]
    fn parses_repeatable_facet_flags() {
        let cli = Cli::try_parse_from([
            "atlas", "list", "--country", "peru", "--country", "chile", "--evidence", "high",
            "school", "meals",
        ])
        .unwrap();
        let Commands::List { filters, .. } = cli.command else {
            panic!("expected list");
        };
        assert_eq!(filters.countries, vec![Country::Peru, Country::Chile]);
        assert_eq!(filters.evidence, vec![EvidenceQuality::High]);
        assert_eq!(filters.query.join(" "), "school meals");
    }

    #[test]
    fn unknown_slug_is_a_usage_error() {
        let err = Cli::try_parse_from(["atlas", "list", "--country", "narnia"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn errors_map_to_exit_codes() {
        let unknown = CliError::from(anyhow::Error::new(UnknownPolicy("x".into())));
        assert_eq!(unknown.code, 3);

        let data = CliError::from(
            anyhow::Error::new(CatalogError::DuplicateId("x".into())).context("loading dataset"),
        );
        assert_eq!(data.code, 4);
        assert!(data.message.contains("Duplicate policy id"));

        let other = CliError::from(anyhow::anyhow!("boom"));
        assert_eq!(other.code, 1);
    }
}
