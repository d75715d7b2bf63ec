use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use aj_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use aj_common::matching::{
    DEFAULT_PARALLEL_MIN_POSTINGS, MatchReport, MatchingEngine, MatchingEngineConfig,
    RelevanceFilter,
};
use aj_common::{CandidateProfile, MatchPreferences, MatchResult};
use clap::Parser;
use serde_json::Value;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to write results: {0}")]
    Output(#[from] io::Error),
}

#[derive(Debug, Parser)]
#[command(name = "aj-matcher", about = "Rank job postings against a candidate profile")]
struct Cli {
    /// Candidate profile (JSON object)
    #[arg(long)]
    profile: PathBuf,

    /// Job postings (JSON array)
    #[arg(long)]
    postings: PathBuf,

    /// Preferred location, e.g. "New York, NY"
    #[arg(long)]
    location: Option<String>,

    /// Preferred work mode: remote | hybrid | onsite
    #[arg(long)]
    work_mode: Option<String>,

    /// Preferred job type, e.g. "Full-time"
    #[arg(long)]
    job_type: Option<String>,

    /// Drop matches scoring below this value (0.0 to 1.0)
    #[arg(long)]
    min_score: Option<f64>,

    /// Keep at most this many matches
    #[arg(long)]
    limit: Option<usize>,

    /// Batches at least this large are scored in parallel (0 disables)
    #[arg(long, env = "AJ_MATCH_PARALLEL_MIN_POSTINGS", default_value_t = DEFAULT_PARALLEL_MIN_POSTINGS)]
    parallel_min_postings: usize,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

impl Cli {
    fn preferences(&self) -> MatchPreferences {
        MatchPreferences {
            location: self.location.clone(),
            work_mode: self.work_mode.clone(),
            job_type: self.job_type.clone(),
        }
    }

    fn relevance_filter(&self) -> Result<RelevanceFilter, CliError> {
        if let Some(min_score) = self.min_score {
            if !(0.0..=1.0).contains(&min_score) {
                return Err(CliError::Config(format!(
                    "--min-score must be between 0 and 1, got {min_score}"
                )));
            }
        }

        Ok(RelevanceFilter {
            min_score: self.min_score,
            limit: self.limit,
        })
    }
}

fn read_json(path: &Path) -> Result<Value, CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn load_profile(path: &Path) -> Result<CandidateProfile, CliError> {
    serde_json::from_value(read_json(path)?).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Accepts a bare array or an object wrapping it under `postings`.
fn load_postings(path: &Path) -> Result<Vec<Value>, CliError> {
    match read_json(path)? {
        Value::Array(items) => Ok(items),
        Value::Object(mut object) => match object.remove("postings") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(CliError::Config(format!(
                "{} must contain a JSON array of postings",
                path.display()
            ))),
        },
        _ => Err(CliError::Config(format!(
            "{} must contain a JSON array of postings",
            path.display()
        ))),
    }
}

fn write_results(results: &[MatchResult], pretty: bool) -> Result<(), CliError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(results)
    } else {
        serde_json::to_string(results)
    }
    .map_err(io::Error::other)?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    let filter = cli.relevance_filter()?;
    let profile = load_profile(&cli.profile)?;
    let postings = load_postings(&cli.postings)?;
    let preferences = cli.preferences();

    let engine = MatchingEngine::new(MatchingEngineConfig {
        parallel_min_postings: cli.parallel_min_postings,
    });
    let MatchReport { matches, rejected } = engine
        .run(&profile, postings, &preferences)
        .filtered(&filter);

    if !rejected.is_empty() {
        warn!(count = rejected.len(), "some postings were rejected");
    }
    info!(
        matches = matches.len(),
        rejected = rejected.len(),
        "ranking complete"
    );

    let results: Vec<MatchResult> = matches.into_iter().map(|scored| scored.result).collect();
    write_results(&results, cli.pretty)
}

fn main() {
    dotenvy::dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));

    if let Err(err) = run(Cli::parse()) {
        tracing::error!(error = %err, "aj-matcher failed");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["aj-matcher", "--profile", "p.json", "--postings", "j.json"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("aj-matcher-{}-{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn builds_preferences_from_flags() {
        let cli = cli(&["--work-mode", "remote", "--job-type", "Full-time"]);
        let prefs = cli.preferences();

        assert_eq!(prefs.work_mode.as_deref(), Some("remote"));
        assert_eq!(prefs.job_type.as_deref(), Some("Full-time"));
        assert!(prefs.location.is_none());
    }

    #[test]
    fn rejects_out_of_range_min_score() {
        let cli = cli(&["--min-score", "2"]);
        assert!(matches!(cli.relevance_filter(), Err(CliError::Config(_))));
    }

    #[test]
    fn loads_wrapped_and_bare_posting_arrays() {
        let bare = temp_file("bare.json", r#"[{"id":"a","title":"Engineer"}]"#);
        let wrapped = temp_file("wrapped.json", r#"{"postings":[{"id":"b","title":"SRE"}]}"#);

        assert_eq!(load_postings(&bare).unwrap().len(), 1);
        assert_eq!(load_postings(&wrapped).unwrap().len(), 1);

        let _ = fs::remove_file(bare);
        let _ = fs::remove_file(wrapped);
    }

    #[test]
    fn reports_missing_files_and_bad_json() {
        let missing = std::env::temp_dir().join("aj-matcher-does-not-exist.json");
        assert!(matches!(load_profile(&missing), Err(CliError::Io { .. })));

        let bad = temp_file("bad.json", "{ not json");
        assert!(matches!(load_profile(&bad), Err(CliError::Json { .. })));
        let _ = fs::remove_file(bad);
    }

    #[test]
    fn non_array_postings_are_config_errors() {
        let scalar = temp_file("scalar.json", "42");
        assert!(matches!(load_postings(&scalar), Err(CliError::Config(_))));
        let _ = fs::remove_file(scalar);
    }
}
