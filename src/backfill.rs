use log::{debug, info};

use snafu::{prelude::*, Snafu};

use std::io::Write;
use std::thread;
use std::time::Duration;

use topic_voting::{HttpVoteCaster, Tally};

use crate::args::Args;
use crate::backfill::report::Mode;

pub mod config_reader;
pub mod io_csv;
pub mod report;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BackfillError {
    #[snafu(display("CSV file not found: {path}"))]
    InputNotFound { path: String },
    #[snafu(display("Failed to read CSV file {path}: {source}"))]
    InputUnreadable { source: csv::Error, path: String },
    #[snafu(display("CSV file is empty: {path}"))]
    InputEmpty { path: String },
    #[snafu(display("CSV must have columns: topic_id, username (found: {})", found.join(", ")))]
    Schema { found: Vec<String> },

    #[snafu(display("Error opening config file {path}: {source}"))]
    OpeningConfig {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing config file {path}: {source}"))]
    ParsingConfig {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Missing setting: {name}"))]
    MissingSetting { name: String },
    #[snafu(display("Invalid forum URL {url:?}: {source}"))]
    InvalidUrl {
        source: url::ParseError,
        url: String,
    },

    #[snafu(display("Failed to create the HTTP client: {source}"))]
    HttpClient { source: reqwest::Error },
    #[snafu(display("Failed to write the report: {source}"))]
    Output { source: std::io::Error },
}

pub type BackfillResult<T> = Result<T, BackfillError>;

const CSV_FORMAT_HINT: &str = "Create a CSV file with the following format:
topic_id,username
12345,john_doe
12346,jane_smith";

impl BackfillError {
    /// What the user can do about the error, if there is something to say.
    pub fn hint(&self) -> Option<String> {
        match self {
            BackfillError::InputNotFound { .. }
            | BackfillError::InputEmpty { .. }
            | BackfillError::Schema { .. } => Some(CSV_FORMAT_HINT.to_string()),
            BackfillError::MissingSetting { name } => Some(format!(
                "Pass {} on the command line or set {} in the config file.",
                config_reader::flag_for(name),
                name
            )),
            _ => None,
        }
    }
}

/// Runs a complete batch and returns the final tally.
///
/// Fatal errors are only returned before the first row is processed, apart
/// from failures to write the report itself.
pub fn run(args: &Args, out: &mut dyn Write) -> BackfillResult<Tally> {
    let config = config_reader::resolve(args)?;
    debug!("run: config: {:?}", config.redacted());

    report::print_banner(&config, out).context(OutputSnafu {})?;

    let rows = io_csv::read_rows(&config.input)?;
    info!("run: {} rows read from {}", rows.len(), config.input.display());
    writeln!(out, "Found {} topics to process\n", rows.len()).context(OutputSnafu {})?;

    let batch_r = if config.dry_run {
        report::run_batch(&rows, Mode::DryRun, &mut |_: Duration| {}, out)
    } else {
        let caster = HttpVoteCaster::new(&config.api).context(HttpClientSnafu {})?;
        let mode = Mode::Live {
            caster: &caster,
            delay: config.delay,
        };
        report::run_batch(&rows, mode, &mut thread::sleep, out)
    };
    let batch = batch_r.context(OutputSnafu {})?;

    report::print_summary(&batch, config.dry_run, out).context(OutputSnafu {})?;
    info!("run: done: {:?}", batch.tally);
    Ok(batch.tally)
}

/// Arguments for a dry run over the given CSV file.
#[cfg(test)]
pub(crate) fn test_args(input: &str) -> Args {
    Args {
        config: None,
        url: Some("http://127.0.0.1:9/community".to_string()),
        api_key: None,
        api_username: None,
        input: Some(input.to_string()),
        live: false,
        delay_ms: None,
        verbose: false,
    }
}
