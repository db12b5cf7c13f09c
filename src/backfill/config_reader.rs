use log::debug;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use topic_voting::ApiSettings;

use crate::args::Args;
use crate::backfill::*;

pub const DEFAULT_CSV_FILE: &str = "topics_to_vote.csv";
pub const DEFAULT_DELAY_MS: u64 = 500;

/// The settings that can be provided in a JSON file.
///
/// All of them are optional. The command line flags take precedence.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(rename = "discourseUrl")]
    pub discourse_url: Option<String>,
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,
    #[serde(rename = "apiUsername")]
    pub api_username: Option<String>,
    /// Relative paths are resolved against the directory of the config file.
    #[serde(rename = "csvFile")]
    pub csv_file: Option<String>,
    #[serde(rename = "dryRun")]
    pub dry_run: Option<bool>,
    #[serde(rename = "delayMs")]
    pub delay_ms: Option<u64>,
}

/// Everything a run needs, fixed once the run starts.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RunConfig {
    pub api: ApiSettings,
    pub input: PathBuf,
    pub dry_run: bool,
    /// Pause between two consecutive vote requests.
    pub delay: Duration,
}

impl RunConfig {
    /// A copy that is safe to log.
    pub fn redacted(&self) -> RunConfig {
        let mut c = self.clone();
        if !c.api.api_key.is_empty() {
            c.api.api_key = "<redacted>".to_string();
        }
        c
    }
}

pub fn read_config_file(path: &str) -> BackfillResult<FileConfig> {
    let contents = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
    let config: FileConfig =
        serde_json::from_str(contents.as_str()).context(ParsingConfigSnafu { path })?;
    Ok(config)
}

/// Builds the run configuration from the command line and the optional config file.
pub fn resolve(args: &Args) -> BackfillResult<RunConfig> {
    match &args.config {
        Some(config_path) => {
            let file_config = read_config_file(config_path)?;
            debug!("resolve: read config file {:?}", config_path);
            let config_dir = Path::new(config_path).parent();
            resolve_with(args, file_config, config_dir)
        }
        None => resolve_with(args, FileConfig::default(), None),
    }
}

pub fn resolve_with(
    args: &Args,
    file_config: FileConfig,
    config_dir: Option<&Path>,
) -> BackfillResult<RunConfig> {
    let raw_url = match args.url.clone().or(file_config.discourse_url) {
        Some(u) if !u.trim().is_empty() => u.trim().to_string(),
        _ => {
            return MissingSettingSnafu {
                name: "discourseUrl",
            }
            .fail()
        }
    };
    url::Url::parse(&raw_url).context(InvalidUrlSnafu { url: &raw_url })?;
    let base_url = raw_url.trim_end_matches('/').to_string();

    let dry_run = if args.live {
        false
    } else {
        file_config.dry_run.unwrap_or(true)
    };

    let api_key = args
        .api_key
        .clone()
        .or(file_config.api_key)
        .unwrap_or_default();
    if !dry_run && api_key.trim().is_empty() {
        return MissingSettingSnafu { name: "apiKey" }.fail();
    }

    let api_username = args
        .api_username
        .clone()
        .or(file_config.api_username)
        .unwrap_or_else(|| ApiSettings::DEFAULT_API_USERNAME.to_string());

    let input: PathBuf = match (&args.input, file_config.csv_file) {
        (Some(p), _) => PathBuf::from(p),
        (None, Some(p)) => match config_dir {
            Some(dir) if Path::new(&p).is_relative() => dir.join(p),
            _ => PathBuf::from(p),
        },
        (None, None) => PathBuf::from(DEFAULT_CSV_FILE),
    };

    let delay_ms = args
        .delay_ms
        .or(file_config.delay_ms)
        .unwrap_or(DEFAULT_DELAY_MS);

    Ok(RunConfig {
        api: ApiSettings {
            base_url,
            api_key: api_key.trim().to_string(),
            api_username,
        },
        input,
        dry_run,
        delay: Duration::from_millis(delay_ms),
    })
}

/// The command line flag matching a config file key.
pub fn flag_for(name: &str) -> &'static str {
    match name {
        "discourseUrl" => "--url",
        "apiKey" => "--api-key (or DISCOURSE_API_KEY)",
        "apiUsername" => "--api-username",
        "csvFile" => "--input",
        "delayMs" => "--delay-ms",
        _ => "the matching flag (see --help)",
    }
}
