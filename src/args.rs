use clap::Parser;

/// Casts topic votes on a Discourse forum on behalf of the users listed in a CSV file.
///
/// Runs as a dry run unless --live is passed.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file with the run settings. Values passed on the command line
    /// take precedence over the values in this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (URL) The base URL of the forum, for example https://forum.example.com/community
    #[clap(short, long, value_parser)]
    pub url: Option<String>,

    /// The admin API key. It must be allowed to act on behalf of other users.
    #[clap(long, env = "DISCOURSE_API_KEY", hide_env_values = true, value_parser)]
    pub api_key: Option<String>,

    /// (default system) The admin username that owns the API key.
    #[clap(long, value_parser)]
    pub api_username: Option<String>,

    /// (file path, default topics_to_vote.csv) The CSV file with the topic_id and username columns.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// If passed as an argument, the votes are cast. Otherwise the run only previews them.
    #[clap(long, takes_value = false)]
    pub live: bool,

    /// (milliseconds, default 500) The pause between two vote requests.
    #[clap(long, value_parser)]
    pub delay_ms: Option<u64>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard error.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
