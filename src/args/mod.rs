mod parsers;


use std::time::Duration;

use clap::Parser;

pub use parsers::{parse_delimiter, parse_duration_arg, parse_positive_u64, parse_positive_usize};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Rate-controlled concurrent query load generator - replays a parameter file against a backend connection pool with live QPS tuning and latency/outcome reporting."
)]
pub struct LoadArgs {
    /// Path to the newline-delimited parameter file
    #[arg(long, short = 'f')]
    pub input: Option<String>,

    /// Total number of queries to replay
    #[arg(long, short = 'n', default_value_t = 10_000, value_parser = parse_positive_u64)]
    pub queries: u64,

    /// Number of backend connections (one input shard each)
    #[arg(long, short = 'c', default_value_t = 1, value_parser = parse_positive_usize)]
    pub connections: usize,

    /// Workers per connection
    #[arg(long, short = 'w', default_value_t = 5, value_parser = parse_positive_usize)]
    pub workers: usize,

    /// Initial global rate in queries per second
    #[arg(long, default_value_t = 50, value_parser = parse_positive_u64)]
    pub qps: u64,

    /// Stop the run after this long even if input remains (supports ms/s/m/h)
    #[arg(long, short = 't', value_parser = parse_duration_arg)]
    pub duration: Option<Duration>,

    /// Per-request deadline (supports ms/s/m/h)
    #[arg(long = "request-timeout", default_value = "60s", value_parser = parse_duration_arg)]
    pub request_timeout: Duration,

    /// Field delimiter for input rows ('\t' for tab)
    #[arg(long, default_value = "\\t", value_parser = parse_delimiter)]
    pub delimiter: char,

    /// Minimum fields a row must carry; shorter rows are skipped as malformed
    #[arg(long = "min-fields", value_parser = parse_positive_usize)]
    pub min_fields: Option<usize>,

    /// Rate-control endpoint listen address
    #[arg(long = "control-listen")]
    pub control_listen: Option<String>,

    /// Disable the rate-control endpoint
    #[arg(long = "no-control")]
    pub no_control: bool,

    /// Backend HTTP endpoint
    #[arg(long, short = 'u')]
    pub url: Option<String>,

    /// Backend database name
    #[arg(long)]
    pub database: Option<String>,

    /// Backend user
    #[arg(long)]
    pub user: Option<String>,

    /// Backend password
    #[arg(long, env = "QLOAD_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Max server-side threads per query (engine passthrough)
    #[arg(long = "max-threads")]
    pub max_threads: Option<u32>,

    /// Show a progress line during the run
    #[arg(long, short = 'p')]
    pub progress: bool,

    /// Verbose logging
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Config file path (TOML)
    #[arg(long)]
    pub config: Option<String>,
}
