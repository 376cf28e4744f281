use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use numstream_client::{DEFAULT_HOST, DEFAULT_PORT};
use numstream_frame::DEFAULT_MAX_LINE;
use numstream_generator::{SeedMode, DEFAULT_SEED, DEFAULT_SIZE};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod count;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Consume a seeded sequence, tally it, and print the throughput.
    Count(CountArgs),
    /// Run the number-generator service.
    Serve(ServeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Count(args) => count::run(args, format),
        Command::Serve(args) => serve::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct CountArgs {
    /// Seed sent to the service.
    #[arg(long, default_value_t = 23, allow_negative_numbers = true)]
    pub seed: i64,
    /// Number of values to consume. Zero or less consumes nothing.
    #[arg(long, default_value_t = 100_000, allow_negative_numbers = true)]
    pub limit: i64,
    /// Service host.
    #[arg(long, env = "NUMSTREAM_HOST", default_value = DEFAULT_HOST)]
    pub host: String,
    /// Service port.
    #[arg(long, env = "NUMSTREAM_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Connection timeout (e.g. 5s, 500ms).
    #[arg(long, value_name = "DURATION")]
    pub connect_timeout: Option<String>,
    /// Maximum wait for the next chunk (e.g. 5s, 500ms).
    #[arg(long, value_name = "DURATION")]
    pub read_timeout: Option<String>,
    /// Also report the N most frequent values.
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub top: usize,
    /// Reject records longer than this many bytes; 0 disables the check.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_LINE)]
    pub max_line_length: usize,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "NUMSTREAM_BIND", default_value = "127.0.0.1:8888")]
    pub bind: String,
    /// TOML file with the stream shape; re-read while serving.
    #[arg(
        long,
        value_name = "PATH",
        conflicts_with_all = ["size", "proportion", "max_rate", "seed_mode", "default_seed", "max_items"]
    )]
    pub config: Option<PathBuf>,
    /// How often the config file is checked for changes (e.g. 1s, 500ms).
    #[arg(long, value_name = "DURATION", default_value = "1s")]
    pub reload_interval: String,
    /// Number of distinct elements in the pool.
    #[arg(long, default_value_t = DEFAULT_SIZE)]
    pub size: usize,
    /// Give the next COUNT elements WEIGHT each (repeatable), e.g. 1:0.5.
    #[arg(long, value_name = "COUNT:WEIGHT")]
    pub proportion: Vec<String>,
    /// Limit each stream to R values per second.
    #[arg(long, value_name = "R")]
    pub max_rate: Option<f64>,
    /// Where the per-connection seed comes from.
    #[arg(long, value_enum, default_value_t = SeedModeArg::Ask)]
    pub seed_mode: SeedModeArg,
    /// Seed used by `fixed` mode and when a client seed is unusable.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub default_seed: u64,
    /// Close each connection after N values.
    #[arg(long, value_name = "N")]
    pub max_items: Option<u64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SeedModeArg {
    Ask,
    Fixed,
    Random,
}

impl From<SeedModeArg> for SeedMode {
    fn from(arg: SeedModeArg) -> Self {
        match arg {
            SeedModeArg::Ask => SeedMode::Ask,
            SeedModeArg::Fixed => SeedMode::Fixed,
            SeedModeArg::Random => SeedMode::Random,
        }
    }
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
