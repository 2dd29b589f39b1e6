use clap::{Parser, Subcommand, ValueEnum};

use crate::core::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "statuswatch",
    version,
    about = "Watch status pages and report every incident and component change once"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to config file (TOML). Default: config/statuswatch.toml
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Comma-separated feed names to enable (case-insensitive)
    #[arg(long, value_delimiter = ',', global = true)]
    pub feeds: Option<Vec<String>>,

    /// Seconds between polls while no incident is open
    #[arg(long, global = true)]
    pub normal_interval: Option<u64>,

    /// Seconds between polls while an incident is open
    #[arg(long, global = true)]
    pub incident_interval: Option<u64>,

    /// Notification output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub format: FormatArg,

    /// Increase verbosity (debug, trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also append logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Poll every enabled feed until interrupted
    Watch {
        /// Stop after this many seconds
        #[arg(long)]
        max_run: Option<u64>,
    },
    /// Run a single poll cycle per feed and exit
    Once,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FormatArg {
    Text,
    Jsonl,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Jsonl => OutputFormat::Jsonl,
        }
    }
}
