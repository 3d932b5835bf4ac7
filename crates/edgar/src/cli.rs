use clap::{Args, Parser, Subcommand, ValueEnum};
use edgar_spider::config::DEFAULT_FEED;
use edgar_spider::FilingType;
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing.
    #[arg(short, long, global = true)]
    pub trace: Option<TraceLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the feed once and download the first matching filing.
    Spider {
        #[command(flatten)]
        run: RunArgs,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run the spider every few seconds until interrupted.
    Watch {
        #[command(flatten)]
        run: RunArgs,

        /// Seconds between runs.
        #[arg(short, long, default_value_t = 100)]
        every: u64,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// RSS/Atom feed announcing the filings.
    #[arg(short, long, default_value_t = DEFAULT_FEED.to_string())]
    pub feed: String,

    /// Filing types to look for, e.g. `--types 8-K,10-Q`.
    ///
    /// If no types are provided, all of 8-K, 10-K and 10-Q are accepted.
    #[arg(long, value_delimiter = ',')]
    pub types: Option<Vec<FilingType>>,

    /// Destination folder; overrides FOLDER_PATH.
    #[arg(long)]
    pub folder: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
#[clap(rename_all = "UPPERCASE")]
pub enum TraceLevel {
    DEBUG,
    ERROR,
    INFO,
    TRACE,
    WARN,
}

impl From<TraceLevel> for Level {
    fn from(level: TraceLevel) -> Self {
        match level {
            TraceLevel::DEBUG => Level::DEBUG,
            TraceLevel::ERROR => Level::ERROR,
            TraceLevel::INFO => Level::INFO,
            TraceLevel::TRACE => Level::TRACE,
            TraceLevel::WARN => Level::WARN,
        }
    }
}
