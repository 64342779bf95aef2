use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sceap", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    /// Engine configuration (TOML, or JSON by extension)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Cable catalog replacing the built-in tables (JSON)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a feeder schedule for structural problems
    Validate {
        /// Feeder schedule (CSV)
        #[arg(value_hint = ValueHint::FilePath)]
        feeders: PathBuf,
        /// Exit non-zero when the structure is invalid
        #[arg(long)]
        strict: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the bus hierarchy with levels
    Hierarchy {
        /// Feeder schedule (CSV)
        #[arg(value_hint = ValueHint::FilePath)]
        feeders: PathBuf,
    },
    /// Trace every load back to its source
    Paths {
        /// Feeder schedule (CSV)
        #[arg(value_hint = ValueHint::FilePath)]
        feeders: PathBuf,
        /// Write the full path report as JSON
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
    /// Size every feeder in the schedule
    Size {
        /// Feeder schedule (CSV)
        #[arg(value_hint = ValueHint::FilePath)]
        feeders: PathBuf,
        /// Write the cable schedule as CSV
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
    /// Graph utilities
    Graph {
        #[command(subcommand)]
        command: GraphCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum GraphCommands {
    /// Graph stats summary
    Stats {
        /// Feeder schedule (CSV)
        feeders: PathBuf,
    },
    /// Export the bus hierarchy
    Export {
        /// Feeder schedule (CSV)
        feeders: PathBuf,
        /// Output format (dot, graphviz or json)
        #[arg(long, default_value = "dot")]
        format: String,
        /// Optional output file path
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}
