use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// PCH Token System - issue and track clinic queue tokens
#[derive(Parser, Debug, Clone)]
#[command(name = "pch-token", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "PCH_TOKEN_CONFIG", default_value = "pch-token.toml")]
    pub config: PathBuf,

    /// Ledger CSV file (overrides storage.data_file)
    #[arg(long, env = "PCH_TOKEN_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Issue the next token
    Issue(IssueArgs),
    /// Show the most recently issued token
    Latest {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the patient history
    History(HistoryArgs),
    /// Reset token numbers to 1 and delete the ledger
    Reset,
    /// Write the ledger as a downloadable CSV
    Export {
        /// Output path, or "-" for stdout (defaults to storage.export_file_name)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Show clinic details, today's date and the current token number
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct IssueArgs {
    /// Doctor name
    #[arg(long)]
    pub doctor: String,

    /// Patient name
    #[arg(long)]
    pub patient: String,

    /// Patient age in years
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=120))]
    pub age: u8,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Only records from the last N days (default: every record, or history.window_days if set)
    #[arg(long, conflicts_with = "all")]
    pub days: Option<u32>,

    /// Show every record, ignoring history.window_days
    #[arg(long)]
    pub all: bool,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}
