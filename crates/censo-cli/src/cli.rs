//! CLI argument definitions for the census validator.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "censo",
    version,
    about = "Validate employee census spreadsheets before an actuarial valuation",
    long_about = "Validate employee census spreadsheets before an actuarial valuation.\n\n\
                  Maps free-form headers onto canonical employee fields, runs every\n\
                  registered validator and reports whether the valuation can proceed."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a census and print the report.
    Run(RunArgs),

    /// List the canonical fields and their header synonyms.
    Fields,

    /// List the registered validator units in dispatch order.
    Validators(ValidatorsArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// CSV file with the active personnel sheet.
    #[arg(long = "active", value_name = "CSV")]
    pub active: PathBuf,

    /// CSV file with the terminations sheet (treated as empty when omitted).
    #[arg(long = "terminated", value_name = "CSV")]
    pub terminated: Option<PathBuf>,

    /// TOML configuration file (censo.toml).
    #[arg(long = "config", value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Run identifier (generated from the current time when omitted).
    #[arg(long = "run-id", value_name = "ID")]
    pub run_id: Option<String>,

    /// Owner recorded on the run session.
    #[arg(long = "owner", value_name = "ID", default_value = "local")]
    pub owner: String,

    /// Valuation date used for ages and seniority (overrides the config file).
    #[arg(long = "valuation-date", value_name = "YYYY-MM-DD")]
    pub valuation_date: Option<NaiveDate>,

    /// Persist sessions and progress logs in this directory.
    #[arg(long = "store-dir", value_name = "DIR")]
    pub store_dir: Option<PathBuf>,

    /// Write the final run session, report included, as JSON.
    #[arg(long = "json", value_name = "PATH")]
    pub json: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ValidatorsArgs {
    /// TOML configuration file whose timeout overrides are shown.
    #[arg(long = "config", value_name = "TOML")]
    pub config: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
