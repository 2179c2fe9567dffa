//! Command-line interface definitions for codealarm.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Running without a subcommand is the same as `codealarm run`.
//!
//! # Example
//!
//! ```bash
//! # Start the alarm clock with two alarms preloaded
//! codealarm run --alarm 07:00 --alarm "07:30=Second chance"
//!
//! # Log in without opening the TUI
//! codealarm login alice
//!
//! # Check your solved count against a different service
//! codealarm status --base-url http://127.0.0.1:3000
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::alarm::{AlarmTime, AlarmTimeError};

/// Alarm clock that only stops once you solve a coding problem.
#[derive(Debug, Parser)]
#[command(name = "codealarm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON records
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write logs to this file (the TUI always logs to a file)
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Progress service base URL, overriding the configuration
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Subcommand to execute (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the interactive alarm clock
    Run(RunArgs),
    /// Verify a username with the progress service and remember it
    Login(LoginArgs),
    /// Forget the stored username
    Logout,
    /// Show the stored username
    Whoami,
    /// Show the current solved-problem count
    Status,
    /// Show the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the run subcommand.
#[derive(Debug, Args, Default)]
pub struct RunArgs {
    /// Preload an alarm, as HH:MM or HH:MM=LABEL (repeatable)
    #[arg(short, long = "alarm", value_name = "HH:MM[=LABEL]")]
    pub alarms: Vec<AlarmSpec>,

    /// Color theme for the interface
    #[arg(long, value_enum)]
    pub theme: Option<ThemeArg>,

    /// Disable the alarm sound
    #[arg(long)]
    pub mute: bool,
}

/// Arguments for the login subcommand.
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Username on the coding-practice site
    #[arg(value_name = "USERNAME")]
    pub username: String,
}

/// Arguments for the config subcommand.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Write the default configuration to the config path
    #[arg(long)]
    pub init: bool,

    /// Overwrite an existing file with --init
    #[arg(long, requires = "init")]
    pub force: bool,
}

/// TUI color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeArg {
    /// Pick based on the terminal background
    #[default]
    Auto,
    Dark,
    Light,
}

/// An alarm given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmSpec {
    pub time: AlarmTime,
    pub label: Option<String>,
}

impl FromStr for AlarmSpec {
    type Err = AlarmTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (time, label) = match s.split_once('=') {
            Some((time, label)) => {
                let label = label.trim();
                (time, (!label.is_empty()).then(|| label.to_string()))
            }
            None => (s, None),
        };
        Ok(Self {
            time: time.parse()?,
            label,
        })
    }
}
