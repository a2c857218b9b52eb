//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Triage using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Triage - HL7 admission routing pipeline
#[derive(Parser, Debug)]
#[command(name = "triage")]
#[command(version, about, long_about = None)]
#[command(author = "Triage Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "triage.toml", env = "TRIAGE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "TRIAGE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the pipeline and accept HL7 over MLLP
    Serve(commands::serve::ServeArgs),

    /// Run HL7 files through the pipeline and exit
    Replay(commands::replay::ReplayArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
