//! Command-line interface for rosterpage.
//!
//! This module provides the CLI structure for the `rosterpage` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{CheckCommand, ConfigCommand, RenderCommand, UnlockCommand};

/// rosterpage - Render a participant list with gated PDF downloads
///
/// Groups registration records by school, renders them as a static HTML page,
/// and embeds a verification dialog in front of each school's PDF.
#[derive(Debug, Parser)]
#[command(name = "rosterpage")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render the participant page from the data file
    Render(RenderCommand),

    /// Validate the data file and summarize the roster
    Check(CheckCommand),

    /// Verify a code against a rendered page and fetch the PDF
    Unlock(UnlockCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}
