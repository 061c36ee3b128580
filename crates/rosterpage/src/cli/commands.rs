//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Render command arguments.
#[derive(Debug, Args)]
pub struct RenderCommand {
    /// Registration data file (defaults to `data.path`)
    #[arg(short, long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Where to write the page (defaults to `page.output_path`)
    #[arg(short, long, value_name = "FILE", conflicts_with = "stdout")]
    pub output: Option<PathBuf>,

    /// Print the page to stdout instead of writing a file
    #[arg(long)]
    pub stdout: bool,
}

/// Check command arguments.
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Registration data file (defaults to `data.path`)
    #[arg(short, long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Unlock command arguments.
#[derive(Debug, Args)]
pub struct UnlockCommand {
    /// Companion name as shown on the page
    #[arg(short, long)]
    pub name: String,

    /// Verification code; prompted for on stdin when omitted
    #[arg(long)]
    pub code: Option<String>,

    /// PDF file name, to pick between companions with the same name
    #[arg(long, value_name = "FILE")]
    pub pdf: Option<String>,

    /// Rendered page to read the download buttons from (defaults to `page.output_path`)
    #[arg(long, value_name = "FILE")]
    pub page: Option<PathBuf>,

    /// Site directory the download URLs resolve against (defaults to the page's directory)
    #[arg(long, value_name = "DIR")]
    pub site: Option<PathBuf>,

    /// Directory to save the PDF into
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub out: PathBuf,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
