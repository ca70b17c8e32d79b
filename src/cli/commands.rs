//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - sweep: delete archive files through the tiered scheduler
//! - config: print the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sweepr - tiered batch deletion for archived storage files
#[derive(Parser, Debug)]
#[command(name = "sweepr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Delete every matching file under the archive directory
    Sweep {
        /// Archive directory (defaults to archive.dir from config)
        dir: Option<PathBuf>,

        /// Glob relative to the archive directory (defaults to archive.pattern)
        #[arg(short, long)]
        pattern: Option<String>,

        /// Show how files would be classified without deleting anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as YAML
    Config,
}
