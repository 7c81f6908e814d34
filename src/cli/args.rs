//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Strata - incremental container image builds
///
/// Derives a content signature for every stage of a build plan, so
/// unchanged stages can be served from cache instead of rebuilt.
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "STRATA_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a starter strata.toml build plan
    Init(InitArgs),

    /// Sign every stage of a build plan
    Sign(SignArgs),

    /// Render a build plan as a Containerfile
    Render(RenderArgs),

    /// Remove old build records and leftover extracted contexts
    Clean(CleanArgs),
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite existing strata.toml
    #[arg(short, long)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

/// Arguments for the sign command
#[derive(Parser, Debug)]
pub struct SignArgs {
    /// Build plan file (defaults to ./strata.toml)
    #[arg(short, long)]
    pub plan: Option<PathBuf>,

    /// Backend override (takes precedence over plan and config)
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Persist the signed chain to the build store
    #[arg(short, long)]
    pub record: bool,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the render command
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Build plan file (defaults to ./strata.toml)
    #[arg(short, long)]
    pub plan: Option<PathBuf>,
}

/// Arguments for the clean command
#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Remove build records older than N days (default: from config)
    #[arg(long)]
    pub days: Option<u32>,

    /// Dry run - show what would be removed
    #[arg(long)]
    pub dry_run: bool,
}

/// Output format for the sign command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one stage per line)
    Plain,
}
