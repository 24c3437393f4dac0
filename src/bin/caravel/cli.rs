//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Caravel - a declarative build driver for C, C++, and assembly projects
#[derive(Parser)]
#[command(name = "caravel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug/trace)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Color output: auto, always, never
    #[arg(long, global = true, default_value = "auto")]
    pub color: String,

    /// Path to Caravel.toml (defaults to ./Caravel.toml)
    #[arg(long, global = true)]
    pub manifest_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure and build components
    Build(BuildArgs),

    /// Remove object and dependency files from the output tree
    Clean(CleanArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Component names to build ("*" for all)
    #[arg(default_value = "*")]
    pub components: Vec<String>,

    /// Number of parallel compile jobs (defaults to hardware concurrency)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Clean the selected components before building
    #[arg(long)]
    pub clean: bool,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Component names to clean ("*" for all)
    #[arg(default_value = "*")]
    pub components: Vec<String>,
}
