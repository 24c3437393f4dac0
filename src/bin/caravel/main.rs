//! Caravel CLI - build C/C++/assembly projects from a Caravel.toml manifest.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use caravel::load_project;
use caravel::util::shell::{ColorChoice, Shell};

mod cli;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("caravel=trace")
    } else {
        EnvFilter::new("caravel=info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let manifest_path = cli
        .manifest_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("Caravel.toml"));

    let color: ColorChoice = cli.color.parse().map_err(anyhow::Error::msg)?;
    let shell = Shell::new(color, cli.quiet);

    let mut project = load_project(&manifest_path)?;
    project.set_shell(shell);

    match cli.command {
        Commands::Build(args) => {
            if let Some(jobs) = args.jobs {
                project.set_parallelism(jobs);
            }
            project.configure()?;
            if args.clean {
                project.clean(&args.components)?;
                project.configure()?;
            }
            project.build(&args.components)
        }
        Commands::Clean(args) => {
            project.configure()?;
            project.clean(&args.components)
        }
    }
}
