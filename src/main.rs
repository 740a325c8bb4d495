use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use gatecheck::{Console, config, default_stages, logging, run_pipeline};

/// Run dependency, lint, secret-scan and test tools in order, stopping at
/// the first failure.
#[derive(Parser)]
#[command(name = "gatecheck", version)]
struct Cli {
    /// Directory to run the tools in (defaults to the current directory)
    #[arg(short = 'C', long)]
    dir: Option<PathBuf>,

    /// Config file (defaults to `.gatecheck.yaml` in the run directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More log output (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(logging::level_for(cli.verbose, cli.quiet));

    let work_dir = match cli.dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };
    if !work_dir.is_dir() {
        anyhow::bail!("not a directory: {}", work_dir.display());
    }

    let tools = match &cli.config {
        Some(path) => config::load_file(path)?,
        None => config::load(&work_dir)?,
    };
    debug!(dir = %work_dir.display(), ?tools, "starting pipeline");

    let console = Console::stdout();
    let stages = default_stages(&tools, &work_dir, &console);
    // The outcome is reported through the printed text only.
    let _ = run_pipeline(&stages, &console);
    Ok(())
}
