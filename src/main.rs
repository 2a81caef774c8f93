use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use molecular_complexity::{
    complexity::{complexity_search, ParallelMode},
    loader::{parse_molfile, ParseMode},
};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Calculate molecular complexity from a V2000 molfile.",
    long_about = None
)]
struct Cli {
    /// A V2000 molfile
    path: PathBuf,

    #[arg(long, value_enum, default_value_t = ParseMode::Strict)]
    parse_mode: ParseMode,

    #[arg(long, value_enum, default_value_t = ParallelMode::None)]
    parallel: ParallelMode,

    /// Print the distinct count of every scanned size to stderr
    #[arg(long)]
    levels: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let molecule = parse_molfile(&cli.path, cli.parse_mode)
        .with_context(|| format!("failed to load {}", cli.path.display()))?;
    debug!(
        atoms = molecule.atom_count(),
        bonds = molecule.bond_count(),
        "loaded molecule\n{}",
        molecule.info()
    );
    let report = complexity_search(&molecule, cli.parallel)
        .with_context(|| format!("failed to score {}", cli.path.display()))?;

    if cli.levels {
        for level in report.levels() {
            eprintln!("{} {}", level.edge_count(), level.distinct_count());
        }
        eprintln!("bmax = {}, nmax = {}", report.bmax(), report.nmax());
    }
    println!("{}", report.score());
    Ok(())
}
