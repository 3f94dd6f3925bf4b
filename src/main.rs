//! biomkit - sparse feature-by-sample tables in BIOM 2.1 layout
//!
//! # Tools
//!
//! - `pack`: Aggregate tab-separated `(feature_id, sample_id, value)` triples into a BIOM file
//! - `unpack`: Emit the stored triples of one or more BIOM files as TSV
//! - `probe`: Report whether files are BIOM 2.x containers
//! - `merge-intervals`: Coalesce overlapping or touching intervals, optionally per group
//!
//! # Usage
//!
//! ```bash
//! # Build a table from triples (duplicates are summed)
//! biomkit pack counts.tsv.gz -o table.biom --id run-42
//!
//! # Read it back, tagging each row with its source file
//! biomkit unpack table.biom other.biom --include-filepath -o triples.tsv
//!
//! # Merge regions per contig
//! biomkit merge-intervals regions.tsv --grouped
//! ```
//!
//! `pack`, `unpack` and `probe` need the `hdf5` cargo feature.

extern crate biomkit_lib;
pub mod commands;
use anyhow::Result;
use biomkit_lib::utils;
use env_logger::Env;
use log::*;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(rename_all = "kebab-case", author, about)]
/// Build, read and inspect BIOM tables
struct Args {
    #[structopt(subcommand)]
    subcommand: Subcommand,
}

#[derive(StructOpt)]
enum Subcommand {
    /// Aggregate TSV triples into a BIOM file
    Pack(commands::PackArgs),
    /// Write the triples stored in BIOM files as TSV
    Unpack(commands::UnpackArgs),
    /// Check whether files are BIOM 2.x containers
    Probe(commands::ProbeArgs),
    /// Coalesce overlapping or touching intervals
    MergeIntervals(commands::MergeIntervalsArgs),
}

impl Subcommand {
    fn run(self) -> Result<()> {
        match self {
            Subcommand::Pack(args) => commands::run_pack(args)?,
            Subcommand::Unpack(args) => commands::run_unpack(args)?,
            Subcommand::Probe(args) => commands::run_probe(args)?,
            Subcommand::MergeIntervals(args) => commands::run_merge_intervals(args)?,
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(err) = Args::from_args().subcommand.run() {
        if utils::is_broken_pipe(&err) {
            std::process::exit(0);
        }
        error!("{:#}", err);
        std::process::exit(1);
    }
    Ok(())
}
