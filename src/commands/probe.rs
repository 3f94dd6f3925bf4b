use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use structopt::StructOpt;

use crate::commands::common;

/// CLI arguments for the `probe` subcommand.
#[derive(Debug, Clone, StructOpt)]
#[structopt(author, name = "probe")]
pub struct ProbeArgs {
    /// Files to check.
    #[structopt(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ProbeRow {
    path: String,
    is_biom: bool,
}

/// Report, one TSV row per path, whether each file is a BIOM 2.x container.
pub fn run_probe(args: ProbeArgs) -> Result<()> {
    let mut writer = biomkit_lib::utils::get_writer::<PathBuf>(&None, false, true, 1, 0)?;
    for path in args.paths {
        let is_biom = common::probe_biom(&path)?;
        writer.serialize(ProbeRow {
            path: path.display().to_string(),
            is_biom,
        })?;
    }
    writer.flush()?;
    Ok(())
}
