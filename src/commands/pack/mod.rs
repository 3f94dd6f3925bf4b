mod args;

use anyhow::{Context, Result};
use biomkit_lib::aggregate::{aggregate_records, Record, StreamConfig};
use biomkit_lib::core::error::BiomError;
use biomkit_lib::utils;
use log::info;

use crate::commands::common;

pub use args::{PackArgs, PackConfig};

/// Execute the `pack` command end-to-end.
pub fn run_pack(args: PackArgs) -> Result<()> {
    let config: PackConfig = args.into();
    let options = config.write_options()?;

    info!("Running biomkit pack on {:?}", config.input);
    let threads = common::configure_global_thread_pool(config.threads)?;

    let gzipped = config.input.as_ref().map_or(false, utils::is_gzipped);
    let mut reader = utils::get_reader(&config.input, config.has_headers, gzipped)?;
    let records = reader
        .deserialize::<Record>()
        .map(|row| row.map_err(BiomError::from));

    let stream = StreamConfig {
        batch_size: config.batch_size,
        threads,
        ..StreamConfig::default()
    };
    let table = aggregate_records(records, &stream).context("Failed to aggregate input triples")?;

    common::write_biom(&config.output, &table, &options)?;
    info!(
        "Pack complete: {} features × {} samples, {} non-zeros -> {:?}",
        table.n_features(),
        table.n_samples(),
        table.nnz(),
        config.output
    );
    Ok(())
}
