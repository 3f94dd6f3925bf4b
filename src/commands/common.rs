use anyhow::{anyhow, Result};
use biomkit_lib::core::options::WriteOptions;
use biomkit_lib::sparse::SparseTable;
use biomkit_lib::utils;
use once_cell::sync::OnceCell;
use rayon::ThreadPoolBuilder;
use std::path::Path;

static GLOBAL_RAYON_THREADS: OnceCell<usize> = OnceCell::new();

/// Configure the global Rayon thread pool exactly once, returning the active
/// worker count. Later calls reuse the first pool and warn when the request
/// differs from the established size.
pub fn configure_global_thread_pool(threads: usize) -> Result<usize> {
    let requested = utils::determine_allowed_cpus(threads)?;

    if let Some(active) = GLOBAL_RAYON_THREADS.get() {
        if *active != requested {
            log::warn!(
                "Rayon global thread pool already initialised with {} threads; ignoring request for {}",
                active,
                requested
            );
        }
        return Ok(*active);
    }

    match ThreadPoolBuilder::new().num_threads(requested).build_global() {
        Ok(_) => {
            GLOBAL_RAYON_THREADS
                .set(requested)
                .map_err(|_| anyhow!("Failed to record global Rayon thread count"))?;
            Ok(requested)
        }
        Err(err) => {
            log::debug!("Global Rayon thread pool initialisation skipped: {}", err);
            let fallback = rayon::current_num_threads();
            if fallback != requested {
                log::warn!(
                    "Using existing Rayon pool with {} threads instead of requested {}",
                    fallback,
                    requested
                );
            }
            GLOBAL_RAYON_THREADS.set(fallback).ok();
            Ok(fallback)
        }
    }
}

/// Write `table` to a new BIOM file at `path`.
#[cfg(feature = "hdf5")]
pub fn write_biom(path: &Path, table: &SparseTable, options: &WriteOptions) -> Result<()> {
    use anyhow::Context;
    use biomkit_lib::container::{h5::Hdf5Container, write_table};

    utils::make_parent_dirs(path)?;
    let mut container = Hdf5Container::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_table(&mut container, table, options)
        .with_context(|| format!("Failed to write table to {}", path.display()))?;
    Ok(())
}

#[cfg(not(feature = "hdf5"))]
pub fn write_biom(path: &Path, _table: &SparseTable, _options: &WriteOptions) -> Result<()> {
    Err(missing_backend(path))
}

/// Load the table stored in the BIOM file at `path`.
#[cfg(feature = "hdf5")]
pub fn read_biom(path: &Path) -> Result<SparseTable> {
    use anyhow::Context;
    use biomkit_lib::container::{h5::Hdf5Container, read_table};

    let container = Hdf5Container::open(path)?;
    let table = read_table(&container)
        .with_context(|| format!("Failed to read table from {}", path.display()))?;
    Ok(table)
}

#[cfg(not(feature = "hdf5"))]
pub fn read_biom(path: &Path) -> Result<SparseTable> {
    Err(missing_backend(path))
}

/// `true` when `path` opens as a container with a BIOM 2.x version attribute.
#[cfg(feature = "hdf5")]
pub fn probe_biom(path: &Path) -> Result<bool> {
    use biomkit_lib::container::{h5::Hdf5Container, is_biom};

    match Hdf5Container::open(path) {
        Ok(container) => Ok(is_biom(&container)),
        Err(err) => {
            log::debug!("{}", err);
            Ok(false)
        }
    }
}

#[cfg(not(feature = "hdf5"))]
pub fn probe_biom(path: &Path) -> Result<bool> {
    Err(missing_backend(path))
}

#[cfg(not(feature = "hdf5"))]
fn missing_backend(path: &Path) -> anyhow::Error {
    anyhow!(
        "{}: BIOM container support requires building with `--features hdf5`",
        path.display()
    )
}
