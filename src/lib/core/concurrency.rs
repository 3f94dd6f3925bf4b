use anyhow::{bail, Result};
use log::{error, warn};

/// Validate a requested worker count. Zero is rejected; requests above the
/// number of logical cores are honoured with a warning.
pub fn determine_allowed_cpus(desired: usize) -> Result<usize> {
    let available = num_cpus::get();
    if desired == 0 {
        error!("Must select > 0 threads");
        bail!("Too few threads selected. Min 1");
    }
    if desired > available {
        warn!(
            "Specified more threads ({}) than are available ({}), continuing anyway",
            desired, available
        );
    }
    Ok(desired)
}
