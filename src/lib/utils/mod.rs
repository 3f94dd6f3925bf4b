//! Flat re-exports of the helpers the command-line front end uses most.

pub use crate::core::concurrency::determine_allowed_cpus;
pub use crate::core::errors::is_broken_pipe;
pub use crate::core::fs::{is_gzipped, make_parent_dirs};
pub use crate::core::io::{get_reader, get_writer};
