pub mod concurrency;
pub mod error;
pub mod errors;
pub mod fs;
pub mod io;
pub mod options;

pub mod prelude {
    pub use super::concurrency::determine_allowed_cpus;
    pub use super::error::{BiomError, Result};
    pub use super::errors::is_broken_pipe;
    pub use super::fs::{is_gzipped, make_parent_dirs};
    pub use super::io::{get_reader, get_writer};
    pub use super::options::{Compression, WriteOptions};
}
