//! Error types for the biomkit library

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BiomError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid input: {0}")]
    BadInput(String),

    #[error("Invalid option: {0}")]
    BadOption(String),

    #[error("Too many {axis} ({count}), exceeds int32 limit")]
    SizeExceeded { axis: &'static str, count: usize },

    #[error("Corrupt container: {0}")]
    ContainerCorrupt(String),

    #[error("Missing attribute: {0}")]
    MissingAttribute(String),

    #[error("Sparse matrix error: {0}")]
    SparseMatrix(String),
}

pub type Result<T> = std::result::Result<T, BiomError>;

impl From<nalgebra_sparse::SparseFormatError> for BiomError {
    fn from(err: nalgebra_sparse::SparseFormatError) -> Self {
        BiomError::SparseMatrix(format!("Sparse format error: {:?}", err))
    }
}
