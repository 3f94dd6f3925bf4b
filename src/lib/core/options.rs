//! Writer options supplied by the host as `key = value` pairs.

use crate::core::error::{BiomError, Result};

/// Table identifier used when the caller does not provide one.
pub const DEFAULT_TABLE_ID: &str = "No Table ID";

/// Name recorded in `generated-by` when the caller does not provide one.
pub const DEFAULT_GENERATED_BY: &str = env!("CARGO_PKG_NAME");

/// Dataset compression requested for the container writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    None,
}

impl Compression {
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "gzip" | "gz" => Ok(Compression::Gzip),
            "none" => Ok(Compression::None),
            _ => Err(BiomError::BadOption(
                "compression must be 'gzip', 'gz', or 'none'".to_string(),
            )),
        }
    }

    #[inline]
    pub fn enabled(self) -> bool {
        matches!(self, Compression::Gzip)
    }
}

/// Normalised options for emitting a table into a container.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOptions {
    pub compression: Compression,
    pub id: String,
    pub generated_by: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compression: Compression::Gzip,
            id: DEFAULT_TABLE_ID.to_string(),
            generated_by: DEFAULT_GENERATED_BY.to_string(),
        }
    }
}

impl WriteOptions {
    /// Build options from host key/value pairs. Keys are matched case-insensitively;
    /// unknown keys are rejected.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = WriteOptions::default();
        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.as_ref();
            match key.to_ascii_lowercase().as_str() {
                "compression" => options.compression = Compression::parse(value)?,
                "id" => options.id = value.to_string(),
                "generated_by" => options.generated_by = value.to_string(),
                _ => {
                    return Err(BiomError::BadOption(format!(
                        "unknown option '{}'",
                        key
                    )))
                }
            }
        }
        Ok(options)
    }
}
