use anyhow::Result;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;

/// Create parent directories for a path when missing.
pub fn make_parent_dirs<P: AsRef<Path>>(path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Detect whether a path uses a gzip-compatible extension.
pub fn is_gzipped<P: AsRef<Path>>(path: P) -> bool {
    matches!(
        path.as_ref().extension().unwrap_or_else(|| OsStr::new("")),
        ext if ext == "gz" || ext == "gzip" || ext == "bgz"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_gzip_extensions() {
        assert!(is_gzipped("triples.tsv.gz"));
        assert!(is_gzipped("triples.gzip"));
        assert!(!is_gzipped("triples.tsv"));
        assert!(!is_gzipped("triples"));
    }

    #[test]
    fn creates_missing_parents() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("a").join("b").join("table.biom");
        make_parent_dirs(&target)?;
        assert!(target.parent().map(|p| p.is_dir()).unwrap_or(false));
        Ok(())
    }
}
