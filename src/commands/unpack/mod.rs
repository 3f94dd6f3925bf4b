mod args;

use anyhow::{bail, Result};
use biomkit_lib::sparse::SparseTable;
use biomkit_lib::utils;
use log::info;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::commands::common;

pub use args::{UnpackArgs, UnpackConfig};

/// One output row. `filepath` is omitted unless requested.
#[derive(Debug, Serialize)]
pub struct TripleRow<'a> {
    pub sample_id: &'a str,
    pub feature_id: &'a str,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filepath: Option<&'a str>,
}

/// Serialize every stored triple of `table` in canonical order.
pub fn write_triples<W: Write>(
    writer: &mut csv::Writer<W>,
    table: &SparseTable,
    filepath: Option<&str>,
) -> Result<usize> {
    let mut written = 0;
    for (feature_id, sample_id, value) in table.triples() {
        writer.serialize(TripleRow {
            sample_id,
            feature_id,
            value,
            filepath,
        })?;
        written += 1;
    }
    Ok(written)
}

/// Fail on the first input that `is_biom` rejects. Runs before any output is
/// opened so a bad path never leaves a partial file behind.
pub fn ensure_biom_inputs<F>(inputs: &[PathBuf], check: F) -> Result<()>
where
    F: Fn(&Path) -> Result<bool>,
{
    for input in inputs {
        if !check(input)? {
            bail!("File is not a BIOM file: {}", input.display());
        }
    }
    Ok(())
}

/// Execute the `unpack` command end-to-end.
pub fn run_unpack(args: UnpackArgs) -> Result<()> {
    let config: UnpackConfig = args.into();

    ensure_biom_inputs(&config.inputs, |path| {
        if !path.exists() {
            bail!("File not found: {}", path.display());
        }
        common::probe_biom(path)
    })?;

    if let Some(output) = &config.output {
        utils::make_parent_dirs(output)?;
    }
    let mut writer = utils::get_writer(&config.output, config.gzip_output, true, config.threads, 6)?;

    for input in &config.inputs {
        info!("Running biomkit unpack on {:?}", input);
        let table = common::read_biom(input)?;
        let label = input.to_string_lossy();
        let filepath = config.include_filepath.then(|| &*label);
        let rows = write_triples(&mut writer, &table, filepath)?;
        info!("Unpacked {} triples from {:?}", rows, input);
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use biomkit_lib::container::{is_biom, write_table, MemoryContainer};
    use biomkit_lib::core::options::WriteOptions;
    use std::collections::HashMap;

    fn render(table: &SparseTable, filepath: Option<&str>) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(Vec::new());
        write_triples(&mut writer, table, filepath)?;
        Ok(String::from_utf8(writer.into_inner()?)?)
    }

    #[test]
    fn rows_follow_canonical_order() -> Result<()> {
        let table = SparseTable::from_triples(&["F2", "F1"], &["S2", "S1"], &[1.0, 2.5])?;
        assert_eq!(
            render(&table, None)?,
            "sample_id\tfeature_id\tvalue\nS2\tF2\t1.0\nS1\tF1\t2.5\n"
        );
        Ok(())
    }

    #[test]
    fn filepath_column_is_appended() -> Result<()> {
        let table = SparseTable::from_triples(&["F1"], &["S1"], &[3.0])?;
        assert_eq!(
            render(&table, Some("a.biom"))?,
            "sample_id\tfeature_id\tvalue\tfilepath\nS1\tF1\t3.0\ta.biom\n"
        );
        Ok(())
    }

    fn stored(containers: &[(&str, MemoryContainer)]) -> HashMap<PathBuf, MemoryContainer> {
        containers
            .iter()
            .map(|(path, c)| (PathBuf::from(path), c.clone()))
            .collect()
    }

    fn biom_container() -> Result<MemoryContainer> {
        let table = SparseTable::from_triples(&["F1"], &["S1"], &[1.0])?;
        let mut container = MemoryContainer::new();
        write_table(&mut container, &table, &WriteOptions::default())?;
        Ok(container)
    }

    #[test]
    fn every_input_is_checked_before_output() -> Result<()> {
        let good = biom_container()?;
        let mut unversioned = good.clone();
        unversioned.remove_root_attr("format-version");

        let files = stored(&[("a.biom", good), ("b.biom", unversioned)]);
        let inputs = vec![PathBuf::from("a.biom"), PathBuf::from("b.biom")];
        let err = ensure_biom_inputs(&inputs, |path| Ok(is_biom(&files[path]))).unwrap_err();
        assert_eq!(err.to_string(), "File is not a BIOM file: b.biom");
        Ok(())
    }

    #[test]
    fn valid_inputs_pass_the_check() -> Result<()> {
        let files = stored(&[("a.biom", biom_container()?), ("b.biom", biom_container()?)]);
        let inputs = vec![PathBuf::from("a.biom"), PathBuf::from("b.biom")];
        ensure_biom_inputs(&inputs, |path| Ok(is_biom(&files[path])))?;
        Ok(())
    }
}
