//! Load a [`SparseTable`] from a container.

use crate::container::{
    Attribute, ContainerRead, Hierarchy, Read1D, ATTR_FORMAT_VERSION, ATTR_ID, OBS_IDS,
    SAMPLE_DATA, SAMPLE_IDS, SAMPLE_INDICES, SAMPLE_INDPTR,
};
use crate::core::error::{BiomError, Result};
use crate::sparse::SparseTable;
use log::{debug, info};

/// Read ids and the sample-major (CSC) arrays and expand them into a table.
///
/// Only the sample axis is consulted; the observation-major copy is
/// redundant for reconstruction.
pub fn read_table<C: ContainerRead>(container: &C) -> Result<SparseTable> {
    let feature_ids = Read1D::<String>::load_1d(container, OBS_IDS)?;
    let sample_ids = Read1D::<String>::load_1d(container, SAMPLE_IDS)?;
    let indptr = Read1D::<i32>::load_1d(container, SAMPLE_INDPTR)?;
    let indices = Read1D::<i32>::load_1d(container, SAMPLE_INDICES)?;
    let data = Read1D::<f64>::load_1d(container, SAMPLE_DATA)?;
    debug!(
        "Loaded {} feature ids, {} sample ids, {} stored values",
        feature_ids.len(),
        sample_ids.len(),
        data.len()
    );

    let table = SparseTable::from_csc(&indptr, &indices, data, feature_ids, sample_ids)?;
    info!(
        "Read table with {} features, {} samples and {} non-zeros",
        table.n_features(),
        table.n_samples(),
        table.nnz()
    );
    Ok(table)
}

/// `true` when the container carries a `format-version` attribute whose major
/// version is 2. Any failure to read it is treated as "not BIOM".
pub fn is_biom<C: Hierarchy>(container: &C) -> bool {
    match container.root_attr(ATTR_FORMAT_VERSION) {
        Ok(Some(version)) => version.first_int() == Some(2),
        Ok(None) => false,
        Err(e) => {
            debug!("Probe could not read {}: {}", ATTR_FORMAT_VERSION, e);
            false
        }
    }
}

/// The table's `id` root attribute.
pub fn table_id<C: Hierarchy>(container: &C) -> Result<String> {
    match container.root_attr(ATTR_ID)? {
        Some(Attribute::Str(id)) => Ok(id),
        Some(other) => Err(BiomError::ContainerCorrupt(format!(
            "attribute {} is not a string: {:?}",
            ATTR_ID, other
        ))),
        None => Err(BiomError::MissingAttribute(ATTR_ID.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::memory::Dataset;
    use crate::container::{write_table, Attribute, MemoryContainer};
    use crate::core::options::WriteOptions;

    fn packed() -> MemoryContainer {
        let table = SparseTable::from_triples(
            &["F1", "F2", "F1", "F3"],
            &["S1", "S1", "S2", "S3"],
            &[1.0, 2.0, 3.0, 4.0],
        )
        .unwrap();
        let mut container = MemoryContainer::new();
        write_table(&mut container, &table, &WriteOptions::default()).unwrap();
        container
    }

    #[test]
    fn probe_checks_major_version() {
        let mut container = MemoryContainer::new();
        assert!(!is_biom(&container));

        container
            .set_root_attr(ATTR_FORMAT_VERSION, Attribute::Int32s(vec![2, 1]))
            .unwrap();
        assert!(is_biom(&container));

        container
            .set_root_attr(ATTR_FORMAT_VERSION, Attribute::Int32s(vec![1, 0]))
            .unwrap();
        assert!(!is_biom(&container));

        container
            .set_root_attr(ATTR_FORMAT_VERSION, Attribute::Str("2.1".into()))
            .unwrap();
        assert!(!is_biom(&container));
    }

    #[test]
    fn reads_back_written_table() {
        let container = packed();
        assert!(is_biom(&container));
        let table = read_table(&container).unwrap();
        assert_eq!(table.feature_ids(), &["F1", "F2", "F3"]);
        assert_eq!(table.sample_ids(), &["S1", "S2", "S3"]);
        assert_eq!(table.coo_feature_ids(), vec!["F1", "F2", "F1", "F3"]);
        assert_eq!(table.coo_sample_ids(), vec!["S1", "S1", "S2", "S3"]);
        assert_eq!(table.coo_values(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn table_id_requires_attribute() {
        let mut container = packed();
        assert_eq!(table_id(&container).unwrap(), "No Table ID");
        container.remove_root_attr(ATTR_ID);
        assert!(matches!(
            table_id(&container),
            Err(BiomError::MissingAttribute(_))
        ));
    }

    #[test]
    fn missing_dataset_is_corrupt() {
        let mut container = packed();
        container.remove(SAMPLE_INDICES);
        assert!(matches!(
            read_table(&container),
            Err(BiomError::ContainerCorrupt(_))
        ));
    }

    #[test]
    fn wrong_dtype_is_corrupt() {
        let mut container = packed();
        container.put(SAMPLE_DATA, Dataset::Int32(vec![1, 2, 3, 4]));
        assert!(matches!(
            read_table(&container),
            Err(BiomError::ContainerCorrupt(_))
        ));
    }

    #[test]
    fn inconsistent_indptr_is_corrupt() {
        let mut container = packed();
        container.put(SAMPLE_INDPTR, Dataset::Int32(vec![0, 2, 3]));
        assert!(matches!(
            read_table(&container),
            Err(BiomError::ContainerCorrupt(_))
        ));
    }

    #[test]
    fn out_of_range_feature_index_is_corrupt() {
        let mut container = packed();
        container.put(SAMPLE_INDICES, Dataset::Int32(vec![0, 1, 0, 9]));
        assert!(matches!(
            read_table(&container),
            Err(BiomError::ContainerCorrupt(_))
        ));
    }
}
