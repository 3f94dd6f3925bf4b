//! Emit a [`SparseTable`] into a container in BIOM 2.1 layout.

use crate::container::{
    split_path, Attribute, ContainerWrite, Write1D, ATTR_CREATION_DATE,
    ATTR_FORMAT_URL, ATTR_FORMAT_VERSION, ATTR_GENERATED_BY, ATTR_ID, ATTR_NNZ, ATTR_SHAPE,
    ATTR_TYPE, FORMAT_URL, FORMAT_VERSION, OBS_DATA, OBS_GROUP, OBS_GROUP_METADATA_GROUP,
    OBS_IDS, OBS_INDICES, OBS_INDPTR, OBS_MATRIX_GROUP, OBS_METADATA_GROUP, SAMPLE_DATA,
    SAMPLE_GROUP, SAMPLE_GROUP_METADATA_GROUP, SAMPLE_IDS, SAMPLE_INDICES, SAMPLE_INDPTR,
    SAMPLE_MATRIX_GROUP, SAMPLE_METADATA_GROUP,
};
use crate::core::error::{BiomError, Result};
use crate::core::options::WriteOptions;
use crate::sparse::{CompressedMatrix, SparseTable, MAX_AXIS_LEN};
use chrono::Utc;
use log::{debug, info};

const GROUPS: [&str; 8] = [
    OBS_GROUP,
    OBS_MATRIX_GROUP,
    OBS_METADATA_GROUP,
    OBS_GROUP_METADATA_GROUP,
    SAMPLE_GROUP,
    SAMPLE_MATRIX_GROUP,
    SAMPLE_METADATA_GROUP,
    SAMPLE_GROUP_METADATA_GROUP,
];

/// Timestamp written to `creation-date`, microsecond precision, no zone suffix.
pub fn creation_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Write root attributes, groups, both id lists and both compressed
/// projections. The container must be freshly created.
pub fn write_table<C: ContainerWrite>(
    container: &mut C,
    table: &SparseTable,
    options: &WriteOptions,
) -> Result<()> {
    table.check_int32_shape()?;
    if table.nnz() > MAX_AXIS_LEN {
        return Err(BiomError::SizeExceeded {
            axis: "non-zeros",
            count: table.nnz(),
        });
    }
    let compress = options.compression.enabled();
    let (n_features, n_samples) = table.shape();

    container.set_root_attr(ATTR_ID, Attribute::Str(options.id.clone()))?;
    container.set_root_attr(ATTR_TYPE, Attribute::Str(String::new()))?;
    container.set_root_attr(ATTR_FORMAT_URL, Attribute::Str(FORMAT_URL.to_string()))?;
    container.set_root_attr(ATTR_FORMAT_VERSION, Attribute::Int32s(FORMAT_VERSION.to_vec()))?;
    container.set_root_attr(
        ATTR_GENERATED_BY,
        Attribute::Str(options.generated_by.clone()),
    )?;
    container.set_root_attr(ATTR_CREATION_DATE, Attribute::Str(creation_timestamp()))?;
    container.set_root_attr(
        ATTR_SHAPE,
        Attribute::Int64s(vec![n_features as i64, n_samples as i64]),
    )?;
    container.set_root_attr(ATTR_NNZ, Attribute::Int64(table.nnz() as i64))?;

    for group in GROUPS {
        container.create_group(group)?;
    }

    write_ids(container, OBS_IDS, table.feature_ids(), compress)?;
    write_ids(container, SAMPLE_IDS, table.sample_ids(), compress)?;

    let csr = table.to_csr()?;
    write_matrix(container, [OBS_DATA, OBS_INDICES, OBS_INDPTR], &csr, compress)?;
    drop(csr);
    let csc = table.to_csc()?;
    write_matrix(
        container,
        [SAMPLE_DATA, SAMPLE_INDICES, SAMPLE_INDPTR],
        &csc,
        compress,
    )?;

    info!(
        "Wrote table '{}' ({} features × {} samples, {} non-zeros, compression {:?})",
        options.id,
        n_features,
        n_samples,
        table.nnz(),
        options.compression
    );
    Ok(())
}

fn write_ids<C: ContainerWrite>(
    container: &mut C,
    path: &str,
    ids: &[String],
    compress: bool,
) -> Result<()> {
    let (group, name) = split_path(path);
    Write1D::<String>::write_1d(container, group, name, ids, compress)
}

fn write_matrix<C: ContainerWrite>(
    container: &mut C,
    [data, indices, indptr]: [&str; 3],
    matrix: &CompressedMatrix,
    compress: bool,
) -> Result<()> {
    debug!(
        "Writing {:?} arrays: {} values, {} pointers",
        matrix.layout,
        matrix.nnz(),
        matrix.indptr.len()
    );
    let (group, name) = split_path(data);
    Write1D::<f64>::write_1d(container, group, name, &matrix.data, compress)?;
    let (group, name) = split_path(indices);
    Write1D::<i32>::write_1d(container, group, name, &matrix.indices, compress)?;
    let (group, name) = split_path(indptr);
    Write1D::<i32>::write_1d(container, group, name, &matrix.indptr, compress)
}
