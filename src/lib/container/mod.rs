//! Narrow interface to the hierarchical binary container holding BIOM tables.
//!
//! The container is addressed by `/`-separated paths. Implementations only
//! need to load and store flat 1-D datasets of `i32`, `f64` and strings,
//! create groups, and read/write root attributes. [`reader`] and [`writer`]
//! translate between those datasets and a [`SparseTable`](crate::sparse::SparseTable).
//!
//! Container libraries are assumed not to be thread-safe; callers serialize
//! access to a single container handle.

#[cfg(feature = "hdf5")]
pub mod h5;
pub mod memory;
pub mod reader;
pub mod writer;

use crate::core::error::Result;

pub use memory::MemoryContainer;
pub use reader::{is_biom, read_table, table_id};
pub use writer::write_table;

pub const OBS_GROUP: &str = "/observation";
pub const OBS_MATRIX_GROUP: &str = "/observation/matrix";
pub const OBS_METADATA_GROUP: &str = "/observation/metadata";
pub const OBS_GROUP_METADATA_GROUP: &str = "/observation/group-metadata";
pub const OBS_IDS: &str = "/observation/ids";
pub const OBS_INDPTR: &str = "/observation/matrix/indptr";
pub const OBS_INDICES: &str = "/observation/matrix/indices";
pub const OBS_DATA: &str = "/observation/matrix/data";

pub const SAMPLE_GROUP: &str = "/sample";
pub const SAMPLE_MATRIX_GROUP: &str = "/sample/matrix";
pub const SAMPLE_METADATA_GROUP: &str = "/sample/metadata";
pub const SAMPLE_GROUP_METADATA_GROUP: &str = "/sample/group-metadata";
pub const SAMPLE_IDS: &str = "/sample/ids";
pub const SAMPLE_INDPTR: &str = "/sample/matrix/indptr";
pub const SAMPLE_INDICES: &str = "/sample/matrix/indices";
pub const SAMPLE_DATA: &str = "/sample/matrix/data";

/// Root attribute names.
pub const ATTR_CREATION_DATE: &str = "creation-date";
pub const ATTR_FORMAT_URL: &str = "format-url";
pub const ATTR_FORMAT_VERSION: &str = "format-version";
pub const ATTR_GENERATED_BY: &str = "generated-by";
pub const ATTR_ID: &str = "id";
pub const ATTR_NNZ: &str = "nnz";
pub const ATTR_SHAPE: &str = "shape";
pub const ATTR_TYPE: &str = "type";

pub const FORMAT_URL: &str = "http://biom-format.org";
pub const FORMAT_VERSION: [i32; 2] = [2, 1];

/// gzip level used for compressed datasets.
pub const DEFLATE_LEVEL: u8 = 4;
/// Upper bound on dataset chunk length when compressing.
pub const MAX_CHUNK_LEN: usize = 65_536;

/// A value stored as a root-group attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Str(String),
    Int64(i64),
    Int32s(Vec<i32>),
    Int64s(Vec<i64>),
}

impl Attribute {
    /// First integer component, for scalar or array integer attributes.
    pub fn first_int(&self) -> Option<i64> {
        match self {
            Attribute::Int64(v) => Some(*v),
            Attribute::Int32s(v) => v.first().map(|&x| x as i64),
            Attribute::Int64s(v) => v.first().copied(),
            Attribute::Str(_) => None,
        }
    }
}

/// Load a named 1-D dataset of `T`. Missing datasets and dtype mismatches are
/// reported as [`BiomError::ContainerCorrupt`](crate::core::error::BiomError::ContainerCorrupt).
pub trait Read1D<T> {
    fn load_1d(&self, path: &str) -> Result<Vec<T>>;
}

/// Store a named 1-D dataset of `T` inside an existing group.
pub trait Write1D<T> {
    fn write_1d(&mut self, group: &str, name: &str, data: &[T], compress: bool) -> Result<()>;
}

/// Group creation and root attribute access.
pub trait Hierarchy {
    fn create_group(&mut self, path: &str) -> Result<()>;
    fn set_root_attr(&mut self, name: &str, value: Attribute) -> Result<()>;
    fn root_attr(&self, name: &str) -> Result<Option<Attribute>>;
}

/// Everything needed to read a table.
pub trait ContainerRead: Read1D<i32> + Read1D<f64> + Read1D<String> + Hierarchy {}
impl<C> ContainerRead for C where C: Read1D<i32> + Read1D<f64> + Read1D<String> + Hierarchy {}

/// Everything needed to write a table.
pub trait ContainerWrite: Write1D<i32> + Write1D<f64> + Write1D<String> + Hierarchy {}
impl<C> ContainerWrite for C where C: Write1D<i32> + Write1D<f64> + Write1D<String> + Hierarchy {}

/// Split `/a/b/c` into (`/a/b`, `c`).
pub(crate) fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => ("/", &path[1..]),
        Some(pos) => (&path[..pos], &path[pos + 1..]),
        None => ("/", path),
    }
}

/// Join a group path and a member name.
pub(crate) fn join_path(group: &str, name: &str) -> String {
    if group.ends_with('/') {
        format!("{}{}", group, name)
    } else {
        format!("{}/{}", group, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        assert_eq!(split_path(SAMPLE_INDPTR), ("/sample/matrix", "indptr"));
        assert_eq!(split_path("/sample"), ("/", "sample"));
        assert_eq!(join_path("/", "sample"), "/sample");
        assert_eq!(join_path(OBS_MATRIX_GROUP, "data"), OBS_DATA);
    }

    #[test]
    fn first_int_of_attributes() {
        assert_eq!(Attribute::Int32s(vec![2, 1]).first_int(), Some(2));
        assert_eq!(Attribute::Int64(7).first_int(), Some(7));
        assert_eq!(Attribute::Int64s(vec![]).first_int(), None);
        assert_eq!(Attribute::Str("2.1".into()).first_int(), None);
    }
}
