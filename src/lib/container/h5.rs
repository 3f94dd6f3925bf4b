//! HDF5 backend. Every call into the library holds one process-wide lock.

use crate::container::{
    split_path, Attribute, Hierarchy, Read1D, Write1D, DEFLATE_LEVEL, MAX_CHUNK_LEN,
};
use crate::core::error::{BiomError, Result};
use hdf5::types::{
    FixedAscii, FixedUnicode, IntSize, TypeDescriptor, VarLenAscii, VarLenUnicode,
};
use hdf5::{File, H5Type};
use log::debug;
use ndarray::ArrayView1;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::str::FromStr;

static HDF5_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Read buffer for fixed-length string attributes. Longer values are rejected.
const FIXED_STR_CAP: usize = 1024;

fn h5err(e: hdf5::Error) -> BiomError {
    BiomError::ContainerCorrupt(format!("HDF5 error: {}", e))
}

/// A BIOM file on disk.
pub struct Hdf5Container {
    file: File,
    path: PathBuf,
}

impl Hdf5Container {
    /// Create (truncating) a file for writing.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let _guard = HDF5_LOCK.lock();
        let file = File::create(&path).map_err(h5err)?;
        debug!("Created {}", path.display());
        Ok(Self { file, path })
    }

    /// Open an existing file read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let _guard = HDF5_LOCK.lock();
        let file = File::open(&path).map_err(|e| {
            BiomError::ContainerCorrupt(format!("cannot open {}: {}", path.display(), e))
        })?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_numeric<T: H5Type>(&self, path: &str) -> Result<Vec<T>> {
        let _guard = HDF5_LOCK.lock();
        let dataset = self.file.dataset(path).map_err(h5err)?;
        dataset.read_raw::<T>().map_err(|e| {
            BiomError::ContainerCorrupt(format!("cannot read dataset {}: {}", path, e))
        })
    }

    fn write_numeric<T: H5Type>(
        &mut self,
        group: &str,
        name: &str,
        data: &[T],
        compress: bool,
    ) -> Result<()> {
        let _guard = HDF5_LOCK.lock();
        let group = self.file.group(group).map_err(h5err)?;
        let view = ArrayView1::from(data);
        let builder = group.new_dataset_builder().with_data(&view);
        if compress && !data.is_empty() {
            builder
                .chunk(data.len().min(MAX_CHUNK_LEN))
                .deflate(DEFLATE_LEVEL)
                .create(name)
                .map_err(h5err)?;
        } else {
            builder.create(name).map_err(h5err)?;
        }
        Ok(())
    }
}

impl Read1D<i32> for Hdf5Container {
    fn load_1d(&self, path: &str) -> Result<Vec<i32>> {
        self.read_numeric(path)
    }
}

impl Read1D<f64> for Hdf5Container {
    fn load_1d(&self, path: &str) -> Result<Vec<f64>> {
        self.read_numeric(path)
    }
}

impl Read1D<String> for Hdf5Container {
    fn load_1d(&self, path: &str) -> Result<Vec<String>> {
        let _guard = HDF5_LOCK.lock();
        let dataset = self.file.dataset(path).map_err(h5err)?;
        let descriptor = dataset
            .dtype()
            .and_then(|dtype| dtype.to_descriptor())
            .map_err(h5err)?;
        let strings = match descriptor {
            TypeDescriptor::VarLenUnicode => dataset
                .read_raw::<VarLenUnicode>()
                .map_err(h5err)?
                .into_iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            TypeDescriptor::VarLenAscii => dataset
                .read_raw::<VarLenAscii>()
                .map_err(h5err)?
                .into_iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            other => {
                return Err(BiomError::ContainerCorrupt(format!(
                    "dataset {} holds {:?}, expected variable-length strings",
                    path, other
                )))
            }
        };
        Ok(strings)
    }
}

impl Write1D<i32> for Hdf5Container {
    fn write_1d(&mut self, group: &str, name: &str, data: &[i32], compress: bool) -> Result<()> {
        self.write_numeric(group, name, data, compress)
    }
}

impl Write1D<f64> for Hdf5Container {
    fn write_1d(&mut self, group: &str, name: &str, data: &[f64], compress: bool) -> Result<()> {
        self.write_numeric(group, name, data, compress)
    }
}

impl Write1D<String> for Hdf5Container {
    fn write_1d(&mut self, group: &str, name: &str, data: &[String], compress: bool) -> Result<()> {
        let unicode = data
            .iter()
            .map(|s| {
                VarLenUnicode::from_str(s)
                    .map_err(|e| BiomError::BadInput(format!("id {:?} is not storable: {}", s, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        self.write_numeric(group, name, &unicode, compress)
    }
}

impl Hierarchy for Hdf5Container {
    fn create_group(&mut self, path: &str) -> Result<()> {
        let _guard = HDF5_LOCK.lock();
        let (parent, name) = split_path(path);
        let parent = self.file.group(parent).map_err(h5err)?;
        parent.create_group(name).map_err(h5err)?;
        Ok(())
    }

    fn set_root_attr(&mut self, name: &str, value: Attribute) -> Result<()> {
        let _guard = HDF5_LOCK.lock();
        match value {
            Attribute::Str(s) => {
                let s = VarLenUnicode::from_str(&s)
                    .map_err(|e| BiomError::BadInput(format!("attribute {}: {}", name, e)))?;
                self.file
                    .new_attr::<VarLenUnicode>()
                    .create(name)
                    .and_then(|attr| attr.write_scalar(&s))
            }
            Attribute::Int64(v) => self
                .file
                .new_attr::<i64>()
                .create(name)
                .and_then(|attr| attr.write_scalar(&v)),
            Attribute::Int32s(v) => self
                .file
                .new_attr_builder()
                .with_data(&ArrayView1::from(v.as_slice()))
                .create(name)
                .map(|_| ()),
            Attribute::Int64s(v) => self
                .file
                .new_attr_builder()
                .with_data(&ArrayView1::from(v.as_slice()))
                .create(name)
                .map(|_| ()),
        }
        .map_err(h5err)
    }

    fn root_attr(&self, name: &str) -> Result<Option<Attribute>> {
        let _guard = HDF5_LOCK.lock();
        if !self.file.attr_names().map_err(h5err)?.iter().any(|n| n == name) {
            return Ok(None);
        }
        let attr = self.file.attr(name).map_err(h5err)?;
        let descriptor = attr
            .dtype()
            .and_then(|dtype| dtype.to_descriptor())
            .map_err(h5err)?;
        let value = match descriptor {
            TypeDescriptor::VarLenUnicode => {
                Attribute::Str(attr.read_scalar::<VarLenUnicode>().map_err(h5err)?.as_str().to_string())
            }
            TypeDescriptor::VarLenAscii => {
                Attribute::Str(attr.read_scalar::<VarLenAscii>().map_err(h5err)?.as_str().to_string())
            }
            TypeDescriptor::FixedAscii(len) | TypeDescriptor::FixedUnicode(len)
                if len > FIXED_STR_CAP =>
            {
                return Err(BiomError::ContainerCorrupt(format!(
                    "attribute {} is a {}-byte fixed string, limit is {}",
                    name, len, FIXED_STR_CAP
                )))
            }
            TypeDescriptor::FixedAscii(_) => {
                let value = attr.read_scalar::<FixedAscii<FIXED_STR_CAP>>().map_err(h5err)?;
                Attribute::Str(trim_fixed(value.as_str()))
            }
            TypeDescriptor::FixedUnicode(_) => {
                let value = attr.read_scalar::<FixedUnicode<FIXED_STR_CAP>>().map_err(h5err)?;
                Attribute::Str(trim_fixed(value.as_str()))
            }
            TypeDescriptor::Integer(IntSize::U4) if !attr.is_scalar() => {
                Attribute::Int32s(attr.read_raw::<i32>().map_err(h5err)?)
            }
            TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) if attr.is_scalar() => {
                Attribute::Int64(attr.read_scalar::<i64>().map_err(h5err)?)
            }
            TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => {
                Attribute::Int64s(attr.read_raw::<i64>().map_err(h5err)?)
            }
            other => {
                return Err(BiomError::ContainerCorrupt(format!(
                    "attribute {} has unsupported type {:?}",
                    name, other
                )))
            }
        };
        Ok(Some(value))
    }
}

/// Fixed-length strings are NUL padded; keep the text before the first NUL.
fn trim_fixed(raw: &str) -> String {
    raw.split('\0').next().unwrap_or_default().to_string()
}
