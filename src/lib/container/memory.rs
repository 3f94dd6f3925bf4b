//! In-process container with the same path and dtype rules as the on-disk format.

use crate::container::{join_path, split_path, Attribute, Hierarchy, Read1D, Write1D};
use crate::core::error::{BiomError, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Typed contents of one dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    Int32(Vec<i32>),
    Float64(Vec<f64>),
    Str(Vec<String>),
}

impl Dataset {
    fn dtype(&self) -> &'static str {
        match self {
            Dataset::Int32(_) => "int32",
            Dataset::Float64(_) => "float64",
            Dataset::Str(_) => "string",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Dataset::Int32(v) => v.len(),
            Dataset::Float64(v) => v.len(),
            Dataset::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDataset {
    pub data: Dataset,
    pub compressed: bool,
}

/// Container kept entirely in memory. Used for tests and for piping tables
/// between stages without touching disk.
#[derive(Debug, Clone)]
pub struct MemoryContainer {
    groups: BTreeSet<String>,
    datasets: BTreeMap<String, StoredDataset>,
    attrs: BTreeMap<String, Attribute>,
}

impl Default for MemoryContainer {
    fn default() -> Self {
        let mut groups = BTreeSet::new();
        groups.insert("/".to_string());
        Self {
            groups,
            datasets: BTreeMap::new(),
            attrs: BTreeMap::new(),
        }
    }
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_group(&self, path: &str) -> bool {
        self.groups.contains(path)
    }

    pub fn dataset(&self, path: &str) -> Option<&StoredDataset> {
        self.datasets.get(path)
    }

    /// Dataset paths in lexical order.
    pub fn dataset_paths(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(|k| k.as_str())
    }

    /// Replace or insert a dataset directly, creating no groups.
    pub fn put(&mut self, path: &str, data: Dataset) {
        self.datasets.insert(
            path.to_string(),
            StoredDataset {
                data,
                compressed: false,
            },
        );
    }

    pub fn remove(&mut self, path: &str) -> Option<StoredDataset> {
        self.datasets.remove(path)
    }

    pub fn remove_root_attr(&mut self, name: &str) -> Option<Attribute> {
        self.attrs.remove(name)
    }

    fn fetch(&self, path: &str) -> Result<&Dataset> {
        self.datasets
            .get(path)
            .map(|stored| &stored.data)
            .ok_or_else(|| BiomError::ContainerCorrupt(format!("missing dataset {}", path)))
    }

    fn store(&mut self, group: &str, name: &str, data: Dataset, compress: bool) -> Result<()> {
        if !self.groups.contains(group) {
            return Err(BiomError::ContainerCorrupt(format!(
                "group {} does not exist",
                group
            )));
        }
        let path = join_path(group, name);
        if self.datasets.contains_key(&path) || self.groups.contains(&path) {
            return Err(BiomError::ContainerCorrupt(format!("{} already exists", path)));
        }
        let compressed = compress && !data.is_empty();
        self.datasets.insert(path, StoredDataset { data, compressed });
        Ok(())
    }
}

fn dtype_mismatch(path: &str, expected: &str, found: &Dataset) -> BiomError {
    BiomError::ContainerCorrupt(format!(
        "dataset {} has dtype {}, expected {}",
        path,
        found.dtype(),
        expected
    ))
}

impl Read1D<i32> for MemoryContainer {
    fn load_1d(&self, path: &str) -> Result<Vec<i32>> {
        match self.fetch(path)? {
            Dataset::Int32(v) => Ok(v.clone()),
            other => Err(dtype_mismatch(path, "int32", other)),
        }
    }
}

impl Read1D<f64> for MemoryContainer {
    fn load_1d(&self, path: &str) -> Result<Vec<f64>> {
        match self.fetch(path)? {
            Dataset::Float64(v) => Ok(v.clone()),
            other => Err(dtype_mismatch(path, "float64", other)),
        }
    }
}

impl Read1D<String> for MemoryContainer {
    fn load_1d(&self, path: &str) -> Result<Vec<String>> {
        match self.fetch(path)? {
            Dataset::Str(v) => Ok(v.clone()),
            other => Err(dtype_mismatch(path, "string", other)),
        }
    }
}

impl Write1D<i32> for MemoryContainer {
    fn write_1d(&mut self, group: &str, name: &str, data: &[i32], compress: bool) -> Result<()> {
        self.store(group, name, Dataset::Int32(data.to_vec()), compress)
    }
}

impl Write1D<f64> for MemoryContainer {
    fn write_1d(&mut self, group: &str, name: &str, data: &[f64], compress: bool) -> Result<()> {
        self.store(group, name, Dataset::Float64(data.to_vec()), compress)
    }
}

impl Write1D<String> for MemoryContainer {
    fn write_1d(&mut self, group: &str, name: &str, data: &[String], compress: bool) -> Result<()> {
        self.store(group, name, Dataset::Str(data.to_vec()), compress)
    }
}

impl Hierarchy for MemoryContainer {
    fn create_group(&mut self, path: &str) -> Result<()> {
        let (parent, _) = split_path(path);
        if !self.groups.contains(parent) {
            return Err(BiomError::ContainerCorrupt(format!(
                "parent group {} does not exist",
                parent
            )));
        }
        if self.datasets.contains_key(path) || !self.groups.insert(path.to_string()) {
            return Err(BiomError::ContainerCorrupt(format!("{} already exists", path)));
        }
        Ok(())
    }

    fn set_root_attr(&mut self, name: &str, value: Attribute) -> Result<()> {
        self.attrs.insert(name.to_string(), value);
        Ok(())
    }

    fn root_attr(&self, name: &str) -> Result<Option<Attribute>> {
        Ok(self.attrs.get(name).cloned())
    }
}
