//! Insertion-ordered string dictionary used to encode feature and sample identifiers.

use crate::core::error::{BiomError, Result};
use rustc_hash::FxHashMap;
use std::convert::TryFrom;

/// Maps each distinct identifier to a dense index, assigned in first-seen order.
///
/// Once an index is handed out it never changes. The hash index can be
/// dropped with [`Dictionary::freeze`] when only positional access is needed.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    ordered: Vec<String>,
    index: FxHashMap<String, u32>,
    frozen: bool,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ordered: Vec::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            frozen: false,
        }
    }

    /// Build a dictionary from identifiers that are already unique and ordered,
    /// e.g. the id datasets of a container. Duplicates are rejected.
    pub fn from_ordered(ids: Vec<String>) -> Result<Self> {
        let mut index = FxHashMap::with_capacity_and_hasher(ids.len(), Default::default());
        for (i, id) in ids.iter().enumerate() {
            let idx = u32::try_from(i).map_err(|_| BiomError::SizeExceeded {
                axis: "dictionary entries",
                count: ids.len(),
            })?;
            if index.insert(id.clone(), idx).is_some() {
                return Err(BiomError::ContainerCorrupt(format!(
                    "duplicate identifier '{}'",
                    id
                )));
            }
        }
        Ok(Self {
            ordered: ids,
            index,
            frozen: false,
        })
    }

    /// Return the index of `key`, appending it if unseen.
    pub fn intern(&mut self, key: &str) -> Result<u32> {
        if self.frozen {
            self.thaw();
        }
        if let Some(&idx) = self.index.get(key) {
            return Ok(idx);
        }
        let idx = u32::try_from(self.ordered.len()).map_err(|_| BiomError::SizeExceeded {
            axis: "dictionary entries",
            count: self.ordered.len() + 1,
        })?;
        self.ordered.push(key.to_owned());
        self.index.insert(key.to_owned(), idx);
        Ok(idx)
    }

    /// Index of `key` if it has been interned.
    pub fn lookup(&self, key: &str) -> Option<u32> {
        if self.frozen {
            return self
                .ordered
                .iter()
                .position(|id| id == key)
                .map(|pos| pos as u32);
        }
        self.index.get(key).copied()
    }

    /// Drop the hash index, keeping only the ordered identifiers.
    pub fn freeze(&mut self) {
        self.index = FxHashMap::default();
        self.frozen = true;
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    #[inline]
    pub fn get(&self, idx: u32) -> Option<&str> {
        self.ordered.get(idx as usize).map(|s| s.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Borrow the identifiers in index order.
    pub fn ids(&self) -> &[String] {
        &self.ordered
    }

    pub fn into_ids(self) -> Vec<String> {
        self.ordered
    }

    fn thaw(&mut self) {
        self.index = self
            .ordered
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i as u32))
            .collect();
        self.frozen = false;
    }
}
