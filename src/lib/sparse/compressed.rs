//! Compressed sparse projections (CSR / CSC) of a [`SparseTable`](crate::sparse::SparseTable).
//!
//! Both layouts share one representation: `indptr` over the major axis,
//! `indices` over the minor axis, and `data`. Indices are `i32` because that
//! is what the container format stores.

use crate::core::error::{BiomError, Result};
use nalgebra_sparse::{CscMatrix, CsrMatrix};

/// Which axis of the table is the major (compressed) axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Features are rows (major axis), samples are columns.
    Csr,
    /// Samples are columns (major axis), features are rows.
    Csc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompressedMatrix {
    pub layout: Layout,
    pub data: Vec<f64>,
    pub indices: Vec<i32>,
    pub indptr: Vec<i32>,
    n_features: usize,
    n_samples: usize,
}

impl CompressedMatrix {
    /// Build a compressed matrix from `(major, minor, value)` entries already
    /// sorted by `(major, minor)`. Empty major slots, including trailing ones,
    /// get repeated pointer entries. Fails with `SizeExceeded` once a pointer
    /// or minor index no longer fits in `i32`.
    pub(crate) fn from_sorted<I>(
        layout: Layout,
        n_features: usize,
        n_samples: usize,
        nnz: usize,
        entries: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (u32, u32, f64)>,
    {
        let n_major = match layout {
            Layout::Csr => n_features,
            Layout::Csc => n_samples,
        };

        let mut data = Vec::with_capacity(nnz);
        let mut indices = Vec::with_capacity(nnz);
        let mut indptr = Vec::with_capacity(n_major + 1);
        indptr.push(0i32);

        let mut current_major = 0usize;
        for (major, minor, value) in entries {
            while current_major < major as usize {
                indptr.push(to_i32(data.len(), "non-zeros")?);
                current_major += 1;
            }
            data.push(value);
            indices.push(to_i32(minor as usize, "minor index")?);
        }
        let end = to_i32(data.len(), "non-zeros")?;
        indptr.resize(n_major + 1, end);

        Ok(Self {
            layout,
            data,
            indices,
            indptr,
            n_features,
            n_samples,
        })
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// `(n_features, n_samples)`, independent of layout.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_features, self.n_samples)
    }

    pub fn density(&self) -> f64 {
        let total = self.n_features * self.n_samples;
        if total == 0 {
            0.0
        } else {
            self.nnz() as f64 / total as f64
        }
    }

    /// Expand back to `(feature, sample, value)` triples in storage order.
    pub fn triples(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let layout = self.layout;
        self.indptr.windows(2).enumerate().flat_map(move |(major, w)| {
            (w[0] as usize..w[1] as usize).map(move |k| {
                let minor = self.indices[k] as usize;
                let value = self.data[k];
                match layout {
                    Layout::Csr => (major, minor, value),
                    Layout::Csc => (minor, major, value),
                }
            })
        })
    }

    fn usize_parts(&self) -> (Vec<usize>, Vec<usize>) {
        (
            self.indptr.iter().map(|&p| p as usize).collect(),
            self.indices.iter().map(|&i| i as usize).collect(),
        )
    }

    /// Validated `nalgebra_sparse` CSR view with features as rows.
    pub fn to_csr_matrix(&self) -> Result<CsrMatrix<f64>> {
        match self.layout {
            Layout::Csr => {
                let (offsets, indices) = self.usize_parts();
                Ok(CsrMatrix::try_from_csr_data(
                    self.n_features,
                    self.n_samples,
                    offsets,
                    indices,
                    self.data.clone(),
                )?)
            }
            Layout::Csc => Ok(CsrMatrix::from(&self.to_csc_matrix()?)),
        }
    }

    /// Validated `nalgebra_sparse` CSC view with samples as columns.
    pub fn to_csc_matrix(&self) -> Result<CscMatrix<f64>> {
        match self.layout {
            Layout::Csc => {
                let (offsets, indices) = self.usize_parts();
                Ok(CscMatrix::try_from_csc_data(
                    self.n_features,
                    self.n_samples,
                    offsets,
                    indices,
                    self.data.clone(),
                )?)
            }
            Layout::Csr => Ok(CscMatrix::from(&self.to_csr_matrix()?)),
        }
    }

    /// Structural check used before handing arrays to a writer.
    pub fn validate(&self) -> Result<()> {
        let n_major = match self.layout {
            Layout::Csr => self.n_features,
            Layout::Csc => self.n_samples,
        };
        if self.indptr.len() != n_major + 1 {
            return Err(BiomError::SparseMatrix(format!(
                "indptr has {} entries, expected {}",
                self.indptr.len(),
                n_major + 1
            )));
        }
        if self.indices.len() != self.data.len() {
            return Err(BiomError::SparseMatrix(
                "indices and data lengths differ".to_string(),
            ));
        }
        match self.layout {
            Layout::Csr => self.to_csr_matrix().map(|_| ()),
            Layout::Csc => self.to_csc_matrix().map(|_| ()),
        }
    }
}

fn to_i32(value: usize, axis: &'static str) -> Result<i32> {
    i32::try_from(value).map_err(|_| BiomError::SizeExceeded { axis, count: value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csc_2x3() -> CompressedMatrix {
        // [[1, 2, 4], [3, 0, 0]] in (sample, feature) order
        CompressedMatrix::from_sorted(
            Layout::Csc,
            2,
            3,
            4,
            vec![(0, 0, 1.0), (0, 1, 3.0), (1, 0, 2.0), (2, 0, 4.0)],
        )
        .unwrap()
    }

    #[test]
    fn builds_pointers_with_trailing_empties() {
        let m = CompressedMatrix::from_sorted(Layout::Csr, 4, 2, 1, vec![(1, 0, 5.0)]).unwrap();
        assert_eq!(m.indptr, vec![0, 0, 1, 1, 1]);
        assert_eq!(m.indices, vec![0]);
        assert_eq!(m.data, vec![5.0]);
        m.validate().unwrap();
    }

    #[test]
    fn empty_matrix_has_zero_pointers() {
        let m = CompressedMatrix::from_sorted(Layout::Csc, 0, 3, 0, Vec::new()).unwrap();
        assert_eq!(m.indptr, vec![0, 0, 0, 0]);
        assert_eq!(m.nnz(), 0);
        assert_eq!(m.density(), 0.0);
    }

    #[test]
    fn pointers_past_i32_are_rejected() {
        let limit = i32::MAX as usize;
        assert_eq!(to_i32(limit, "non-zeros").unwrap(), i32::MAX);
        assert!(matches!(
            to_i32(limit + 1, "non-zeros"),
            Err(BiomError::SizeExceeded { axis: "non-zeros", count }) if count == limit + 1
        ));
    }

    #[test]
    fn minor_index_past_i32_is_rejected() {
        let entries = vec![(0u32, i32::MAX as u32 + 1, 1.0)];
        let err = CompressedMatrix::from_sorted(Layout::Csr, 1, 1, 1, entries).unwrap_err();
        assert!(matches!(err, BiomError::SizeExceeded { axis: "minor index", .. }));
    }

    #[test]
    fn nalgebra_views_agree() {
        let csc = csc_2x3();
        let csr = csc.to_csr_matrix().unwrap();
        assert_eq!(csr.nrows(), 2);
        assert_eq!(csr.ncols(), 3);
        assert_eq!(csr.row_offsets(), &[0, 3, 4]);
        assert_eq!(csr.col_indices(), &[0, 1, 2, 0]);
        assert_eq!(csr.values(), &[1.0, 2.0, 4.0, 3.0]);
    }

    #[test]
    fn triples_are_feature_sample_ordered() {
        let triples: Vec<_> = csc_2x3().triples().collect();
        assert_eq!(
            triples,
            vec![(0, 0, 1.0), (1, 0, 3.0), (0, 1, 2.0), (0, 2, 4.0)]
        );
    }

    #[test]
    fn validate_rejects_bad_pointer_length() {
        let mut m = csc_2x3();
        m.indptr.pop();
        assert!(m.validate().is_err());
    }

    #[test]
    fn density_counts_nonzeros() {
        assert!((csc_2x3().density() - 4.0 / 6.0).abs() < 1e-12);
    }
}
