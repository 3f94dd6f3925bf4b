//! Canonical feature-by-sample table.

use crate::core::error::{BiomError, Result};
use crate::sparse::coo::{canonicalize, CooParts, EPSILON};
use crate::sparse::compressed::{CompressedMatrix, Layout};
use crate::sparse::dictionary::Dictionary;
use itertools::{izip, Itertools};
use log::debug;
use rayon::prelude::*;
use std::convert::TryFrom;

/// Largest axis length representable by the container's int32 indices.
pub const MAX_AXIS_LEN: usize = i32::MAX as usize;

/// A sparse count table holding canonical COO triples and the two identifier
/// dictionaries. Rows are features, columns are samples.
///
/// Triples are kept sorted by `(sample, feature)` with unique keys and
/// strictly positive values, so the CSC projection is a single scan.
#[derive(Debug, Clone)]
pub struct SparseTable {
    rows: Vec<u32>,
    cols: Vec<u32>,
    values: Vec<f64>,
    features: Dictionary,
    samples: Dictionary,
}

impl SparseTable {
    /// Streaming path: indices were already interned into `features` and `samples`.
    pub fn from_encoded(parts: CooParts, features: Dictionary, samples: Dictionary) -> Result<Self> {
        Self::from_encoded_with_epsilon(parts, features, samples, EPSILON)
    }

    /// Streaming path with an explicit drop threshold for summed values.
    pub fn from_encoded_with_epsilon(
        parts: CooParts,
        mut features: Dictionary,
        mut samples: Dictionary,
        epsilon: f64,
    ) -> Result<Self> {
        if parts.rows.len() != parts.values.len() || parts.cols.len() != parts.values.len() {
            return Err(BiomError::BadInput(format!(
                "COO arrays differ in length: {} rows, {} cols, {} values",
                parts.rows.len(),
                parts.cols.len(),
                parts.values.len()
            )));
        }
        check_bounds(&parts.rows, features.len(), "feature")?;
        check_bounds(&parts.cols, samples.len(), "sample")?;

        let CooParts { rows, cols, values } = canonicalize(parts, epsilon);
        features.freeze();
        samples.freeze();
        Ok(Self {
            rows,
            cols,
            values,
            features,
            samples,
        })
    }

    /// Bulk path: intern raw identifiers in input order, then canonicalize.
    pub fn from_triples<F, S>(feature_ids: &[F], sample_ids: &[S], values: &[f64]) -> Result<Self>
    where
        F: AsRef<str>,
        S: AsRef<str>,
    {
        if feature_ids.len() != values.len() || sample_ids.len() != values.len() {
            return Err(BiomError::BadInput(format!(
                "triple columns differ in length: {} features, {} samples, {} values",
                feature_ids.len(),
                sample_ids.len(),
                values.len()
            )));
        }

        let mut features = Dictionary::new();
        let mut samples = Dictionary::new();
        let (rows, cols): (Vec<u32>, Vec<u32>) = feature_ids
            .iter()
            .zip(sample_ids)
            .map(|(f, s)| -> Result<(u32, u32)> {
                Ok((features.intern(f.as_ref())?, samples.intern(s.as_ref())?))
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .unzip();

        Self::from_encoded(
            CooParts {
                rows,
                cols,
                values: values.to_vec(),
            },
            features,
            samples,
        )
    }

    /// Ingest path: expand container-native CSC arrays without re-canonicalizing.
    /// Structure is validated; ordering and value invariants are trusted.
    pub fn from_csc(
        indptr: &[i32],
        indices: &[i32],
        data: Vec<f64>,
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let n_features = feature_ids.len();
        let n_samples = sample_ids.len();
        if indptr.len() != n_samples + 1 {
            return Err(BiomError::ContainerCorrupt(format!(
                "indptr has {} entries for {} samples",
                indptr.len(),
                n_samples
            )));
        }
        if indices.len() != data.len() {
            return Err(BiomError::ContainerCorrupt(format!(
                "indices ({}) and data ({}) differ in length",
                indices.len(),
                data.len()
            )));
        }
        if indptr.first().copied().unwrap_or(0) != 0
            || indptr.last().map(|&p| p as usize) != Some(data.len())
            || indptr.iter().tuple_windows().any(|(a, b)| a > b)
        {
            return Err(BiomError::ContainerCorrupt(
                "indptr must start at 0, be non-decreasing and end at nnz".to_string(),
            ));
        }

        let nnz = data.len();
        let mut rows = Vec::with_capacity(nnz);
        let mut cols = Vec::with_capacity(nnz);
        for (col, (&start, &end)) in indptr.iter().tuple_windows().enumerate() {
            for &index in &indices[start as usize..end as usize] {
                let row = u32::try_from(index)
                    .ok()
                    .filter(|&r| (r as usize) < n_features)
                    .ok_or_else(|| {
                        BiomError::ContainerCorrupt(format!(
                            "feature index {} out of range for {} features",
                            index, n_features
                        ))
                    })?;
                rows.push(row);
                cols.push(col as u32);
            }
        }

        let mut features = Dictionary::from_ordered(feature_ids)?;
        let mut samples = Dictionary::from_ordered(sample_ids)?;
        features.freeze();
        samples.freeze();
        Ok(Self {
            rows,
            cols,
            values: data,
            features,
            samples,
        })
    }

    /// Number of stored non-zeros.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// `(n_features, n_samples)`
    pub fn shape(&self) -> (usize, usize) {
        (self.features.len(), self.samples.len())
    }

    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn feature_ids(&self) -> &[String] {
        self.features.ids()
    }

    pub fn sample_ids(&self) -> &[String] {
        self.samples.ids()
    }

    pub fn features(&self) -> &Dictionary {
        &self.features
    }

    pub fn samples(&self) -> &Dictionary {
        &self.samples
    }

    pub fn coo_feature_indices(&self) -> &[u32] {
        &self.rows
    }

    pub fn coo_sample_indices(&self) -> &[u32] {
        &self.cols
    }

    pub fn coo_values(&self) -> &[f64] {
        &self.values
    }

    /// Feature identifier of every stored entry, in canonical order.
    pub fn coo_feature_ids(&self) -> Vec<&str> {
        self.rows
            .iter()
            .map(|&r| self.feature_ids()[r as usize].as_str())
            .collect()
    }

    /// Sample identifier of every stored entry, in canonical order.
    pub fn coo_sample_ids(&self) -> Vec<&str> {
        self.cols
            .iter()
            .map(|&c| self.sample_ids()[c as usize].as_str())
            .collect()
    }

    /// `(feature_id, sample_id, value)` for every stored entry.
    pub fn triples(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
        let features = self.feature_ids();
        let samples = self.sample_ids();
        izip!(&self.rows, &self.cols, &self.values).map(move |(&r, &c, &v)| {
            (
                features[r as usize].as_str(),
                samples[c as usize].as_str(),
                v,
            )
        })
    }

    /// Fail when either axis cannot be addressed with int32 indices.
    pub fn check_int32_shape(&self) -> Result<()> {
        if self.n_features() > MAX_AXIS_LEN {
            return Err(BiomError::SizeExceeded {
                axis: "features",
                count: self.n_features(),
            });
        }
        if self.n_samples() > MAX_AXIS_LEN {
            return Err(BiomError::SizeExceeded {
                axis: "samples",
                count: self.n_samples(),
            });
        }
        Ok(())
    }

    /// Features-as-rows projection. Requires a re-sort by `(feature, sample)`
    /// through an index array; the stored triples are left untouched.
    /// Fails when the shape or non-zero count overflows int32 pointers.
    pub fn to_csr(&self) -> Result<CompressedMatrix> {
        self.check_int32_shape()?;
        let mut order: Vec<usize> = (0..self.nnz()).collect();
        order.par_sort_unstable_by_key(|&i| (self.rows[i], self.cols[i]));
        debug!("Building CSR projection over {} non-zeros", self.nnz());
        CompressedMatrix::from_sorted(
            Layout::Csr,
            self.n_features(),
            self.n_samples(),
            self.nnz(),
            order
                .into_iter()
                .map(|i| (self.rows[i], self.cols[i], self.values[i])),
        )
    }

    /// Samples-as-columns projection; a direct scan of the canonical order.
    pub fn to_csc(&self) -> Result<CompressedMatrix> {
        self.check_int32_shape()?;
        debug!("Building CSC projection over {} non-zeros", self.nnz());
        CompressedMatrix::from_sorted(
            Layout::Csc,
            self.n_features(),
            self.n_samples(),
            self.nnz(),
            izip!(&self.cols, &self.rows, &self.values).map(|(&c, &r, &v)| (c, r, v)),
        )
    }
}

fn check_bounds(indices: &[u32], len: usize, axis: &str) -> Result<()> {
    match indices.iter().find(|&&i| i as usize >= len) {
        Some(bad) => Err(BiomError::BadInput(format!(
            "{} index {} out of range for dictionary of {} entries",
            axis, bad, len
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table(triples: &[(&str, &str, f64)]) -> SparseTable {
        let features: Vec<&str> = triples.iter().map(|t| t.0).collect();
        let samples: Vec<&str> = triples.iter().map(|t| t.1).collect();
        let values: Vec<f64> = triples.iter().map(|t| t.2).collect();
        SparseTable::from_triples(&features, &samples, &values).unwrap()
    }

    #[test]
    fn simple_three_by_three() {
        let t = table(&[("F1", "S1", 1.0), ("F2", "S2", 2.0), ("F3", "S3", 3.0)]);
        assert_eq!(t.feature_ids(), &["F1", "F2", "F3"]);
        assert_eq!(t.sample_ids(), &["S1", "S2", "S3"]);
        assert_eq!(t.coo_feature_indices(), &[0, 1, 2]);
        assert_eq!(t.coo_sample_indices(), &[0, 1, 2]);
        assert_eq!(t.coo_values(), &[1.0, 2.0, 3.0]);
        assert_eq!(t.nnz(), 3);
    }

    #[test]
    fn duplicate_keys_are_summed() {
        let t = table(&[("F1", "S1", 1.0), ("F2", "S2", 2.0), ("F1", "S1", 3.0)]);
        assert_eq!(t.coo_feature_indices(), &[0, 1]);
        assert_eq!(t.coo_sample_indices(), &[0, 1]);
        assert_eq!(t.coo_values(), &[4.0, 2.0]);
        assert_eq!(t.coo_feature_ids(), vec!["F1", "F2"]);
        assert_eq!(t.coo_sample_ids(), vec!["S1", "S2"]);
    }

    #[test]
    fn zero_sums_are_eliminated() {
        let t = table(&[
            ("F1", "S1", 1.0),
            ("F2", "S2", 0.0),
            ("F3", "S1", 3.0),
            ("F2", "S2", 0.0),
        ]);
        assert_eq!(t.nnz(), 2);
        assert!(t.triples().all(|(f, _, _)| f != "F2"));
        // F2 and S2 stay in the dictionaries even though they carry no values
        assert_eq!(t.shape(), (3, 2));
    }

    fn two_by_three() -> SparseTable {
        table(&[
            ("F1", "S1", 1.0),
            ("F1", "S2", 2.0),
            ("F1", "S3", 4.0),
            ("F2", "S1", 3.0),
        ])
    }

    #[test]
    fn csr_of_two_by_three() {
        let csr = two_by_three().to_csr().unwrap();
        assert_eq!(csr.layout, Layout::Csr);
        assert_eq!(csr.data, vec![1.0, 2.0, 4.0, 3.0]);
        assert_eq!(csr.indices, vec![0, 1, 2, 0]);
        assert_eq!(csr.indptr, vec![0, 3, 4]);
    }

    #[test]
    fn csc_of_two_by_three() {
        let csc = two_by_three().to_csc().unwrap();
        assert_eq!(csc.layout, Layout::Csc);
        assert_eq!(csc.data, vec![1.0, 3.0, 2.0, 4.0]);
        assert_eq!(csc.indices, vec![0, 1, 0, 0]);
        assert_eq!(csc.indptr, vec![0, 2, 3, 4]);
    }

    #[test]
    fn empty_table_projections() {
        let t = SparseTable::from_triples::<&str, &str>(&[], &[], &[]).unwrap();
        assert_eq!(t.to_csr().unwrap().indptr, vec![0]);
        assert_eq!(t.to_csc().unwrap().indptr, vec![0]);
        assert_eq!(t.nnz(), 0);
    }

    #[test]
    fn all_zero_input_keeps_axes() {
        let t = table(&[("F1", "S1", 0.0), ("F2", "S2", -1.0)]);
        assert_eq!(t.nnz(), 0);
        assert_eq!(t.to_csr().unwrap().indptr, vec![0, 0, 0]);
        assert_eq!(t.to_csc().unwrap().indptr, vec![0, 0, 0]);
    }

    #[test]
    fn single_column_and_single_row() {
        let col = table(&[("F1", "S1", 1.0), ("F2", "S1", 2.0), ("F3", "S1", 3.0)]);
        assert_eq!(col.to_csc().unwrap().indptr, vec![0, 3]);
        assert_eq!(col.to_csr().unwrap().indptr, vec![0, 1, 2, 3]);

        let row = table(&[("F1", "S1", 1.0), ("F1", "S2", 2.0), ("F1", "S3", 3.0)]);
        assert_eq!(row.to_csr().unwrap().indptr, vec![0, 3]);
        assert_eq!(row.to_csr().unwrap().indices, vec![0, 1, 2]);
        assert_eq!(row.to_csc().unwrap().indptr, vec![0, 1, 2, 3]);
    }

    #[test]
    fn csr_does_not_mutate_canonical_order() {
        let t = two_by_three();
        let before = t.coo_feature_indices().to_vec();
        let _ = t.to_csr().unwrap();
        assert_eq!(t.coo_feature_indices(), before.as_slice());
    }

    #[test]
    fn from_encoded_rejects_out_of_range_index() {
        let mut features = Dictionary::new();
        features.intern("F1").unwrap();
        let mut samples = Dictionary::new();
        samples.intern("S1").unwrap();
        let parts = CooParts {
            rows: vec![1],
            cols: vec![0],
            values: vec![1.0],
        };
        let err = SparseTable::from_encoded(parts, features, samples).unwrap_err();
        assert!(matches!(err, BiomError::BadInput(_)));
    }

    #[test]
    fn from_triples_rejects_ragged_columns() {
        let err = SparseTable::from_triples(&["F1"], &["S1", "S2"], &[1.0]).unwrap_err();
        assert!(matches!(err, BiomError::BadInput(_)));
    }

    #[test]
    fn from_csc_expands_without_resorting() {
        let t = SparseTable::from_csc(
            &[0, 2, 3, 4],
            &[0, 1, 0, 0],
            vec![1.0, 3.0, 2.0, 4.0],
            vec!["F1".into(), "F2".into()],
            vec!["S1".into(), "S2".into(), "S3".into()],
        )
        .unwrap();
        assert_eq!(t.coo_sample_indices(), &[0, 0, 1, 2]);
        assert_eq!(t.coo_feature_indices(), &[0, 1, 0, 0]);
        assert_eq!(t.to_csr().unwrap().indptr, vec![0, 3, 4]);
        assert_eq!(t.to_csc().unwrap().data, vec![1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn from_csc_with_empty_samples() {
        let t = SparseTable::from_csc(
            &[0, 0, 1, 1],
            &[1],
            vec![7.0],
            vec!["F1".into(), "F2".into()],
            vec!["S1".into(), "S2".into(), "S3".into()],
        )
        .unwrap();
        let triples: Vec<_> = t.triples().collect();
        assert_eq!(triples, vec![("F2", "S2", 7.0)]);
    }

    #[test]
    fn from_csc_rejects_corrupt_structure() {
        let ids = || vec!["A".to_string()];
        let bad_len = SparseTable::from_csc(&[0], &[], vec![], ids(), ids());
        assert!(matches!(bad_len, Err(BiomError::ContainerCorrupt(_))));

        let bad_index = SparseTable::from_csc(&[0, 1], &[3], vec![1.0], ids(), ids());
        assert!(matches!(bad_index, Err(BiomError::ContainerCorrupt(_))));

        let negative = SparseTable::from_csc(&[0, 1], &[-1], vec![1.0], ids(), ids());
        assert!(matches!(negative, Err(BiomError::ContainerCorrupt(_))));

        let bad_ptr = SparseTable::from_csc(&[0, 2], &[0], vec![1.0], ids(), ids());
        assert!(matches!(bad_ptr, Err(BiomError::ContainerCorrupt(_))));
    }

    #[test]
    fn int32_shape_check_passes_small_tables() {
        two_by_three().check_int32_shape().unwrap();
    }

    fn arb_id_triples() -> impl Strategy<Value = Vec<(u8, u8, f64)>> {
        prop::collection::vec((0u8..30, 0u8..30, -1.0f64..5.0), 0..2_000)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn csr_and_csc_expand_to_same_multiset(raw in arb_id_triples()) {
            let features: Vec<String> = raw.iter().map(|t| format!("F{}", t.0)).collect();
            let samples: Vec<String> = raw.iter().map(|t| format!("S{}", t.1)).collect();
            let values: Vec<f64> = raw.iter().map(|t| t.2).collect();
            let t = SparseTable::from_triples(&features, &samples, &values).unwrap();

            let csr = t.to_csr().unwrap();
            let csc = t.to_csc().unwrap();
            csr.validate().unwrap();
            csc.validate().unwrap();
            prop_assert_eq!(csr.indptr.len(), t.n_features() + 1);
            prop_assert_eq!(csc.indptr.len(), t.n_samples() + 1);

            let mut from_csr: Vec<_> = csr.triples().map(|(r, c, v)| (r, c, v.to_bits())).collect();
            let mut from_csc: Vec<_> = csc.triples().map(|(r, c, v)| (r, c, v.to_bits())).collect();
            from_csr.sort_unstable();
            from_csc.sort_unstable();
            prop_assert_eq!(from_csr, from_csc);
        }
    }
}
