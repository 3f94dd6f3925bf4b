//! Coordinate-list (COO) buffers and canonicalization.

use crate::sparse::permute::apply_permutation;
use log::debug;
use rayon::prelude::*;

/// Values at or below this threshold are dropped during canonicalization.
pub const EPSILON: f64 = 1e-10;

/// Below this many triples the argsort runs serially.
const PARALLEL_SORT_MIN: usize = 1 << 16;

/// Owned `(rows, cols, values)` arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CooParts {
    pub rows: Vec<u32>,
    pub cols: Vec<u32>,
    pub values: Vec<f64>,
}

impl CooParts {
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Append-only triple buffer. Canonicalization happens later, once all
/// producers have been merged, so no sorting happens here.
#[derive(Debug, Clone, Default)]
pub struct CooBuilder {
    parts: CooParts,
}

impl CooBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            parts: CooParts {
                rows: Vec::with_capacity(capacity),
                cols: Vec::with_capacity(capacity),
                values: Vec::with_capacity(capacity),
            },
        }
    }

    #[inline]
    pub fn push(&mut self, row: u32, col: u32, value: f64) {
        self.parts.rows.push(row);
        self.parts.cols.push(col);
        self.parts.values.push(value);
    }

    /// Move every triple of `other` onto the end of this buffer.
    pub fn append(&mut self, other: &mut CooParts) {
        self.parts.rows.append(&mut other.rows);
        self.parts.cols.append(&mut other.cols);
        self.parts.values.append(&mut other.values);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Hand over the buffers, leaving the builder empty.
    pub fn drain(&mut self) -> CooParts {
        std::mem::take(&mut self.parts)
    }
}

/// Sort by `(col, row)`, sum duplicate keys and drop sums `<= epsilon`.
///
/// The sort is stable, so duplicates are summed in input order.
pub fn canonicalize(parts: CooParts, epsilon: f64) -> CooParts {
    let CooParts {
        mut rows,
        mut cols,
        mut values,
    } = parts;
    let n = values.len();
    if n == 0 {
        return CooParts::default();
    }

    let mut perm: Vec<usize> = (0..n).collect();
    if n >= PARALLEL_SORT_MIN {
        perm.par_sort_by_key(|&i| (cols[i], rows[i]));
    } else {
        perm.sort_by_key(|&i| (cols[i], rows[i]));
    }
    apply_permutation(&mut rows, &mut cols, &mut values, &perm);
    drop(perm);

    let mut out = CooParts {
        rows: Vec::with_capacity(n),
        cols: Vec::with_capacity(n),
        values: Vec::with_capacity(n),
    };

    let mut last_row = rows[0];
    let mut last_col = cols[0];
    let mut accum = values[0];
    for i in 1..n {
        if rows[i] == last_row && cols[i] == last_col {
            accum += values[i];
            continue;
        }
        if accum > epsilon {
            out.rows.push(last_row);
            out.cols.push(last_col);
            out.values.push(accum);
        }
        last_row = rows[i];
        last_col = cols[i];
        accum = values[i];
    }
    if accum > epsilon {
        out.rows.push(last_row);
        out.cols.push(last_col);
        out.values.push(accum);
    }

    debug!(
        "Canonicalized {} triples into {} non-zeros",
        n,
        out.values.len()
    );
    out.rows.shrink_to_fit();
    out.cols.shrink_to_fit();
    out.values.shrink_to_fit();
    out
}
