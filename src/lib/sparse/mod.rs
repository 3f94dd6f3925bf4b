//! Sparse feature-by-sample tables.
//!
//! Identifiers are dictionary-encoded ([`Dictionary`]), triples accumulate in
//! a [`CooBuilder`], and [`SparseTable`] owns the canonical form from which
//! the CSR and CSC projections ([`CompressedMatrix`]) are derived.

pub mod compressed;
pub mod coo;
pub mod dictionary;
pub mod permute;
pub mod table;

pub use compressed::{CompressedMatrix, Layout};
pub use coo::{canonicalize, CooBuilder, CooParts, EPSILON};
pub use dictionary::Dictionary;
pub use permute::{apply_permutation, Permuter};
pub use table::{SparseTable, MAX_AXIS_LEN};
