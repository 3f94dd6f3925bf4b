//! biomkit: sparse feature-by-sample tables in BIOM 2.1 layout
//!
//! The library provides:
//! 1. Dictionary-encoded COO accumulation with canonical ordering and duplicate summation
//! 2. CSR and CSC projections with `i32` indices
//! 3. A sink/combine/finalize aggregator for building one table from many workers
//! 4. Reading and writing tables through a narrow hierarchical container interface
//! 5. Streaming coalescing of genomic intervals, optionally grouped by key
//!
//! # Modules
//!
//! - [`sparse`]: dictionaries, COO canonicalization, compressed projections, [`sparse::SparseTable`]
//! - [`aggregate`]: concurrent construction of a table from streamed records
//! - [`container`]: container traits, the in-memory backend and BIOM read/write
//! - [`intervals`]: interval merging
//! - [`core`]: errors, options, IO and threading helpers shared by the CLI
//! - [`utils`]: flat re-exports of common helpers

pub mod aggregate;
pub mod container;
pub mod core;
pub mod intervals;
pub mod sparse;
pub mod utils;
