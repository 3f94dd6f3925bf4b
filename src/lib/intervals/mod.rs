//! Genomic interval coalescing.
//!
//! [`IntervalMerger`] folds a stream of half-open `[start, stop)` intervals
//! into a disjoint union with bounded memory; [`GroupedIntervals`] keeps one
//! merger per group key.

pub mod grouped;
pub mod merger;

pub use grouped::GroupedIntervals;
pub use merger::{IntervalMerger, COMPACT_THRESHOLD};
