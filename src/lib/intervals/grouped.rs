//! One [`IntervalMerger`] per group key, e.g. per contig.

use crate::core::error::Result;
use crate::intervals::merger::{IntervalMerger, COMPACT_THRESHOLD};
use crate::sparse::Dictionary;

/// Coalesces intervals independently per group, reporting groups in the
/// order they were first seen.
#[derive(Debug, Clone)]
pub struct GroupedIntervals {
    groups: Dictionary,
    mergers: Vec<IntervalMerger>,
    threshold: usize,
}

impl Default for GroupedIntervals {
    fn default() -> Self {
        Self::with_threshold(COMPACT_THRESHOLD)
    }
}

impl GroupedIntervals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(threshold: usize) -> Self {
        Self {
            groups: Dictionary::new(),
            mergers: Vec::new(),
            threshold,
        }
    }

    pub fn add(&mut self, group: &str, start: i64, stop: i64) -> Result<()> {
        let idx = self.groups.intern(group)? as usize;
        if idx == self.mergers.len() {
            self.mergers.push(IntervalMerger::with_threshold(self.threshold));
        }
        self.mergers[idx].add(start, stop);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.mergers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mergers.is_empty()
    }

    /// Compact every group and yield `(group, start, stop)` rows.
    pub fn finish(self) -> impl Iterator<Item = (String, i64, i64)> {
        self.groups
            .into_ids()
            .into_iter()
            .zip(self.mergers)
            .flat_map(|(group, merger)| {
                merger
                    .into_intervals()
                    .unwrap_or_default()
                    .into_iter()
                    .map(move |(start, stop)| (group.clone(), start, stop))
            })
    }
}
