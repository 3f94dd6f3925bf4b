mod args;

use anyhow::Result;
use biomkit_lib::intervals::{GroupedIntervals, IntervalMerger};
use biomkit_lib::utils;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

pub use args::{MergeIntervalsArgs, MergeIntervalsConfig};

#[derive(Debug, Deserialize)]
struct IntervalRow {
    start: Option<i64>,
    stop: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct GroupedIntervalRow {
    group: Option<String>,
    start: Option<i64>,
    stop: Option<i64>,
}

#[derive(Debug, Serialize)]
struct MergedRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<&'a str>,
    start: i64,
    stop: i64,
}

/// Counts reported after a merge.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    pub read: usize,
    pub skipped: usize,
    pub written: usize,
}

/// Coalesce `start`/`stop` rows. Rows missing either bound are skipped.
pub fn merge_plain<R: Read, W: Write>(
    reader: &mut csv::Reader<R>,
    writer: &mut csv::Writer<W>,
    threshold: usize,
) -> Result<MergeSummary> {
    let mut summary = MergeSummary::default();
    let mut merger = IntervalMerger::with_threshold(threshold);
    for row in reader.deserialize::<IntervalRow>() {
        let row = row?;
        summary.read += 1;
        match (row.start, row.stop) {
            (Some(start), Some(stop)) => merger.add(start, stop),
            _ => summary.skipped += 1,
        }
    }
    for (start, stop) in merger.into_intervals().unwrap_or_default() {
        writer.serialize(MergedRow {
            group: None,
            start,
            stop,
        })?;
        summary.written += 1;
    }
    Ok(summary)
}

/// Coalesce `group`/`start`/`stop` rows within each group. A missing group
/// key forms its own group, written as an empty field.
pub fn merge_grouped<R: Read, W: Write>(
    reader: &mut csv::Reader<R>,
    writer: &mut csv::Writer<W>,
    threshold: usize,
) -> Result<MergeSummary> {
    let mut summary = MergeSummary::default();
    let mut grouped = GroupedIntervals::with_threshold(threshold);
    for row in reader.deserialize::<GroupedIntervalRow>() {
        let row = row?;
        summary.read += 1;
        match (row.start, row.stop) {
            (Some(start), Some(stop)) => {
                grouped.add(row.group.as_deref().unwrap_or(""), start, stop)?
            }
            _ => summary.skipped += 1,
        }
    }
    for (group, start, stop) in grouped.finish() {
        writer.serialize(MergedRow {
            group: Some(&group),
            start,
            stop,
        })?;
        summary.written += 1;
    }
    Ok(summary)
}

/// Execute the `merge-intervals` command end-to-end.
pub fn run_merge_intervals(args: MergeIntervalsArgs) -> Result<()> {
    let config: MergeIntervalsConfig = args.into();
    info!("Running biomkit merge-intervals on {:?}", config.input);

    let mut reader = utils::get_reader(&config.input, config.has_headers, config.gzip_input)?;
    if let Some(output) = &config.output {
        utils::make_parent_dirs(output)?;
    }
    let mut writer = utils::get_writer(&config.output, config.gzip_output, true, 1, 6)?;

    let summary = if config.grouped {
        merge_grouped(&mut reader, &mut writer, config.compact_threshold)?
    } else {
        merge_plain(&mut reader, &mut writer, config.compact_threshold)?
    };
    writer.flush()?;

    if summary.skipped > 0 {
        warn!("Skipped {} rows with a missing start or stop", summary.skipped);
    }
    info!(
        "Merged {} intervals into {} ranges",
        summary.read - summary.skipped,
        summary.written
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str, grouped: bool, threshold: usize) -> Result<(String, MergeSummary)> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_reader(input.as_bytes());
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(Vec::new());
        let summary = if grouped {
            merge_grouped(&mut reader, &mut writer, threshold)?
        } else {
            merge_plain(&mut reader, &mut writer, threshold)?
        };
        Ok((String::from_utf8(writer.into_inner()?)?, summary))
    }

    #[test]
    fn plain_merge() -> Result<()> {
        let (out, summary) = run("start\tstop\n500\t600\n100\t200\n150\t350\n300\t400\n", false, 2)?;
        assert_eq!(out, "start\tstop\n100\t400\n500\t600\n");
        assert_eq!(summary, MergeSummary { read: 4, skipped: 0, written: 2 });
        Ok(())
    }

    #[test]
    fn missing_bounds_are_skipped() -> Result<()> {
        let (out, summary) = run("start\tstop\n10\t\n\t20\n30\t40\n", false, 100)?;
        assert_eq!(out, "start\tstop\n30\t40\n");
        assert_eq!(summary.skipped, 2);
        Ok(())
    }

    #[test]
    fn empty_input_writes_nothing() -> Result<()> {
        let (out, summary) = run("start\tstop\n", false, 100)?;
        assert_eq!(out, "");
        assert_eq!(summary.written, 0);
        Ok(())
    }

    #[test]
    fn grouped_merge_keeps_first_seen_order() -> Result<()> {
        let input = "group\tstart\tstop\nchr2\t10\t20\nchr1\t5\t8\nchr2\t20\t30\nchr1\t1\t5\n";
        let (out, summary) = run(input, true, 1_000)?;
        assert_eq!(out, "group\tstart\tstop\nchr2\t10\t30\nchr1\t1\t8\n");
        assert_eq!(summary.written, 2);
        Ok(())
    }
}
