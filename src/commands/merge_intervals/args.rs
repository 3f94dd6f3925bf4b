use biomkit_lib::intervals::COMPACT_THRESHOLD;
use lazy_static::lazy_static;
use std::path::PathBuf;
use structopt::StructOpt;

lazy_static! {
    /// [`COMPACT_THRESHOLD`] as a string.
    static ref COMPACT_THRESHOLD_STR: String = COMPACT_THRESHOLD.to_string();
}

/// CLI arguments for the `merge-intervals` subcommand.
#[derive(Debug, Clone, StructOpt)]
#[structopt(author, name = "merge-intervals")]
pub struct MergeIntervalsArgs {
    /// Tab-separated `start`, `stop` (or `group`, `start`, `stop` with `--grouped`);
    /// `-` or absent reads stdin.
    pub input: Option<PathBuf>,

    /// Output TSV (stdout when absent). A `.gz` extension enables gzip.
    #[structopt(long, short = "o")]
    pub output: Option<PathBuf>,

    /// First column is a group key; intervals merge within each group.
    #[structopt(long, short = "g")]
    pub grouped: bool,

    /// Input has no header line; columns are taken by position.
    #[structopt(long)]
    pub no_header: bool,

    /// Uncompacted additions per group before an automatic compaction.
    #[structopt(long, default_value = COMPACT_THRESHOLD_STR.as_str())]
    pub compact_threshold: usize,
}

/// Normalised configuration derived from [`MergeIntervalsArgs`].
#[derive(Debug, Clone)]
pub struct MergeIntervalsConfig {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub grouped: bool,
    pub has_headers: bool,
    pub gzip_input: bool,
    pub gzip_output: bool,
    pub compact_threshold: usize,
}

impl From<MergeIntervalsArgs> for MergeIntervalsConfig {
    fn from(args: MergeIntervalsArgs) -> MergeIntervalsConfig {
        let gzipped = |path: &Option<PathBuf>| {
            path.as_ref().map_or(false, biomkit_lib::utils::is_gzipped)
        };
        MergeIntervalsConfig {
            gzip_input: gzipped(&args.input),
            gzip_output: gzipped(&args.output),
            input: args.input,
            output: args.output,
            grouped: args.grouped,
            has_headers: !args.no_header,
            compact_threshold: args.compact_threshold.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_threshold() -> anyhow::Result<()> {
        let args = MergeIntervalsArgs::from_iter_safe(&["merge-intervals"])?;
        let config = MergeIntervalsConfig::from(args);
        assert_eq!(config.compact_threshold, COMPACT_THRESHOLD);
        assert!(!config.grouped);
        assert!(config.has_headers);
        Ok(())
    }

    #[test]
    fn gzip_detection() -> anyhow::Result<()> {
        let args = MergeIntervalsArgs::from_iter_safe(&[
            "merge-intervals",
            "regions.tsv.gz",
            "-g",
            "--compact-threshold",
            "0",
        ])?;
        let config = MergeIntervalsConfig::from(args);
        assert!(config.gzip_input);
        assert!(!config.gzip_output);
        assert!(config.grouped);
        assert_eq!(config.compact_threshold, 1);
        Ok(())
    }
}
