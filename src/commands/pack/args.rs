use anyhow::Result;
use biomkit_lib::aggregate::stream::DEFAULT_BATCH_SIZE;
use biomkit_lib::core::options::{WriteOptions, DEFAULT_TABLE_ID};
use lazy_static::lazy_static;
use std::path::PathBuf;
use structopt::StructOpt;

lazy_static! {
    static ref DEFAULT_BATCH_SIZE_STR: String = DEFAULT_BATCH_SIZE.to_string();
}

/// CLI arguments for the `pack` subcommand.
#[derive(Debug, Clone, StructOpt)]
#[structopt(author, name = "pack")]
pub struct PackArgs {
    /// Tab-separated triples `feature_id`, `sample_id`, `value`; `-` or absent reads stdin.
    /// Gzip input is detected from the extension.
    pub input: Option<PathBuf>,

    /// Output BIOM file.
    #[structopt(long, short = "o")]
    pub output: PathBuf,

    /// Input has no header line; columns are taken by position.
    #[structopt(long)]
    pub no_header: bool,

    /// Dataset compression: gzip, gz or none.
    #[structopt(long, default_value = "gzip")]
    pub compression: String,

    /// Table identifier stored in the `id` attribute.
    #[structopt(long, default_value = DEFAULT_TABLE_ID)]
    pub id: String,

    /// Value of the `generated-by` attribute.
    #[structopt(long)]
    pub generated_by: Option<String>,

    /// Number of worker threads to use.
    #[structopt(long, short = "t", default_value = "4")]
    pub threads: usize,

    /// Records per batch handed to a worker.
    #[structopt(long, short = "b", default_value = DEFAULT_BATCH_SIZE_STR.as_str())]
    pub batch_size: usize,
}

/// Normalised configuration derived from [`PackArgs`].
#[derive(Debug, Clone)]
pub struct PackConfig {
    pub input: Option<PathBuf>,
    pub output: PathBuf,
    pub has_headers: bool,
    pub threads: usize,
    pub batch_size: usize,
    option_pairs: Vec<(&'static str, String)>,
}

impl From<PackArgs> for PackConfig {
    fn from(args: PackArgs) -> PackConfig {
        let mut option_pairs = vec![("compression", args.compression), ("id", args.id)];
        if let Some(generated_by) = args.generated_by {
            option_pairs.push(("generated_by", generated_by));
        }
        PackConfig {
            input: args.input,
            output: args.output,
            has_headers: !args.no_header,
            threads: args.threads,
            batch_size: args.batch_size.max(1),
            option_pairs,
        }
    }
}

impl PackConfig {
    /// Validate the writer options the same way a host would pass them.
    pub fn write_options(&self) -> Result<WriteOptions> {
        Ok(WriteOptions::from_pairs(
            self.option_pairs.iter().map(|(k, v)| (*k, v.as_str())),
        )?)
    }
}
