use std::path::PathBuf;
use structopt::StructOpt;

/// CLI arguments for the `unpack` subcommand.
#[derive(Debug, Clone, StructOpt)]
#[structopt(author, name = "unpack")]
pub struct UnpackArgs {
    /// BIOM files to read.
    #[structopt(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output TSV (stdout when absent). A `.gz` extension enables gzip.
    #[structopt(long, short = "o")]
    pub output: Option<PathBuf>,

    /// Append a `filepath` column naming the source file of each row.
    #[structopt(long)]
    pub include_filepath: bool,

    /// Threads used for gzip output.
    #[structopt(long, short = "t", default_value = "1")]
    pub threads: usize,
}

/// Normalised configuration derived from [`UnpackArgs`].
#[derive(Debug, Clone)]
pub struct UnpackConfig {
    pub inputs: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub include_filepath: bool,
    pub gzip_output: bool,
    pub threads: usize,
}

impl From<UnpackArgs> for UnpackConfig {
    fn from(args: UnpackArgs) -> UnpackConfig {
        let gzip_output = args
            .output
            .as_ref()
            .map_or(false, biomkit_lib::utils::is_gzipped);
        UnpackConfig {
            inputs: args.inputs,
            output: args.output,
            include_filepath: args.include_filepath,
            gzip_output,
            threads: args.threads.max(1),
        }
    }
}
