pub mod common;
pub mod merge_intervals;
pub mod pack;
pub mod probe;
pub mod unpack;

pub use merge_intervals::{run_merge_intervals, MergeIntervalsArgs};
pub use pack::{run_pack, PackArgs};
pub use probe::{run_probe, ProbeArgs};
pub use unpack::{run_unpack, UnpackArgs};
