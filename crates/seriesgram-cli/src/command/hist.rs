use std::path::PathBuf;

use anyhow::Context;
use seriesgram_stats::Alignment;
use tracing::warn;

use crate::report;

use super::{GridArg, InputArg};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct HistArg {
    #[clap(flatten)]
    pub(super) input: InputArg,
    #[clap(flatten)]
    pub(super) grid: GridArg,
    /// Alignment policy: front, back, at-max, at-min or by-x
    #[arg(long, default_value = "by-x")]
    pub(super) alignment: String,
    /// Directory the histogram files are written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

pub(crate) fn run(arg: &HistArg) -> anyhow::Result<()> {
    let HistArg {
        input,
        grid: grid_arg,
        alignment,
        output_dir,
    } = arg;

    if alignment.parse::<Alignment>().is_err() {
        warn!(%alignment, "histograms will stay empty");
    }

    let records = input.load()?;
    for (key, collection) in &records.groups {
        let mut grid = grid_arg.build()?;
        grid.add_collection_named(collection, alignment)
            .with_context(|| format!("Failed to bin series of key `{key}`"))?;
        report::save_histogram(output_dir, key, alignment, &grid)?;
    }
    Ok(())
}
