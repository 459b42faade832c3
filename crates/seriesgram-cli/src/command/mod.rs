use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use seriesgram_stats::{HistogramGrid, RangePolicy};
use tracing::info;

use crate::record::{PositionMode, RecordSet};

use self::{hist::HistArg, summarize::SummarizeArg, traits::TraitsArg};

mod hist;
mod summarize;
mod traits;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Write one 2D histogram per key
    Hist(#[clap(flatten)] HistArg),
    /// Write the trait vector of every series, one file per key
    Traits(#[clap(flatten)] TraitsArg),
    /// Print aggregate statistics per key as JSON
    Summarize(#[clap(flatten)] SummarizeArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Hist(arg) => hist::run(&arg)?,
        Mode::Traits(arg) => traits::run(&arg)?,
        Mode::Summarize(arg) => summarize::run(&arg)?,
    }
    Ok(())
}

#[derive(Debug, Clone, clap::Args)]
struct InputArg {
    /// Record file to read
    input: PathBuf,
    /// Hours added to the UTC hour of each timestamp
    #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
    hour_offset: i64,
    /// Use timestamps as positions without converting them to hours
    #[arg(long, default_value_t = false)]
    raw_positions: bool,
}

impl InputArg {
    fn load(&self) -> anyhow::Result<RecordSet> {
        let mode = PositionMode {
            raw: self.raw_positions,
            hour_offset: self.hour_offset,
        };
        let records = RecordSet::open(&self.input, mode)?;
        info!(
            path = %self.input.display(),
            keys = records.groups.len(),
            series = records.num_series(),
            "records loaded"
        );
        Ok(records)
    }
}

#[derive(Debug, Clone, clap::Args)]
struct GridArg {
    /// Number of bins along the position axis
    #[arg(long, default_value_t = 12)]
    x_bins: usize,
    /// Number of bins along the value axis
    #[arg(long, default_value_t = 12)]
    y_bins: usize,
    #[arg(long, default_value_t = -0.1, allow_negative_numbers = true)]
    x_min: f64,
    #[arg(long, default_value_t = 24.0, allow_negative_numbers = true)]
    x_max: f64,
    #[arg(long, default_value_t = -0.1, allow_negative_numbers = true)]
    y_min: f64,
    #[arg(long, default_value_t = 25.1, allow_negative_numbers = true)]
    y_max: f64,
    /// Clamp coordinates outside the grid into the edge bins instead of failing
    #[arg(long, default_value_t = false)]
    clamp: bool,
}

impl GridArg {
    fn build(&self) -> anyhow::Result<HistogramGrid> {
        let grid = HistogramGrid::new(
            self.x_bins,
            self.y_bins,
            self.x_min,
            self.x_max,
            self.y_min,
            self.y_max,
        )
        .context("Invalid histogram parameters")?;
        let policy = if self.clamp {
            RangePolicy::Clamp
        } else {
            RangePolicy::Reject
        };
        Ok(grid.with_range_policy(policy))
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_command_args() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_parse_hist_defaults() {
        let args = CommandArgs::try_parse_from(["seriesgram", "hist", "data.txt"]).unwrap();
        let Mode::Hist(arg) = args.mode else {
            panic!("expected hist");
        };
        assert_eq!(arg.alignment, "by-x");
        assert_eq!(arg.input.hour_offset, 5);
        let grid = arg.grid.build().unwrap();
        assert_eq!((grid.x_bins(), grid.y_bins()), (12, 12));
        assert_eq!(grid.x_range(), (-0.1, 24.0));
        assert_eq!(grid.y_range(), (-0.1, 25.1));
        assert_eq!(grid.range_policy(), RangePolicy::Reject);
    }

    #[test]
    fn test_parse_grid_options() {
        let args = CommandArgs::try_parse_from([
            "seriesgram",
            "hist",
            "data.txt",
            "--x-bins",
            "4",
            "--x-min",
            "-2",
            "--hour-offset",
            "-3",
            "--clamp",
        ])
        .unwrap();
        let Mode::Hist(arg) = args.mode else {
            panic!("expected hist");
        };
        assert_eq!(arg.input.hour_offset, -3);
        let grid = arg.grid.build().unwrap();
        assert_eq!(grid.x_bins(), 4);
        assert_eq!(grid.x_range(), (-2.0, 24.0));
        assert_eq!(grid.range_policy(), RangePolicy::Clamp);
    }

    #[test]
    fn test_invalid_grid_is_reported() {
        let args =
            CommandArgs::try_parse_from(["seriesgram", "hist", "data.txt", "--y-bins", "0"])
                .unwrap();
        let Mode::Hist(arg) = args.mode else {
            panic!("expected hist");
        };
        let err = arg.grid.build().unwrap_err();
        assert_eq!(err.root_cause().to_string(), "y axis needs at least one bin");
    }
}
