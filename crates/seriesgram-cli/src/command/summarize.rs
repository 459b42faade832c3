use std::{collections::BTreeMap, path::PathBuf};

use anyhow::Context;
use seriesgram_stats::{Basis, CollectionSummary, SeriesCollection, SeriesSummary};
use serde::Serialize;

use crate::util::Output;

use super::InputArg;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SummarizeArg {
    #[clap(flatten)]
    input: InputArg,
    /// Output file path (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
struct GroupSummary {
    series: usize,
    bounds: CollectionSummary<i64>,
    concatenated: SeriesSummary<i64>,
    unique_mean: f64,
    unique_spread: f64,
}

impl GroupSummary {
    fn new(collection: &SeriesCollection<i64>) -> anyhow::Result<Self> {
        let concatenated = collection.concatenate()?;
        Ok(Self {
            series: collection.len(),
            bounds: collection.summary()?,
            concatenated: concatenated.summary(),
            unique_mean: concatenated.mean(Basis::UniqueOnly),
            unique_spread: concatenated.variance(Basis::UniqueOnly),
        })
    }
}

pub(crate) fn run(arg: &SummarizeArg) -> anyhow::Result<()> {
    let records = arg.input.load()?;
    let summaries = records
        .groups
        .iter()
        .map(|(key, collection)| {
            let summary = GroupSummary::new(collection)
                .with_context(|| format!("Failed to summarize key `{key}`"))?;
            Ok((key.as_str(), summary))
        })
        .collect::<anyhow::Result<BTreeMap<_, _>>>()?;
    Output::save_json(&summaries, arg.output.clone())
}
