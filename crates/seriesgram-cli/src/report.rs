//! Per-key report files.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::Context;
use seriesgram_stats::{HistogramGrid, Numeric, SeriesCollection};
use tracing::info;

use crate::util::Output;

/// Replaces characters that are unsafe in a file name.
fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn histogram_path(dir: &Path, key: &str, alignment: &str) -> PathBuf {
    dir.join(format!("{}_{}_.txt", file_stem(key), file_stem(alignment)))
}

pub fn traits_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{}_traits_.csv", file_stem(key)))
}

/// Writes one trait vector per series, in collection order.
pub fn write_traits<W, T>(sink: &mut W, collection: &SeriesCollection<T>) -> io::Result<()>
where
    W: io::Write + ?Sized,
    T: Numeric,
{
    for series in collection {
        writeln!(sink, "{}", series.summary())?;
    }
    Ok(())
}

fn create_in(dir: &Path, path: PathBuf) -> anyhow::Result<Output> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    Output::open(path)
}

pub fn save_histogram(
    dir: &Path,
    key: &str,
    alignment: &str,
    grid: &HistogramGrid,
) -> anyhow::Result<PathBuf> {
    let path = histogram_path(dir, key, alignment);
    let mut output = create_in(dir, path.clone())?;
    output.write_with(|sink| grid.render(sink))?;
    info!(key, total = grid.total(), path = %path.display(), "histogram written");
    Ok(path)
}

pub fn save_traits<T>(dir: &Path, key: &str, collection: &SeriesCollection<T>) -> anyhow::Result<PathBuf>
where
    T: Numeric,
{
    let path = traits_path(dir, key);
    let mut output = create_in(dir, path.clone())?;
    output.write_with(|sink| write_traits(sink, collection))?;
    info!(key, series = collection.len(), path = %path.display(), "traits written");
    Ok(path)
}
