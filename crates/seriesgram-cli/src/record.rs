//! Record file reader.
//!
//! A record file holds one record per line, as whitespace-separated columns.
//! The third column is the group key. After it, bracketed lists come in
//! pairs: a list of values followed by a list of Unix timestamps, e.g.
//!
//! ```text
//! 17  1491000000  books  [3, 2, 2]  [1491001200, 1491004800, 1491008400]
//! ```
//!
//! Each pair becomes one series. Lists may be split across columns. The
//! timestamps are turned into hours of the day unless raw positions are
//! requested.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader},
    num::ParseIntError,
    path::Path,
};

use anyhow::{Context, bail};
use chrono::{DateTime, Timelike as _};
use seriesgram_stats::{NumericSeries, SeriesCollection};
use tracing::debug;

const KEY_COLUMN: usize = 2;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ParseLineError {
    #[display("expected a key in column {}, found {found} columns", KEY_COLUMN + 1)]
    MissingKey { found: usize },
    #[display("list starting at column {column} is not closed")]
    UnclosedList { column: usize },
    #[display("list at column {column} has no paired position list")]
    UnpairedList { column: usize },
    #[display("invalid number `{token}`")]
    InvalidNumber { token: String, source: ParseIntError },
    #[display("timestamp {timestamp} is out of range")]
    InvalidTimestamp { timestamp: i64 },
}

/// How positions are derived from the raw timestamp lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionMode {
    /// Keep timestamps as they are.
    pub raw: bool,
    /// Hours added to the UTC hour of day, modulo 24.
    pub hour_offset: i64,
}

impl Default for PositionMode {
    fn default() -> Self {
        Self {
            raw: false,
            hour_offset: 5,
        }
    }
}

impl PositionMode {
    fn apply(self, timestamp: i64) -> Result<i64, ParseLineError> {
        if self.raw {
            Ok(timestamp)
        } else {
            hour_of_day(timestamp, self.hour_offset)
        }
    }
}

/// UTC hour of `timestamp`, shifted by `offset` hours and wrapped into `0..24`.
pub fn hour_of_day(timestamp: i64, offset: i64) -> Result<i64, ParseLineError> {
    let time =
        DateTime::from_timestamp(timestamp, 0).ok_or(ParseLineError::InvalidTimestamp { timestamp })?;
    Ok((i64::from(time.hour()) + offset).rem_euclid(24))
}

/// One record line: its key and the `(values, positions)` pairs it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RecordLine {
    key: String,
    pairs: Vec<(Vec<i64>, Vec<i64>)>,
}

fn parse_list(body: &str) -> Result<Vec<i64>, ParseLineError> {
    body.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse()
                .map_err(|source| ParseLineError::InvalidNumber {
                    token: token.to_owned(),
                    source,
                })
        })
        .collect()
}

/// Parses one line. Blank lines yield `None`.
fn parse_line(line: &str) -> Result<Option<RecordLine>, ParseLineError> {
    let columns = line.split_whitespace().collect::<Vec<_>>();
    if columns.is_empty() {
        return Ok(None);
    }
    let Some(key) = columns.get(KEY_COLUMN) else {
        return Err(ParseLineError::MissingKey {
            found: columns.len(),
        });
    };

    let mut lists = vec![];
    let mut i = KEY_COLUMN + 1;
    while i < columns.len() {
        if !columns[i].starts_with('[') {
            i += 1;
            continue;
        }
        let start = i;
        let mut body = String::new();
        loop {
            let Some(column) = columns.get(i) else {
                return Err(ParseLineError::UnclosedList { column: start + 1 });
            };
            body.push_str(column);
            body.push(' ');
            i += 1;
            if column.ends_with(']') {
                break;
            }
        }
        lists.push((start, parse_list(&body)?));
    }

    if lists.len() % 2 == 1 {
        let (start, _) = lists[lists.len() - 1];
        return Err(ParseLineError::UnpairedList { column: start + 1 });
    }

    let mut pairs = vec![];
    let mut lists = lists.into_iter().map(|(_, list)| list);
    while let (Some(values), Some(positions)) = (lists.next(), lists.next()) {
        pairs.push((values, positions));
    }

    Ok(Some(RecordLine {
        key: (*key).to_owned(),
        pairs,
    }))
}

/// Series read from a record file, grouped by key in key order.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub groups: BTreeMap<String, SeriesCollection<i64>>,
}

impl RecordSet {
    pub fn open<P>(path: P, mode: PositionMode) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let records = Self::from_reader(BufReader::new(file), mode)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        if records.groups.is_empty() {
            bail!("{} contains no records", path.display());
        }
        Ok(records)
    }

    pub fn from_reader<R>(reader: R, mode: PositionMode) -> anyhow::Result<Self>
    where
        R: BufRead,
    {
        let mut groups = BTreeMap::<String, SeriesCollection<i64>>::new();
        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line.with_context(|| format!("failed to read line {line_no}"))?;
            let Some(record) = parse_line(&line).with_context(|| format!("line {line_no}"))? else {
                continue;
            };

            let collection = groups.entry(record.key).or_default();
            for (values, timestamps) in record.pairs {
                let positions = timestamps
                    .into_iter()
                    .map(|t| mode.apply(t))
                    .collect::<Result<Vec<_>, _>>()
                    .with_context(|| format!("line {line_no}"))?;
                let series = NumericSeries::new(values, positions)
                    .with_context(|| format!("line {line_no}"))?;
                collection.append(series);
            }
        }

        groups.retain(|key, collection| {
            if collection.is_empty() {
                debug!(%key, "dropping group without series");
            }
            !collection.is_empty()
        });
        Ok(Self { groups })
    }

    pub fn num_series(&self) -> usize {
        self.groups.values().map(SeriesCollection::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: PositionMode = PositionMode {
        raw: true,
        hour_offset: 0,
    };

    #[test]
    fn test_parse_line_single_pair() {
        let record = parse_line("1\t100\tbooks\t[3, 2, 2]\t[10, 11, 12]")
            .unwrap()
            .unwrap();
        assert_eq!(record.key, "books");
        assert_eq!(record.pairs, [(vec![3, 2, 2], vec![10, 11, 12])]);
    }

    #[test]
    fn test_parse_line_compact_and_multiple_pairs() {
        let record = parse_line("a b toys [4] [7] [1,2] [8,9]").unwrap().unwrap();
        assert_eq!(
            record.pairs,
            [(vec![4], vec![7]), (vec![1, 2], vec![8, 9])]
        );
    }

    #[test]
    fn test_parse_line_without_lists() {
        let record = parse_line("a b toys trailing text").unwrap().unwrap();
        assert_eq!(record.key, "toys");
        assert!(record.pairs.is_empty());
    }

    #[test]
    fn test_parse_line_blank() {
        assert_eq!(parse_line("   \t ").unwrap(), None);
    }

    #[test]
    fn test_parse_line_errors() {
        assert!(matches!(
            parse_line("only two"),
            Err(ParseLineError::MissingKey { found: 2 })
        ));
        assert!(matches!(
            parse_line("a b k [1, 2"),
            Err(ParseLineError::UnclosedList { column: 4 })
        ));
        assert!(matches!(
            parse_line("a b k [1] [2] [3]"),
            Err(ParseLineError::UnpairedList { column: 6 })
        ));
        let err = parse_line("a b k [1, x] [2, 3]").unwrap_err();
        assert_eq!(err.to_string(), "invalid number `x`");
    }

    #[test]
    fn test_hour_of_day() {
        // 2017-04-01T00:00:00Z
        assert_eq!(hour_of_day(1_491_004_800, 0).unwrap(), 0);
        assert_eq!(hour_of_day(1_491_004_800 + 3 * 3600, 5).unwrap(), 8);
        assert_eq!(hour_of_day(1_491_004_800 + 22 * 3600, 5).unwrap(), 3);
        assert_eq!(hour_of_day(1_491_004_800, -1).unwrap(), 23);
        assert!(hour_of_day(i64::MAX, 0).is_err());
    }

    #[test]
    fn test_from_reader_groups_by_key() {
        let input = "\
1 0 toys [1, 2] [0, 1]
2 0 books [5] [3]

3 0 toys [4, 4, 4] [2, 3, 4] [9] [9]
";
        let records = RecordSet::from_reader(input.as_bytes(), RAW).unwrap();
        assert_eq!(records.groups.keys().collect::<Vec<_>>(), ["books", "toys"]);
        assert_eq!(records.num_series(), 4);

        let toys = &records.groups["toys"];
        let lengths = toys.iter().map(NumericSeries::len).collect::<Vec<_>>();
        assert_eq!(lengths, [2, 3, 1]);
        assert_eq!(toys.iter().nth(1).unwrap().positions(), &[2, 3, 4]);
    }

    #[test]
    fn test_from_reader_converts_timestamps() {
        let input = "1 0 k [2, 3] [1491004800, 1491008400]\n";
        let records = RecordSet::from_reader(input.as_bytes(), PositionMode::default()).unwrap();
        let series = &records.groups["k"].series()[0];
        assert_eq!(series.positions(), &[5, 6]);
    }

    #[test]
    fn test_from_reader_reports_line() {
        let input = "1 0 k [1] [1]\n2 0 k [1, 2] [1]\n";
        let err = RecordSet::from_reader(input.as_bytes(), RAW).unwrap_err();
        assert_eq!(err.to_string(), "line 2");
        assert_eq!(
            err.root_cause().to_string(),
            "series has 2 values but 1 positions"
        );
    }

    #[test]
    fn test_from_reader_drops_groups_without_series() {
        let input = "1 0 empty no lists here\n2 0 k [1] [1]\n";
        let records = RecordSet::from_reader(input.as_bytes(), RAW).unwrap();
        assert_eq!(records.groups.keys().collect::<Vec<_>>(), ["k"]);
    }
}
