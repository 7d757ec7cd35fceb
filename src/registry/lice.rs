use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, SeaLiceError};
use crate::registry::table::TextTable;

/// Site codes that were misspelt in the consolidated lice counts, with their
/// correct spelling.
pub const LICE_KEY_TYPOS: [(&str, &str); 3] = [
    ("Fs0860", "FS0860"),
    ("Fs1018", "FS1018"),
    ("Fs1024", "FS1024"),
];

/// Weekly lice-per-fish counts keyed by regulatory site code, all sharing one
/// time axis.
#[derive(Debug, Clone, Default)]
pub struct LiceDataset {
    times: Vec<NaiveDate>,
    series: BTreeMap<String, Vec<Option<f64>>>,
}

impl LiceDataset {
    pub fn new(times: Vec<NaiveDate>, mut series: BTreeMap<String, Vec<Option<f64>>>) -> Self {
        for values in series.values_mut() {
            values.resize(times.len(), None);
        }
        merge_typos(&mut series);
        Self { times, series }
    }

    /// Reads a `time,<code>,<code>,...` table. Empty, `nan` or otherwise
    /// unparseable cells are missing samples.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let table = TextTable::read(path, b',')?;
        if table.height() == 0 {
            return Err(SeaLiceError::parse(path, 1, "empty lice dataset"));
        }
        let codes: Vec<String> = (1..table.width())
            .map(|col| table.cell(0, col).unwrap_or_default().to_string())
            .collect();

        let mut times = Vec::new();
        let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); codes.len()];

        for row in 1..table.height() {
            if table.is_blank(row) {
                continue;
            }
            let stamp = table.cell(row, 0).unwrap_or_default();
            let date = parse_day(stamp).ok_or_else(|| {
                SeaLiceError::parse(path, TextTable::line(row), format!("invalid date '{}'", stamp))
            })?;
            times.push(date);

            for (i, column) in columns.iter_mut().enumerate() {
                column.push(table.cell(row, i + 1).and_then(parse_sample));
            }
        }

        let series = codes.into_iter().zip(columns).collect();
        let dataset = Self::new(times, series);
        info!(
            sites = dataset.series.len(),
            samples = dataset.times.len(),
            "lice dataset loaded"
        );
        Ok(dataset)
    }

    pub fn times(&self) -> &[NaiveDate] {
        &self.times
    }

    pub fn get(&self, code: &str) -> Option<&[Option<f64>]> {
        self.series.get(code).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

fn merge_typos(series: &mut BTreeMap<String, Vec<Option<f64>>>) {
    for (typo, correct) in LICE_KEY_TYPOS {
        let Some(misspelt) = series.remove(typo) else {
            continue;
        };
        match series.get_mut(correct) {
            Some(target) => {
                for (slot, value) in target.iter_mut().zip(misspelt) {
                    if slot.is_none() {
                        *slot = value;
                    }
                }
                debug!(typo, correct, "merged misspelt lice series");
            }
            None => {
                series.insert(correct.to_string(), misspelt);
                debug!(typo, correct, "renamed misspelt lice series");
            }
        }
    }
}

fn parse_day(stamp: &str) -> Option<NaiveDate> {
    let day = stamp.get(..10).unwrap_or(stamp);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

pub(crate) fn parse_sample(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Mean of the defined samples, `None` when there are none.
pub(crate) fn mean_defined<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}
