use polars::prelude::*;
use std::fs::File;
use std::path::Path;

use crate::error::Result;

/// A delimited text file with every cell kept as a string.
///
/// The first line is read as a plain row rather than a header, so callers
/// address columns by position and row `r` sits on line `r + 1`.
pub(crate) struct TextTable {
    columns: Vec<StringChunked>,
    height: usize,
}

impl TextTable {
    pub(crate) fn read(path: &Path, separator: u8) -> Result<Self> {
        let file = File::open(path)?;
        let df = CsvReadOptions::default()
            .with_has_header(false)
            .with_infer_schema_length(Some(0)) // all columns as String
            .map_parse_options(|opts| opts.with_separator(separator))
            .into_reader_with_file_handle(file)
            .finish()?;

        let columns = df
            .get_columns()
            .iter()
            .map(|column| column.str().cloned())
            .collect::<PolarsResult<Vec<_>>>()?;

        Ok(Self {
            columns,
            height: df.height(),
        })
    }

    pub(crate) fn height(&self) -> usize {
        self.height
    }

    pub(crate) fn width(&self) -> usize {
        self.columns.len()
    }

    /// Trimmed cell text, `None` when the cell is missing or blank.
    pub(crate) fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.columns
            .get(col)?
            .get(row)
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    pub(crate) fn is_blank(&self, row: usize) -> bool {
        (0..self.width()).all(|col| self.cell(row, col).is_none())
    }

    /// One-based line number of a row.
    pub(crate) fn line(row: usize) -> usize {
        row + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_quoted_fields_keep_their_separators() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sites.csv");
        std::fs::write(&path, "site,name,lat\nA,\"Loch Alpha, North\",56.5\nB,,57\n").unwrap();

        let table = TextTable::read(&path, b',').unwrap();

        assert_eq!(table.width(), 3);
        assert_eq!(table.height(), 3);
        assert_eq!(table.cell(1, 1), Some("Loch Alpha, North"));
        assert_eq!(table.cell(1, 2), Some("56.5"));
        assert_eq!(table.cell(2, 1), None);
        assert_eq!(table.cell(2, 7), None);
        assert!(!table.is_blank(2));
    }
}
