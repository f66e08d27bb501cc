// src/extract/workbook.rs

use calamine::{open_workbook_auto, Data, DataType, Range, Reader};
use chrono::NaiveDateTime;
use std::path::Path;
use tracing::{debug, instrument};

use super::{extract_grid, CellValue, Grid, SheetSource};
use crate::error::ConvertError;

/// First worksheet of a workbook opened through calamine, whichever tab was
/// active when it was saved. Formula cells carry their cached results, so
/// every value here is already evaluated.
pub struct CalamineSheet {
    range: Range<Data>,
}

impl CalamineSheet {
    pub fn new(range: Range<Data>) -> Self {
        Self { range }
    }

    /// Opens `path` (xlsx, xlsm, xlsb, xls or ods, sniffed by extension)
    /// and loads its first sheet.
    pub fn open(path: &Path) -> Result<Self, ConvertError> {
        let parse_err = |source| ConvertError::Parse {
            path: path.to_path_buf(),
            source,
        };

        let mut workbook = open_workbook_auto(path).map_err(parse_err)?;
        let range = workbook
            .worksheet_range_at(0)
            .unwrap_or(Err(calamine::Error::Msg("workbook contains no sheets")))
            .map_err(parse_err)?;

        debug!(start = ?range.start(), end = ?range.end(), "loaded sheet range");
        Ok(Self::new(range))
    }
}

impl SheetSource for CalamineSheet {
    // Counted from A1 rather than from the first stored cell. An empty
    // sheet still reports a single row and column.
    fn highest_row(&self) -> usize {
        self.range.end().map_or(1, |(row, _)| row as usize + 1)
    }

    fn highest_column(&self) -> usize {
        self.range.end().map_or(1, |(_, col)| col as usize + 1)
    }

    fn cell(&self, row: usize, col: usize) -> CellValue {
        self.range
            .get_value((row as u32, col as u32))
            .map_or(CellValue::Blank, to_cell_value)
    }
}

fn to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Blank,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s.as_str()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::text(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => CellValue::text(e.to_string()),
        Data::DateTime(_) => match data.as_datetime() {
            Some(dt) => CellValue::text(format_datetime(&dt)),
            None => data.as_f64().map_or(CellValue::Blank, CellValue::Number),
        },
    }
}

fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Opens the workbook at `path` and materializes its used range.
#[instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_grid<P: AsRef<Path>>(path: P) -> Result<Grid, ConvertError> {
    let sheet = CalamineSheet::open(path.as_ref())?;
    let grid = extract_grid(&sheet);
    debug!(
        rows = grid.highest_row(),
        columns = grid.highest_column(),
        "extracted grid"
    );
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_used_range_from_xlsx() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("book.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "name")?;
        sheet.write_string(0, 1, " qty ")?;
        sheet.write_number(1, 1, 42.0)?;
        sheet.write_number(1, 2, 2.5)?;
        sheet.write_boolean(3, 0, true)?;
        workbook.save(&path)?;

        let grid = load_grid(&path)?;
        assert_eq!(grid.highest_row(), 4);
        assert_eq!(grid.highest_column(), 3);
        assert_eq!(grid.shape().dimensions(), "C4");

        let rows = grid.rows();
        assert_eq!(rows[0][0], CellValue::text("name"));
        assert_eq!(rows[0][1].trimmed(), "qty");
        assert_eq!(rows[1][1].as_text(), "42");
        assert_eq!(rows[1][2].as_text(), "2.5");
        assert!(rows[2].iter().all(CellValue::is_blank));
        assert_eq!(rows[3][0], CellValue::text("TRUE"));
        Ok(())
    }

    #[test]
    fn used_range_is_anchored_at_a1() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("offset.xlsx");

        let mut workbook = Workbook::new();
        workbook.add_worksheet().write_string(2, 3, "far")?;
        workbook.save(&path)?;

        let grid = load_grid(&path)?;
        assert_eq!(grid.shape().dimensions(), "D3");
        assert_eq!(grid.rows()[2][3], CellValue::text("far"));
        assert!(grid.rows()[0].iter().all(CellValue::is_blank));
        Ok(())
    }

    #[test]
    fn empty_sheet_reports_a1() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.xlsx");

        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        workbook.save(&path)?;

        let grid = load_grid(&path)?;
        assert_eq!(grid.shape().dimensions(), "A1");
        assert_eq!(grid.rows(), &[vec![CellValue::Blank]]);
        Ok(())
    }

    #[test]
    fn datetimes_render_as_iso_timestamps() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("dates.xlsx");

        let stamp = ExcelDateTime::from_ymd(2024, 3, 5)?.and_hms(14, 30, 0)?;
        let format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
        let mut workbook = Workbook::new();
        workbook
            .add_worksheet()
            .write_datetime_with_format(0, 0, &stamp, &format)?;
        workbook.save(&path)?;

        let grid = load_grid(&path)?;
        assert_eq!(grid.rows()[0][0], CellValue::text("2024-03-05 14:30:00"));
        Ok(())
    }

    #[test]
    fn first_sheet_is_read_even_when_another_tab_is_active() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("tabs.xlsx");

        let mut workbook = Workbook::new();
        workbook.add_worksheet().write_string(0, 0, "first")?;
        let second = workbook.add_worksheet();
        second.write_string(0, 0, "second")?;
        second.set_active(true);
        workbook.save(&path)?;

        let grid = load_grid(&path)?;
        assert_eq!(grid.rows()[0][0], CellValue::text("first"));
        Ok(())
    }

    #[test]
    fn corrupt_file_is_a_parse_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.xlsx");
        fs::write(&path, b"definitely not a zip container")?;

        match load_grid(&path) {
            Err(ConvertError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected parse error, got {:?}", other.map(|g| g.shape())),
        }
        Ok(())
    }
}
