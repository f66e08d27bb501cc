// src/extract/mod.rs

use std::borrow::Cow;

pub mod workbook;

pub use workbook::{load_grid, CalamineSheet};

/// A single evaluated cell, normalized at the grid boundary.
/// Absent cells and empty strings are both `Blank`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Blank,
}

impl CellValue {
    /// Builds a text cell, folding the empty string into `Blank`.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            CellValue::Blank
        } else {
            CellValue::Text(s)
        }
    }

    /// String rendering of the cell, untrimmed.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Text(s) => Cow::Borrowed(s.as_str()),
            CellValue::Number(n) => Cow::Owned(format_number(*n)),
            CellValue::Blank => Cow::Borrowed(""),
        }
    }

    pub fn trimmed(&self) -> String {
        self.as_text().trim().to_string()
    }

    /// True when nothing but whitespace survives rendering.
    pub fn is_blank(&self) -> bool {
        self.as_text().trim().is_empty()
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// Integral values print without a fractional part (`3`, not `3.0`).
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// 1-based column number to spreadsheet letters: 1 → `A`, 28 → `AB`.
pub fn column_letter(mut column: usize) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(b'A' + rem as u8);
        column = (column - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Size of the used range, kept after the grid itself is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetShape {
    pub highest_row: usize,
    pub highest_column: usize,
}

impl SheetShape {
    /// Bottom-right corner of the used range, e.g. `D12`.
    pub fn dimensions(&self) -> String {
        format!(
            "{}{}",
            column_letter(self.highest_column.max(1)),
            self.highest_row.max(1)
        )
    }
}

/// Rectangular matrix of evaluated cells covering the used range.
/// Every row holds exactly `highest_column` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<CellValue>>,
    highest_column: usize,
}

impl Grid {
    /// Builds a grid from ragged rows, padding short rows with `Blank`.
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        let highest_column = rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(highest_column, CellValue::Blank);
                row
            })
            .collect();
        Self {
            rows,
            highest_column,
        }
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn highest_row(&self) -> usize {
        self.rows.len()
    }

    pub fn highest_column(&self) -> usize {
        self.highest_column
    }

    pub fn shape(&self) -> SheetShape {
        SheetShape {
            highest_row: self.highest_row(),
            highest_column: self.highest_column,
        }
    }
}

/// What the range extractor needs from a spreadsheet reader. Indices passed
/// to `cell` are 0-based and anchored at A1.
pub trait SheetSource {
    fn highest_row(&self) -> usize;
    fn highest_column(&self) -> usize;
    /// Evaluated value at `(row, col)`; `Blank` outside stored data.
    fn cell(&self, row: usize, col: usize) -> CellValue;
}

/// Materializes exactly `A1:<highest_column><highest_row>` and nothing past it.
pub fn extract_grid(sheet: &dyn SheetSource) -> Grid {
    let (height, width) = (sheet.highest_row(), sheet.highest_column());
    let rows = (0..height)
        .map(|r| (0..width).map(|c| sheet.cell(r, c)).collect())
        .collect();
    Grid {
        rows,
        highest_column: width,
    }
}
