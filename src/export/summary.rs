// src/export/summary.rs

use serde::Serialize;

use crate::extract::SheetShape;
use crate::filter::FilteredTable;

/// Byte sizes of the three artifacts of one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArtifactSizes {
    pub original: u64,
    pub csv: u64,
    pub zip: u64,
}

/// Final report of a conversion. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    pub original_size: u64,
    pub csv_size: u64,
    pub zip_size: u64,
    /// Archive size as a percentage of the CSV size, one decimal.
    pub compression_ratio: f64,
    pub rows_written: usize,
    pub empty_rows_skipped: usize,
    /// Bottom-right corner of the used range, e.g. `D12`.
    pub dimensions: String,
    pub total_columns: usize,
    pub active_columns: usize,
}

impl ExportSummary {
    pub fn new(shape: SheetShape, table: &FilteredTable, sizes: ArtifactSizes) -> Self {
        Self {
            original_size: sizes.original,
            csv_size: sizes.csv,
            zip_size: sizes.zip,
            compression_ratio: compression_ratio(sizes.zip, sizes.csv),
            rows_written: table.row_count,
            empty_rows_skipped: table.empty_rows_skipped,
            dimensions: shape.dimensions(),
            total_columns: shape.highest_column,
            active_columns: table.active_columns.len(),
        }
    }
}

/// `round(zip / csv * 100, 1)`, or `0.0` when there is no CSV content.
pub fn compression_ratio(zip_size: u64, csv_size: u64) -> f64 {
    if csv_size == 0 {
        return 0.0;
    }
    (zip_size as f64 / csv_size as f64 * 1000.0).round() / 10.0
}
