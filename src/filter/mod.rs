// src/filter/mod.rs

use std::collections::BTreeSet;
use tracing::debug;

use crate::extract::{CellValue, Grid};

/// Rows that survived filtering, projected onto the active columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredTable {
    /// Trimmed values, one entry per active column.
    pub rows: Vec<Vec<String>>,
    /// Column indices with data anywhere in the sheet, ascending.
    pub active_columns: Vec<usize>,
    pub row_count: usize,
    pub empty_rows_skipped: usize,
}

/// Pass 1: every column index holding at least one non-blank trimmed value.
pub fn active_columns(grid: &Grid) -> Vec<usize> {
    let mut seen = BTreeSet::new();
    for row in grid.rows() {
        for (idx, cell) in row.iter().enumerate() {
            if !cell.is_blank() {
                seen.insert(idx);
            }
        }
    }
    seen.into_iter().collect()
}

fn trimmed_at(row: &[CellValue], idx: usize) -> String {
    row.get(idx).map(CellValue::trimmed).unwrap_or_default()
}

/// Pass 2: drop rows that are blank across every active column and project
/// the rest. Never fails; an all-blank grid gives an empty table.
pub fn filter_rows(grid: &Grid) -> FilteredTable {
    let active = active_columns(grid);
    let mut table = FilteredTable {
        active_columns: active,
        ..Default::default()
    };

    for row in grid.rows() {
        let has_content = table
            .active_columns
            .iter()
            .any(|&idx| !trimmed_at(row, idx).is_empty());
        if !has_content {
            table.empty_rows_skipped += 1;
            continue;
        }

        let projected = table
            .active_columns
            .iter()
            .map(|&idx| trimmed_at(row, idx))
            .collect();
        table.rows.push(projected);
        table.row_count += 1;
    }

    debug!(
        active = table.active_columns.len(),
        kept = table.row_count,
        skipped = table.empty_rows_skipped,
        "filtered grid"
    );
    table
}
