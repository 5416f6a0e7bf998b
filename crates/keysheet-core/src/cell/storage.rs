//! Sparse row-major cell storage
//!
//! Rows live in a `BTreeMap` keyed by row index so iteration is ordered for
//! the writers. Unlike a purely value-sparse grid, cleared cells and empty
//! rows stay in the map: the bounding rectangle reported to callers follows
//! what has been materialized, not what currently holds a value.

use std::collections::BTreeMap;

use super::CellValue;
use crate::format::NumberFormat;
use crate::row::Row;

/// Value and display format of one cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellData {
    pub value: CellValue,
    pub number_format: NumberFormat,
}

impl CellData {
    /// Cell with a value and the General format
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            number_format: NumberFormat::General,
        }
    }

    pub fn with_format(value: CellValue, number_format: NumberFormat) -> Self {
        Self {
            value,
            number_format,
        }
    }

    /// Whether the cell displays as a date
    pub fn is_date(&self) -> bool {
        matches!(self.value.effective_value(), CellValue::Number(_))
            && self.number_format.is_date_format()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CellStorage {
    rows: BTreeMap<u32, Row>,
}

impl CellStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, row: u32, col: u16) -> Option<&CellData> {
        self.rows.get(&row).and_then(|r| r.cell(col))
    }

    pub fn get_mut(&mut self, row: u32, col: u16) -> Option<&mut CellData> {
        self.rows.get_mut(&row).and_then(|r| r.cell_mut(col))
    }

    pub fn row(&self, row: u32) -> Option<&Row> {
        self.rows.get(&row)
    }

    /// Row at `row`, materialized when missing
    pub fn row_entry(&mut self, row: u32) -> &mut Row {
        self.rows.entry(row).or_default()
    }

    /// Cell at (row, col), materializing the row and the cell
    pub fn cell_entry(&mut self, row: u32, col: u16) -> &mut CellData {
        self.row_entry(row).cell_entry(col)
    }

    /// Replace value and format of a cell
    pub fn set(&mut self, row: u32, col: u16, data: CellData) {
        self.row_entry(row).set_cell(col, data);
    }

    /// Replace the value of a cell, keeping its format
    pub fn set_value(&mut self, row: u32, col: u16, value: CellValue) {
        self.cell_entry(row, col).value = value;
    }

    /// Drop a cell entirely. The row stays materialized.
    pub fn remove(&mut self, row: u32, col: u16) -> Option<CellData> {
        self.rows.get_mut(&row).and_then(|r| r.remove_cell(col))
    }

    /// Highest materialized row
    pub fn last_row(&self) -> Option<u32> {
        self.rows.keys().next_back().copied()
    }

    pub fn first_row(&self) -> Option<u32> {
        self.rows.keys().next().copied()
    }

    /// Smallest and largest column over all rows
    pub fn column_bounds(&self) -> Option<(u16, u16)> {
        self.rows.values().fold(None, |acc, row| {
            match (acc, row.first_column(), row.last_column()) {
                (None, Some(first), Some(last)) => Some((first, last)),
                (Some((lo, hi)), Some(first), Some(last)) => Some((lo.min(first), hi.max(last))),
                (acc, _, _) => acc,
            }
        })
    }

    /// Rows in order, including rows without cells
    pub fn rows(&self) -> impl Iterator<Item = (u32, &Row)> {
        self.rows.iter().map(|(index, row)| (*index, row))
    }

    /// Materialized rows with index in `first..=last`
    pub fn rows_between(&self, first: u32, last: u32) -> impl Iterator<Item = (u32, &Row)> {
        (first <= last)
            .then(|| self.rows.range(first..=last))
            .into_iter()
            .flatten()
            .map(|(index, row)| (*index, row))
    }

    /// All cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.rows
            .iter()
            .flat_map(|(row, cells)| cells.cells().map(move |(col, data)| (*row, col, data)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, u16, &mut CellData)> {
        self.rows
            .iter_mut()
            .flat_map(|(row, cells)| cells.cells_mut().map(move |(col, data)| (*row, col, data)))
    }

    pub fn cell_count(&self) -> usize {
        self.rows.values().map(Row::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleared_cells_stay_present() {
        let mut storage = CellStorage::new();
        storage.set_value(4, 7, CellValue::Number(1.0));
        storage.set_value(4, 7, CellValue::Empty);

        assert!(storage.get(4, 7).is_some());
        assert_eq!(storage.last_row(), Some(4));
        assert_eq!(storage.row(4).and_then(Row::last_column), Some(7));
    }

    #[test]
    fn test_empty_rows_count_towards_bounds() {
        let mut storage = CellStorage::new();
        storage.set_value(0, 2, "a".into());
        storage.row_entry(9);

        assert_eq!(storage.last_row(), Some(9));
        assert_eq!(storage.column_bounds(), Some((2, 2)));
        assert_eq!(storage.cell_count(), 1);
        assert_eq!(storage.rows().count(), 2);
    }

    #[test]
    fn test_rows_between_skips_missing_rows() {
        let mut storage = CellStorage::new();
        for row in [0, 3, 7, 12] {
            storage.set_value(row, 0, 1.into());
        }

        let rows: Vec<u32> = storage.rows_between(2, 10).map(|(r, _)| r).collect();
        assert_eq!(rows, vec![3, 7]);
        assert_eq!(storage.rows_between(9, 4).count(), 0);
    }

    #[test]
    fn test_iteration_is_row_major() {
        let mut storage = CellStorage::new();
        storage.set_value(1, 0, 3.into());
        storage.set_value(0, 5, 2.into());
        storage.set_value(0, 1, 1.into());

        let order: Vec<_> = storage.iter().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(order, vec![(0, 1), (0, 5), (1, 0)]);
    }
}
