//! Worksheet type

use crate::cell::{CellAddress, CellData, CellStorage, CellValue};
use crate::error::{Error, Result};
use crate::format::NumberFormat;
use crate::row::Row;
use crate::{MAX_COLS, MAX_ROWS};

static EMPTY: CellValue = CellValue::Empty;

/// A named sheet holding a sparse grid of cells
#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    cells: CellStorage,
}

impl Worksheet {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: CellStorage::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Underlying storage
    pub fn cells(&self) -> &CellStorage {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut CellStorage {
        &mut self.cells
    }

    // ===== Reading =====

    pub fn cell(&self, row: u32, col: u16) -> Option<&CellData> {
        self.cells.get(row, col)
    }

    /// Value at (row, col); missing cells read as empty
    pub fn cell_value_at(&self, row: u32, col: u16) -> &CellValue {
        self.cells.get(row, col).map_or(&EMPTY, |c| &c.value)
    }

    /// Value at an A1 address
    pub fn cell_value(&self, address: &str) -> Result<&CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_value_at(addr.row, addr.col))
    }

    pub fn row(&self, row: u32) -> Option<&Row> {
        self.cells.row(row)
    }

    /// Highest materialized row index
    pub fn last_row(&self) -> Option<u32> {
        self.cells.last_row()
    }

    /// Highest column with a cell in `row`
    pub fn last_column_in_row(&self, row: u32) -> Option<u16> {
        self.cells.row(row).and_then(Row::last_column)
    }

    /// Last materialized row + 1; 0 for an empty sheet
    pub fn row_count(&self) -> u32 {
        self.last_row().map_or(0, |r| r + 1)
    }

    /// Last column of the first row + 1; 0 when the first row is missing
    pub fn column_count(&self) -> u32 {
        self.last_column_in_row(0).map_or(0, |c| c as u32 + 1)
    }

    /// `(first_row, first_col, last_row, last_col)` over materialized cells
    pub fn dimensions(&self) -> Option<(u32, u16, u32, u16)> {
        let (first_col, last_col) = self.cells.column_bounds()?;
        Some((self.cells.first_row()?, first_col, self.cells.last_row()?, last_col))
    }

    /// All cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.cells.iter()
    }

    /// Formula cells in row-major order
    pub fn formula_cells(&self) -> impl Iterator<Item = (u32, u16, &str)> {
        self.cells
            .iter()
            .filter_map(|(r, c, data)| data.value.formula_text().map(|text| (r, c, text)))
    }

    // ===== Writing =====

    /// Set the value at (row, col), keeping the cell's format
    pub fn set_cell_value_at(&mut self, row: u32, col: u16, value: CellValue) -> Result<()> {
        check_bounds(row, col as u32)?;
        self.cells.set_value(row, col, value);
        Ok(())
    }

    /// Set the value at an A1 address
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value.into())
    }

    /// Replace value and format at (row, col)
    pub fn set_cell_at(&mut self, row: u32, col: u16, data: CellData) -> Result<()> {
        check_bounds(row, col as u32)?;
        self.cells.set(row, col, data);
        Ok(())
    }

    pub fn set_number_format_at(&mut self, row: u32, col: u16, format: NumberFormat) -> Result<()> {
        check_bounds(row, col as u32)?;
        self.cells.cell_entry(row, col).number_format = format;
        Ok(())
    }

    /// Reset the cell to empty. The cell stays present with its format.
    pub fn clear_cell_value_at(&mut self, row: u32, col: u16) -> Result<()> {
        self.set_cell_value_at(row, col, CellValue::Empty)
    }

    /// Drop the cell from its row
    pub fn remove_cell_at(&mut self, row: u32, col: u16) -> Option<CellData> {
        self.cells.remove(row, col)
    }

    /// Materialize a row without cells
    pub fn ensure_row(&mut self, row: u32) -> Result<()> {
        check_bounds(row, 0)?;
        self.cells.row_entry(row);
        Ok(())
    }
}

/// Reject positions outside the sheet limits
pub fn check_bounds(row: u32, col: u32) -> Result<()> {
    if row >= MAX_ROWS {
        return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
    }
    if col >= MAX_COLS as u32 {
        return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_counts_use_bounding_rectangle() {
        let mut sheet = Worksheet::new("Data");
        assert_eq!((sheet.row_count(), sheet.column_count()), (0, 0));

        sheet.set_cell_value("A1", "ID").unwrap();
        sheet.set_cell_value("H1", "Total").unwrap();
        sheet.set_cell_value("C5", 3).unwrap();

        assert_eq!(sheet.row_count(), 5);
        assert_eq!(sheet.column_count(), 8);
        assert_eq!(sheet.dimensions(), Some((0, 0, 4, 7)));
    }

    #[test]
    fn test_column_count_without_first_row() {
        let mut sheet = Worksheet::new("Data");
        sheet.set_cell_value_at(3, 4, 1.into()).unwrap();
        assert_eq!(sheet.row_count(), 4);
        assert_eq!(sheet.column_count(), 0);
    }

    #[test]
    fn test_clear_keeps_cell_and_format() {
        let mut sheet = Worksheet::new("Data");
        sheet
            .set_cell_at(2, 2, CellData::with_format(43464.0.into(), NumberFormat::date()))
            .unwrap();
        sheet.clear_cell_value_at(2, 2).unwrap();

        let cell = sheet.cell(2, 2).unwrap();
        assert!(cell.value.is_empty());
        assert_eq!(cell.number_format, NumberFormat::date());
    }

    #[test]
    fn test_out_of_bounds_writes_fail() {
        let mut sheet = Worksheet::new("Data");
        assert!(sheet.set_cell_value_at(MAX_ROWS, 0, 1.into()).is_err());
        assert!(sheet.set_cell_at(0, u16::MAX, CellData::default()).is_err());
        assert_eq!(sheet.cell_value_at(MAX_ROWS + 5, 3), &CellValue::Empty);
    }
}
