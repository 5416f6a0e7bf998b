//! Rows of a worksheet

use std::collections::BTreeMap;

use crate::cell::CellData;

/// A materialized row.
///
/// A row exists once any of its cells is written or a loaded file defines it,
/// even when it holds no cells.
#[derive(Debug, Clone, Default)]
pub struct Row {
    cells: BTreeMap<u16, CellData>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, col: u16) -> Option<&CellData> {
        self.cells.get(&col)
    }

    pub fn cell_mut(&mut self, col: u16) -> Option<&mut CellData> {
        self.cells.get_mut(&col)
    }

    /// Cell at `col`, created empty when missing
    pub fn cell_entry(&mut self, col: u16) -> &mut CellData {
        self.cells.entry(col).or_default()
    }

    pub fn set_cell(&mut self, col: u16, data: CellData) {
        self.cells.insert(col, data);
    }

    pub fn remove_cell(&mut self, col: u16) -> Option<CellData> {
        self.cells.remove(&col)
    }

    /// Highest column holding a cell, empty cells included
    pub fn last_column(&self) -> Option<u16> {
        self.cells.keys().next_back().copied()
    }

    pub fn first_column(&self) -> Option<u16> {
        self.cells.keys().next().copied()
    }

    /// Cells in column order
    pub fn cells(&self) -> impl Iterator<Item = (u16, &CellData)> {
        self.cells.iter().map(|(col, data)| (*col, data))
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = (u16, &mut CellData)> {
        self.cells.iter_mut().map(|(col, data)| (*col, data))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
