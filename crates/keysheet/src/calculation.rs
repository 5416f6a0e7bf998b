//! Workbook calculation
//!
//! Evaluates every formula cell against the live workbook and stores the
//! result as the cell's cached value, which is what the writers persist.
//!
//! # Example
//!
//! ```rust
//! use keysheet::{CellValue, Workbook, WorkbookCalculationExt};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", 10.0).unwrap();
//! sheet.set_cell_value("A2", CellValue::formula("=A1*2")).unwrap();
//!
//! let stats = workbook.calculate().unwrap();
//! assert_eq!(stats.cells_calculated, 1);
//! ```

use crate::{parse_formula, CellValue, EvaluationContext, Result, Workbook};

/// Statistics from a calculation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationStats {
    /// Formula cells found
    pub formula_count: usize,
    /// Formula cells whose cached value was refreshed
    pub cells_calculated: usize,
    /// Formula cells left with their previous cached value because the text
    /// does not parse
    pub unparsed: usize,
    /// Cells whose result is an error value
    pub errors: usize,
}

/// Extension trait for Workbook to add calculation methods
pub trait WorkbookCalculationExt {
    /// Recalculate all formula cells of the workbook
    fn calculate(&mut self) -> Result<CalculationStats>;
}

impl WorkbookCalculationExt for Workbook {
    fn calculate(&mut self) -> Result<CalculationStats> {
        let mut stats = CalculationStats::default();

        // Results are computed against the whole workbook before any cache
        // is written back. One context serves every cell so each formula is
        // computed once.
        let ctx = EvaluationContext::for_workbook(self);
        let mut results = Vec::new();
        for (sheet_idx, sheet) in self.worksheets().enumerate() {
            for (row, col, text) in sheet.formula_cells() {
                stats.formula_count += 1;
                if let Err(e) = parse_formula(text) {
                    log::warn!(
                        "keeping cached value of {}!R{}C{}: {}",
                        sheet.name(),
                        row + 1,
                        col + 1,
                        e
                    );
                    stats.unparsed += 1;
                    continue;
                }
                let value = CellValue::from(ctx.cell_result(sheet_idx, row, col));
                if value.is_error() {
                    stats.errors += 1;
                }
                results.push((sheet_idx, row, col, value));
            }
        }

        drop(ctx);

        for (sheet_idx, row, col, value) in results {
            let cell = self
                .worksheet_mut(sheet_idx)
                .and_then(|sheet| sheet.cells_mut().get_mut(row, col));
            if let Some(cell) = cell {
                if let CellValue::Formula { cached_value, .. } = &mut cell.value {
                    *cached_value = Some(Box::new(value));
                    stats.cells_calculated += 1;
                }
            }
        }

        log::debug!(
            "calculated {} of {} formula cells",
            stats.cells_calculated,
            stats.formula_count
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keysheet_core::CellError;
    use pretty_assertions::assert_eq;

    fn cached(workbook: &Workbook, sheet: usize, address: &str) -> Option<CellValue> {
        match workbook.worksheet(sheet).unwrap().cell_value(address).unwrap() {
            CellValue::Formula { cached_value, .. } => cached_value.as_deref().cloned(),
            _ => None,
        }
    }

    #[test]
    fn test_calculate_stores_results_across_sheets() {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Rates").unwrap();
        wb.worksheet_mut(1).unwrap().set_cell_value("B2", 0.25).unwrap();

        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", 200.0).unwrap();
        sheet.set_cell_value("A2", CellValue::formula("A1*Rates!B2")).unwrap();
        sheet.set_cell_value("A3", CellValue::formula("A2&\" due\"")).unwrap();
        sheet.set_cell_value("A4", CellValue::formula("1/0")).unwrap();

        let stats = wb.calculate().unwrap();
        assert_eq!(
            stats,
            CalculationStats {
                formula_count: 3,
                cells_calculated: 3,
                unparsed: 0,
                errors: 1,
            }
        );
        assert_eq!(cached(&wb, 0, "A2"), Some(CellValue::Number(50.0)));
        assert_eq!(cached(&wb, 0, "A3"), Some(CellValue::string("50 due")));
        assert_eq!(cached(&wb, 0, "A4"), Some(CellValue::Error(CellError::Div0)));
    }

    #[test]
    fn test_calculate_long_running_total() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", 1.0).unwrap();
        for row in 1..10_000u32 {
            sheet
                .set_cell_value_at(row, 0, CellValue::formula(format!("A{}+1", row)))
                .unwrap();
        }

        let stats = wb.calculate().unwrap();
        assert_eq!((stats.cells_calculated, stats.errors), (9_999, 0));
        assert_eq!(cached(&wb, 0, "A10000"), Some(CellValue::Number(10_000.0)));
    }

    #[test]
    fn test_unparseable_formula_keeps_its_cache() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet
            .set_cell_value(
                "C1",
                CellValue::Formula {
                    text: "=SUM(A1:".into(),
                    cached_value: Some(Box::new(CellValue::Number(7.0))),
                },
            )
            .unwrap();

        let stats = wb.calculate().unwrap();
        assert_eq!((stats.unparsed, stats.cells_calculated), (1, 0));
        assert_eq!(cached(&wb, 0, "C1"), Some(CellValue::Number(7.0)));
    }
}
