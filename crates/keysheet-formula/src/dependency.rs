//! Dependency order for formula evaluation
//!
//! A formula cell can only be computed once the formula cells it references
//! have results. [`evaluation_order`] walks those references with its own
//! work stack, so a long chain of references costs heap, not thread stack.

use crate::ast::FormulaExpr;
use keysheet_core::{CellRange, Workbook};
use std::collections::HashSet;

/// Unique key for a cell (sheet index + address)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub sheet: usize,
    pub row: u32,
    pub col: u16,
}

impl CellKey {
    pub fn new(sheet: usize, row: u32, col: u16) -> Self {
        Self { sheet, row, col }
    }
}

/// Every reference of a formula as (sheet, range); single cells become
/// one-cell ranges
pub fn references(expr: &FormulaExpr) -> Vec<(Option<&str>, CellRange)> {
    let mut found = Vec::new();
    let mut pending = vec![expr];
    while let Some(expr) = pending.pop() {
        match expr {
            FormulaExpr::CellRef(r) => {
                found.push((r.sheet.as_deref(), CellRange::new(r.address, r.address)))
            }
            FormulaExpr::RangeRef(r) => found.push((r.sheet.as_deref(), r.range)),
            FormulaExpr::BinaryOp { left, right, .. } => {
                pending.push(right);
                pending.push(left);
            }
            FormulaExpr::UnaryOp { operand, .. } => pending.push(operand),
            FormulaExpr::Function { args, .. } => pending.extend(args.iter().rev()),
            _ => {}
        }
    }
    found
}

/// Formula cells that a formula on `sheet` reads.
///
/// References to unknown sheets are skipped; they evaluate to `#REF!`
/// without touching any cell.
pub fn formula_precedents(workbook: &Workbook, sheet: usize, expr: &FormulaExpr) -> Vec<CellKey> {
    let mut precedents = Vec::new();
    for (sheet_name, range) in references(expr) {
        let index = match sheet_name {
            Some(name) => workbook.sheet_index(name),
            None => Some(sheet),
        };
        let Some((index, worksheet)) = index.and_then(|i| Some((i, workbook.worksheet(i)?))) else {
            continue;
        };
        let cols = range.start.col..=range.end.col;
        for (row, cells) in worksheet.cells().rows_between(range.start.row, range.end.row) {
            for (col, data) in cells.cells() {
                if cols.contains(&col) && data.value.is_formula() {
                    precedents.push(CellKey::new(index, row, col));
                }
            }
        }
    }
    precedents
}

/// Order in which `root` and the formula cells it depends on must be
/// computed: every cell comes after its precedents.
///
/// `precedents` yields the unfinished precedents of a cell. A precedent
/// that is still being walked closes a cycle; it is not followed, so the
/// cells of a cycle see each other unfinished.
pub fn evaluation_order<F>(root: CellKey, mut precedents: F) -> Vec<CellKey>
where
    F: FnMut(CellKey) -> Vec<CellKey>,
{
    let mut order = Vec::new();
    let mut seen = HashSet::from([root]);
    let mut stack = vec![(root, precedents(root).into_iter())];

    while let Some((cell, remaining)) = stack.last_mut() {
        let cell = *cell;
        match remaining.next() {
            Some(next) => {
                if seen.insert(next) {
                    let frame = (next, precedents(next).into_iter());
                    stack.push(frame);
                }
            }
            None => {
                stack.pop();
                order.push(cell);
            }
        }
    }
    order
}
