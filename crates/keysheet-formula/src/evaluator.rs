//! Formula evaluator
//!
//! Walks a parsed expression against a workbook. Referenced formula cells are
//! computed from their text, so results never depend on stale cached values.
//! Before a formula cell is computed, the formula cells it depends on are
//! put in dependency order and computed first; a cell that is reached again
//! while its own computation is still pending yields `#REF!`.
//!
//! Results are memoized per [`EvaluationContext`], so a context must not be
//! kept across edits of its workbook.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::dependency::{evaluation_order, formula_precedents, CellKey};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::lookup_function;
use crate::parser::parse_formula;
use keysheet_core::{format_general, CellError, CellRange, CellValue, Workbook};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),
    /// Rows of a range
    Array(Vec<Vec<FormulaValue>>),
    Empty,
}

impl FormulaValue {
    /// Numeric view; blank counts as zero and text must parse
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            FormulaValue::String(s) => s.trim().parse().ok(),
            FormulaValue::Empty => Some(0.0),
            FormulaValue::Array(rows) => rows.first().and_then(|r| r.first())?.as_number(),
            FormulaValue::Error(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormulaValue::Boolean(b) => Some(*b),
            FormulaValue::Number(n) => Some(*n != 0.0),
            FormulaValue::Empty => Some(false),
            FormulaValue::String(s) if s.eq_ignore_ascii_case("TRUE") => Some(true),
            FormulaValue::String(s) if s.eq_ignore_ascii_case("FALSE") => Some(false),
            FormulaValue::Array(rows) => rows.first().and_then(|r| r.first())?.as_bool(),
            _ => None,
        }
    }

    /// Text view used by `&` and the text functions
    pub fn as_string(&self) -> String {
        match self {
            FormulaValue::Number(n) => format_general(*n),
            FormulaValue::String(s) => s.clone(),
            FormulaValue::Boolean(true) => "TRUE".to_string(),
            FormulaValue::Boolean(false) => "FALSE".to_string(),
            FormulaValue::Error(e) => e.to_string(),
            FormulaValue::Empty => String::new(),
            FormulaValue::Array(rows) => rows
                .first()
                .and_then(|r| r.first())
                .map(FormulaValue::as_string)
                .unwrap_or_default(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FormulaValue::Error(_))
    }

    pub fn get_error(&self) -> Option<CellError> {
        match self {
            FormulaValue::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Collapse a range to its top-left value
    pub fn scalar(self) -> FormulaValue {
        match self {
            FormulaValue::Array(rows) => rows
                .into_iter()
                .next()
                .and_then(|r| r.into_iter().next())
                .unwrap_or(FormulaValue::Empty),
            other => other,
        }
    }

    /// Every value of an argument, flattening ranges
    pub fn flatten(&self) -> Box<dyn Iterator<Item = &FormulaValue> + '_> {
        match self {
            FormulaValue::Array(rows) => Box::new(rows.iter().flatten()),
            other => Box::new(std::iter::once(other)),
        }
    }
}

impl From<&CellValue> for FormulaValue {
    fn from(value: &CellValue) -> Self {
        match value {
            CellValue::Empty => FormulaValue::Empty,
            CellValue::Number(n) => FormulaValue::Number(*n),
            CellValue::String(s) => FormulaValue::String(s.as_str().to_string()),
            CellValue::Boolean(b) => FormulaValue::Boolean(*b),
            CellValue::Error(e) => FormulaValue::Error(*e),
            CellValue::Formula { cached_value, .. } => cached_value
                .as_deref()
                .map(FormulaValue::from)
                .unwrap_or(FormulaValue::Empty),
        }
    }
}

impl From<FormulaValue> for CellValue {
    fn from(value: FormulaValue) -> Self {
        match value.scalar() {
            FormulaValue::Empty => CellValue::Empty,
            FormulaValue::Number(n) => CellValue::Number(n),
            FormulaValue::String(s) => CellValue::String(s.into()),
            FormulaValue::Boolean(b) => CellValue::Boolean(b),
            FormulaValue::Error(e) => CellValue::Error(e),
            FormulaValue::Array(_) => CellValue::Error(CellError::Value),
        }
    }
}

/// Formula results shared by a context and its children
#[derive(Debug, Default)]
struct EvalState {
    /// Finished formula cells
    memo: HashMap<CellKey, FormulaValue>,
    /// Formula cells ordered for computation but not finished yet
    pending: HashSet<CellKey>,
}

/// Context for formula evaluation
pub struct EvaluationContext<'a> {
    /// Workbook for cell lookups; references read as blank without one
    pub workbook: Option<&'a Workbook>,
    pub current_sheet: usize,
    pub current_row: u32,
    pub current_col: u16,
    state: Rc<RefCell<EvalState>>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(workbook: Option<&'a Workbook>, sheet: usize, row: u32, col: u16) -> Self {
        Self {
            workbook,
            current_sheet: sheet,
            current_row: row,
            current_col: col,
            state: Rc::default(),
        }
    }

    /// Context without a workbook
    pub fn simple() -> Self {
        Self::new(None, 0, 0, 0)
    }

    /// Context for computing whole cells of `workbook` with
    /// [`cell_result`](Self::cell_result)
    pub fn for_workbook(workbook: &'a Workbook) -> Self {
        Self::new(Some(workbook), 0, 0, 0)
    }

    /// Whether the workbook counts dates from 1904
    pub fn date_1904(&self) -> bool {
        self.workbook.is_some_and(|wb| wb.settings().date_1904)
    }

    fn child(&self, sheet: usize, row: u32, col: u16) -> EvaluationContext<'a> {
        EvaluationContext {
            workbook: self.workbook,
            current_sheet: sheet,
            current_row: row,
            current_col: col,
            state: Rc::clone(&self.state),
        }
    }

    fn resolve_sheet(&self, sheet: Option<&str>) -> Option<usize> {
        match sheet {
            Some(name) => self.workbook?.sheet_index(name),
            None => Some(self.current_sheet),
        }
    }

    /// Value of the cell at (sheet, row, col) as the sheet shows it.
    ///
    /// Formula cells are computed; an empty formula result reads as zero.
    /// Formula text that does not parse falls back to the stored cached
    /// value.
    pub fn cell_result(&self, sheet: usize, row: u32, col: u16) -> FormulaValue {
        let Some(worksheet) = self.workbook.and_then(|wb| wb.worksheet(sheet)) else {
            return FormulaValue::Error(CellError::Ref);
        };
        let stored = worksheet.cell_value_at(row, col);
        if !stored.is_formula() {
            return stored.into();
        }
        match self.formula_cell_value(CellKey::new(sheet, row, col)) {
            FormulaValue::Empty => FormulaValue::Number(0.0),
            value => value,
        }
    }

    /// Value of a referenced cell, computing formulas on demand
    pub fn cell_value(&self, sheet: Option<&str>, row: u32, col: u16) -> FormulaValue {
        let Some(workbook) = self.workbook else {
            return FormulaValue::Empty;
        };
        let Some(sheet_index) = self.resolve_sheet(sheet) else {
            return FormulaValue::Error(CellError::Ref);
        };
        let Some(worksheet) = workbook.worksheet(sheet_index) else {
            return FormulaValue::Error(CellError::Ref);
        };

        let value = worksheet.cell_value_at(row, col);
        if value.is_formula() {
            self.formula_cell_value(CellKey::new(sheet_index, row, col))
        } else {
            value.into()
        }
    }

    fn formula_cell_value(&self, key: CellKey) -> FormulaValue {
        if let Some(value) = self.state.borrow().memo.get(&key) {
            return value.clone();
        }
        if self.state.borrow().pending.contains(&key) {
            log::debug!(
                "circular reference through sheet {} ({}, {})",
                key.sheet,
                key.row,
                key.col
            );
            return FormulaValue::Error(CellError::Ref);
        }

        self.compute(key);
        self.state
            .borrow()
            .memo
            .get(&key)
            .cloned()
            .unwrap_or(FormulaValue::Error(CellError::Ref))
    }

    /// Compute `root` after every unfinished formula cell it depends on
    fn compute(&self, root: CellKey) {
        let Some(workbook) = self.workbook else {
            return;
        };

        let mut parsed: HashMap<CellKey, Option<FormulaExpr>> = HashMap::new();
        let order = evaluation_order(root, |cell| {
            let ast = workbook
                .worksheet(cell.sheet)
                .and_then(|ws| ws.cell_value_at(cell.row, cell.col).formula_text())
                .and_then(|text| parse_formula(text).ok());
            let precedents = match &ast {
                Some(ast) => {
                    let state = self.state.borrow();
                    formula_precedents(workbook, cell.sheet, ast)
                        .into_iter()
                        .filter(|p| !state.memo.contains_key(p) && !state.pending.contains(p))
                        .collect()
                }
                None => Vec::new(),
            };
            parsed.insert(cell, ast);
            precedents
        });

        self.state.borrow_mut().pending.extend(order.iter().copied());
        for cell in order {
            let result = match parsed.remove(&cell).flatten() {
                Some(ast) => {
                    let ctx = self.child(cell.sheet, cell.row, cell.col);
                    match evaluate(&ast, &ctx) {
                        Ok(value) => value.scalar(),
                        Err(e) => FormulaValue::Error(e.to_cell_error()),
                    }
                }
                None => workbook
                    .worksheet(cell.sheet)
                    .map(|ws| FormulaValue::from(ws.cell_value_at(cell.row, cell.col)))
                    .unwrap_or(FormulaValue::Error(CellError::Ref)),
            };
            let mut state = self.state.borrow_mut();
            state.pending.remove(&cell);
            state.memo.insert(cell, result);
        }
    }

    /// Values of a range, clamped to the cells its rows hold
    pub fn range_values(&self, sheet: Option<&str>, range: &CellRange) -> FormulaValue {
        let Some(workbook) = self.workbook else {
            return FormulaValue::Array(Vec::new());
        };
        let Some(sheet_index) = self.resolve_sheet(sheet) else {
            return FormulaValue::Error(CellError::Ref);
        };
        let Some(worksheet) = workbook.worksheet(sheet_index) else {
            return FormulaValue::Error(CellError::Ref);
        };
        let Some(last_row) = worksheet.last_row() else {
            return FormulaValue::Array(Vec::new());
        };

        let end_row = range.end.row.min(last_row);
        let last_col = worksheet
            .cells()
            .rows_between(range.start.row, end_row)
            .filter_map(|(_, row)| row.last_column())
            .max();
        let Some(last_col) = last_col else {
            return FormulaValue::Array(Vec::new());
        };
        let end_col = range.end.col.min(last_col);

        let sheet_name = Some(worksheet.name());
        let mut rows = Vec::new();
        for row in range.start.row..=end_row {
            let mut values = Vec::new();
            for col in range.start.col..=end_col {
                values.push(self.cell_value(sheet_name, row, col));
            }
            rows.push(values);
        }
        FormulaValue::Array(rows)
    }
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match expr {
        FormulaExpr::Number(n) => Ok(FormulaValue::Number(*n)),
        FormulaExpr::String(s) => Ok(FormulaValue::String(s.clone())),
        FormulaExpr::Boolean(b) => Ok(FormulaValue::Boolean(*b)),
        FormulaExpr::Error(e) => Ok(FormulaValue::Error(*e)),
        FormulaExpr::CellRef(r) => Ok(ctx.cell_value(
            r.sheet.as_deref(),
            r.address.row,
            r.address.col,
        )),
        FormulaExpr::RangeRef(r) => Ok(ctx.range_values(r.sheet.as_deref(), &r.range)),
        FormulaExpr::NameRef(_) => Ok(FormulaValue::Error(CellError::Name)),
        FormulaExpr::BinaryOp { op, left, right } => {
            let left = evaluate(left, ctx)?.scalar();
            let right = evaluate(right, ctx)?.scalar();
            Ok(evaluate_binary_op(*op, &left, &right))
        }
        FormulaExpr::UnaryOp { op, operand } => {
            let value = evaluate(operand, ctx)?.scalar();
            Ok(match to_number(&value) {
                Ok(n) => match op {
                    UnaryOperator::Negate => FormulaValue::Number(-n),
                    UnaryOperator::Percent => FormulaValue::Number(n / 100.0),
                },
                Err(e) => FormulaValue::Error(e),
            })
        }
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),
    }
}

/// Evaluate the cell at (sheet, row, col) of `workbook`.
///
/// Shorthand for [`EvaluationContext::cell_result`] on a fresh context. Use
/// one context for many cells of an unchanged workbook so shared precedents
/// are computed once.
pub fn evaluate_cell(workbook: &Workbook, sheet: usize, row: u32, col: u16) -> FormulaValue {
    EvaluationContext::for_workbook(workbook).cell_result(sheet, row, col)
}

/// Number from an operand, or the error it stands for
pub(crate) fn to_number(value: &FormulaValue) -> Result<f64, CellError> {
    match value {
        FormulaValue::Error(e) => Err(*e),
        other => other.as_number().ok_or(CellError::Value),
    }
}

fn evaluate_binary_op(op: BinaryOperator, left: &FormulaValue, right: &FormulaValue) -> FormulaValue {
    if let Some(e) = left.get_error().or_else(|| right.get_error()) {
        return FormulaValue::Error(e);
    }

    let arithmetic = |f: fn(f64, f64) -> FormulaValue| match (to_number(left), to_number(right)) {
        (Ok(l), Ok(r)) => f(l, r),
        (Err(e), _) | (_, Err(e)) => FormulaValue::Error(e),
    };

    match op {
        BinaryOperator::Add => arithmetic(|l, r| FormulaValue::Number(l + r)),
        BinaryOperator::Subtract => arithmetic(|l, r| FormulaValue::Number(l - r)),
        BinaryOperator::Multiply => arithmetic(|l, r| FormulaValue::Number(l * r)),
        BinaryOperator::Divide => arithmetic(|l, r| {
            if r == 0.0 {
                FormulaValue::Error(CellError::Div0)
            } else {
                FormulaValue::Number(l / r)
            }
        }),
        BinaryOperator::Power => arithmetic(|l, r| {
            let result = l.powf(r);
            if result.is_finite() {
                FormulaValue::Number(result)
            } else {
                FormulaValue::Error(CellError::Num)
            }
        }),
        BinaryOperator::Concat => {
            FormulaValue::String(format!("{}{}", left.as_string(), right.as_string()))
        }
        BinaryOperator::Equal => FormulaValue::Boolean(compare_values(left, right).is_eq()),
        BinaryOperator::NotEqual => FormulaValue::Boolean(compare_values(left, right).is_ne()),
        BinaryOperator::LessThan => FormulaValue::Boolean(compare_values(left, right).is_lt()),
        BinaryOperator::LessEqual => FormulaValue::Boolean(compare_values(left, right).is_le()),
        BinaryOperator::GreaterThan => FormulaValue::Boolean(compare_values(left, right).is_gt()),
        BinaryOperator::GreaterEqual => {
            FormulaValue::Boolean(compare_values(left, right).is_ge())
        }
    }
}

/// Spreadsheet ordering: numbers < text < booleans, text ignores case,
/// and a blank takes the type of the other side.
pub fn compare_values(left: &FormulaValue, right: &FormulaValue) -> Ordering {
    fn rank(value: &FormulaValue) -> u8 {
        match value {
            FormulaValue::Number(_) | FormulaValue::Empty => 0,
            FormulaValue::String(_) => 1,
            FormulaValue::Boolean(_) => 2,
            _ => 3,
        }
    }

    let blank_as = |other: &FormulaValue| match other {
        FormulaValue::String(_) => FormulaValue::String(String::new()),
        FormulaValue::Boolean(_) => FormulaValue::Boolean(false),
        _ => FormulaValue::Number(0.0),
    };
    let left = match left {
        FormulaValue::Empty => blank_as(right),
        other => other.clone(),
    };
    let right = match right {
        FormulaValue::Empty => blank_as(&left),
        other => other.clone(),
    };

    match (&left, &right) {
        (FormulaValue::Number(a), FormulaValue::Number(b)) => {
            a.partial_cmp(b).unwrap_or(Ordering::Equal)
        }
        (FormulaValue::String(a), FormulaValue::String(b)) => {
            a.to_lowercase().cmp(&b.to_lowercase())
        }
        (FormulaValue::Boolean(a), FormulaValue::Boolean(b)) => a.cmp(b),
        (a, b) => rank(a).cmp(&rank(b)),
    }
}

fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let Some(def) = lookup_function(name) else {
        log::debug!("unknown function {}", name);
        return Ok(FormulaValue::Error(CellError::Name));
    };

    let too_many = def.max_args.is_some_and(|max| args.len() > max);
    if args.len() < def.min_args || too_many {
        let expected = match def.max_args {
            Some(max) if max == def.min_args => max.to_string(),
            Some(max) => format!("{} to {}", def.min_args, max),
            None => format!("at least {}", def.min_args),
        };
        return Err(FormulaError::ArgumentCount {
            function: def.name.to_string(),
            expected,
            actual: args.len(),
        });
    }

    let values = args
        .iter()
        .map(|arg| evaluate(arg, ctx))
        .collect::<FormulaResult<Vec<_>>>()?;
    (def.implementation)(&values, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn eval(formula: &str) -> FormulaValue {
        let ast = parse_formula(formula).unwrap();
        evaluate(&ast, &EvaluationContext::simple()).unwrap()
    }

    fn sample_workbook() -> Workbook {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", 10).unwrap();
        sheet.set_cell_value("A2", 20).unwrap();
        sheet.set_cell_value("A3", "text").unwrap();
        sheet.set_cell_value("B1", CellValue::formula("=A1*2")).unwrap();
        sheet.set_cell_value("B2", CellValue::formula("=B1+A2")).unwrap();
        wb.add_worksheet_with_name("Rates").unwrap();
        wb.worksheet_mut(1)
            .unwrap()
            .set_cell_value("A1", 0.5)
            .unwrap();
        wb
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("=1+2*3"), FormulaValue::Number(7.0));
        assert_eq!(eval("=(1+2)*3"), FormulaValue::Number(9.0));
        assert_eq!(eval("=2^3^2"), FormulaValue::Number(64.0));
        assert_eq!(eval("=-2^2"), FormulaValue::Number(4.0));
        assert_eq!(eval("=50%"), FormulaValue::Number(0.5));
        assert_eq!(eval("=\"3\"+1"), FormulaValue::Number(4.0));
        assert_eq!(eval("=TRUE+1"), FormulaValue::Number(2.0));
    }

    #[test]
    fn test_value_errors() {
        assert_eq!(eval("=1/0"), FormulaValue::Error(CellError::Div0));
        assert_eq!(eval("=\"a\"+1"), FormulaValue::Error(CellError::Value));
        assert_eq!(eval("=#N/A+1"), FormulaValue::Error(CellError::Na));
        assert_eq!(eval("=NOSUCHFN(1)"), FormulaValue::Error(CellError::Name));
        assert_eq!(eval("=Rate*2"), FormulaValue::Error(CellError::Name));
    }

    #[test]
    fn test_comparison_and_concat() {
        assert_eq!(eval("=\"abc\"=\"ABC\""), FormulaValue::Boolean(true));
        assert_eq!(eval("=1<\"a\""), FormulaValue::Boolean(true));
        assert_eq!(eval("=\"z\"<TRUE"), FormulaValue::Boolean(true));
        assert_eq!(eval("=2>=2"), FormulaValue::Boolean(true));
        assert_eq!(eval("=\"Total: \"&1.5&TRUE"), FormulaValue::String("Total: 1.5TRUE".into()));
    }

    #[test]
    fn test_references_follow_formulas() {
        let wb = sample_workbook();
        assert_eq!(evaluate_cell(&wb, 0, 1, 1), FormulaValue::Number(40.0));

        let ast = parse_formula("=SUM(A1:B2)+Rates!A1").unwrap();
        let ctx = EvaluationContext::new(Some(&wb), 0, 9, 9);
        assert_eq!(evaluate(&ast, &ctx).unwrap(), FormulaValue::Number(90.5));

        let ast = parse_formula("=Missing!A1").unwrap();
        assert_eq!(
            evaluate(&ast, &ctx).unwrap(),
            FormulaValue::Error(CellError::Ref)
        );
    }

    #[test]
    fn test_circular_reference_is_ref_error() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", CellValue::formula("=B1+1")).unwrap();
        sheet.set_cell_value("B1", CellValue::formula("=A1+1")).unwrap();
        sheet.set_cell_value("C1", CellValue::formula("=C1")).unwrap();

        assert_eq!(evaluate_cell(&wb, 0, 0, 0), FormulaValue::Error(CellError::Ref));
        assert_eq!(evaluate_cell(&wb, 0, 0, 2), FormulaValue::Error(CellError::Ref));
    }

    #[test]
    fn test_long_reference_chain() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value_at(0, 0, CellValue::Number(1.0)).unwrap();
        for row in 1..20_000u32 {
            sheet
                .set_cell_value_at(row, 0, CellValue::formula(format!("=A{}+1", row)))
                .unwrap();
        }
        assert_eq!(evaluate_cell(&wb, 0, 19_999, 0), FormulaValue::Number(20_000.0));

        // Closing the chain into a loop turns every cell on it into #REF!
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet
            .set_cell_value_at(0, 0, CellValue::formula("=A20000"))
            .unwrap();
        assert_eq!(evaluate_cell(&wb, 0, 500, 0), FormulaValue::Error(CellError::Ref));
    }

    #[test]
    fn test_context_shares_results_between_cells() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        for row in 0..2_000u32 {
            sheet.set_cell_value_at(row, 0, CellValue::Number(1.0)).unwrap();
            sheet
                .set_cell_value_at(row, 1, CellValue::formula(format!("=SUM($A$1:A{})", row + 1)))
                .unwrap();
        }

        let ctx = EvaluationContext::for_workbook(&wb);
        let totals: Vec<FormulaValue> = (0..2_000u32).map(|row| ctx.cell_result(0, row, 1)).collect();
        assert_eq!(totals[0], FormulaValue::Number(1.0));
        assert_eq!(totals[1_999], FormulaValue::Number(2_000.0));
        assert_eq!(ctx.cell_result(0, 7, 0), FormulaValue::Number(1.0));
        assert_eq!(ctx.cell_result(5, 0, 0), FormulaValue::Error(CellError::Ref));
    }

    #[test]
    fn test_blank_formula_result_reads_as_zero() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", CellValue::formula("=Z99")).unwrap();
        assert_eq!(evaluate_cell(&wb, 0, 0, 0), FormulaValue::Number(0.0));
    }

    #[test]
    fn test_unparseable_formula_uses_cached_value() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet
            .set_cell_value(
                "A1",
                CellValue::Formula {
                    text: "=SUM(A2:A3".into(),
                    cached_value: Some(Box::new(CellValue::Number(7.0))),
                },
            )
            .unwrap();
        assert_eq!(evaluate_cell(&wb, 0, 0, 0), FormulaValue::Number(7.0));
    }

    #[test]
    fn test_argument_count_is_checked() {
        let ast = parse_formula("=ROUND(1)").unwrap();
        let err = evaluate(&ast, &EvaluationContext::simple()).unwrap_err();
        assert!(matches!(err, FormulaError::ArgumentCount { actual: 1, .. }));
        assert_eq!(err.to_cell_error(), CellError::Value);
    }
}
