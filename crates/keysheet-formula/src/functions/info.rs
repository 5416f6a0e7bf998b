//! Information functions

use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};

fn first(args: &[FormulaValue]) -> FormulaValue {
    args[0].clone().scalar()
}

pub fn fn_isblank(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(matches!(first(args), FormulaValue::Empty)))
}

pub fn fn_isnumber(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(matches!(first(args), FormulaValue::Number(_))))
}

pub fn fn_istext(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(matches!(first(args), FormulaValue::String(_))))
}

pub fn fn_iserror(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(first(args).is_error()))
}

#[cfg(test)]
mod tests {
    use crate::evaluator::{evaluate, EvaluationContext, FormulaValue};
    use crate::parser::parse_formula;
    use keysheet_core::Workbook;

    #[test]
    fn test_type_checks_against_cells() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", 3).unwrap();
        sheet.set_cell_value("A2", "x").unwrap();
        let ctx = EvaluationContext::new(Some(&wb), 0, 5, 5);

        let check = |formula: &str| {
            let ast = parse_formula(formula).unwrap();
            evaluate(&ast, &ctx).unwrap()
        };
        assert_eq!(check("=ISBLANK(A9)"), FormulaValue::Boolean(true));
        assert_eq!(check("=ISNUMBER(A1)"), FormulaValue::Boolean(true));
        assert_eq!(check("=ISTEXT(A2)"), FormulaValue::Boolean(true));
        assert_eq!(check("=ISTEXT(A1)"), FormulaValue::Boolean(false));
        assert_eq!(check("=ISERROR(A1/0)"), FormulaValue::Boolean(true));
    }
}
