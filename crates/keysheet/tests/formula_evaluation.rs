//! Formula results as a session shows them

use keysheet::prelude::*;
use keysheet::{evaluate, parse_formula, EvaluationContext, FormulaValue};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Session over a freshly created workbook; nothing here saves, so the
/// file can go away with its directory
fn session() -> Session {
    let dir = TempDir::new().unwrap();
    let mut session = Session::new();
    session
        .create(&dir.path().join("formulas.xlsx").to_string_lossy())
        .unwrap();
    session
}

fn result_of(session: &mut Session, formula: &str) -> String {
    session.set_cell_formula(formula, 20, 0).unwrap();
    session.get_cell(20, 0).unwrap()
}

/// Formulas without cell references
#[test]
fn test_evaluate_simple_formulas() {
    let ctx = EvaluationContext::simple();

    let ast = parse_formula("=1+2*3").unwrap();
    assert_eq!(evaluate(&ast, &ctx).unwrap(), FormulaValue::Number(7.0));

    let ast = parse_formula("=2^3^2").unwrap();
    assert_eq!(evaluate(&ast, &ctx).unwrap(), FormulaValue::Number(64.0));

    let ast = parse_formula("=\"Hello \"&\"World\"").unwrap();
    assert_eq!(
        evaluate(&ast, &ctx).unwrap(),
        FormulaValue::String("Hello World".into())
    );

    let ast = parse_formula("=5>3").unwrap();
    assert_eq!(evaluate(&ast, &ctx).unwrap(), FormulaValue::Boolean(true));
}

#[test]
fn test_references_and_ranges() {
    let mut s = session();
    for (row, value) in [10.0, 20.0, 30.0].iter().enumerate() {
        s.set_cell_number(*value, row as u32, 1).unwrap();
    }
    s.set_cell_string("skip", 3, 1).unwrap();

    assert_eq!(result_of(&mut s, "SUM(B1:B4)"), "60");
    assert_eq!(result_of(&mut s, "AVERAGE(B1:B3)"), "20");
    assert_eq!(result_of(&mut s, "COUNT(B1:B4)"), "3");
    assert_eq!(result_of(&mut s, "COUNTA(B1:B4)"), "4");
    assert_eq!(result_of(&mut s, "MAX($B$1:B3)-MIN(B1:B3)"), "20");
    assert_eq!(result_of(&mut s, "B1/B2"), "0.5");
    assert_eq!(result_of(&mut s, "B1%"), "0.1");
    assert_eq!(result_of(&mut s, "Z99+1"), "1");
}

#[test]
fn test_chained_formulas_follow_edits() {
    let mut s = session();
    s.set_cell_number(4.0, 0, 0).unwrap();
    s.set_cell_formula("A1*2", 0, 1).unwrap();
    s.set_cell_formula("B1+1", 0, 2).unwrap();
    assert_eq!(s.get_cell(0, 2).unwrap(), "9");

    s.set_cell_number(10.0, 0, 0).unwrap();
    assert_eq!(s.get_cell(0, 2).unwrap(), "21");
}

#[test]
fn test_other_sheets() {
    let mut s = session();
    s.add_sheet("My Rates").unwrap();
    s.select_sheet("My Rates").unwrap();
    s.set_cell_number(0.2, 0, 0).unwrap();
    s.select_sheet("Sheet1").unwrap();
    s.set_cell_number(50.0, 0, 0).unwrap();

    assert_eq!(result_of(&mut s, "A1*'My Rates'!A1"), "10");
    assert_eq!(result_of(&mut s, "Missing!A1"), "#REF!");
}

#[test]
fn test_error_values() {
    let mut s = session();
    assert_eq!(result_of(&mut s, "1/0"), "#DIV/0!");
    assert_eq!(result_of(&mut s, "\"a\"+1"), "#VALUE!");
    assert_eq!(result_of(&mut s, "NOSUCHFN(1)"), "#NAME?");
    assert_eq!(result_of(&mut s, "SQRT(-1)"), "#NUM!");
    assert_eq!(result_of(&mut s, "IFERROR(1/0,\"none\")"), "none");
    assert_eq!(result_of(&mut s, "ISERROR(1/0)"), "true");
}

#[test]
fn test_circular_reference_is_ref_error() {
    let mut s = session();
    s.set_cell_formula("B1+1", 0, 0).unwrap();
    s.set_cell_formula("A1+1", 0, 1).unwrap();
    assert_eq!(s.get_cell(0, 0).unwrap(), "#REF!");

    s.set_cell_formula("C1", 0, 2).unwrap();
    assert_eq!(s.get_cell(0, 2).unwrap(), "#REF!");
}

#[test]
fn test_text_and_dates() {
    let mut s = session();
    s.set_cell_string("  Quarterly   Report ", 0, 0).unwrap();
    s.set_cell_date("03-30-2018", 0, 1).unwrap();

    assert_eq!(result_of(&mut s, "UPPER(TRIM(A1))"), "QUARTERLY REPORT");
    assert_eq!(result_of(&mut s, "LEN(TRIM(A1))"), "16");
    assert_eq!(result_of(&mut s, "YEAR(B1)&\"/\"&MONTH(B1)"), "2018/3");
    assert_eq!(result_of(&mut s, "DATE(2018,3,30)=B1"), "true");
    assert_eq!(result_of(&mut s, "IF(AND(1<2,NOT(FALSE)),\"yes\",\"no\")"), "yes");
}
