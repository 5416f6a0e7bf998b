//! Date functions over serial numbers in the workbook's date system

use super::{number_arg, try_value};
use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime};
use keysheet_core::date::{date_to_serial, datetime_to_serial, serial_to_datetime};
use keysheet_core::CellError;

fn datetime_arg(args: &[FormulaValue], ctx: &EvaluationContext) -> Result<NaiveDateTime, FormulaValue> {
    let serial = number_arg(args, 0)?;
    serial_to_datetime(serial, ctx.date_1904()).ok_or(FormulaValue::Error(CellError::Num))
}

/// DATE(year, month, day); months and days roll over, years below 1900 are
/// offset from 1900
pub fn fn_date(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut year = try_value!(number_arg(args, 0)).trunc() as i64;
    let month = try_value!(number_arg(args, 1)).trunc() as i64;
    let day = try_value!(number_arg(args, 2)).trunc() as i64;
    if (0..1900).contains(&year) {
        year += 1900;
    }
    if !(0..=9999).contains(&year) || month.abs() > 120_000 || day.abs() > 3_000_000 {
        return Ok(FormulaValue::Error(CellError::Num));
    }

    let months = year * 12 + (month - 1);
    let first = i32::try_from(months.div_euclid(12))
        .ok()
        .and_then(|y| NaiveDate::from_ymd_opt(y, months.rem_euclid(12) as u32 + 1, 1));
    let Some(date) = first.and_then(|d| d.checked_add_signed(Duration::days(day - 1))) else {
        return Ok(FormulaValue::Error(CellError::Num));
    };

    let serial = date_to_serial(date, ctx.date_1904());
    if serial < 0.0 || date.year() > 9999 {
        return Ok(FormulaValue::Error(CellError::Num));
    }
    Ok(FormulaValue::Number(serial))
}

pub fn fn_year(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let dt = try_value!(datetime_arg(args, ctx));
    Ok(FormulaValue::Number(dt.year() as f64))
}

pub fn fn_month(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let dt = try_value!(datetime_arg(args, ctx));
    Ok(FormulaValue::Number(dt.month() as f64))
}

pub fn fn_day(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let dt = try_value!(datetime_arg(args, ctx));
    Ok(FormulaValue::Number(dt.day() as f64))
}

pub fn fn_today(_args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let today = Local::now().date_naive();
    Ok(FormulaValue::Number(date_to_serial(today, ctx.date_1904())))
}

pub fn fn_now(_args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let now = Local::now().naive_local();
    Ok(FormulaValue::Number(datetime_to_serial(now, ctx.date_1904())))
}

#[cfg(test)]
mod tests {
    use crate::evaluator::{evaluate, EvaluationContext, FormulaValue};
    use crate::parser::parse_formula;
    use keysheet_core::{CellError, Workbook};
    use pretty_assertions::assert_eq;

    fn eval(formula: &str) -> FormulaValue {
        let ast = parse_formula(formula).unwrap();
        evaluate(&ast, &EvaluationContext::simple()).unwrap()
    }

    #[test]
    fn test_date_builds_serials() {
        assert_eq!(eval("=DATE(2018,12,30)"), FormulaValue::Number(43464.0));
        assert_eq!(eval("=DATE(2018,13,1)"), FormulaValue::Number(43466.0));
        assert_eq!(eval("=DATE(2019,1,0)"), FormulaValue::Number(43465.0));
        assert_eq!(eval("=DATE(118,12,30)"), FormulaValue::Number(43464.0));
        assert_eq!(eval("=DATE(-1,1,1)"), FormulaValue::Error(CellError::Num));
    }

    #[test]
    fn test_date_parts() {
        assert_eq!(eval("=YEAR(43464)"), FormulaValue::Number(2018.0));
        assert_eq!(eval("=MONTH(43464)"), FormulaValue::Number(12.0));
        assert_eq!(eval("=DAY(43464.75)"), FormulaValue::Number(30.0));
        assert_eq!(eval("=YEAR(-1)"), FormulaValue::Error(CellError::Num));
    }

    #[test]
    fn test_1904_system() {
        let mut wb = Workbook::new();
        wb.settings_mut().date_1904 = true;
        let ctx = EvaluationContext::new(Some(&wb), 0, 0, 0);
        let ast = parse_formula("=DATE(1904,1,2)").unwrap();
        assert_eq!(evaluate(&ast, &ctx).unwrap(), FormulaValue::Number(1.0));
    }

    #[test]
    fn test_today_is_a_whole_serial() {
        let FormulaValue::Number(today) = eval("=TODAY()") else {
            panic!("TODAY should return a number");
        };
        assert!(today > 43464.0);
        assert_eq!(today.fract(), 0.0);
    }
}
