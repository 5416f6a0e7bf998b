//! Math and aggregate functions

use super::{number_arg, try_value};
use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use keysheet_core::CellError;

/// Numbers among the arguments; text, booleans and blanks are skipped
fn numbers(args: &[FormulaValue]) -> Result<Vec<f64>, FormulaValue> {
    let mut out = Vec::new();
    for value in args.iter().flat_map(FormulaValue::flatten) {
        match value {
            FormulaValue::Number(n) => out.push(*n),
            FormulaValue::Error(e) => return Err(FormulaValue::Error(*e)),
            _ => {}
        }
    }
    Ok(out)
}

fn checked(n: f64) -> FormulaValue {
    if n.is_finite() {
        FormulaValue::Number(n)
    } else {
        FormulaValue::Error(CellError::Num)
    }
}

pub fn fn_sum(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let values = try_value!(numbers(args));
    Ok(checked(values.iter().sum()))
}

pub fn fn_average(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let values = try_value!(numbers(args));
    if values.is_empty() {
        return Ok(FormulaValue::Error(CellError::Div0));
    }
    Ok(checked(values.iter().sum::<f64>() / values.len() as f64))
}

pub fn fn_min(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let values = try_value!(numbers(args));
    Ok(FormulaValue::Number(
        values.into_iter().reduce(f64::min).unwrap_or(0.0),
    ))
}

pub fn fn_max(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let values = try_value!(numbers(args));
    Ok(FormulaValue::Number(
        values.into_iter().reduce(f64::max).unwrap_or(0.0),
    ))
}

/// COUNT: number values only, errors are not counted
pub fn fn_count(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let count = args
        .iter()
        .flat_map(FormulaValue::flatten)
        .filter(|v| matches!(v, FormulaValue::Number(_)))
        .count();
    Ok(FormulaValue::Number(count as f64))
}

/// COUNTA: everything but blanks
pub fn fn_counta(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let count = args
        .iter()
        .flat_map(FormulaValue::flatten)
        .filter(|v| !matches!(v, FormulaValue::Empty))
        .count();
    Ok(FormulaValue::Number(count as f64))
}

pub fn fn_product(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let values = try_value!(numbers(args));
    if values.is_empty() {
        return Ok(FormulaValue::Number(0.0));
    }
    Ok(checked(values.iter().product()))
}

pub fn fn_abs(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Number(try_value!(number_arg(args, 0)).abs()))
}

/// ROUND, half away from zero
pub fn fn_round(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let n = try_value!(number_arg(args, 0));
    let digits = try_value!(number_arg(args, 1)).trunc() as i32;
    Ok(checked(round_to(n, digits)))
}

pub(crate) fn round_to(n: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits.abs());
    if digits >= 0 {
        // Nudge values like 2.675 that sit just under the half
        let scaled = n * factor;
        let nudged = scaled + scaled.signum() * 1e-9 * scaled.abs().max(1.0);
        nudged.round() / factor
    } else {
        (n / factor).round() * factor
    }
}

pub fn fn_int(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Number(try_value!(number_arg(args, 0)).floor()))
}

/// MOD takes the sign of the divisor
pub fn fn_mod(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let n = try_value!(number_arg(args, 0));
    let d = try_value!(number_arg(args, 1));
    if d == 0.0 {
        return Ok(FormulaValue::Error(CellError::Div0));
    }
    Ok(checked(n - d * (n / d).floor()))
}

pub fn fn_sqrt(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let n = try_value!(number_arg(args, 0));
    if n < 0.0 {
        return Ok(FormulaValue::Error(CellError::Num));
    }
    Ok(FormulaValue::Number(n.sqrt()))
}

pub fn fn_power(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let base = try_value!(number_arg(args, 0));
    let exponent = try_value!(number_arg(args, 1));
    if base == 0.0 && exponent < 0.0 {
        return Ok(FormulaValue::Error(CellError::Div0));
    }
    Ok(checked(base.powf(exponent)))
}

pub fn fn_sign(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let n = try_value!(number_arg(args, 0));
    let sign = if n > 0.0 {
        1.0
    } else if n < 0.0 {
        -1.0
    } else {
        0.0
    };
    Ok(FormulaValue::Number(sign))
}

pub fn fn_trunc(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let n = try_value!(number_arg(args, 0));
    let digits = if args.len() > 1 {
        try_value!(number_arg(args, 1)).trunc() as i32
    } else {
        0
    };
    let factor = 10f64.powi(digits);
    Ok(checked((n * factor).trunc() / factor))
}

pub fn fn_pi(_args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Number(std::f64::consts::PI))
}

#[cfg(test)]
mod tests {
    use crate::evaluator::{evaluate, EvaluationContext, FormulaValue};
    use crate::parser::parse_formula;
    use keysheet_core::CellError;
    use pretty_assertions::assert_eq;

    fn eval(formula: &str) -> FormulaValue {
        let ast = parse_formula(formula).unwrap();
        evaluate(&ast, &EvaluationContext::simple()).unwrap()
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(eval("=SUM(1,2,3)"), FormulaValue::Number(6.0));
        assert_eq!(eval("=SUM(1,\"x\",TRUE)"), FormulaValue::Number(1.0));
        assert_eq!(eval("=AVERAGE(2,4)"), FormulaValue::Number(3.0));
        assert_eq!(eval("=AVERAGE(\"x\")"), FormulaValue::Error(CellError::Div0));
        assert_eq!(eval("=MIN(4,-2,9)"), FormulaValue::Number(-2.0));
        assert_eq!(eval("=MAX(4,-2,9)"), FormulaValue::Number(9.0));
        assert_eq!(eval("=COUNT(1,\"a\",2)"), FormulaValue::Number(2.0));
        assert_eq!(eval("=COUNTA(1,\"a\",2)"), FormulaValue::Number(3.0));
        assert_eq!(eval("=PRODUCT(2,3,4)"), FormulaValue::Number(24.0));
        assert_eq!(eval("=SUM(1,#N/A)"), FormulaValue::Error(CellError::Na));
    }

    #[test]
    fn test_rounding() {
        assert_eq!(eval("=ROUND(2.675,2)"), FormulaValue::Number(2.68));
        assert_eq!(eval("=ROUND(-2.5,0)"), FormulaValue::Number(-3.0));
        assert_eq!(eval("=ROUND(1234,-2)"), FormulaValue::Number(1200.0));
        assert_eq!(eval("=INT(-1.5)"), FormulaValue::Number(-2.0));
        assert_eq!(eval("=TRUNC(-1.57,1)"), FormulaValue::Number(-1.5));
    }

    #[test]
    fn test_scalar_functions() {
        assert_eq!(eval("=MOD(-3,2)"), FormulaValue::Number(1.0));
        assert_eq!(eval("=MOD(1,0)"), FormulaValue::Error(CellError::Div0));
        assert_eq!(eval("=SQRT(16)"), FormulaValue::Number(4.0));
        assert_eq!(eval("=SQRT(-1)"), FormulaValue::Error(CellError::Num));
        assert_eq!(eval("=POWER(2,10)"), FormulaValue::Number(1024.0));
        assert_eq!(eval("=ABS(-3)"), FormulaValue::Number(3.0));
        assert_eq!(eval("=SIGN(-0.1)"), FormulaValue::Number(-1.0));
        assert_eq!(eval("=ABS(\"x\")"), FormulaValue::Error(CellError::Value));
    }
}
