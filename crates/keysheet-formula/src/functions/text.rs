//! Text functions

use super::{number_arg, try_value};
use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use keysheet_core::{format_number, CellError, NumberFormat};

/// Text of one argument, or the error value it carries
fn text_arg(args: &[FormulaValue], index: usize) -> Result<String, FormulaValue> {
    match args.get(index).cloned().unwrap_or(FormulaValue::Empty).scalar() {
        FormulaValue::Error(e) => Err(FormulaValue::Error(e)),
        value => Ok(value.as_string()),
    }
}

/// Optional character count, defaulting to 1; negative counts are `#VALUE!`
fn count_arg(args: &[FormulaValue], index: usize) -> Result<usize, FormulaValue> {
    if args.len() <= index {
        return Ok(1);
    }
    let n = number_arg(args, index)?.trunc();
    if n < 0.0 {
        return Err(FormulaValue::Error(CellError::Value));
    }
    Ok(n as usize)
}

pub fn fn_concatenate(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut out = String::new();
    for arg in args {
        match arg.clone().scalar() {
            FormulaValue::Error(e) => return Ok(FormulaValue::Error(e)),
            value => out.push_str(&value.as_string()),
        }
    }
    Ok(FormulaValue::String(out))
}

pub fn fn_len(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let text = try_value!(text_arg(args, 0));
    Ok(FormulaValue::Number(text.chars().count() as f64))
}

pub fn fn_left(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let text = try_value!(text_arg(args, 0));
    let n = try_value!(count_arg(args, 1));
    Ok(FormulaValue::String(text.chars().take(n).collect()))
}

pub fn fn_right(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let text = try_value!(text_arg(args, 0));
    let n = try_value!(count_arg(args, 1));
    let len = text.chars().count();
    Ok(FormulaValue::String(text.chars().skip(len.saturating_sub(n)).collect()))
}

/// MID(text, start, count) with a 1-based start
pub fn fn_mid(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let text = try_value!(text_arg(args, 0));
    let start = try_value!(number_arg(args, 1)).trunc();
    let count = try_value!(number_arg(args, 2)).trunc();
    if start < 1.0 || count < 0.0 {
        return Ok(FormulaValue::Error(CellError::Value));
    }
    Ok(FormulaValue::String(
        text.chars()
            .skip(start as usize - 1)
            .take(count as usize)
            .collect(),
    ))
}

pub fn fn_upper(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::String(try_value!(text_arg(args, 0)).to_uppercase()))
}

pub fn fn_lower(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::String(try_value!(text_arg(args, 0)).to_lowercase()))
}

/// TRIM drops outer spaces and collapses inner runs to one
pub fn fn_trim(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let text = try_value!(text_arg(args, 0));
    let trimmed = text.split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ");
    Ok(FormulaValue::String(trimmed))
}

pub fn fn_value(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match args[0].clone().scalar() {
        FormulaValue::Number(n) => Ok(FormulaValue::Number(n)),
        FormulaValue::Error(e) => Ok(FormulaValue::Error(e)),
        FormulaValue::Empty => Ok(FormulaValue::Number(0.0)),
        other => {
            let text = other.as_string();
            let text = text.trim();
            let parsed = match text.strip_suffix('%') {
                Some(body) => body.trim().parse::<f64>().map(|n| n / 100.0),
                None => text.replace(',', "").parse::<f64>(),
            };
            Ok(parsed
                .map(FormulaValue::Number)
                .unwrap_or(FormulaValue::Error(CellError::Value)))
        }
    }
}

/// TEXT(value, format_code)
pub fn fn_text(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let code = try_value!(text_arg(args, 1));
    match args[0].clone().scalar() {
        FormulaValue::Error(e) => Ok(FormulaValue::Error(e)),
        value => match value.as_number() {
            Some(n) if !matches!(value, FormulaValue::Boolean(_)) => Ok(FormulaValue::String(
                format_number(n, &NumberFormat::from_code(&code), ctx.date_1904()),
            )),
            _ => Ok(FormulaValue::String(value.as_string())),
        },
    }
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

    fn text(s: &str) -> FormulaValue {
        FormulaValue::String(s.into())
    }

    #[test]
    fn test_slicing() {
        assert_eq!(eval("=LEFT(\"Invoice\",3)"), text("Inv"));
        assert_eq!(eval("=LEFT(\"Invoice\")"), text("I"));
        assert_eq!(eval("=RIGHT(\"Invoice\",4)"), text("oice"));
        assert_eq!(eval("=RIGHT(\"ab\",10)"), text("ab"));
        assert_eq!(eval("=MID(\"Invoice\",3,2)"), text("vo"));
        assert_eq!(eval("=MID(\"Invoice\",0,2)"), FormulaValue::Error(CellError::Value));
        assert_eq!(eval("=LEN(\"héllo\")"), FormulaValue::Number(5.0));
    }

    #[test]
    fn test_case_and_spacing() {
        assert_eq!(eval("=UPPER(\"abc\")"), text("ABC"));
        assert_eq!(eval("=LOWER(\"ABC\")"), text("abc"));
        assert_eq!(eval("=TRIM(\"  a   b  \")"), text("a b"));
        assert_eq!(eval("=CONCATENATE(\"a\",1,TRUE)"), text("a1TRUE"));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(eval("=VALUE(\"1,250.5\")"), FormulaValue::Number(1250.5));
        assert_eq!(eval("=VALUE(\"12%\")"), FormulaValue::Number(0.12));
        assert_eq!(eval("=VALUE(\"abc\")"), FormulaValue::Error(CellError::Value));
        assert_eq!(eval("=TEXT(0.5,\"0%\")"), text("50%"));
        assert_eq!(eval("=TEXT(43464,\"mm-dd-yyyy\")"), text("12-30-2018"));
    }
}
