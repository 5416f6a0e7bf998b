//! Logical functions

use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use keysheet_core::CellError;

fn condition(value: &FormulaValue) -> Result<bool, CellError> {
    match value {
        FormulaValue::Error(e) => Err(*e),
        other => other.clone().scalar().as_bool().ok_or(CellError::Value),
    }
}

pub fn fn_if(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let chosen = match condition(&args[0]) {
        Ok(true) => args[1].clone(),
        Ok(false) => args.get(2).cloned().unwrap_or(FormulaValue::Boolean(false)),
        Err(e) => FormulaValue::Error(e),
    };
    Ok(chosen)
}

/// Booleans among the arguments; text inside ranges is skipped
fn booleans(args: &[FormulaValue]) -> Result<Vec<bool>, CellError> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            FormulaValue::Array(_) => {
                for value in arg.flatten() {
                    match value {
                        FormulaValue::Error(e) => return Err(*e),
                        FormulaValue::Boolean(b) => out.push(*b),
                        FormulaValue::Number(n) => out.push(*n != 0.0),
                        _ => {}
                    }
                }
            }
            FormulaValue::Empty => {}
            other => out.push(condition(other)?),
        }
    }
    if out.is_empty() {
        return Err(CellError::Value);
    }
    Ok(out)
}

pub fn fn_and(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(match booleans(args) {
        Ok(values) => FormulaValue::Boolean(values.into_iter().all(|b| b)),
        Err(e) => FormulaValue::Error(e),
    })
}

pub fn fn_or(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(match booleans(args) {
        Ok(values) => FormulaValue::Boolean(values.into_iter().any(|b| b)),
        Err(e) => FormulaValue::Error(e),
    })
}

pub fn fn_not(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(match condition(&args[0]) {
        Ok(b) => FormulaValue::Boolean(!b),
        Err(e) => FormulaValue::Error(e),
    })
}

pub fn fn_true(_args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(true))
}

pub fn fn_false(_args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(false))
}

pub fn fn_iferror(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let value = args[0].clone().scalar();
    if value.is_error() {
        Ok(args[1].clone())
    } else {
        Ok(value)
    }
}
