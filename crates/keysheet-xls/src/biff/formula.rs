//! BIFF8 formula token streams (rgce).
//!
//! Formulas are stored in reverse Polish notation: operands push, operators
//! and function tokens pop. Only the token subset produced by the formula
//! parser is supported; shared formulas, names, arrays and 3-D references are
//! reported as unsupported so readers can fall back to the cached result.

use super::parser::{ByteReader, PutLe};
use super::strings::{encode_short_string, read_short_string};
use crate::error::{XlsError, XlsResult};
use crate::{XLS_MAX_COLS, XLS_MAX_ROWS};
use keysheet_core::{CellAddress, CellError, CellRange};
use keysheet_formula::{
    BinaryOperator, CellReference, FormulaExpr, RangeReference, UnaryOperator,
};

// Token ids
const PTG_EXP: u8 = 0x01;
const PTG_ADD: u8 = 0x03;
const PTG_SUB: u8 = 0x04;
const PTG_MUL: u8 = 0x05;
const PTG_DIV: u8 = 0x06;
const PTG_POWER: u8 = 0x07;
const PTG_CONCAT: u8 = 0x08;
const PTG_LT: u8 = 0x09;
const PTG_LE: u8 = 0x0A;
const PTG_EQ: u8 = 0x0B;
const PTG_GE: u8 = 0x0C;
const PTG_GT: u8 = 0x0D;
const PTG_NE: u8 = 0x0E;
const PTG_UPLUS: u8 = 0x12;
const PTG_UMINUS: u8 = 0x13;
const PTG_PERCENT: u8 = 0x14;
const PTG_PAREN: u8 = 0x15;
const PTG_STR: u8 = 0x17;
const PTG_ATTR: u8 = 0x19;
const PTG_ERR: u8 = 0x1C;
const PTG_BOOL: u8 = 0x1D;
const PTG_INT: u8 = 0x1E;
const PTG_NUM: u8 = 0x1F;

// Classified tokens, by base id; the class lives in bits 5..6
const PTG_FUNC: u8 = 0x01;
const PTG_FUNC_VAR: u8 = 0x02;
const PTG_REF: u8 = 0x04;
const PTG_AREA: u8 = 0x05;
const PTG_REF_ERR: u8 = 0x0A;
const PTG_AREA_ERR: u8 = 0x0B;

const CLASS_REFERENCE: u8 = 0x20;
const CLASS_VALUE: u8 = 0x40;

const ATTR_CHOOSE: u8 = 0x04;
const ATTR_SUM: u8 = 0x10;

/// A worksheet function with its BIFF8 id
#[derive(Debug, Clone, Copy)]
pub struct BiffFunction {
    pub name: &'static str,
    pub id: u16,
    /// Argument count of fixed-arity functions; `None` for variadic ones
    pub fixed_args: Option<u8>,
}

const fn fixed(name: &'static str, id: u16, args: u8) -> BiffFunction {
    BiffFunction {
        name,
        id,
        fixed_args: Some(args),
    }
}

const fn variadic(name: &'static str, id: u16) -> BiffFunction {
    BiffFunction {
        name,
        id,
        fixed_args: None,
    }
}

static FUNCTIONS: &[BiffFunction] = &[
    variadic("COUNT", 0),
    variadic("IF", 1),
    fixed("ISERROR", 3, 1),
    variadic("SUM", 4),
    variadic("AVERAGE", 5),
    variadic("MIN", 6),
    variadic("MAX", 7),
    fixed("PI", 19, 0),
    fixed("SQRT", 20, 1),
    fixed("ABS", 24, 1),
    fixed("INT", 25, 1),
    fixed("SIGN", 26, 1),
    fixed("ROUND", 27, 2),
    fixed("MID", 31, 3),
    fixed("LEN", 32, 1),
    fixed("VALUE", 33, 1),
    fixed("TRUE", 34, 0),
    fixed("FALSE", 35, 0),
    variadic("AND", 36),
    variadic("OR", 37),
    fixed("NOT", 38, 1),
    fixed("MOD", 39, 2),
    fixed("TEXT", 48, 2),
    fixed("DATE", 65, 3),
    fixed("DAY", 67, 1),
    fixed("MONTH", 68, 1),
    fixed("YEAR", 69, 1),
    fixed("NOW", 74, 0),
    fixed("LOWER", 112, 1),
    fixed("UPPER", 113, 1),
    variadic("LEFT", 115),
    variadic("RIGHT", 116),
    fixed("TRIM", 118, 1),
    fixed("ISTEXT", 127, 1),
    fixed("ISNUMBER", 128, 1),
    fixed("ISBLANK", 129, 1),
    variadic("COUNTA", 169),
    variadic("PRODUCT", 183),
    variadic("TRUNC", 197),
    fixed("TODAY", 221, 0),
    variadic("CONCATENATE", 336),
    fixed("POWER", 337, 2),
];

pub fn function_by_name(name: &str) -> Option<&'static BiffFunction> {
    FUNCTIONS.iter().find(|f| f.name.eq_ignore_ascii_case(name))
}

pub fn function_by_id(id: u16) -> Option<&'static BiffFunction> {
    FUNCTIONS.iter().find(|f| f.id == id)
}

// === Encoding ===

/// Encode a parsed formula for a cell on `sheet_name`.
///
/// References to other sheets and functions without a BIFF8 id fail with
/// [`XlsError::InvalidFormat`].
pub fn encode_formula(expr: &FormulaExpr, sheet_name: &str) -> XlsResult<Vec<u8>> {
    let mut out = Vec::new();
    Encoder { sheet_name }.expr(expr, CLASS_VALUE, &mut out)?;
    Ok(out)
}

struct Encoder<'a> {
    sheet_name: &'a str,
}

impl Encoder<'_> {
    fn expr(&self, expr: &FormulaExpr, class: u8, out: &mut Vec<u8>) -> XlsResult<()> {
        match expr {
            FormulaExpr::Number(n) => {
                if n.fract() == 0.0 && (0.0..=65535.0).contains(n) {
                    out.put_u8(PTG_INT);
                    out.put_u16(*n as u16);
                } else {
                    out.put_u8(PTG_NUM);
                    out.put_f64(*n);
                }
            }
            FormulaExpr::String(s) => {
                if s.encode_utf16().count() > 255 {
                    return Err(XlsError::InvalidFormat(
                        "formula text constants are limited to 255 characters".into(),
                    ));
                }
                out.put_u8(PTG_STR);
                out.extend_from_slice(&encode_short_string(s));
            }
            FormulaExpr::Boolean(b) => {
                out.put_u8(PTG_BOOL);
                out.put_u8(u8::from(*b));
            }
            FormulaExpr::Error(e) => {
                out.put_u8(PTG_ERR);
                out.put_u8(e.code());
            }
            FormulaExpr::CellRef(r) => {
                self.check_sheet(&r.sheet)?;
                out.put_u8(class | PTG_REF);
                put_cell(out, &r.address, true)?;
                put_cell(out, &r.address, false)?;
            }
            FormulaExpr::RangeRef(r) => {
                self.check_sheet(&r.sheet)?;
                out.put_u8(CLASS_REFERENCE | PTG_AREA);
                put_cell(out, &r.range.start, true)?;
                put_cell(out, &r.range.end, true)?;
                put_cell(out, &r.range.start, false)?;
                put_cell(out, &r.range.end, false)?;
            }
            FormulaExpr::NameRef(name) => {
                return Err(XlsError::InvalidFormat(format!(
                    "defined name '{}' cannot be written to .xls",
                    name
                )))
            }
            FormulaExpr::BinaryOp { op, left, right } => {
                let p = op.precedence();
                self.operand(left, left.precedence() < p, out)?;
                self.operand(right, right.precedence() <= p, out)?;
                out.put_u8(binary_token(*op));
            }
            FormulaExpr::UnaryOp { op, operand } => match op {
                UnaryOperator::Negate => {
                    self.operand(operand, operand.precedence() < 6, out)?;
                    out.put_u8(PTG_UMINUS);
                }
                UnaryOperator::Percent => {
                    self.operand(operand, operand.precedence() < 7, out)?;
                    out.put_u8(PTG_PERCENT);
                }
            },
            FormulaExpr::Function { name, args } => {
                let func = function_by_name(name).ok_or_else(|| {
                    XlsError::InvalidFormat(format!("function {} has no .xls equivalent", name))
                })?;
                for arg in args {
                    self.expr(arg, CLASS_REFERENCE, out)?;
                }
                match func.fixed_args {
                    Some(n) if n as usize == args.len() => {
                        out.put_u8(CLASS_VALUE | PTG_FUNC);
                        out.put_u16(func.id);
                    }
                    Some(n) => {
                        return Err(XlsError::InvalidFormat(format!(
                            "{} takes {} argument(s), got {}",
                            func.name,
                            n,
                            args.len()
                        )))
                    }
                    None => {
                        if args.len() > 30 {
                            return Err(XlsError::InvalidFormat(format!(
                                "{} is limited to 30 arguments in .xls",
                                func.name
                            )));
                        }
                        out.put_u8(CLASS_VALUE | PTG_FUNC_VAR);
                        out.put_u8(args.len() as u8);
                        out.put_u16(func.id);
                    }
                }
            }
        }
        Ok(())
    }

    fn operand(&self, expr: &FormulaExpr, parens: bool, out: &mut Vec<u8>) -> XlsResult<()> {
        self.expr(expr, CLASS_VALUE, out)?;
        if parens {
            out.put_u8(PTG_PAREN);
        }
        Ok(())
    }

    fn check_sheet(&self, sheet: &Option<String>) -> XlsResult<()> {
        match sheet {
            Some(name) if !name.eq_ignore_ascii_case(self.sheet_name) => {
                Err(XlsError::InvalidFormat(format!(
                    "reference to sheet '{}' cannot be written to .xls",
                    name
                )))
            }
            _ => Ok(()),
        }
    }
}

fn binary_token(op: BinaryOperator) -> u8 {
    match op {
        BinaryOperator::Add => PTG_ADD,
        BinaryOperator::Subtract => PTG_SUB,
        BinaryOperator::Multiply => PTG_MUL,
        BinaryOperator::Divide => PTG_DIV,
        BinaryOperator::Power => PTG_POWER,
        BinaryOperator::Concat => PTG_CONCAT,
        BinaryOperator::LessThan => PTG_LT,
        BinaryOperator::LessEqual => PTG_LE,
        BinaryOperator::Equal => PTG_EQ,
        BinaryOperator::GreaterEqual => PTG_GE,
        BinaryOperator::GreaterThan => PTG_GT,
        BinaryOperator::NotEqual => PTG_NE,
    }
}

/// Row field (`row = true`) or flagged column field of a reference
fn put_cell(out: &mut Vec<u8>, addr: &CellAddress, row: bool) -> XlsResult<()> {
    if addr.row >= XLS_MAX_ROWS || addr.col >= XLS_MAX_COLS {
        return Err(XlsError::InvalidFormat(format!(
            "reference {} is outside the .xls grid",
            addr
        )));
    }
    if row {
        out.put_u16(addr.row as u16);
    } else {
        let mut col = addr.col;
        if !addr.col_absolute {
            col |= 0x4000;
        }
        if !addr.row_absolute {
            col |= 0x8000;
        }
        out.put_u16(col);
    }
    Ok(())
}

// === Decoding ===

/// Rebuild the expression tree of a token stream
pub fn decode_formula(rgce: &[u8]) -> XlsResult<FormulaExpr> {
    let mut r = ByteReader::new(rgce);
    let mut stack: Vec<FormulaExpr> = Vec::new();

    while !r.is_empty() {
        let ptg = r.u8()?;
        match ptg {
            PTG_ADD..=PTG_NE => {
                let right = pop(&mut stack)?;
                let left = pop(&mut stack)?;
                stack.push(FormulaExpr::BinaryOp {
                    op: binary_operator(ptg),
                    left: Box::new(left),
                    right: Box::new(right),
                });
            }
            PTG_UPLUS | PTG_PAREN => {}
            PTG_UMINUS | PTG_PERCENT => {
                let operand = pop(&mut stack)?;
                let op = if ptg == PTG_UMINUS {
                    UnaryOperator::Negate
                } else {
                    UnaryOperator::Percent
                };
                stack.push(FormulaExpr::UnaryOp {
                    op,
                    operand: Box::new(operand),
                });
            }
            PTG_STR => stack.push(FormulaExpr::String(read_short_string(&mut r)?)),
            PTG_ATTR => {
                let flags = r.u8()?;
                let data = r.u16()?;
                if flags & ATTR_CHOOSE != 0 {
                    r.skip((data as usize + 1) * 2)?;
                }
                if flags & ATTR_SUM != 0 {
                    let arg = pop(&mut stack)?;
                    stack.push(FormulaExpr::Function {
                        name: "SUM".into(),
                        args: vec![arg],
                    });
                }
            }
            PTG_ERR => {
                let code = r.u8()?;
                stack.push(FormulaExpr::Error(
                    CellError::from_code(code).unwrap_or(CellError::Value),
                ));
            }
            PTG_BOOL => stack.push(FormulaExpr::Boolean(r.u8()? != 0)),
            PTG_INT => stack.push(FormulaExpr::Number(r.u16()? as f64)),
            PTG_NUM => stack.push(FormulaExpr::Number(r.f64()?)),
            0x20..=0x7F => decode_classified(ptg & 0x1F, &mut r, &mut stack)?,
            PTG_EXP => return Err(unsupported("shared formula")),
            other => return Err(unsupported(&format!("token 0x{:02X}", other))),
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(expr), true) => Ok(expr),
        _ => Err(XlsError::Parse("unbalanced formula token stream".into())),
    }
}

fn decode_classified(
    base: u8,
    r: &mut ByteReader,
    stack: &mut Vec<FormulaExpr>,
) -> XlsResult<()> {
    match base {
        PTG_FUNC => {
            let id = r.u16()?;
            let func = function_by_id(id).ok_or_else(|| unsupported(&format!("function #{}", id)))?;
            let count = func.fixed_args.unwrap_or(0) as usize;
            push_call(stack, func.name, count)
        }
        PTG_FUNC_VAR => {
            let count = (r.u8()? & 0x7F) as usize;
            let id = r.u16()? & 0x7FFF;
            let func = function_by_id(id).ok_or_else(|| unsupported(&format!("function #{}", id)))?;
            push_call(stack, func.name, count)
        }
        PTG_REF => {
            let row = r.u16()?;
            let col = r.u16()?;
            stack.push(FormulaExpr::CellRef(CellReference {
                sheet: None,
                address: cell_address(row, col),
            }));
            Ok(())
        }
        PTG_AREA => {
            let first_row = r.u16()?;
            let last_row = r.u16()?;
            let first_col = r.u16()?;
            let last_col = r.u16()?;
            stack.push(FormulaExpr::RangeRef(RangeReference {
                sheet: None,
                range: CellRange::new(
                    cell_address(first_row, first_col),
                    cell_address(last_row, last_col),
                ),
            }));
            Ok(())
        }
        PTG_REF_ERR | PTG_AREA_ERR => {
            r.skip(if base == PTG_REF_ERR { 4 } else { 8 })?;
            stack.push(FormulaExpr::Error(CellError::Ref));
            Ok(())
        }
        other => Err(unsupported(&format!("token 0x{:02X}", other | CLASS_REFERENCE))),
    }
}

fn push_call(stack: &mut Vec<FormulaExpr>, name: &str, count: usize) -> XlsResult<()> {
    if stack.len() < count {
        return Err(XlsError::Parse(format!("{} is missing arguments", name)));
    }
    let args = stack.split_off(stack.len() - count);
    stack.push(FormulaExpr::Function {
        name: name.to_string(),
        args,
    });
    Ok(())
}

fn cell_address(row: u16, col_field: u16) -> CellAddress {
    CellAddress::with_absolute(
        row as u32,
        col_field & 0x3FFF,
        col_field & 0x8000 == 0,
        col_field & 0x4000 == 0,
    )
}

fn binary_operator(ptg: u8) -> BinaryOperator {
    match ptg {
        PTG_ADD => BinaryOperator::Add,
        PTG_SUB => BinaryOperator::Subtract,
        PTG_MUL => BinaryOperator::Multiply,
        PTG_DIV => BinaryOperator::Divide,
        PTG_POWER => BinaryOperator::Power,
        PTG_CONCAT => BinaryOperator::Concat,
        PTG_LT => BinaryOperator::LessThan,
        PTG_LE => BinaryOperator::LessEqual,
        PTG_EQ => BinaryOperator::Equal,
        PTG_GE => BinaryOperator::GreaterEqual,
        PTG_GT => BinaryOperator::GreaterThan,
        _ => BinaryOperator::NotEqual,
    }
}

fn pop(stack: &mut Vec<FormulaExpr>) -> XlsResult<FormulaExpr> {
    stack
        .pop()
        .ok_or_else(|| XlsError::Parse("formula token stream underflow".into()))
}

fn unsupported(what: &str) -> XlsError {
    XlsError::Parse(format!("unsupported formula content: {}", what))
}
