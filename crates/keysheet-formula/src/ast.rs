//! Formula syntax tree

use keysheet_core::{format_general, CellAddress, CellError, CellRange};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),

    CellRef(CellReference),
    RangeRef(RangeReference),
    /// Defined name; evaluates to `#NAME?`
    NameRef(String),

    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    /// Function call; `name` is uppercase
    Function {
        name: String,
        args: Vec<FormulaExpr>,
    },
}

/// Cell reference with optional sheet
#[derive(Debug, Clone, PartialEq)]
pub struct CellReference {
    pub sheet: Option<String>,
    pub address: CellAddress,
}

/// Range reference with optional sheet
#[derive(Debug, Clone, PartialEq)]
pub struct RangeReference {
    pub sheet: Option<String>,
    pub range: CellRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Concat,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Concat => "&",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
        }
    }

    /// Binding strength, higher binds tighter
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Equal
            | BinaryOperator::NotEqual
            | BinaryOperator::LessThan
            | BinaryOperator::LessEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterEqual => 1,
            BinaryOperator::Concat => 2,
            BinaryOperator::Add | BinaryOperator::Subtract => 3,
            BinaryOperator::Multiply | BinaryOperator::Divide => 4,
            BinaryOperator::Power => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Percent,
}

impl FormulaExpr {
    /// Binding strength of the node when printed
    pub fn precedence(&self) -> u8 {
        match self {
            FormulaExpr::BinaryOp { op, .. } => op.precedence(),
            FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                ..
            } => 6,
            FormulaExpr::UnaryOp {
                op: UnaryOperator::Percent,
                ..
            } => 7,
            _ => 8,
        }
    }

    /// Formula text with the leading `=`
    pub fn to_formula(&self) -> String {
        format!("={}", self)
    }
}

fn write_sheet(f: &mut fmt::Formatter<'_>, sheet: &Option<String>) -> fmt::Result {
    let Some(sheet) = sheet else {
        return Ok(());
    };
    let plain = sheet.chars().all(|c| c.is_alphanumeric() || c == '_')
        && !sheet.starts_with(|c: char| c.is_ascii_digit());
    if plain {
        write!(f, "{}!", sheet)
    } else {
        write!(f, "'{}'!", sheet.replace('\'', "''"))
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &FormulaExpr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

impl fmt::Display for FormulaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaExpr::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else if n.abs() >= 1e15 {
                    f.write_str(&format_general(*n))
                } else {
                    write!(f, "{}", n)
                }
            }
            FormulaExpr::String(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            FormulaExpr::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            FormulaExpr::Error(e) => f.write_str(e.as_str()),
            FormulaExpr::CellRef(r) => {
                write_sheet(f, &r.sheet)?;
                write!(f, "{}", r.address)
            }
            FormulaExpr::RangeRef(r) => {
                write_sheet(f, &r.sheet)?;
                write!(f, "{}:{}", r.range.start, r.range.end)
            }
            FormulaExpr::NameRef(name) => f.write_str(name),
            FormulaExpr::BinaryOp { op, left, right } => {
                let p = op.precedence();
                write_operand(f, left, left.precedence() < p)?;
                f.write_str(op.symbol())?;
                write_operand(f, right, right.precedence() <= p)
            }
            FormulaExpr::UnaryOp { op, operand } => match op {
                UnaryOperator::Negate => {
                    f.write_str("-")?;
                    write_operand(f, operand, operand.precedence() < 6)
                }
                UnaryOperator::Percent => {
                    write_operand(f, operand, operand.precedence() < 7)?;
                    f.write_str("%")
                }
            },
            FormulaExpr::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_formula;
    use pretty_assertions::assert_eq;

    fn reprint(formula: &str) -> String {
        parse_formula(formula).unwrap().to_formula()
    }

    #[test]
    fn test_print_keeps_needed_parentheses() {
        assert_eq!(reprint("=(1+2)*3"), "=(1+2)*3");
        assert_eq!(reprint("=1+2*3"), "=1+2*3");
        assert_eq!(reprint("=((A1))-(B1-C1)"), "=A1-(B1-C1)");
        assert_eq!(reprint("=2^3^2"), "=2^3^2");
        assert_eq!(reprint("=(2^3)^2"), "=2^3^2");
        assert_eq!(reprint("=2^(3^2)"), "=2^(3^2)");
        assert_eq!(reprint("=-(1+2)"), "=-(1+2)");
        assert_eq!(reprint("=(A1+1)%"), "=(A1+1)%");
    }

    #[test]
    fn test_print_references_and_literals() {
        assert_eq!(reprint("=sum($F$4, e4)"), "=SUM($F$4,E4)");
        assert_eq!(reprint("='My Sheet'!A1:B2"), "='My Sheet'!A1:B2");
        assert_eq!(reprint("=Data!C3&\"say \"\"hi\"\"\""), "=Data!C3&\"say \"\"hi\"\"\"");
        assert_eq!(reprint("=0.25*TRUE"), "=0.25*TRUE");
        assert_eq!(reprint("=#N/A"), "=#N/A");
    }
}
