//! Formula error types

use keysheet_core::CellError;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors raised while parsing or evaluating a formula.
///
/// Value-level problems (a text operand in arithmetic, division by zero)
/// evaluate to an error value instead; these variants are for formulas that
/// cannot be evaluated at all.
#[derive(Debug, Error)]
pub enum FormulaError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("Circular reference detected at {0}")]
    CircularReference(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}

impl FormulaError {
    /// Error value a cell shows when its formula fails this way
    pub fn to_cell_error(&self) -> CellError {
        match self {
            FormulaError::Parse(_) | FormulaError::UnknownFunction(_) => CellError::Name,
            FormulaError::CircularReference(_) | FormulaError::InvalidReference(_) => {
                CellError::Ref
            }
            FormulaError::Evaluation(_)
            | FormulaError::Argument(_)
            | FormulaError::ArgumentCount { .. } => CellError::Value,
        }
    }
}
