//! # keysheet-formula
//!
//! Formula support for keysheet workbooks:
//! - parsing formula text into a [`FormulaExpr`] tree and printing it back
//! - evaluating a tree, or a whole formula cell, against a live [`Workbook`](keysheet_core::Workbook)
//! - ordering formula cells so precedents are computed first
//! - the built-in function registry
//!
//! ## Example
//!
//! ```rust
//! use keysheet_core::Workbook;
//! use keysheet_formula::{evaluate_cell, FormulaValue};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("E4", 60.0).unwrap();
//! sheet.set_cell_value("F4", 1000.0).unwrap();
//! sheet.set_cell_value_at(3, 9, keysheet_core::CellValue::formula("=SUM(F4,E4)")).unwrap();
//!
//! assert_eq!(evaluate_cell(&workbook, 0, 3, 9), FormulaValue::Number(1060.0));
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;

pub use ast::{BinaryOperator, CellReference, FormulaExpr, RangeReference, UnaryOperator};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, evaluate_cell, EvaluationContext, FormulaValue};
pub use functions::{lookup_function, FunctionDef};
pub use parser::parse_formula;
