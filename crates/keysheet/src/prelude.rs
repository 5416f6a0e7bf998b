//! Prelude module - common imports for keysheet users
//!
//! ```rust
//! use keysheet::prelude::*;
//! ```

pub use crate::{
    CalculationStats,
    CellValue,
    Error,
    ErrorKind,
    // Keyword dispatch
    ExcelLibrary,
    KeywordValue,
    NumberFormat,
    Result,
    // Session
    Session,
    SessionOptions,
    SpreadsheetFormat,
    // Main types
    Workbook,
    // Extension traits
    WorkbookCalculationExt,
    WorkbookExt,
    Worksheet,
};
