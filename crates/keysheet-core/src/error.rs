//! Error types for keysheet-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the workbook model
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed A1 address
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Row index past the sheet limit
    #[error("Row index {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column index past the sheet limit
    #[error("Column index {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u32, u16),

    /// Sheet position past the end of the workbook
    #[error("Sheet index {0} out of bounds (count: {1})")]
    SheetOutOfBounds(usize, usize),

    /// No sheet with this name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Sheet name breaks the naming rules
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Another sheet already uses this name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),
}
