//! # keysheet-core
//!
//! Workbook model for the keysheet keyword library.
//!
//! - [`Workbook`] and [`Worksheet`] hold sheets and a sparse grid of cells
//! - [`CellValue`] is the tagged value of a cell, [`CellData`] adds its [`NumberFormat`]
//! - [`format_value`] renders a value the way a spreadsheet displays it
//! - [`date`] converts between calendar dates and serial numbers
//!
//! ## Example
//!
//! ```rust
//! use keysheet_core::{format_value, CellValue, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("J4", 22.0).unwrap();
//!
//! let cell = sheet.cell(3, 9).unwrap();
//! assert_eq!(format_value(&cell.value, &cell.number_format, false), "22");
//! ```

pub mod cell;
pub mod date;
pub mod error;
pub mod format;
pub mod row;
pub mod workbook;
pub mod worksheet;

pub use cell::{CellAddress, CellData, CellError, CellRange, CellStorage, CellValue, SharedString};
pub use error::{Error, Result};
pub use format::{format_general, format_number, format_value, NumberFormat};
pub use row::Row;
pub use workbook::{Workbook, WorkbookSettings};
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
