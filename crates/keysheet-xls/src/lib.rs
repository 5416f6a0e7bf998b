//! # keysheet-xls
//!
//! XLS (BIFF8) reader and writer for keysheet workbooks.
//!
//! The legacy binary format stores a `Workbook` stream of BIFF records inside
//! an OLE2 compound file. Values, number formats, the date system and formulas
//! (as parsed token streams) are carried both ways.

pub mod biff;
pub mod error;
pub mod reader;
pub mod writer;

mod formats;

pub use error::{XlsError, XlsResult};
pub use reader::XlsReader;
pub use writer::XlsWriter;

/// Rows a BIFF8 sheet can address
pub const XLS_MAX_ROWS: u32 = 65_536;

/// Columns a BIFF8 sheet can address
pub const XLS_MAX_COLS: u16 = 256;
