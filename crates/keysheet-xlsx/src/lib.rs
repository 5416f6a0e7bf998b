//! # keysheet-xlsx
//!
//! XLSX (Office Open XML) reader and writer for keysheet workbooks.
//!
//! Cell values, formulas with their cached results, number formats and the
//! workbook date system survive a round trip. Other styling is not read.

pub mod error;
pub mod reader;
pub mod writer;

mod styles;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;
