//! # keysheet
//!
//! A spreadsheet keyword library for test-automation hosts.
//!
//! Keysheet opens, edits and saves `.xls` and `.xlsx` workbooks with its own
//! workbook model, formula engine and container codecs.
//!
//! - [`Session`] owns one open workbook and a selected sheet and exposes the
//!   typed cell operations
//! - [`ExcelLibrary`] dispatches named keywords with string arguments to a
//!   session, the way a keyword-driven host calls them
//! - [`WorkbookExt`] and [`WorkbookCalculationExt`] add file I/O and
//!   recalculation to a plain [`Workbook`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use keysheet::prelude::*;
//!
//! let mut session = Session::new();
//! session.create("report.xlsx").unwrap();
//! session.set_cell_number(22.0, 3, 9).unwrap();
//! session.set_cell_formula("J4*2", 4, 9).unwrap();
//! session.save().unwrap();
//!
//! session.open("report.xlsx").unwrap();
//! assert_eq!(session.get_cell(3, 9).unwrap(), "22");
//! assert_eq!(session.get_cell(4, 9).unwrap(), "44");
//! ```

pub mod args;
pub mod calculation;
pub mod error;
pub mod keywords;
pub mod prelude;
pub mod session;

pub use calculation::{CalculationStats, WorkbookCalculationExt};
pub use error::{Error, ErrorKind, Result};
pub use keywords::{ExcelLibrary, KeywordDef, KeywordValue, KEYWORDS};
pub use session::{Session, SessionOptions};

pub use keysheet_core::{
    format_value, CellAddress, CellData, CellError, CellValue, NumberFormat, Workbook,
    WorkbookSettings, Worksheet, MAX_COLS, MAX_ROWS, MAX_SHEET_NAME_LEN,
};
pub use keysheet_formula::{
    evaluate, evaluate_cell, parse_formula, EvaluationContext, FormulaExpr, FormulaValue,
};
pub use keysheet_xls::{XlsReader, XlsWriter};
pub use keysheet_xlsx::{XlsxReader, XlsxWriter};

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Spreadsheet container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    /// Legacy BIFF8 compound file
    Xls,
    /// Zip-based Office Open XML
    Xlsx,
}

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const EMPTY_ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];
const CFB_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

impl SpreadsheetFormat {
    /// Format named by the path's extension, ignoring case
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("xlsx") => Ok(SpreadsheetFormat::Xlsx),
            Some("xls") => Ok(SpreadsheetFormat::Xls),
            _ => Err(Error::InvalidFormat(format!(
                "'{}' must end in .xlsx or .xls",
                path.display()
            ))),
        }
    }

    /// Format of a container from its leading bytes
    pub fn sniff(header: &[u8]) -> Option<Self> {
        if header.starts_with(&CFB_MAGIC) {
            Some(SpreadsheetFormat::Xls)
        } else if header.starts_with(&ZIP_MAGIC) || header.starts_with(&EMPTY_ZIP_MAGIC) {
            Some(SpreadsheetFormat::Xlsx)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SpreadsheetFormat::Xls => "xls",
            SpreadsheetFormat::Xlsx => "xlsx",
        }
    }
}

/// Load a workbook, choosing the reader from the file's content
pub fn read_workbook(path: &Path) -> Result<(Workbook, SpreadsheetFormat)> {
    let mut header = Vec::with_capacity(CFB_MAGIC.len());
    File::open(path)?
        .take(CFB_MAGIC.len() as u64)
        .read_to_end(&mut header)?;

    let format = SpreadsheetFormat::sniff(&header).ok_or_else(|| {
        Error::InvalidFormat(format!(
            "'{}' is neither an .xlsx nor an .xls workbook",
            path.display()
        ))
    })?;
    let workbook = match format {
        SpreadsheetFormat::Xlsx => XlsxReader::read_file(path)?,
        SpreadsheetFormat::Xls => XlsReader::read_file(path)?,
    };
    log::debug!(
        "read {} sheet(s) from {} as {}",
        workbook.sheet_count(),
        path.display(),
        format.extension()
    );
    Ok((workbook, format))
}

/// Write a workbook in the given format, replacing the file
pub fn write_workbook(workbook: &Workbook, path: &Path, format: SpreadsheetFormat) -> Result<()> {
    match format {
        SpreadsheetFormat::Xlsx => XlsxWriter::write_file(workbook, path)?,
        SpreadsheetFormat::Xls => XlsWriter::write_file(workbook, path)?,
    }
    Ok(())
}

/// Extension trait for Workbook to add file I/O
pub trait WorkbookExt {
    /// Open a workbook from a file
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook>;

    /// Save the workbook in the format named by the path's extension
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()>;
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook> {
        read_workbook(path.as_ref()).map(|(workbook, _)| workbook)
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        write_workbook(self, path, SpreadsheetFormat::from_path(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            SpreadsheetFormat::from_path(Path::new("C:/demo/Report.XLSX")).unwrap(),
            SpreadsheetFormat::Xlsx
        );
        assert_eq!(
            SpreadsheetFormat::from_path(Path::new("old.Xls")).unwrap(),
            SpreadsheetFormat::Xls
        );
        for bad in ["data.csv", "noext", "book.xlsm"] {
            assert_eq!(
                SpreadsheetFormat::from_path(Path::new(bad)).unwrap_err().kind(),
                ErrorKind::InvalidFormat
            );
        }
    }

    #[test]
    fn test_sniff() {
        assert_eq!(SpreadsheetFormat::sniff(b"PK\x03\x04rest"), Some(SpreadsheetFormat::Xlsx));
        assert_eq!(SpreadsheetFormat::sniff(&CFB_MAGIC), Some(SpreadsheetFormat::Xls));
        assert_eq!(SpreadsheetFormat::sniff(b"id,name\n"), None);
        assert_eq!(SpreadsheetFormat::sniff(b""), None);
    }
}
