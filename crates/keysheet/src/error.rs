//! Error taxonomy of the keyword library
//!
//! Every failure a keyword can report falls into one [`ErrorKind`]. Errors
//! from the model, formula and container crates are classified on the way in.

use keysheet_formula::FormulaError;
use keysheet_xls::XlsError;
use keysheet_xlsx::XlsxError;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by a [`Session`](crate::Session) or the keyword table
#[derive(Debug, Error)]
pub enum Error {
    /// Missing file or sheet
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unsupported extension, damaged container, or content the target
    /// container cannot hold
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Malformed number, boolean, date or formula input
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(std::io::Error),

    /// No workbook open, or no sheet selected
    #[error("{0}")]
    Uninitialized(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No keyword with name '{0}'")]
    UnknownKeyword(String),

    #[error("Keyword '{keyword}' expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        keyword: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidFormat,
    Parse,
    Io,
    Uninitialized,
    InvalidArgument,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InvalidFormat(_) => ErrorKind::InvalidFormat,
            Error::Parse(_) => ErrorKind::Parse,
            Error::Io(_) => ErrorKind::Io,
            Error::Uninitialized(_) => ErrorKind::Uninitialized,
            Error::InvalidArgument(_)
            | Error::UnknownKeyword(_)
            | Error::ArgumentCount { .. } => ErrorKind::InvalidArgument,
        }
    }

    pub(crate) fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn parse<S: Into<String>>(msg: S) -> Self {
        Error::Parse(msg.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(err.to_string()),
            _ => Error::Io(err),
        }
    }
}

impl From<keysheet_core::Error> for Error {
    fn from(err: keysheet_core::Error) -> Self {
        match err {
            keysheet_core::Error::SheetNotFound(name) => {
                Error::NotFound(format!("no sheet named '{}'", name))
            }
            other => Error::InvalidArgument(other.to_string()),
        }
    }
}

impl From<FormulaError> for Error {
    fn from(err: FormulaError) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<XlsxError> for Error {
    fn from(err: XlsxError) -> Self {
        match err {
            XlsxError::Io(e) => e.into(),
            other => Error::InvalidFormat(other.to_string()),
        }
    }
}

impl From<XlsError> for Error {
    fn from(err: XlsError) -> Self {
        match err {
            XlsError::Io(e) => e.into(),
            other => Error::InvalidFormat(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_io_errors_split_missing_files_out() {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(Error::from(missing).kind(), ErrorKind::NotFound);

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no");
        assert_eq!(Error::from(denied).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_container_damage_is_invalid_format() {
        let err: Error = XlsxError::MissingPart("xl/workbook.xml".into()).into();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);

        let err: Error = XlsError::UnsupportedVersion("BIFF5".into()).into();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn test_model_errors() {
        let err: Error = keysheet_core::Error::SheetNotFound("Q3".into()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err: Error = keysheet_core::Error::DuplicateSheetName("Q3".into()).into();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = Error::ArgumentCount {
            keyword: "getCellData",
            expected: 2,
            actual: 1,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            err.to_string(),
            "Keyword 'getCellData' expects 2 argument(s), got 1"
        );
    }
}
