//! Spreadsheet session
//!
//! A [`Session`] holds at most one open workbook, the file it came from, and
//! the selected sheet. Cell operations address the selected sheet by
//! zero-based row and column and exchange values as display text.

use std::path::{Path, PathBuf};

use keysheet_core::date::date_to_serial;
use keysheet_core::worksheet::check_bounds;

use crate::args::parse_date;
use crate::error::{Error, Result};
use crate::{
    format_value, parse_formula, read_workbook, write_workbook, CellData, CellValue,
    EvaluationContext, NumberFormat, SpreadsheetFormat, Workbook, WorkbookCalculationExt,
    Worksheet,
};

const NO_WORKBOOK: &str = "No workbook is open; open or create one first";
const NO_SHEET: &str = "No sheet is selected; select a sheet first";

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Refresh cached formula results before writing
    pub recalculate_on_save: bool,
    /// Display format code given to cells set from a date
    pub date_format: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            recalculate_on_save: true,
            date_format: NumberFormat::DATE_PATTERN.to_string(),
        }
    }
}

#[derive(Debug)]
struct OpenWorkbook {
    workbook: Workbook,
    path: PathBuf,
    format: SpreadsheetFormat,
    selected: Option<usize>,
}

/// One open workbook and its selected sheet
#[derive(Debug, Default)]
pub struct Session {
    options: SessionOptions,
    open: Option<OpenWorkbook>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SessionOptions) -> Self {
        Self {
            options,
            open: None,
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn workbook(&self) -> Option<&Workbook> {
        self.open.as_ref().map(|o| &o.workbook)
    }

    /// File the workbook is saved to
    pub fn path(&self) -> Option<&Path> {
        self.open.as_ref().map(|o| o.path.as_path())
    }

    pub fn format(&self) -> Option<SpreadsheetFormat> {
        self.open.as_ref().map(|o| o.format)
    }

    /// Name of the selected sheet
    pub fn selected_sheet(&self) -> Option<&str> {
        let open = self.open.as_ref()?;
        open.workbook.worksheet(open.selected?).map(Worksheet::name)
    }

    // ===== Workbook lifecycle =====

    /// Load the workbook at `path` and select its first sheet.
    ///
    /// The container is recognised from the file content. On failure the
    /// session is left without a workbook.
    pub fn open(&mut self, path: &str) -> Result<()> {
        self.open = None;
        let path = PathBuf::from(path.trim());
        if !path.exists() {
            return Err(Error::NotFound(format!("no file at '{}'", path.display())));
        }

        let (workbook, format) = read_workbook(&path)?;
        if workbook.is_empty() {
            return Err(Error::InvalidFormat(format!(
                "'{}' contains no worksheets",
                path.display()
            )));
        }
        log::debug!("opened {}", path.display());
        self.open = Some(OpenWorkbook {
            workbook,
            path,
            format,
            selected: Some(0),
        });
        Ok(())
    }

    /// Create a workbook with a single `Sheet1` at `path` and write it
    /// immediately. The format follows the extension.
    pub fn create(&mut self, path: &str) -> Result<()> {
        self.open = None;
        let path = PathBuf::from(path.trim());
        let format = SpreadsheetFormat::from_path(&path)?;

        let workbook = Workbook::new();
        write_workbook(&workbook, &path, format)?;
        log::debug!("created {}", path.display());
        self.open = Some(OpenWorkbook {
            workbook,
            path,
            format,
            selected: Some(0),
        });
        Ok(())
    }

    /// Write the whole workbook back to its file
    pub fn save(&mut self) -> Result<()> {
        let recalculate = self.options.recalculate_on_save;
        let open = self.open.as_mut().ok_or(Error::Uninitialized(NO_WORKBOOK))?;
        if recalculate {
            open.workbook.calculate()?;
        }
        write_workbook(&open.workbook, &open.path, open.format)?;
        log::debug!("saved {}", open.path.display());
        Ok(())
    }

    // ===== Sheets =====

    pub fn select_sheet(&mut self, name: &str) -> Result<()> {
        let open = self.open.as_mut().ok_or(Error::Uninitialized(NO_WORKBOOK))?;
        let index = open
            .workbook
            .sheet_index(name)
            .ok_or_else(|| Error::NotFound(format!("no sheet named '{}'", name)))?;
        open.selected = Some(index);
        Ok(())
    }

    pub fn add_sheet(&mut self, name: &str) -> Result<()> {
        let open = self.open.as_mut().ok_or(Error::Uninitialized(NO_WORKBOOK))?;
        open.workbook.add_worksheet_with_name(name)?;
        Ok(())
    }

    /// Remove a sheet by name. Removing the selected sheet clears the
    /// selection; the last remaining sheet cannot be removed.
    pub fn remove_sheet(&mut self, name: &str) -> Result<()> {
        let open = self.open.as_mut().ok_or(Error::Uninitialized(NO_WORKBOOK))?;
        let index = open
            .workbook
            .sheet_index(name)
            .ok_or_else(|| Error::NotFound(format!("no sheet named '{}'", name)))?;
        if open.workbook.sheet_count() == 1 {
            return Err(Error::invalid_argument(format!(
                "cannot remove '{}', the only sheet of the workbook",
                name
            )));
        }
        open.workbook.remove_worksheet(index)?;
        open.selected = match open.selected {
            Some(s) if s == index => None,
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        Ok(())
    }

    pub fn sheet_names(&self) -> Result<Vec<String>> {
        Ok(self.current_workbook()?.sheet_names())
    }

    pub fn sheet_count(&self) -> Result<usize> {
        Ok(self.current_workbook()?.sheet_count())
    }

    // ===== Reading cells =====

    /// Display text of the cell at (row, col).
    ///
    /// Missing rows and cells read as `""`. Formula cells show their
    /// computed result.
    pub fn get_cell(&self, row: u32, col: u32) -> Result<String> {
        let (workbook, sheet_idx) = self.current()?;
        if workbook.worksheet(sheet_idx).is_none() {
            return Err(Error::Uninitialized(NO_SHEET));
        }
        let ctx = EvaluationContext::for_workbook(workbook);
        Ok(render_cell(&ctx, workbook, sheet_idx, row, col))
    }

    /// Last materialized row + 1
    pub fn row_count(&self) -> Result<u32> {
        Ok(self.current_sheet()?.row_count())
    }

    /// Last used column of the first row + 1
    pub fn column_count(&self) -> Result<u32> {
        Ok(self.current_sheet()?.column_count())
    }

    /// Display text of `row` across `0..column_count()`
    pub fn row_values(&self, row: u32, include_empty: bool) -> Result<Vec<String>> {
        let columns = self.column_count()?;
        let (workbook, sheet_idx) = self.current()?;
        let ctx = EvaluationContext::for_workbook(workbook);
        let values = (0..columns)
            .map(|col| render_cell(&ctx, workbook, sheet_idx, row, col))
            .collect();
        Ok(keep_values(values, include_empty))
    }

    /// Display text of `col` across `0..row_count()`
    pub fn column_values(&self, col: u32, include_empty: bool) -> Result<Vec<String>> {
        let rows = self.row_count()?;
        let (workbook, sheet_idx) = self.current()?;
        let ctx = EvaluationContext::for_workbook(workbook);
        let values = (0..rows)
            .map(|row| render_cell(&ctx, workbook, sheet_idx, row, col))
            .collect();
        Ok(keep_values(values, include_empty))
    }

    // ===== Writing cells =====

    pub fn set_cell_number(&mut self, value: f64, row: u32, col: u32) -> Result<()> {
        self.current()?;
        if !value.is_finite() {
            return Err(Error::parse(format!("{} is not a finite number", value)));
        }
        self.write_cell(row, col, CellData::new(CellValue::Number(value)))
    }

    pub fn set_cell_string(&mut self, value: &str, row: u32, col: u32) -> Result<()> {
        self.write_cell(row, col, CellData::new(CellValue::string(value)))
    }

    pub fn set_cell_boolean(&mut self, value: bool, row: u32, col: u32) -> Result<()> {
        self.write_cell(row, col, CellData::new(CellValue::Boolean(value)))
    }

    /// Store a formula; the leading `=` is optional. Text that does not
    /// parse is rejected.
    pub fn set_cell_formula(&mut self, formula: &str, row: u32, col: u32) -> Result<()> {
        self.current()?;
        let value = CellValue::formula(formula.trim());
        if let Some(text) = value.formula_text() {
            parse_formula(text)?;
        }
        self.write_cell(row, col, CellData::new(value))
    }

    /// Store a `MM-dd-yyyy` date as a serial with the session's date format.
    ///
    /// Like the other setters, a missing workbook or sheet is reported
    /// before the input is looked at.
    pub fn set_cell_date(&mut self, date: &str, row: u32, col: u32) -> Result<()> {
        let (workbook, _) = self.current()?;
        let date_1904 = workbook.settings().date_1904;
        let date = parse_date(date)?;
        let data = CellData::with_format(
            CellValue::Number(date_to_serial(date, date_1904)),
            NumberFormat::from_code(&self.options.date_format),
        );
        self.write_cell(row, col, data)
    }

    /// Clear the value; the cell stays in its row
    pub fn remove_cell_value(&mut self, row: u32, col: u32) -> Result<()> {
        let sheet = self.current_sheet_mut()?;
        check_bounds(row, col)?;
        sheet.clear_cell_value_at(row, col as u16)?;
        Ok(())
    }

    // ===== Internals =====

    fn write_cell(&mut self, row: u32, col: u32, data: CellData) -> Result<()> {
        let sheet = self.current_sheet_mut()?;
        check_bounds(row, col)?;
        sheet.set_cell_at(row, col as u16, data)?;
        Ok(())
    }

    fn current_workbook(&self) -> Result<&Workbook> {
        self.workbook().ok_or(Error::Uninitialized(NO_WORKBOOK))
    }

    fn current(&self) -> Result<(&Workbook, usize)> {
        let open = self.open.as_ref().ok_or(Error::Uninitialized(NO_WORKBOOK))?;
        let selected = open.selected.ok_or(Error::Uninitialized(NO_SHEET))?;
        Ok((&open.workbook, selected))
    }

    fn current_sheet(&self) -> Result<&Worksheet> {
        let (workbook, index) = self.current()?;
        workbook
            .worksheet(index)
            .ok_or(Error::Uninitialized(NO_SHEET))
    }

    fn current_sheet_mut(&mut self) -> Result<&mut Worksheet> {
        let open = self.open.as_mut().ok_or(Error::Uninitialized(NO_WORKBOOK))?;
        let selected = open.selected.ok_or(Error::Uninitialized(NO_SHEET))?;
        open.workbook
            .worksheet_mut(selected)
            .ok_or(Error::Uninitialized(NO_SHEET))
    }
}

/// Display text of one cell; missing sheets, rows and cells read as `""`
fn render_cell(
    ctx: &EvaluationContext,
    workbook: &Workbook,
    sheet_idx: usize,
    row: u32,
    col: u32,
) -> String {
    let Ok(col) = u16::try_from(col) else {
        return String::new();
    };
    let Some(cell) = workbook.worksheet(sheet_idx).and_then(|s| s.cell(row, col)) else {
        return String::new();
    };

    let date_1904 = workbook.settings().date_1904;
    if cell.value.is_formula() {
        let value = CellValue::from(ctx.cell_result(sheet_idx, row, col));
        format_value(&value, &cell.number_format, date_1904)
    } else {
        format_value(&cell.value, &cell.number_format, date_1904)
    }
}

fn keep_values(values: Vec<String>, include_empty: bool) -> Vec<String> {
    if include_empty {
        values
    } else {
        values.into_iter().filter(|v| !v.is_empty()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use pretty_assertions::assert_eq;

    fn open_session() -> Session {
        let mut session = Session::new();
        session.open = Some(OpenWorkbook {
            workbook: Workbook::new(),
            path: PathBuf::from("unsaved.xlsx"),
            format: SpreadsheetFormat::Xlsx,
            selected: Some(0),
        });
        session
    }

    #[test]
    fn test_cell_operations_need_a_workbook() {
        let mut session = Session::new();
        assert_eq!(session.get_cell(0, 0).unwrap_err().kind(), ErrorKind::Uninitialized);
        assert_eq!(
            session.set_cell_number(1.0, 0, 0).unwrap_err().kind(),
            ErrorKind::Uninitialized
        );
        assert_eq!(session.sheet_names().unwrap_err().kind(), ErrorKind::Uninitialized);
        assert_eq!(session.save().unwrap_err().kind(), ErrorKind::Uninitialized);
    }

    #[test]
    fn test_missing_workbook_is_reported_before_bad_input() {
        let mut session = Session::new();
        assert_eq!(
            session.set_cell_date("2018-03-30", 0, 0).unwrap_err().kind(),
            ErrorKind::Uninitialized
        );
        assert_eq!(
            session.set_cell_formula("SUM(", 0, 0).unwrap_err().kind(),
            ErrorKind::Uninitialized
        );
        assert_eq!(
            session.set_cell_number(f64::NAN, 0, 0).unwrap_err().kind(),
            ErrorKind::Uninitialized
        );

        let mut session = open_session();
        assert_eq!(
            session.set_cell_date("2018-03-30", 0, 0).unwrap_err().kind(),
            ErrorKind::Parse
        );
    }

    #[test]
    fn test_values_render_as_text() {
        let mut session = open_session();
        session.set_cell_number(22.0, 3, 9).unwrap();
        session.set_cell_number(34.59, 0, 0).unwrap();
        session.set_cell_string("dummy", 0, 1).unwrap();
        session.set_cell_boolean(true, 0, 2).unwrap();
        session.set_cell_date("03-30-2018", 0, 3).unwrap();

        assert_eq!(session.get_cell(3, 9).unwrap(), "22");
        assert_eq!(session.get_cell(0, 0).unwrap(), "34.59");
        assert_eq!(session.get_cell(0, 1).unwrap(), "dummy");
        assert_eq!(session.get_cell(0, 2).unwrap(), "true");
        assert_eq!(session.get_cell(0, 3).unwrap(), "03-30-2018");
        assert_eq!(session.get_cell(50, 50).unwrap(), "");
        assert_eq!(session.get_cell(0, 100_000).unwrap(), "");
    }

    #[test]
    fn test_formulas_show_computed_values() {
        let mut session = open_session();
        session.set_cell_number(1000.0, 3, 5).unwrap();
        session.set_cell_number(60.0, 3, 4).unwrap();
        session.set_cell_formula("SUM(F4,E4)", 0, 0).unwrap();
        session.set_cell_formula("=A1/0", 0, 1).unwrap();
        assert_eq!(session.get_cell(0, 0).unwrap(), "1060");
        assert_eq!(session.get_cell(0, 1).unwrap(), "#DIV/0!");

        session.set_cell_number(40.0, 3, 4).unwrap();
        assert_eq!(session.get_cell(0, 0).unwrap(), "1040");

        let err = session.set_cell_formula("SUM(F4,", 0, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(session.get_cell(0, 2).unwrap(), "");
    }

    #[test]
    fn test_setting_overwrites_type() {
        let mut session = open_session();
        session.set_cell_date("12-30-2018", 1, 1).unwrap();
        session.set_cell_number(5.0, 1, 1).unwrap();
        assert_eq!(session.get_cell(1, 1).unwrap(), "5");
    }

    #[test]
    fn test_bad_input_is_rejected() {
        let mut session = open_session();
        assert_eq!(session.set_cell_date("2018/03/30", 0, 0).unwrap_err().kind(), ErrorKind::Parse);
        assert_eq!(
            session.set_cell_number(f64::NAN, 0, 0).unwrap_err().kind(),
            ErrorKind::Parse
        );
        assert_eq!(
            session.set_cell_string("x", 0, 20_000).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            session.set_cell_string("x", 2_000_000, 0).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_remove_cell_value_keeps_the_cell() {
        let mut session = open_session();
        session.set_cell_string("gone", 2, 4).unwrap();
        session.remove_cell_value(2, 4).unwrap();
        assert_eq!(session.get_cell(2, 4).unwrap(), "");

        let sheet = session.current_sheet().unwrap();
        assert_eq!(sheet.cell(2, 4).map(|c| c.value.clone()), Some(CellValue::Empty));
    }

    #[test]
    fn test_counts_and_values() {
        let mut session = open_session();
        assert_eq!((session.row_count().unwrap(), session.column_count().unwrap()), (0, 0));
        assert!(session.row_values(0, true).unwrap().is_empty());

        session.set_cell_string("ID", 0, 0).unwrap();
        session.set_cell_string("Total", 0, 3).unwrap();
        session.set_cell_number(7.0, 2, 0).unwrap();

        assert_eq!(session.row_count().unwrap(), 3);
        assert_eq!(session.column_count().unwrap(), 4);
        assert_eq!(session.row_values(0, true).unwrap(), vec!["ID", "", "", "Total"]);
        assert_eq!(session.row_values(0, false).unwrap(), vec!["ID", "Total"]);
        assert_eq!(session.column_values(0, true).unwrap(), vec!["ID", "", "7"]);
        assert_eq!(session.column_values(0, false).unwrap(), vec!["ID", "7"]);
        assert_eq!(session.row_values(9, true).unwrap(), vec!["", "", "", ""]);
    }

    #[test]
    fn test_sheet_management() {
        let mut session = open_session();
        session.add_sheet("TC_1").unwrap();
        session.add_sheet("TC_2").unwrap();
        assert_eq!(session.sheet_names().unwrap(), vec!["Sheet1", "TC_1", "TC_2"]);
        assert_eq!(session.sheet_count().unwrap(), 3);

        assert_eq!(session.add_sheet("tc_1").unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(session.add_sheet("a/b").unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(session.select_sheet("Nope").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(session.remove_sheet("Nope").unwrap_err().kind(), ErrorKind::NotFound);

        session.select_sheet("tc_2").unwrap();
        assert_eq!(session.selected_sheet(), Some("TC_2"));
        session.remove_sheet("TC_1").unwrap();
        assert_eq!(session.selected_sheet(), Some("TC_2"));

        session.remove_sheet("TC_2").unwrap();
        assert_eq!(session.selected_sheet(), None);
        assert_eq!(session.get_cell(0, 0).unwrap_err().kind(), ErrorKind::Uninitialized);
        assert_eq!(
            session.set_cell_date("13-45-2018", 0, 0).unwrap_err().kind(),
            ErrorKind::Uninitialized
        );
        assert_eq!(session.sheet_names().unwrap(), vec!["Sheet1"]);

        assert_eq!(
            session.remove_sheet("Sheet1").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        session.select_sheet("Sheet1").unwrap();
        assert_eq!(session.get_cell(0, 0).unwrap(), "");
    }

    #[test]
    fn test_date_format_option() {
        let mut session = Session::with_options(SessionOptions {
            date_format: "d-mmm-yy".into(),
            ..SessionOptions::default()
        });
        session.open = open_session().open;
        session.set_cell_date("03-30-2018", 0, 0).unwrap();
        assert_eq!(session.get_cell(0, 0).unwrap(), "30-Mar-18");
    }
}
