//! Workbooks written by `XlsxWriter` and read back by `XlsxReader`

use keysheet_core::{CellData, CellError, CellValue, NumberFormat, Workbook};
use keysheet_xlsx::{XlsxReader, XlsxWriter};
use pretty_assertions::assert_eq;

fn round_trip(workbook: &Workbook) -> Workbook {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.xlsx");
    XlsxWriter::write_file(workbook, &path).unwrap();
    XlsxReader::read_file(&path).unwrap()
}

#[test]
fn test_values_formats_and_sheets_survive() {
    let mut wb = Workbook::new();
    wb.add_worksheet_with_name("Q1 & Q2").unwrap();
    {
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", 22.5).unwrap();
        sheet.set_cell_value("B1", "  spaced <text> ").unwrap();
        sheet.set_cell_value("C1", true).unwrap();
        sheet
            .set_cell_value_at(0, 3, CellValue::Error(CellError::Na))
            .unwrap();
        sheet
            .set_cell_at(1, 0, CellData::with_format(43464.0.into(), NumberFormat::date()))
            .unwrap();
        sheet
            .set_cell_value_at(
                1,
                1,
                CellValue::Formula {
                    text: "=A1*2".into(),
                    cached_value: Some(Box::new(CellValue::Number(45.0))),
                },
            )
            .unwrap();
        sheet.clear_cell_value_at(3, 2).unwrap();
    }

    let back = round_trip(&wb);
    assert_eq!(back.sheet_names(), vec!["Sheet1", "Q1 & Q2"]);

    let sheet = back.worksheet(0).unwrap();
    assert_eq!(sheet.cell_value_at(0, 0), &CellValue::Number(22.5));
    assert_eq!(sheet.cell_value_at(0, 1), &CellValue::string("  spaced <text> "));
    assert_eq!(sheet.cell_value_at(0, 2), &CellValue::Boolean(true));
    assert_eq!(sheet.cell_value_at(0, 3), &CellValue::Error(CellError::Na));
    assert_eq!(sheet.cell(1, 0).unwrap().number_format, NumberFormat::date());
    assert_eq!(
        sheet.cell_value_at(1, 1),
        &CellValue::Formula {
            text: "=A1*2".into(),
            cached_value: Some(Box::new(CellValue::Number(45.0))),
        }
    );
    assert!(sheet.cell(3, 2).is_some());
    assert_eq!(sheet.row_count(), 4);
    assert_eq!(sheet.column_count(), 4);
}

#[test]
fn test_empty_rows_and_date_system_survive() {
    let mut wb = Workbook::new();
    wb.settings_mut().date_1904 = true;
    wb.worksheet_mut(0).unwrap().ensure_row(9).unwrap();

    let back = round_trip(&wb);
    assert!(back.settings().date_1904);
    assert_eq!(back.worksheet(0).unwrap().row_count(), 10);
}

#[test]
fn test_text_that_looks_escaped_is_preserved() {
    let mut wb = Workbook::new();
    wb.worksheet_mut(0)
        .unwrap()
        .set_cell_value("A1", "code_x0041_\u{1}end")
        .unwrap();

    let back = round_trip(&wb);
    assert_eq!(
        back.worksheet(0).unwrap().cell_value_at(0, 0),
        &CellValue::string("code_x0041_\u{1}end")
    );
}
