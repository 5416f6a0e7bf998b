//! Workbooks written by `XlsWriter` and read back by `XlsReader`

use std::io::Cursor;

use keysheet_core::{CellData, CellError, CellValue, NumberFormat, Workbook};
use keysheet_xls::{XlsError, XlsReader, XlsWriter};
use pretty_assertions::assert_eq;

fn round_trip(workbook: &Workbook) -> Workbook {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.xls");
    XlsWriter::write_file(workbook, &path).unwrap();
    XlsReader::read_file(&path).unwrap()
}

fn formula(text: &str, cached: CellValue) -> CellValue {
    CellValue::Formula {
        text: text.into(),
        cached_value: Some(Box::new(cached)),
    }
}

#[test]
fn test_values_and_formats_survive() {
    let mut wb = Workbook::new();
    wb.add_worksheet_with_name("Totals").unwrap();
    {
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value_at(3, 9, 22.0.into()).unwrap();
        sheet.set_cell_value("A1", "Ünïcode ключ").unwrap();
        sheet.set_cell_value("B1", "  spaced ").unwrap();
        sheet.set_cell_value("C1", false).unwrap();
        sheet.set_cell_value("D1", CellError::Div0).unwrap();
        sheet
            .set_cell_at(1, 0, CellData::with_format(43464.0.into(), NumberFormat::date()))
            .unwrap();
        sheet
            .set_cell_at(1, 1, CellData::with_format(0.25.into(), NumberFormat::BuiltIn(9)))
            .unwrap();
        sheet.clear_cell_value_at(2, 2).unwrap();
    }

    let back = round_trip(&wb);
    assert_eq!(back.sheet_names(), vec!["Sheet1", "Totals"]);
    let sheet = back.worksheet(0).unwrap();
    assert_eq!(sheet.cell_value_at(3, 9), &CellValue::Number(22.0));
    assert_eq!(sheet.cell_value_at(0, 0), &CellValue::string("Ünïcode ключ"));
    assert_eq!(sheet.cell_value_at(0, 1), &CellValue::string("  spaced "));
    assert_eq!(sheet.cell_value_at(0, 2), &CellValue::Boolean(false));
    assert_eq!(sheet.cell_value_at(0, 3), &CellValue::Error(CellError::Div0));
    assert_eq!(sheet.cell(1, 0).unwrap().number_format, NumberFormat::date());
    assert_eq!(sheet.cell(1, 1).unwrap().number_format, NumberFormat::BuiltIn(9));
    assert!(sheet.cell(2, 2).is_some());
    assert_eq!(sheet.row_count(), 4);
    assert_eq!(sheet.column_count(), 4);
}

#[test]
fn test_formulas_keep_text_and_cached_results() {
    let mut wb = Workbook::new();
    {
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value("E4", 60.0).unwrap();
        sheet.set_cell_value("F4", 1000.0).unwrap();
        sheet
            .set_cell_value_at(3, 9, formula("=SUM(F4,E4)", CellValue::Number(1060.0)))
            .unwrap();
        sheet
            .set_cell_value_at(4, 0, formula("=\"n=\"&E4", CellValue::string("n=60")))
            .unwrap();
        sheet
            .set_cell_value_at(4, 1, formula("=E4>F4", CellValue::Boolean(false)))
            .unwrap();
        sheet
            .set_cell_value_at(4, 2, formula("=1/0", CellValue::Error(CellError::Div0)))
            .unwrap();
    }

    let back = round_trip(&wb);
    let sheet = back.worksheet(0).unwrap();
    assert_eq!(
        sheet.cell_value_at(3, 9),
        &formula("=SUM(F4,E4)", CellValue::Number(1060.0))
    );
    assert_eq!(
        sheet.cell_value_at(4, 0),
        &formula("=\"n=\"&E4", CellValue::string("n=60"))
    );
    assert_eq!(
        sheet.cell_value_at(4, 1),
        &formula("=E4>F4", CellValue::Boolean(false))
    );
    assert_eq!(
        sheet.cell_value_at(4, 2),
        &formula("=1/0", CellValue::Error(CellError::Div0))
    );
}

#[test]
fn test_many_strings_and_1904_dates() {
    let mut wb = Workbook::new();
    wb.settings_mut().date_1904 = true;
    {
        let sheet = wb.worksheet_mut(0).unwrap();
        for row in 0..2500u32 {
            sheet
                .set_cell_value_at(row, 0, CellValue::string(format!("row {} {}", row, "z".repeat((row % 30) as usize))))
                .unwrap();
        }
    }

    let back = round_trip(&wb);
    assert!(back.settings().date_1904);
    let sheet = back.worksheet(0).unwrap();
    assert_eq!(sheet.row_count(), 2500);
    assert_eq!(
        sheet.cell_value_at(2499, 0),
        &CellValue::string(format!("row 2499 {}", "z".repeat(9)))
    );
}

#[test]
fn test_content_xls_cannot_hold_is_rejected() {
    let mut wb = Workbook::new();
    wb.worksheet_mut(0)
        .unwrap()
        .set_cell_value_at(70_000, 0, 1.0.into())
        .unwrap();
    assert!(matches!(XlsWriter::to_bytes(&wb), Err(XlsError::InvalidFormat(_))));

    let mut wb = Workbook::new();
    wb.add_worksheet_with_name("Other").unwrap();
    wb.worksheet_mut(0)
        .unwrap()
        .set_cell_value_at(0, 0, CellValue::formula("=Other!A1"))
        .unwrap();
    assert!(matches!(XlsWriter::to_bytes(&wb), Err(XlsError::InvalidFormat(_))));

    let mut wb = Workbook::new();
    wb.worksheet_mut(0)
        .unwrap()
        .set_cell_value_at(0, 300, 1.0.into())
        .unwrap();
    assert!(matches!(XlsWriter::to_bytes(&wb), Err(XlsError::InvalidFormat(_))));
}

#[test]
fn test_rejects_files_that_are_not_compound_documents() {
    assert!(matches!(
        XlsReader::read(Cursor::new(b"PK\x03\x04 not an ole file".to_vec())),
        Err(XlsError::InvalidFormat(_))
    ));
}

#[test]
fn test_long_cached_string_result_survives() {
    let text = format!("{}€{}", "left ".repeat(3_000), "right ".repeat(2_000));
    let mut wb = Workbook::new();
    {
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", text.as_str()).unwrap();
        sheet
            .set_cell_value("B1", formula("=A1", CellValue::string(text.clone())))
            .unwrap();
    }

    let back = round_trip(&wb);
    let sheet = back.worksheet(0).unwrap();
    assert_eq!(sheet.cell_value_at(0, 0), &CellValue::string(text.clone()));
    assert_eq!(sheet.cell_value_at(0, 1), &formula("=A1", CellValue::string(text)));
}

#[test]
fn test_text_over_cell_limit_is_rejected() {
    let mut wb = Workbook::new();
    wb.worksheet_mut(0)
        .unwrap()
        .set_cell_value("C3", "x".repeat(70_000).as_str())
        .unwrap();
    match XlsWriter::workbook_stream(&wb) {
        Err(XlsError::InvalidFormat(message)) => assert!(message.contains("C3"), "{}", message),
        other => panic!("expected InvalidFormat, got {:?}", other.map(|s| s.len())),
    }

    let mut wb = Workbook::new();
    wb.worksheet_mut(0)
        .unwrap()
        .set_cell_value("A1", formula("=1", CellValue::string("é".repeat(32_768))))
        .unwrap();
    assert!(matches!(XlsWriter::to_bytes(&wb), Err(XlsError::InvalidFormat(_))));

    // exactly at the limit is fine
    let mut wb = Workbook::new();
    wb.worksheet_mut(0)
        .unwrap()
        .set_cell_value("A1", "y".repeat(32_767).as_str())
        .unwrap();
    let back = round_trip(&wb);
    assert_eq!(
        back.worksheet(0).unwrap().cell_value_at(0, 0),
        &CellValue::string("y".repeat(32_767))
    );
}
