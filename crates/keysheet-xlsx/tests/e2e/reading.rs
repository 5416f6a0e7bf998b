//! Reading hand-built packages

use std::io::Cursor;

use crate::{package, read_single_sheet, sheet_xml, workbook_xml, CONTENT_TYPES, WORKBOOK_RELS};
use keysheet_core::{CellError, CellValue, NumberFormat};
use keysheet_xlsx::{XlsxError, XlsxReader};
use pretty_assertions::assert_eq;

#[test]
fn test_shared_strings_keep_whitespace_and_runs() {
    let shared = r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<si><t xml:space="preserve">  padded  </t></si>
<si><r><t>Rich</t></r><r><t xml:space="preserve"> text</t></r><rPh><t>ignored</t></rPh></si>
<si/>
<si><t>tab_x0009_bed</t></si>
</sst>"#;
    let wb = read_single_sheet(
        r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="s"><v>2</v></c><c r="D1" t="s"><v>3</v></c></row>"#,
        &[("xl/sharedStrings.xml", shared)],
    )
    .unwrap();

    let sheet = wb.worksheet(0).unwrap();
    assert_eq!(sheet.cell_value_at(0, 0), &CellValue::string("  padded  "));
    assert_eq!(sheet.cell_value_at(0, 1), &CellValue::string("Rich text"));
    assert_eq!(sheet.cell_value_at(0, 2), &CellValue::string(""));
    assert_eq!(sheet.cell_value_at(0, 3), &CellValue::string("tab\tbed"));
}

#[test]
fn test_cells_without_references_follow_their_neighbours() {
    let wb = read_single_sheet(
        r#"<row><c><v>1</v></c><c><v>2</v></c></row><row><c r="C2"><v>3</v></c><c><v>4</v></c></row>"#,
        &[],
    )
    .unwrap();

    let sheet = wb.worksheet(0).unwrap();
    assert_eq!(sheet.cell_value_at(0, 0), &CellValue::Number(1.0));
    assert_eq!(sheet.cell_value_at(0, 1), &CellValue::Number(2.0));
    assert_eq!(sheet.cell_value_at(1, 2), &CellValue::Number(3.0));
    assert_eq!(sheet.cell_value_at(1, 3), &CellValue::Number(4.0));
}

#[test]
fn test_empty_rows_count_towards_row_count() {
    let wb = read_single_sheet(
        r#"<row r="1"><c r="A1"><v>1</v></c></row><row r="5"/>"#,
        &[],
    )
    .unwrap();
    assert_eq!(wb.worksheet(0).unwrap().row_count(), 5);
}

#[test]
fn test_typed_cells_and_formulas() {
    let wb = read_single_sheet(
        r#"<row r="1">
<c r="A1" t="b"><v>1</v></c>
<c r="B1" t="e"><v>#DIV/0!</v></c>
<c r="C1" t="inlineStr"><is><t>inline</t></is></c>
<c r="D1"><f>SUM(1,2)</f><v>3</v></c>
<c r="E1" t="str"><f>"a"&amp;"b"</f><v>ab</v></c>
</row>"#,
        &[],
    )
    .unwrap();

    let sheet = wb.worksheet(0).unwrap();
    assert_eq!(sheet.cell_value_at(0, 0), &CellValue::Boolean(true));
    assert_eq!(sheet.cell_value_at(0, 1), &CellValue::Error(CellError::Div0));
    assert_eq!(sheet.cell_value_at(0, 2), &CellValue::string("inline"));
    assert_eq!(
        sheet.cell_value_at(0, 3),
        &CellValue::Formula {
            text: "=SUM(1,2)".into(),
            cached_value: Some(Box::new(CellValue::Number(3.0))),
        }
    );
    assert_eq!(
        sheet.cell_value_at(0, 4),
        &CellValue::Formula {
            text: "=\"a\"&\"b\"".into(),
            cached_value: Some(Box::new(CellValue::string("ab"))),
        }
    );
}

#[test]
fn test_styles_and_date_system() {
    let styles = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<numFmts count="1"><numFmt numFmtId="164" formatCode="mm-dd-yyyy"/></numFmts>
<cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="164" applyNumberFormat="1"/></cellXfs>
</styleSheet>"#;
    let workbook = workbook_xml("Dates", true);
    let sheet = sheet_xml(r#"<row r="1"><c r="A1" s="1"><v>100</v></c></row>"#);
    let bytes = package(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("xl/workbook.xml", workbook.as_str()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/styles.xml", styles),
        ("xl/worksheets/sheet1.xml", sheet.as_str()),
    ]);

    let wb = XlsxReader::read(Cursor::new(bytes)).unwrap();
    assert!(wb.settings().date_1904);
    assert_eq!(wb.sheet_names(), vec!["Dates"]);
    let cell = wb.worksheet(0).unwrap().cell(0, 0).unwrap();
    assert_eq!(cell.number_format, NumberFormat::date());
    assert!(cell.is_date());
}

#[test]
fn test_rejects_packages_that_are_not_workbooks() {
    let no_types = package(&[("xl/workbook.xml", "<workbook/>")]);
    assert!(matches!(
        XlsxReader::read(Cursor::new(no_types)),
        Err(XlsxError::InvalidFormat(_))
    ));

    let no_workbook = package(&[("[Content_Types].xml", CONTENT_TYPES)]);
    assert!(matches!(
        XlsxReader::read(Cursor::new(no_workbook)),
        Err(XlsxError::MissingPart(_))
    ));

    assert!(XlsxReader::read(Cursor::new(b"plain text".to_vec())).is_err());
}
