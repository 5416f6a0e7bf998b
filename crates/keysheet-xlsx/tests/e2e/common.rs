//! Fixture helpers shared by the XLSX E2E tests.

use std::io::{Cursor, Write};

use keysheet_core::Workbook;
use keysheet_xlsx::{XlsxReader, XlsxResult};

pub const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="xml" ContentType="application/xml"/>
</Types>"#;

pub const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

/// `xl/workbook.xml` with a single sheet bound to rId1
pub fn workbook_xml(sheet_name: &str, date_1904: bool) -> String {
    let pr = if date_1904 { r#"<workbookPr date1904="1"/>"# } else { "" };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">{pr}<sheets><sheet name="{sheet_name}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
    )
}

/// `xl/worksheets/sheet1.xml` wrapping the given `<sheetData>` children
pub fn sheet_xml(rows: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{rows}</sheetData></worksheet>"#
    )
}

/// Zip the given parts into an in-memory package
pub fn package(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        zip.start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Minimal single-sheet package around `rows`, plus any extra parts
pub fn read_single_sheet(rows: &str, extra: &[(&str, &str)]) -> XlsxResult<Workbook> {
    let workbook = workbook_xml("Data", false);
    let sheet = sheet_xml(rows);
    let mut parts = vec![
        ("[Content_Types].xml", CONTENT_TYPES),
        ("xl/workbook.xml", workbook.as_str()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/worksheets/sheet1.xml", sheet.as_str()),
    ];
    parts.extend_from_slice(extra);
    XlsxReader::read(Cursor::new(package(&parts)))
}
