//! XLSX writer

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use crate::error::XlsxResult;
use crate::styles::{escape_xml_attr, XlsxStyleTable};
use keysheet_core::{CellAddress, CellData, CellValue, Workbook, Worksheet};

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path, replacing any existing file
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(workbook, file)
    }

    /// Write a workbook to a writer
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        let mut zip = zip::ZipWriter::new(writer);
        let style_table = XlsxStyleTable::build(workbook);

        Self::write_part(&mut zip, "[Content_Types].xml", &Self::content_types(workbook))?;
        Self::write_part(&mut zip, "_rels/.rels", ROOT_RELS)?;
        Self::write_part(&mut zip, "xl/workbook.xml", &Self::workbook_xml(workbook))?;
        Self::write_part(
            &mut zip,
            "xl/_rels/workbook.xml.rels",
            &Self::workbook_rels(workbook),
        )?;
        Self::write_part(&mut zip, "xl/styles.xml", &style_table.to_styles_xml())?;

        for (i, sheet) in workbook.worksheets().enumerate() {
            let xml = Self::worksheet_xml(sheet, &style_table);
            Self::write_part(&mut zip, &format!("xl/worksheets/sheet{}.xml", i + 1), &xml)?;
        }

        zip.finish()?;
        log::debug!("wrote {} sheet(s) as xlsx", workbook.sheet_count());
        Ok(())
    }

    fn write_part<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        name: &str,
        content: &str,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn content_types(workbook: &Workbook) -> String {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
        );
        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }
        content.push_str("\n</Types>");
        content
    }

    fn workbook_xml(workbook: &Workbook) -> String {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );
        if workbook.settings().date_1904 {
            content.push_str("\n    <workbookPr date1904=\"1\"/>");
        }
        content.push_str("\n    <sheets>");
        for (i, sheet) in workbook.worksheets().enumerate() {
            content.push_str(&format!(
                r#"
        <sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml_attr(sheet.name()),
                i + 1,
                i + 1
            ));
        }
        content.push_str("\n    </sheets>\n</workbook>");
        content
    }

    fn workbook_rels(workbook: &Workbook) -> String {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }
        content.push_str(&format!(
            r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#,
            workbook.sheet_count() + 1
        ));
        content
    }

    fn worksheet_xml(sheet: &Worksheet, style_table: &XlsxStyleTable) -> String {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );
        if let Some((first_row, first_col, last_row, last_col)) = sheet.dimensions() {
            let range = format!(
                "{}:{}",
                CellAddress::new(first_row, first_col),
                CellAddress::new(last_row, last_col)
            );
            content.push_str(&format!("\n    <dimension ref=\"{}\"/>", range));
        }
        content.push_str("\n    <sheetData>");

        // Rows without cells are written too so the sheet keeps its extent
        for (row_index, row) in sheet.cells().rows() {
            if row.is_empty() {
                content.push_str(&format!("\n        <row r=\"{}\"/>", row_index + 1));
                continue;
            }
            content.push_str(&format!("\n        <row r=\"{}\">", row_index + 1));
            for (col, cell) in row.cells() {
                let cell_ref = CellAddress::new(row_index, col).to_a1_string();
                content.push_str("\n            ");
                content.push_str(&Self::cell_xml(&cell_ref, cell, style_table));
            }
            content.push_str("\n        </row>");
        }

        content.push_str("\n    </sheetData>\n</worksheet>");
        content
    }

    fn cell_xml(cell_ref: &str, cell: &CellData, style_table: &XlsxStyleTable) -> String {
        let xf_id = style_table.xf_id(&cell.number_format);
        let style_attr = if xf_id != 0 {
            format!(" s=\"{}\"", xf_id)
        } else {
            String::new()
        };

        match &cell.value {
            CellValue::Empty => format!("<c r=\"{}\"{}/>", cell_ref, style_attr),
            CellValue::Number(n) => {
                format!("<c r=\"{}\"{}><v>{}</v></c>", cell_ref, style_attr, n)
            }
            CellValue::String(s) => format!(
                "<c r=\"{}\"{} t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                cell_ref,
                style_attr,
                escape_xml(&encode_excel_escapes(s.as_str()))
            ),
            CellValue::Boolean(b) => format!(
                "<c r=\"{}\"{} t=\"b\"><v>{}</v></c>",
                cell_ref,
                style_attr,
                u8::from(*b)
            ),
            CellValue::Error(e) => format!(
                "<c r=\"{}\"{} t=\"e\"><v>{}</v></c>",
                cell_ref,
                style_attr,
                escape_xml(e.as_str())
            ),
            CellValue::Formula { text, cached_value } => {
                let formula = escape_xml(text.strip_prefix('=').unwrap_or(text));
                let (type_attr, cached) = match cached_value.as_deref() {
                    Some(CellValue::Number(n)) => ("", format!("<v>{}</v>", n)),
                    Some(CellValue::String(s)) => (
                        " t=\"str\"",
                        format!("<v>{}</v>", escape_xml(&encode_excel_escapes(s.as_str()))),
                    ),
                    Some(CellValue::Boolean(b)) => (" t=\"b\"", format!("<v>{}</v>", u8::from(*b))),
                    Some(CellValue::Error(e)) => {
                        (" t=\"e\"", format!("<v>{}</v>", escape_xml(e.as_str())))
                    }
                    _ => ("", String::new()),
                };
                format!(
                    "<c r=\"{}\"{}{}><f>{}</f>{}</c>",
                    cell_ref, style_attr, type_attr, formula, cached
                )
            }
        }
    }
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Escape control characters as `_xHHHH_`, and underscores that would
/// otherwise read back as an escape
fn encode_excel_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        let looks_escaped = c == '_' && {
            let tail = &s.as_bytes()[i..];
            tail.len() >= 7
                && tail[1] == b'x'
                && tail[2..6].iter().all(u8::is_ascii_hexdigit)
                && tail[6] == b'_'
        };
        if looks_escaped {
            out.push_str("_x005F_");
        } else if c.is_control() && !matches!(c, '\t' | '\n') {
            out.push_str(&format!("_x{:04X}_", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::decode_excel_escapes;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escapes_survive_decoding() {
        for text in ["line\r\nbreak", "lit_x0041_eral", "bell\u{7}", "tab\tok"] {
            assert_eq!(decode_excel_escapes(&encode_excel_escapes(text)), text);
        }
    }

    #[test]
    fn test_formula_cell_keeps_cached_value() {
        let table = XlsxStyleTable::build(&Workbook::new());
        let cell = CellData::new(CellValue::Formula {
            text: "=A1&\"<x>\"".into(),
            cached_value: Some(Box::new(CellValue::string("1<x>"))),
        });
        assert_eq!(
            XlsxWriter::cell_xml("B1", &cell, &table),
            "<c r=\"B1\" t=\"str\"><f>A1&amp;&quot;&lt;x&gt;&quot;</f><v>1&lt;x&gt;</v></c>"
        );
    }
}
