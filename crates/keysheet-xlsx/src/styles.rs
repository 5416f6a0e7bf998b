//! XLSX styles (styles.xml) read/write helpers
//!
//! Only the number-format side of styles is modelled: each `cellXfs` entry
//! maps to a [`NumberFormat`].

use std::collections::HashMap;
use std::io::{BufReader, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use keysheet_core::{NumberFormat, Workbook};

// === Reading ===

fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Number format of every `cellXfs` entry, by xf index
pub(crate) fn read_styles_xml<R: Read>(reader: R) -> XlsxResult<Vec<NumberFormat>> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut custom_codes: HashMap<u32, String> = HashMap::new();
    let mut xf_format_ids: Vec<u32> = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"cellXfs" => in_cell_xfs = true,
                b"numFmt" => {
                    let id = attr_value(&e, b"numFmtId").and_then(|s| s.parse().ok());
                    if let (Some(id), Some(code)) = (id, attr_value(&e, b"formatCode")) {
                        custom_codes.insert(id, code);
                    }
                }
                b"xf" if in_cell_xfs => {
                    let id = attr_value(&e, b"numFmtId")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0);
                    xf_format_ids.push(id);
                }
                _ => {}
            },
            Ok(Event::End(e)) if e.name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(xf_format_ids
        .into_iter()
        .map(|id| match custom_codes.get(&id) {
            Some(code) => NumberFormat::from_code(code),
            None => NumberFormat::from_id(id),
        })
        .collect())
}

// === Writing ===

/// Workbook-wide `cellXfs` table: xf 0 is General, then one xf per distinct
/// format in first-use order.
#[derive(Debug)]
pub(crate) struct XlsxStyleTable {
    formats: Vec<NumberFormat>,
    xf_ids: HashMap<NumberFormat, u32>,
    /// Custom codes and their assigned ids
    custom_ids: Vec<(u32, String)>,
}

impl XlsxStyleTable {
    pub(crate) fn build(workbook: &Workbook) -> Self {
        let mut table = Self {
            formats: vec![NumberFormat::General],
            xf_ids: HashMap::new(),
            custom_ids: Vec::new(),
        };
        table.xf_ids.insert(NumberFormat::General, 0);

        for sheet in workbook.worksheets() {
            for (_, _, cell) in sheet.iter_cells() {
                let format = &cell.number_format;
                if format.is_general() || table.xf_ids.contains_key(format) {
                    continue;
                }
                if let NumberFormat::Custom(code) = format {
                    if !table.custom_ids.iter().any(|(_, c)| c == code) {
                        let id = NumberFormat::FIRST_CUSTOM_ID + table.custom_ids.len() as u32;
                        table.custom_ids.push((id, code.clone()));
                    }
                }
                table.xf_ids.insert(format.clone(), table.formats.len() as u32);
                table.formats.push(format.clone());
            }
        }
        table
    }

    /// xf index for a cell's format
    pub(crate) fn xf_id(&self, format: &NumberFormat) -> u32 {
        if format.is_general() {
            return 0;
        }
        self.xf_ids.get(format).copied().unwrap_or(0)
    }

    fn num_fmt_id(&self, format: &NumberFormat) -> u32 {
        match format {
            NumberFormat::Custom(code) => self
                .custom_ids
                .iter()
                .find(|(_, c)| c == code)
                .map_or(0, |(id, _)| *id),
            other => other.builtin_id().unwrap_or(0),
        }
    }

    pub(crate) fn to_styles_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        if !self.custom_ids.is_empty() {
            xml.push_str(&format!("\n  <numFmts count=\"{}\">", self.custom_ids.len()));
            for (id, code) in &self.custom_ids {
                xml.push_str(&format!(
                    "\n    <numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                    id,
                    escape_xml_attr(code)
                ));
            }
            xml.push_str("\n  </numFmts>");
        }

        xml.push_str(
            r#"
  <fonts count="1">
    <font><sz val="11"/><name val="Calibri"/><family val="2"/></font>
  </fonts>
  <fills count="2">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
  </fills>
  <borders count="1">
    <border><left/><right/><top/><bottom/><diagonal/></border>
  </borders>
  <cellStyleXfs count="1">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
  </cellStyleXfs>"#,
        );

        xml.push_str(&format!("\n  <cellXfs count=\"{}\">", self.formats.len()));
        for format in &self.formats {
            let id = self.num_fmt_id(format);
            let apply = if id != 0 { " applyNumberFormat=\"1\"" } else { "" };
            xml.push_str(&format!(
                "\n    <xf numFmtId=\"{}\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"{}/>",
                id, apply
            ));
        }
        xml.push_str("\n  </cellXfs>");

        xml.push_str(
            r#"
  <cellStyles count="1">
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
  </cellStyles>
</styleSheet>"#,
        );
        xml
    }
}

pub(crate) fn escape_xml_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
