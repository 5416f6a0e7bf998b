//! XLSX reader

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::styles::read_styles_xml;
use keysheet_core::{
    CellAddress, CellData, CellError, CellValue, NumberFormat, Workbook, Worksheet,
};

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// `_x000D_` is a carriage return, `_x005F_` an escaped underscore.
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);
        match decoded {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                result.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    result.push_str(rest);
    result
}

fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn is_true(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Sheet entry from workbook.xml
struct SheetEntry {
    name: String,
    r_id: String,
}

/// Cell being assembled between `<c>` and `</c>`
struct PendingCell {
    address: CellAddress,
    cell_type: Option<String>,
    style: Option<usize>,
    value: Option<String>,
    formula: Option<String>,
    inline_text: Option<String>,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let formats = match archive.by_name("xl/styles.xml") {
            Ok(file) => read_styles_xml(file)?,
            Err(_) => Vec::new(),
        };
        let (sheets, date_1904) = Self::read_workbook_xml(&mut archive)?;
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let mut workbook = Workbook::empty();
        workbook.settings_mut().date_1904 = date_1904;

        for entry in sheets {
            let Some(path) = sheet_paths.get(&entry.r_id) else {
                log::warn!("sheet '{}' has no worksheet part, skipping", entry.name);
                continue;
            };
            let mut worksheet = Worksheet::new(entry.name);
            Self::read_worksheet(&mut archive, path, &mut worksheet, &shared_strings, &formats)?;
            workbook.add_existing_worksheet(worksheet)?;
        }

        if workbook.is_empty() {
            return Err(XlsxError::InvalidFormat("Workbook has no sheets".into()));
        }
        log::debug!("read {} sheet(s) from xlsx", workbook.sheet_count());
        Ok(workbook)
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings),
        };

        // Text is not trimmed: spaces inside <t> are content
        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        let mut buf = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => strings.push(String::new()),
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current));
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    let text = e.unescape()?;
                    current.push_str(&text);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    /// Sheet names with their relationship ids, and the date system flag
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<(Vec<SheetEntry>, bool)> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();
        let mut date_1904 = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"sheet" => {
                        let name = attr_value(&e, b"name");
                        let r_id = attr_value(&e, b"r:id");
                        if let (Some(name), Some(r_id)) = (name, r_id) {
                            sheets.push(SheetEntry { name, r_id });
                        }
                    }
                    b"workbookPr" => {
                        date_1904 = attr_value(&e, b"date1904").is_some_and(|v| is_true(&v));
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok((sheets, date_1904))
    }

    /// Worksheet part paths by relationship id
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let id = attr_value(&e, b"Id");
                    let target = attr_value(&e, b"Target");
                    let rel_type = attr_value(&e, b"Type");
                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            let full_path = match target.strip_prefix('/') {
                                Some(absolute) => absolute.to_string(),
                                None => format!("xl/{}", target),
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        worksheet: &mut Worksheet,
        shared_strings: &[String],
        formats: &[NumberFormat],
    ) -> XlsxResult<()> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        let mut buf = Vec::new();

        // Rows and cells may omit `r`; positions then follow the previous one
        let mut row_index: Option<u32> = None;
        let mut next_col: u16 = 0;
        let mut cell: Option<PendingCell> = None;
        let mut in_value = false;
        let mut in_formula = false;
        let mut in_inline_text = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"row" => {
                        let row = Self::row_position(&e, row_index);
                        worksheet.ensure_row(row)?;
                        row_index = Some(row);
                        next_col = 0;
                    }
                    b"c" => {
                        cell = Some(Self::start_cell(&e, row_index.unwrap_or(0), next_col)?);
                    }
                    b"v" if cell.is_some() => in_value = true,
                    b"f" if cell.is_some() => in_formula = true,
                    b"t" if cell.is_some() => in_inline_text = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"row" => {
                        let row = Self::row_position(&e, row_index);
                        worksheet.ensure_row(row)?;
                        row_index = Some(row);
                        next_col = 0;
                    }
                    b"c" => {
                        let pending = Self::start_cell(&e, row_index.unwrap_or(0), next_col)?;
                        next_col = Self::finish_cell(worksheet, pending, shared_strings, formats)?;
                    }
                    _ => {}
                },
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"c" => {
                        if let Some(pending) = cell.take() {
                            next_col =
                                Self::finish_cell(worksheet, pending, shared_strings, formats)?;
                        }
                    }
                    b"v" => in_value = false,
                    b"f" => in_formula = false,
                    b"t" => in_inline_text = false,
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    if let Some(pending) = cell.as_mut() {
                        let target = if in_value {
                            Some(&mut pending.value)
                        } else if in_formula {
                            Some(&mut pending.formula)
                        } else if in_inline_text {
                            Some(&mut pending.inline_text)
                        } else {
                            None
                        };
                        if let Some(target) = target {
                            let text = e.unescape()?;
                            target.get_or_insert_with(String::new).push_str(&text);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }

    fn row_position(e: &BytesStart, previous: Option<u32>) -> u32 {
        attr_value(e, b"r")
            .and_then(|r| r.parse::<u32>().ok())
            .map(|r| r.saturating_sub(1))
            .unwrap_or_else(|| previous.map_or(0, |p| p + 1))
    }

    fn start_cell(e: &BytesStart, row: u32, next_col: u16) -> XlsxResult<PendingCell> {
        let address = match attr_value(e, b"r") {
            Some(r) => CellAddress::parse(&r)
                .map_err(|err| XlsxError::Parse(format!("Invalid cell reference '{}': {}", r, err)))?,
            None => CellAddress::new(row, next_col),
        };
        Ok(PendingCell {
            address,
            cell_type: attr_value(e, b"t"),
            style: attr_value(e, b"s").and_then(|s| s.parse().ok()),
            value: None,
            formula: None,
            inline_text: None,
        })
    }

    /// Store a finished cell; returns the column after it
    fn finish_cell(
        worksheet: &mut Worksheet,
        pending: PendingCell,
        shared_strings: &[String],
        formats: &[NumberFormat],
    ) -> XlsxResult<u16> {
        let address = pending.address;
        let number_format = pending
            .style
            .and_then(|s| formats.get(s))
            .cloned()
            .unwrap_or_default();

        let cell_type = pending.cell_type.as_deref();
        let stored = match (pending.value.as_deref(), pending.inline_text) {
            (_, Some(text)) if cell_type == Some("inlineStr") => {
                Some(CellValue::string(decode_excel_escapes(&text)))
            }
            (Some(v), _) => Some(Self::typed_value(cell_type, v, shared_strings)?),
            (None, _) => None,
        };

        let value = match pending.formula.filter(|f| !f.trim().is_empty()) {
            Some(formula) => CellValue::Formula {
                text: if formula.starts_with('=') {
                    formula
                } else {
                    format!("={}", formula)
                },
                cached_value: stored.map(Box::new),
            },
            None => stored.unwrap_or_default(),
        };

        worksheet.set_cell_at(
            address.row,
            address.col,
            CellData::with_format(value, number_format),
        )?;
        Ok(address.col.saturating_add(1))
    }

    fn typed_value(
        cell_type: Option<&str>,
        value: &str,
        shared_strings: &[String],
    ) -> XlsxResult<CellValue> {
        Ok(match cell_type {
            Some("s") => {
                let idx: usize = value.trim().parse().map_err(|_| {
                    XlsxError::Parse(format!("Invalid shared string index: {}", value))
                })?;
                let s = shared_strings.get(idx).ok_or_else(|| {
                    XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
                })?;
                CellValue::string(s)
            }
            Some("b") => CellValue::Boolean(is_true(value.trim())),
            Some("e") => CellError::parse(value.trim())
                .map(CellValue::Error)
                .unwrap_or_else(|| CellValue::string(value)),
            Some("str") | Some("inlineStr") => CellValue::string(decode_excel_escapes(value)),
            None | Some("n") | Some("d") => match value.trim().parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::string(value),
            },
            Some(_) => CellValue::string(value),
        })
    }
}
