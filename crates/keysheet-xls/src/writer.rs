//! XLS (BIFF8) writer.
//!
//! Builds the `Workbook` stream in memory (globals, then one substream per
//! sheet), patches each BOUNDSHEET with its sheet's stream offset and stores
//! the stream in a new compound file.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;

use keysheet_core::{CellAddress, CellData, CellValue, NumberFormat, Workbook, Worksheet};
use keysheet_formula::parse_formula;

use crate::biff::formula::encode_formula;
use crate::biff::parser::PutLe;
use crate::biff::records;
use crate::biff::strings::{
    encode_short_string, encode_unicode_string, write_sst, ContinuedRecord, MAX_STRING_UNITS,
};
use crate::biff::BiffWriter;
use crate::error::{XlsError, XlsResult};
use crate::formats::XlsFormatTable;
use crate::{XLS_MAX_COLS, XLS_MAX_ROWS};

/// Streams shorter than this land in the mini stream, which Excel rejects
/// for the workbook
const MIN_STREAM_LEN: usize = 4096;

/// Longest number format code Excel accepts
const MAX_FORMAT_UNITS: usize = 255;

/// XLS file writer
pub struct XlsWriter;

impl XlsWriter {
    /// Write a workbook to a file path, replacing any existing file
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsResult<()> {
        let bytes = Self::to_bytes(workbook)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// The complete compound file
    pub fn to_bytes(workbook: &Workbook) -> XlsResult<Vec<u8>> {
        let stream = Self::workbook_stream(workbook)?;
        // Excel and POI expect 512-byte sectors
        let mut cfb =
            cfb::CompoundFile::create_with_version(cfb::Version::V3, Cursor::new(Vec::new()))?;
        {
            let mut out = cfb.create_stream("/Workbook")?;
            out.write_all(&stream)?;
        }
        cfb.flush()?;
        Ok(cfb.into_inner().into_inner())
    }

    /// The BIFF8 `Workbook` stream
    pub fn workbook_stream(workbook: &Workbook) -> XlsResult<Vec<u8>> {
        if workbook.is_empty() {
            return Err(XlsError::InvalidFormat("workbook has no sheets".into()));
        }
        check_strings(workbook)?;
        let formats = XlsFormatTable::build(workbook);
        let sst = SharedStrings::build(workbook);

        let mut sheets = Vec::with_capacity(workbook.sheet_count());
        for (index, sheet) in workbook.worksheets().enumerate() {
            sheets.push(Self::sheet_substream(sheet, index == 0, &formats, &sst)?);
        }

        let (mut globals, offset_slots) = Self::globals(workbook, &formats, &sst);
        let mut offset = globals.position();
        for (slot, sheet) in offset_slots.iter().zip(&sheets) {
            globals.patch_u32(*slot, offset as u32);
            offset += sheet.position();
        }
        for sheet in sheets {
            globals.append(sheet);
        }

        let mut stream = globals.into_inner();
        if stream.len() < MIN_STREAM_LEN {
            stream.resize(MIN_STREAM_LEN, 0);
        }
        log::debug!(
            "built xls stream: {} sheet(s), {} shared string(s)",
            workbook.sheet_count(),
            sst.strings.len()
        );
        Ok(stream)
    }

    /// Globals substream; also returns where each BOUNDSHEET offset lives
    fn globals(
        workbook: &Workbook,
        formats: &XlsFormatTable,
        sst: &SharedStrings,
    ) -> (BiffWriter, Vec<usize>) {
        let mut w = BiffWriter::new();
        w.record(records::BOF, &bof(records::BOF_WORKBOOK_GLOBALS));
        w.record(records::CODEPAGE, &1200u16.to_le_bytes());
        w.record(records::WINDOW1, &window1());
        w.record(
            records::DATEMODE,
            &u16::from(workbook.settings().date_1904).to_le_bytes(),
        );

        // Font 4 does not exist in BIFF; four fonts cover indexes 0..=3
        for _ in 0..4 {
            w.record(records::FONT, &font("Arial"));
        }

        for (id, code) in formats.custom_formats() {
            let mut body = Vec::new();
            body.put_u16(*id);
            body.extend_from_slice(&encode_unicode_string(code));
            w.record(records::FORMAT, &body);
        }

        for _ in 0..XlsFormatTable::STYLE_XFS {
            w.record(records::XF, &xf(0, true));
        }
        w.record(records::XF, &xf(0, false));
        for format_id in formats.cell_xf_formats() {
            w.record(records::XF, &xf(format_id, false));
        }

        // Built-in "Normal" style on XF 0
        w.record(records::STYLE, &[0x00, 0x80, 0x00, 0xFF]);

        let mut offset_slots = Vec::with_capacity(workbook.sheet_count());
        for sheet in workbook.worksheets() {
            let mut body = Vec::new();
            body.put_u32(0);
            body.put_u8(0); // visible
            body.put_u8(0); // worksheet
            body.extend_from_slice(&encode_short_string(sheet.name()));
            offset_slots.push(w.position() + 4);
            w.record(records::BOUNDSHEET, &body);
        }

        write_sst(&mut w, &sst.strings, sst.total_refs);
        w.record(records::EOF, &[]);
        (w, offset_slots)
    }

    fn sheet_substream(
        sheet: &Worksheet,
        selected: bool,
        formats: &XlsFormatTable,
        sst: &SharedStrings,
    ) -> XlsResult<BiffWriter> {
        let mut w = BiffWriter::new();
        w.record(records::BOF, &bof(records::BOF_WORKSHEET));

        let mut dimension = Vec::with_capacity(14);
        match (sheet.cells().first_row(), sheet.dimensions()) {
            (_, Some((first_row, first_col, last_row, last_col))) => {
                check_limits(sheet, last_row, last_col)?;
                dimension.put_u32(first_row);
                dimension.put_u32(last_row + 1);
                dimension.put_u16(first_col);
                dimension.put_u16(last_col + 1);
            }
            (Some(first_row), None) => {
                let last_row = sheet.last_row().unwrap_or(first_row);
                check_limits(sheet, last_row, 0)?;
                dimension.put_u32(first_row);
                dimension.put_u32(last_row + 1);
                dimension.put_u32(0);
            }
            (None, None) => dimension.extend_from_slice(&[0u8; 12]),
        }
        dimension.put_u16(0);
        w.record(records::DIMENSION, &dimension);

        for (row_index, row) in sheet.cells().rows() {
            let first = row.first_column().unwrap_or(0);
            let end = row.last_column().map_or(0, |c| c + 1);
            let mut body = Vec::with_capacity(16);
            body.put_u16(row_index as u16);
            body.put_u16(first);
            body.put_u16(end);
            body.put_u16(0x00FF); // default height
            body.put_u32(0);
            body.put_u32(0x000F_0100);
            w.record(records::ROW, &body);
        }

        for (row, col, cell) in sheet.iter_cells() {
            Self::cell_records(&mut w, sheet, row, col, cell, formats, sst)?;
        }

        w.record(records::WINDOW2, &window2(selected));
        w.record(records::EOF, &[]);
        Ok(w)
    }

    fn cell_records(
        w: &mut BiffWriter,
        sheet: &Worksheet,
        row: u32,
        col: u16,
        cell: &CellData,
        formats: &XlsFormatTable,
        sst: &SharedStrings,
    ) -> XlsResult<()> {
        let mut body = Vec::with_capacity(32);
        body.put_u16(row as u16);
        body.put_u16(col);
        body.put_u16(formats.xf_index(&cell.number_format));

        match &cell.value {
            CellValue::Empty => w.record(records::BLANK, &body),
            CellValue::Number(n) => {
                body.put_f64(*n);
                w.record(records::NUMBER, &body);
            }
            CellValue::String(s) => {
                body.put_u32(sst.index(s.as_str()));
                w.record(records::LABELSST, &body);
            }
            CellValue::Boolean(b) => {
                body.put_u8(u8::from(*b));
                body.put_u8(0);
                w.record(records::BOOLERR, &body);
            }
            CellValue::Error(e) => {
                body.put_u8(e.code());
                body.put_u8(1);
                w.record(records::BOOLERR, &body);
            }
            CellValue::Formula { text, cached_value } => {
                let expr = parse_formula(text).map_err(|e| {
                    XlsError::InvalidFormat(format!("formula {} cannot be written: {}", text, e))
                })?;
                let rgce = encode_formula(&expr, sheet.name())?;

                let cached = cached_value.as_deref();
                body.extend_from_slice(&formula_result(cached));
                body.put_u16(0x0002); // recalculate on load
                body.put_u32(0);
                body.put_u16(rgce.len() as u16);
                body.extend_from_slice(&rgce);
                w.record(records::FORMULA, &body);

                if let Some(CellValue::String(s)) = cached {
                    let mut string = ContinuedRecord::new(w, records::STRING);
                    string.put_string(s.as_str());
                    string.finish();
                }
            }
        }
        Ok(())
    }
}

fn check_limits(sheet: &Worksheet, last_row: u32, last_col: u16) -> XlsResult<()> {
    if last_row >= XLS_MAX_ROWS || last_col >= XLS_MAX_COLS {
        return Err(XlsError::InvalidFormat(format!(
            "sheet '{}' extends past the .xls limit of {} rows and {} columns",
            sheet.name(),
            XLS_MAX_ROWS,
            XLS_MAX_COLS
        )));
    }
    Ok(())
}

/// Reject text the BIFF8 string fields cannot hold
fn check_strings(workbook: &Workbook) -> XlsResult<()> {
    for sheet in workbook.worksheets() {
        for (row, col, cell) in sheet.iter_cells() {
            if let NumberFormat::Custom(code) = &cell.number_format {
                if code.encode_utf16().count() > MAX_FORMAT_UNITS {
                    return Err(XlsError::InvalidFormat(format!(
                        "number format of {}!{} is longer than {} characters",
                        sheet.name(),
                        CellAddress::new(row, col),
                        MAX_FORMAT_UNITS
                    )));
                }
            }
            let text = match &cell.value {
                CellValue::String(s) => s.as_str(),
                CellValue::Formula { cached_value, .. } => match cached_value.as_deref() {
                    Some(CellValue::String(s)) => s.as_str(),
                    _ => continue,
                },
                _ => continue,
            };
            let units = text.encode_utf16().count();
            if units > MAX_STRING_UNITS {
                return Err(XlsError::InvalidFormat(format!(
                    "text in {}!{} has {} characters, more than the .xls limit of {}",
                    sheet.name(),
                    CellAddress::new(row, col),
                    units,
                    MAX_STRING_UNITS
                )));
            }
        }
    }
    Ok(())
}

/// Workbook-wide string table in first-use order
struct SharedStrings {
    strings: Vec<String>,
    indexes: HashMap<String, u32>,
    total_refs: u32,
}

impl SharedStrings {
    fn build(workbook: &Workbook) -> Self {
        let mut table = Self {
            strings: Vec::new(),
            indexes: HashMap::new(),
            total_refs: 0,
        };
        for sheet in workbook.worksheets() {
            for (_, _, cell) in sheet.iter_cells() {
                if let CellValue::String(s) = &cell.value {
                    table.total_refs += 1;
                    if !table.indexes.contains_key(s.as_str()) {
                        table
                            .indexes
                            .insert(s.as_str().to_string(), table.strings.len() as u32);
                        table.strings.push(s.as_str().to_string());
                    }
                }
            }
        }
        table
    }

    fn index(&self, s: &str) -> u32 {
        self.indexes.get(s).copied().unwrap_or(0)
    }
}

fn bof(substream: u16) -> Vec<u8> {
    let mut body = Vec::with_capacity(16);
    body.put_u16(records::BIFF8_VERSION);
    body.put_u16(substream);
    body.put_u16(0x0DBB); // build
    body.put_u16(0x07CC); // year
    body.put_u32(0);
    body.put_u32(0x0000_0006);
    body
}

fn window1() -> Vec<u8> {
    let mut body = Vec::with_capacity(18);
    for v in [0x01E0u16, 0x005A, 0x3FCF, 0x2A4E, 0x0038, 0, 0, 1, 0x0258] {
        body.put_u16(v);
    }
    body
}

/// 10pt regular font
fn font(name: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(32);
    body.put_u16(200); // height in twips
    body.put_u16(0);
    body.put_u16(0x7FFF); // automatic colour
    body.put_u16(400); // normal weight
    body.put_u16(0);
    body.extend_from_slice(&[0, 0, 0, 0]);
    body.extend_from_slice(&encode_short_string(name));
    body
}

fn xf(format_id: u16, style: bool) -> Vec<u8> {
    let mut body = Vec::with_capacity(20);
    body.put_u16(0); // font
    body.put_u16(format_id);
    if style {
        body.put_u16(0xFFF5); // locked, style XF, no parent
    } else {
        body.put_u16(0x0001); // locked, parent XF 0
    }
    body.put_u8(0x20); // bottom aligned
    body.put_u8(0);
    body.put_u8(0);
    // style XFs flag unused attribute groups, cell XFs the ones they set
    body.put_u8(if style { 0xF4 } else if format_id != 0 { 0x04 } else { 0 });
    body.put_u32(0);
    body.put_u32(0);
    body.put_u16(0x20C0); // pattern colours
    body
}

fn window2(selected: bool) -> Vec<u8> {
    let mut body = Vec::with_capacity(18);
    body.put_u16(if selected { 0x06B6 } else { 0x00B6 });
    body.put_u16(0);
    body.put_u16(0);
    body.put_u16(0x0040);
    body.put_u16(0);
    body.put_u16(0);
    body.put_u16(0);
    body.put_u32(0);
    body
}

/// The 8-byte FORMULA result field
fn formula_result(cached: Option<&CellValue>) -> [u8; 8] {
    match cached {
        Some(CellValue::Number(n)) => n.to_le_bytes(),
        Some(CellValue::String(_)) => [0x00, 0, 0, 0, 0, 0, 0xFF, 0xFF],
        Some(CellValue::Boolean(b)) => [0x01, 0, u8::from(*b), 0, 0, 0, 0xFF, 0xFF],
        Some(CellValue::Error(e)) => [0x02, 0, e.code(), 0, 0, 0, 0xFF, 0xFF],
        _ => [0x03, 0, 0, 0, 0, 0, 0xFF, 0xFF],
    }
}
