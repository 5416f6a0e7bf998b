//! XLS (BIFF8) reader.
//!
//! Opens the compound file, reads the `Workbook` stream, collects the
//! globals (shared strings, sheets, formats, date system) and then fills each
//! worksheet from the substream its BOUNDSHEET record points at.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use keysheet_core::{CellData, CellError, CellValue, Workbook, Worksheet};

use crate::biff::formula::decode_formula;
use crate::biff::parser::ByteReader;
use crate::biff::strings::{
    parse_sst, parse_string_record, read_short_string, read_unicode_string,
};
use crate::biff::{self, records, BiffRecord};
use crate::error::{XlsError, XlsResult};
use crate::formats::{parse_format, parse_xf_format, FormatTable};

/// XLS file reader
pub struct XlsReader;

/// BOUNDSHEET entry
#[derive(Debug)]
struct SheetInfo {
    /// Stream offset of the sheet's BOF
    offset: u32,
    /// 0 = worksheet, 2 = chart, 6 = VBA module
    sheet_type: u8,
    name: String,
}

/// Shared state for decoding one sheet's cells
struct SheetContext<'a> {
    sst: &'a [String],
    formats: &'a FormatTable,
}

impl XlsReader {
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsResult<Workbook> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::read(file)
    }

    pub fn read<R: Read + Seek>(reader: R) -> XlsResult<Workbook> {
        let mut cfb = cfb::CompoundFile::open(reader)
            .map_err(|e| XlsError::InvalidFormat(format!("not a compound file: {}", e)))?;

        if !cfb.exists("/Workbook") {
            return Err(if cfb.exists("/Book") {
                XlsError::UnsupportedVersion("BIFF5 'Book' stream".into())
            } else {
                XlsError::InvalidFormat("no Workbook stream in compound file".into())
            });
        }

        let mut stream_data = Vec::new();
        cfb.open_stream("/Workbook")?.read_to_end(&mut stream_data)?;
        let all_records = biff::read_all_records(&mut Cursor::new(&stream_data))?;

        // Workbook globals run from the first BOF to its EOF
        let mut sst: Vec<String> = Vec::new();
        let mut sheets: Vec<SheetInfo> = Vec::new();
        let mut formats = FormatTable::default();
        let mut date_1904 = false;
        let mut globals_end = None;

        match all_records.first() {
            Some(rec) if rec.record_type == records::BOF => {
                let (version, substream) = biff::parse_bof(&rec.data)?;
                if substream != records::BOF_WORKBOOK_GLOBALS {
                    return Err(XlsError::InvalidFormat(
                        "stream does not start with workbook globals".into(),
                    ));
                }
                if version != records::BIFF8_VERSION {
                    return Err(XlsError::UnsupportedVersion(format!(
                        "expected BIFF8 (0x0600), got 0x{:04X}",
                        version
                    )));
                }
            }
            _ => return Err(XlsError::InvalidFormat("missing workbook BOF".into())),
        }

        for (idx, rec) in all_records.iter().enumerate().skip(1) {
            match rec.record_type {
                records::EOF => {
                    globals_end = Some(idx);
                    break;
                }
                records::SST => sst = parse_sst(rec)?,
                records::BOUNDSHEET => sheets.push(Self::parse_boundsheet(&rec.data)?),
                records::DATEMODE => {
                    date_1904 = ByteReader::new(&rec.data).u16().map_or(false, |m| m == 1);
                }
                records::FORMAT => match parse_format(&rec.data) {
                    Ok((id, code)) => formats.add_format(id, code),
                    Err(e) => log::warn!("skipping malformed FORMAT record: {}", e),
                },
                records::XF => formats.add_xf(parse_xf_format(&rec.data)?),
                _ => {}
            }
        }
        let globals_end = globals_end
            .ok_or_else(|| XlsError::InvalidFormat("workbook globals have no EOF".into()))?;

        let substreams = Self::split_substreams(&all_records[globals_end + 1..]);
        let ctx = SheetContext {
            sst: &sst,
            formats: &formats,
        };

        let mut workbook = Workbook::empty();
        workbook.settings_mut().date_1904 = date_1904;

        for info in sheets.iter().filter(|s| s.sheet_type == 0) {
            let mut worksheet = Worksheet::new(info.name.as_str());
            match substreams.get(&(info.offset as u64)) {
                Some(sheet_records) => Self::read_sheet(sheet_records, &mut worksheet, &ctx)?,
                None => log::warn!(
                    "sheet '{}' points at offset {} where no substream starts",
                    info.name,
                    info.offset
                ),
            }
            workbook.add_existing_worksheet(worksheet)?;
        }

        if workbook.is_empty() {
            return Err(XlsError::InvalidFormat("workbook has no worksheets".into()));
        }
        log::debug!("read {} sheet(s) from xls", workbook.sheet_count());
        Ok(workbook)
    }

    /// BOUNDSHEET: offset(4) + visibility(1) + type(1) + short string
    fn parse_boundsheet(data: &[u8]) -> XlsResult<SheetInfo> {
        let mut r = ByteReader::new(data);
        let offset = r.u32()?;
        let _visibility = r.u8()?;
        let sheet_type = r.u8()?;
        let name = read_short_string(&mut r)?;
        Ok(SheetInfo {
            offset,
            sheet_type,
            name,
        })
    }

    /// Records of each top-level BOF..EOF substream, keyed by the BOF offset
    fn split_substreams(records: &[BiffRecord]) -> HashMap<u64, Vec<&BiffRecord>> {
        let mut groups = HashMap::new();
        let mut current: Option<(u64, Vec<&BiffRecord>)> = None;
        let mut depth = 0usize;

        for rec in records {
            match rec.record_type {
                records::BOF => {
                    if depth == 0 {
                        current = Some((rec.stream_offset, Vec::new()));
                    }
                    depth += 1;
                }
                records::EOF => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        if let Some((offset, group)) = current.take() {
                            groups.insert(offset, group);
                        }
                    }
                }
                _ if depth == 1 => {
                    if let Some((_, group)) = current.as_mut() {
                        group.push(rec);
                    }
                }
                _ => {}
            }
        }
        groups
    }

    fn read_sheet(
        records: &[&BiffRecord],
        ws: &mut Worksheet,
        ctx: &SheetContext,
    ) -> XlsResult<()> {
        // Cell of the last FORMULA whose text result follows in a STRING record
        let mut pending_string: Option<(u32, u16)> = None;

        for rec in records {
            let data = rec.data.as_slice();
            match rec.record_type {
                records::ROW => {
                    let row = ByteReader::new(data).u16()?;
                    ws.ensure_row(row as u32)?;
                }
                records::LABELSST => {
                    let mut r = ByteReader::new(data);
                    let (row, col, xf) = Self::cell_header(&mut r)?;
                    let index = r.u32()? as usize;
                    let text = ctx.sst.get(index).ok_or_else(|| {
                        XlsError::Parse(format!("shared string {} out of range", index))
                    })?;
                    Self::store(ws, ctx, row, col, xf, CellValue::string(text))?;
                }
                records::LABEL => {
                    let mut r = ByteReader::new(data);
                    let (row, col, xf) = Self::cell_header(&mut r)?;
                    let text = read_unicode_string(&mut r)?;
                    Self::store(ws, ctx, row, col, xf, CellValue::string(text))?;
                }
                records::NUMBER => {
                    let mut r = ByteReader::new(data);
                    let (row, col, xf) = Self::cell_header(&mut r)?;
                    let value = r.f64()?;
                    Self::store(ws, ctx, row, col, xf, CellValue::Number(value))?;
                }
                records::RK => {
                    let mut r = ByteReader::new(data);
                    let (row, col, xf) = Self::cell_header(&mut r)?;
                    let value = r.rk()?;
                    Self::store(ws, ctx, row, col, xf, CellValue::Number(value))?;
                }
                records::MULRK => Self::read_mulrk(data, ws, ctx)?,
                records::BLANK => {
                    let mut r = ByteReader::new(data);
                    let (row, col, xf) = Self::cell_header(&mut r)?;
                    Self::store(ws, ctx, row, col, xf, CellValue::Empty)?;
                }
                records::MULBLANK => Self::read_mulblank(data, ws, ctx)?,
                records::BOOLERR => {
                    let mut r = ByteReader::new(data);
                    let (row, col, xf) = Self::cell_header(&mut r)?;
                    let value = r.u8()?;
                    let is_error = r.u8()? != 0;
                    Self::store(ws, ctx, row, col, xf, bool_or_error(value, is_error))?;
                }
                records::FORMULA => {
                    pending_string = Self::read_formula(data, ws, ctx)?;
                    continue;
                }
                records::STRING => {
                    if let Some((row, col)) = pending_string.take() {
                        let text = parse_string_record(rec)?;
                        Self::set_cached_string(ws, row, col, text);
                    }
                    continue;
                }
                _ => continue,
            }
            pending_string = None;
        }
        Ok(())
    }

    /// row(2) + col(2) + xf(2) shared by every cell record
    fn cell_header(r: &mut ByteReader) -> XlsResult<(u32, u16, u16)> {
        Ok((r.u16()? as u32, r.u16()?, r.u16()?))
    }

    fn store(
        ws: &mut Worksheet,
        ctx: &SheetContext,
        row: u32,
        col: u16,
        xf: u16,
        value: CellValue,
    ) -> XlsResult<()> {
        ws.set_cell_at(row, col, CellData::with_format(value, ctx.formats.resolve(xf)))?;
        Ok(())
    }

    /// MULRK: row(2) + first_col(2) + [xf(2) + rk(4)]* + last_col(2)
    fn read_mulrk(data: &[u8], ws: &mut Worksheet, ctx: &SheetContext) -> XlsResult<()> {
        let mut r = ByteReader::new(data);
        let row = r.u16()? as u32;
        let first_col = r.u16()?;
        let count = r.remaining().saturating_sub(2) / 6;
        for i in 0..count {
            let xf = r.u16()?;
            let value = r.rk()?;
            Self::store(ws, ctx, row, first_col + i as u16, xf, CellValue::Number(value))?;
        }
        Ok(())
    }

    /// MULBLANK: row(2) + first_col(2) + [xf(2)]* + last_col(2)
    fn read_mulblank(data: &[u8], ws: &mut Worksheet, ctx: &SheetContext) -> XlsResult<()> {
        let mut r = ByteReader::new(data);
        let row = r.u16()? as u32;
        let first_col = r.u16()?;
        let count = r.remaining().saturating_sub(2) / 2;
        for i in 0..count {
            let xf = r.u16()?;
            Self::store(ws, ctx, row, first_col + i as u16, xf, CellValue::Empty)?;
        }
        Ok(())
    }

    /// FORMULA: header(6) + result(8) + flags(2) + chn(4) + cce(2) + rgce.
    ///
    /// Returns the cell when its text result follows in a STRING record.
    fn read_formula(
        data: &[u8],
        ws: &mut Worksheet,
        ctx: &SheetContext,
    ) -> XlsResult<Option<(u32, u16)>> {
        let mut r = ByteReader::new(data);
        let (row, col, xf) = Self::cell_header(&mut r)?;
        let result = r.take(8)?;
        r.skip(6)?;
        let len = r.u16()? as usize;
        let rgce = r.take(len.min(r.remaining()))?;

        let mut string_follows = false;
        let cached = if result[6] == 0xFF && result[7] == 0xFF {
            match result[0] {
                0x00 => {
                    string_follows = true;
                    None
                }
                0x01 => Some(CellValue::Boolean(result[2] != 0)),
                0x02 => Some(bool_or_error(result[2], true)),
                0x03 => Some(CellValue::string("")),
                _ => None,
            }
        } else {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(result);
            Some(CellValue::Number(f64::from_le_bytes(bytes)))
        };

        let value = match decode_formula(rgce) {
            Ok(expr) => CellValue::Formula {
                text: expr.to_formula(),
                cached_value: cached.map(Box::new),
            },
            Err(e) => {
                log::warn!(
                    "keeping cached result of formula at row {} col {}: {}",
                    row,
                    col,
                    e
                );
                cached.unwrap_or_default()
            }
        };
        Self::store(ws, ctx, row, col, xf, value)?;
        Ok(string_follows.then_some((row, col)))
    }

    fn set_cached_string(ws: &mut Worksheet, row: u32, col: u16, text: String) {
        let Some(cell) = ws.cells_mut().get_mut(row, col) else {
            return;
        };
        match &mut cell.value {
            CellValue::Formula { cached_value, .. } => {
                *cached_value = Some(Box::new(CellValue::string(text)));
            }
            other => *other = CellValue::string(text),
        }
    }
}

fn bool_or_error(value: u8, is_error: bool) -> CellValue {
    if is_error {
        CellValue::Error(CellError::from_code(value).unwrap_or(CellError::Value))
    } else {
        CellValue::Boolean(value != 0)
    }
}
