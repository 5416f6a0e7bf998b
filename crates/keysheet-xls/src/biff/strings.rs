//! BIFF8 string encoding.
//!
//! Strings are a character count, a flags byte and the characters. Flag bit 0
//! selects UTF-16LE over one-byte Latin-1; bit 3 announces rich-text runs and
//! bit 2 phonetic data, whose sizes follow the flags and whose bytes follow
//! the characters.
//!
//! In the SST and in STRING records a string may be cut at a CONTINUE
//! boundary. The continuation then starts with a new flags byte, so the
//! encoding can change mid-string.

use super::parser::{ByteReader, PutLe};
use super::records::{CONTINUE, MAX_RECORD_DATA, SST};
use super::{BiffRecord, BiffWriter};
use crate::error::{XlsError, XlsResult};

/// Most UTF-16 units a cell's text may hold
pub const MAX_STRING_UNITS: usize = 32_767;

const FLAG_WIDE: u8 = 0x01;
const FLAG_PHONETIC: u8 = 0x04;
const FLAG_RICH: u8 = 0x08;

/// String with a one-byte length (BOUNDSHEET, FONT, ptgStr)
pub fn read_short_string(r: &mut ByteReader) -> XlsResult<String> {
    let count = r.u8()? as usize;
    let flags = r.u8()?;
    read_characters(r, count, flags)
}

/// String with a two-byte length (LABEL, STRING, FORMAT)
pub fn read_unicode_string(r: &mut ByteReader) -> XlsResult<String> {
    let count = r.u16()? as usize;
    let flags = r.u8()?;
    let runs = if flags & FLAG_RICH != 0 { r.u16()? as usize } else { 0 };
    let phonetic = if flags & FLAG_PHONETIC != 0 { r.u32()? as usize } else { 0 };
    let text = read_characters(r, count, flags)?;
    r.skip(runs * 4 + phonetic)?;
    Ok(text)
}

fn read_characters(r: &mut ByteReader, count: usize, flags: u8) -> XlsResult<String> {
    if flags & FLAG_WIDE != 0 {
        let bytes = r.take(count * 2)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .collect();
        Ok(String::from_utf16_lossy(&units))
    } else {
        Ok(r.take(count)?.iter().map(|&b| b as char).collect())
    }
}

/// Decode the shared string table of an SST record
pub fn parse_sst(record: &BiffRecord) -> XlsResult<Vec<String>> {
    let mut cursor = SegmentCursor {
        data: &record.data,
        boundaries: &record.continue_offsets,
        pos: 8,
    };
    if record.data.len() < 8 {
        return Err(XlsError::Parse("SST record too short".into()));
    }
    let unique = u32::from_le_bytes([record.data[4], record.data[5], record.data[6], record.data[7]])
        as usize;

    let mut strings = Vec::with_capacity(unique.min(record.data.len()));
    for i in 0..unique {
        match cursor.read_string() {
            Ok(s) => strings.push(s),
            Err(e) => {
                log::warn!("SST truncated at string {}/{}: {}", i, unique, e);
                break;
            }
        }
    }
    Ok(strings)
}

/// Text result of a STRING record, which may continue in CONTINUE records
pub fn parse_string_record(record: &BiffRecord) -> XlsResult<String> {
    SegmentCursor {
        data: &record.data,
        boundaries: &record.continue_offsets,
        pos: 0,
    }
    .read_string()
}

/// Reads strings from a record body made of CONTINUE segments
struct SegmentCursor<'a> {
    data: &'a [u8],
    boundaries: &'a [usize],
    pos: usize,
}

impl SegmentCursor<'_> {
    fn bytes(&mut self, len: usize) -> XlsResult<&[u8]> {
        if self.pos + len > self.data.len() {
            return Err(XlsError::Parse(format!(
                "string runs past the end of the record at offset {}",
                self.pos
            )));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u8(&mut self) -> XlsResult<u8> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> XlsResult<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> XlsResult<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn at_boundary(&self) -> bool {
        self.boundaries.binary_search(&self.pos).is_ok()
    }

    /// End of the CONTINUE segment holding `pos`
    fn segment_end(&self) -> usize {
        self.boundaries
            .iter()
            .copied()
            .find(|&b| b > self.pos)
            .unwrap_or(self.data.len())
    }

    fn read_string(&mut self) -> XlsResult<String> {
        let count = self.u16()? as usize;
        let mut flags = self.u8()?;
        let runs = if flags & FLAG_RICH != 0 { self.u16()? as usize } else { 0 };
        let phonetic = if flags & FLAG_PHONETIC != 0 { self.u32()? as usize } else { 0 };

        let mut units: Vec<u16> = Vec::with_capacity(count);
        while units.len() < count {
            if self.at_boundary() {
                flags = self.u8()?;
            }
            let width = if flags & FLAG_WIDE != 0 { 2 } else { 1 };
            let fit = (self.segment_end() - self.pos) / width;
            let take = fit.min(count - units.len());
            if take == 0 {
                return Err(XlsError::Parse(format!(
                    "string characters cut short at offset {}",
                    self.pos
                )));
            }
            let bytes = self.bytes(take * width)?;
            if width == 2 {
                units.extend(
                    bytes
                        .chunks_exact(2)
                        .map(|b| u16::from_le_bytes([b[0], b[1]])),
                );
            } else {
                units.extend(bytes.iter().map(|&b| b as u16));
            }
        }

        let trailing = runs * 4 + phonetic;
        self.pos = (self.pos + trailing).min(self.data.len());
        Ok(String::from_utf16_lossy(&units))
    }
}

// === Writing ===

/// Characters of a string in the narrowest encoding that holds them
struct EncodedChars {
    wide: bool,
    units: Vec<u16>,
}

impl EncodedChars {
    fn new(s: &str) -> Self {
        let units: Vec<u16> = s.encode_utf16().collect();
        let wide = units.iter().any(|&u| u > 0xFF);
        Self { wide, units }
    }

    fn flags(&self) -> u8 {
        if self.wide {
            FLAG_WIDE
        } else {
            0
        }
    }

    fn width(&self) -> usize {
        if self.wide {
            2
        } else {
            1
        }
    }

    fn put(&self, out: &mut Vec<u8>, units: &[u16]) {
        for &u in units {
            if self.wide {
                out.put_u16(u);
            } else {
                out.put_u8(u as u8);
            }
        }
    }
}

/// Two-byte-length string; callers keep `s` within [`MAX_STRING_UNITS`]
pub fn encode_unicode_string(s: &str) -> Vec<u8> {
    let chars = EncodedChars::new(s);
    let mut out = Vec::with_capacity(3 + chars.units.len() * chars.width());
    out.put_u16(chars.units.len() as u16);
    out.put_u8(chars.flags());
    chars.put(&mut out, &chars.units);
    out
}

/// One-byte-length string; callers keep `s` under 256 UTF-16 units
pub fn encode_short_string(s: &str) -> Vec<u8> {
    let chars = EncodedChars::new(s);
    let mut out = Vec::with_capacity(2 + chars.units.len() * chars.width());
    out.put_u8(chars.units.len() as u8);
    out.put_u8(chars.flags());
    chars.put(&mut out, &chars.units);
    out
}

/// Record whose strings continue across CONTINUE records.
///
/// A string header always shares its segment with at least one character,
/// and a string cut at a segment end resumes after a new flags byte.
pub struct ContinuedRecord<'w> {
    writer: &'w mut BiffWriter,
    record_type: u16,
    body: Vec<u8>,
}

impl<'w> ContinuedRecord<'w> {
    pub fn new(writer: &'w mut BiffWriter, record_type: u16) -> Self {
        Self {
            writer,
            record_type,
            body: Vec::with_capacity(MAX_RECORD_DATA),
        }
    }

    /// Fixed-size fields; they never straddle a segment
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        if self.body.len() + bytes.len() > MAX_RECORD_DATA {
            self.next_segment();
        }
        self.body.extend_from_slice(bytes);
    }

    /// Two-byte-length string; callers keep `s` within [`MAX_STRING_UNITS`]
    pub fn put_string(&mut self, s: &str) {
        let chars = EncodedChars::new(s);
        let width = chars.width();
        if self.body.len() + 3 + width > MAX_RECORD_DATA {
            self.next_segment();
        }
        self.body.put_u16(chars.units.len() as u16);
        self.body.put_u8(chars.flags());

        let mut rest: &[u16] = &chars.units;
        loop {
            let fit = (MAX_RECORD_DATA - self.body.len()) / width;
            let (now, later) = rest.split_at(fit.min(rest.len()));
            chars.put(&mut self.body, now);
            rest = later;
            if rest.is_empty() {
                break;
            }
            self.next_segment();
            self.body.put_u8(chars.flags());
        }
    }

    fn next_segment(&mut self) {
        self.writer.record(self.record_type, &self.body);
        self.record_type = CONTINUE;
        self.body.clear();
    }

    pub fn finish(self) {
        self.writer.record(self.record_type, &self.body);
    }
}

/// Write the SST record and its CONTINUE records
pub fn write_sst(w: &mut BiffWriter, strings: &[String], total_refs: u32) {
    let mut sst = ContinuedRecord::new(w, SST);
    let mut header = Vec::with_capacity(8);
    header.put_u32(total_refs);
    header.put_u32(strings.len() as u32);
    sst.put_bytes(&header);
    for s in strings {
        sst.put_string(s);
    }
    sst.finish();
}
