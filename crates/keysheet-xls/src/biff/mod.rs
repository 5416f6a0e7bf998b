//! BIFF8 record framing.
//!
//! A BIFF8 stream is a sequence of records, each a 4-byte header (record id
//! and body length, little-endian u16s) followed by at most
//! [`records::MAX_RECORD_DATA`] body bytes. Longer bodies continue in
//! CONTINUE records.

pub mod formula;
pub mod parser;
pub mod records;
pub mod strings;

use std::io::{Read, Seek};

use crate::error::{XlsError, XlsResult};
use parser::ByteReader;

/// One record with its CONTINUE bodies appended
#[derive(Debug, Clone)]
pub struct BiffRecord {
    pub record_type: u16,
    pub data: Vec<u8>,
    /// Offsets in `data` where a CONTINUE body starts. SST and STRING need them:
    /// a string split there restarts with a fresh encoding flag.
    pub continue_offsets: Vec<usize>,
    /// Offset of the record header in the stream
    pub stream_offset: u64,
}

/// Read every record of a stream, merging CONTINUE records into their parent
pub fn read_all_records<R: Read + Seek>(stream: &mut R) -> XlsResult<Vec<BiffRecord>> {
    let mut records: Vec<BiffRecord> = Vec::new();
    let mut header = [0u8; 4];

    loop {
        let stream_offset = stream.stream_position()?;
        match stream.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(XlsError::Io(e)),
        }

        let record_type = u16::from_le_bytes([header[0], header[1]]);
        let len = u16::from_le_bytes([header[2], header[3]]) as usize;
        let mut body = vec![0u8; len];
        stream.read_exact(&mut body)?;

        match record_type {
            records::CONTINUE => match records.last_mut() {
                Some(prev) => {
                    prev.continue_offsets.push(prev.data.len());
                    prev.data.extend_from_slice(&body);
                }
                None => log::warn!("CONTINUE record at {} has no parent", stream_offset),
            },
            // zero padding after the last substream
            0 if len == 0 => {}
            _ => records.push(BiffRecord {
                record_type,
                data: body,
                continue_offsets: Vec::new(),
                stream_offset,
            }),
        }
    }

    Ok(records)
}

/// `(version, substream_type)` of a BOF record
pub fn parse_bof(data: &[u8]) -> XlsResult<(u16, u16)> {
    let mut r = ByteReader::new(data);
    let version = r
        .u16()
        .map_err(|_| XlsError::InvalidFormat("BOF record too short".into()))?;
    let substream = r
        .u16()
        .map_err(|_| XlsError::InvalidFormat("BOF record too short".into()))?;
    Ok((version, substream))
}

/// Accumulates records into a stream buffer
#[derive(Debug, Default)]
pub struct BiffWriter {
    buf: Vec<u8>,
}

impl BiffWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Append a record, spilling bodies over the size limit into CONTINUE
    /// records
    pub fn record(&mut self, record_type: u16, body: &[u8]) {
        let mut chunks = body.chunks(records::MAX_RECORD_DATA);
        let first = chunks.next().unwrap_or(&[]);
        self.raw_record(record_type, first);
        for chunk in chunks {
            self.raw_record(records::CONTINUE, chunk);
        }
    }

    fn raw_record(&mut self, record_type: u16, body: &[u8]) {
        self.buf.extend_from_slice(&record_type.to_le_bytes());
        self.buf.extend_from_slice(&(body.len() as u16).to_le_bytes());
        self.buf.extend_from_slice(body);
    }

    /// Overwrite a u32 written earlier
    pub fn patch_u32(&mut self, at: usize, value: u32) {
        self.buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn append(&mut self, other: BiffWriter) {
        self.buf.extend_from_slice(&other.buf);
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn test_long_records_round_trip_through_continue() {
        let body: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        let mut w = BiffWriter::new();
        w.record(records::SST, &body);
        w.record(records::EOF, &[]);
        let mut bytes = w.into_inner();
        bytes.extend_from_slice(&[0u8; 16]);

        let recs = read_all_records(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].data, body);
        assert_eq!(recs[0].continue_offsets, vec![8224, 16448]);
        assert_eq!(recs[1].record_type, records::EOF);
    }

    #[test]
    fn test_parse_bof() {
        let mut w = BiffWriter::new();
        w.record(records::BOF, &[0x00, 0x06, 0x10, 0x00]);
        let recs = read_all_records(&mut Cursor::new(w.into_inner())).unwrap();
        assert_eq!(
            parse_bof(&recs[0].data).unwrap(),
            (records::BIFF8_VERSION, records::BOF_WORKSHEET)
        );
        assert!(parse_bof(&[0x00]).is_err());
    }
}
