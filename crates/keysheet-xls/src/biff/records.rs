//! BIFF8 record ids used by the reader and writer

// Substream framing
pub const BOF: u16 = 0x0809;
pub const EOF: u16 = 0x000A;
pub const CONTINUE: u16 = 0x003C;

// Workbook globals
pub const CODEPAGE: u16 = 0x0042;
pub const WINDOW1: u16 = 0x003D;
pub const DATEMODE: u16 = 0x0022;
pub const FONT: u16 = 0x0031;
pub const FORMAT: u16 = 0x041E;
pub const XF: u16 = 0x00E0;
pub const STYLE: u16 = 0x0293;
pub const BOUNDSHEET: u16 = 0x0085;
pub const SST: u16 = 0x00FC;

// Worksheet substream
pub const DIMENSION: u16 = 0x0200;
pub const ROW: u16 = 0x0208;
pub const WINDOW2: u16 = 0x023E;

// Cells
pub const LABELSST: u16 = 0x00FD;
pub const LABEL: u16 = 0x0204;
pub const NUMBER: u16 = 0x0203;
pub const RK: u16 = 0x027E;
pub const MULRK: u16 = 0x00BD;
pub const BLANK: u16 = 0x0201;
pub const MULBLANK: u16 = 0x00BE;
pub const BOOLERR: u16 = 0x0205;
pub const FORMULA: u16 = 0x0006;
/// Cached text result of the FORMULA record before it
pub const STRING: u16 = 0x0207;

// BOF substream types
pub const BOF_WORKBOOK_GLOBALS: u16 = 0x0005;
pub const BOF_WORKSHEET: u16 = 0x0010;

pub const BIFF8_VERSION: u16 = 0x0600;

/// Largest record body; longer data goes into CONTINUE records
pub const MAX_RECORD_DATA: usize = 8224;
