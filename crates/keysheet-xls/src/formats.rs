//! Number formats carried by FORMAT and XF records

use std::collections::HashMap;

use crate::biff::parser::ByteReader;
use crate::biff::strings::read_unicode_string;
use crate::error::XlsResult;
use keysheet_core::{NumberFormat, Workbook};

/// FORMAT record: `(ifmt, code)`
pub(crate) fn parse_format(data: &[u8]) -> XlsResult<(u16, String)> {
    let mut r = ByteReader::new(data);
    let id = r.u16()?;
    Ok((id, read_unicode_string(&mut r)?))
}

/// Format index of an XF record
pub(crate) fn parse_xf_format(data: &[u8]) -> XlsResult<u16> {
    let mut r = ByteReader::new(data);
    r.skip(2)?;
    r.u16()
}

/// Format codes and XF entries collected from the workbook globals
#[derive(Debug, Default)]
pub(crate) struct FormatTable {
    codes: HashMap<u16, String>,
    xf_formats: Vec<u16>,
}

impl FormatTable {
    pub(crate) fn add_format(&mut self, id: u16, code: String) {
        self.codes.insert(id, code);
    }

    pub(crate) fn add_xf(&mut self, format_id: u16) {
        self.xf_formats.push(format_id);
    }

    /// Format of the cell XF at `xf_index`
    pub(crate) fn resolve(&self, xf_index: u16) -> NumberFormat {
        let Some(&id) = self.xf_formats.get(xf_index as usize) else {
            return NumberFormat::General;
        };
        match self.codes.get(&id) {
            Some(code) => NumberFormat::from_code(code),
            None => NumberFormat::from_id(id as u32),
        }
    }
}

/// XF layout the writer emits: 15 style XFs, the default cell XF 15, then one
/// cell XF per distinct format
#[derive(Debug)]
pub(crate) struct XlsFormatTable {
    /// `(ifmt, format)` per extra cell XF
    entries: Vec<(u16, NumberFormat)>,
    /// Custom codes with their assigned ifmt
    custom: Vec<(u16, String)>,
}

impl XlsFormatTable {
    pub(crate) const STYLE_XFS: u16 = 15;
    pub(crate) const DEFAULT_CELL_XF: u16 = 15;

    pub(crate) fn build(workbook: &Workbook) -> Self {
        let mut table = Self {
            entries: Vec::new(),
            custom: Vec::new(),
        };
        for sheet in workbook.worksheets() {
            for (_, _, cell) in sheet.iter_cells() {
                let format = &cell.number_format;
                if format.is_general() || table.entries.iter().any(|(_, f)| f == format) {
                    continue;
                }
                let id = match format {
                    NumberFormat::Custom(code) => table.custom_id(code),
                    other => other.builtin_id().unwrap_or(0) as u16,
                };
                table.entries.push((id, format.clone()));
            }
        }
        table
    }

    fn custom_id(&mut self, code: &str) -> u16 {
        if let Some((id, _)) = self.custom.iter().find(|(_, c)| c == code) {
            return *id;
        }
        let id = NumberFormat::FIRST_CUSTOM_ID as u16 + self.custom.len() as u16;
        self.custom.push((id, code.to_string()));
        id
    }

    /// XF index for a cell's format
    pub(crate) fn xf_index(&self, format: &NumberFormat) -> u16 {
        if format.is_general() {
            return Self::DEFAULT_CELL_XF;
        }
        self.entries
            .iter()
            .position(|(_, f)| f == format)
            .map_or(Self::DEFAULT_CELL_XF, |i| Self::DEFAULT_CELL_XF + 1 + i as u16)
    }

    /// Codes that need a FORMAT record
    pub(crate) fn custom_formats(&self) -> &[(u16, String)] {
        &self.custom
    }

    /// ifmt of each cell XF after the default one
    pub(crate) fn cell_xf_formats(&self) -> impl Iterator<Item = u16> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keysheet_core::CellData;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_prefers_format_records() {
        let mut table = FormatTable::default();
        table.add_format(164, "mm-dd-yyyy".into());
        table.add_xf(0);
        table.add_xf(14);
        table.add_xf(164);

        assert_eq!(table.resolve(0), NumberFormat::General);
        assert_eq!(table.resolve(1), NumberFormat::BuiltIn(14));
        assert_eq!(table.resolve(2), NumberFormat::date());
        assert_eq!(table.resolve(99), NumberFormat::General);
    }

    #[test]
    fn test_writer_table_assigns_xfs_after_defaults() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet
            .set_cell_at(0, 0, CellData::with_format(1.0.into(), NumberFormat::BuiltIn(10)))
            .unwrap();
        sheet
            .set_cell_at(0, 1, CellData::with_format(1.0.into(), NumberFormat::date()))
            .unwrap();
        sheet.set_cell_value("C1", 3.0).unwrap();

        let table = XlsFormatTable::build(&wb);
        assert_eq!(table.xf_index(&NumberFormat::General), 15);
        assert_eq!(table.xf_index(&NumberFormat::BuiltIn(10)), 16);
        assert_eq!(table.xf_index(&NumberFormat::date()), 17);
        assert_eq!(table.custom_formats(), &[(164, "mm-dd-yyyy".to_string())]);
        assert_eq!(table.cell_xf_formats().collect::<Vec<_>>(), vec![10, 164]);
    }
}
