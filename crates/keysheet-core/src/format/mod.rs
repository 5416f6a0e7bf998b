//! Number formats and display rendering

mod render;

pub use render::{format_general, format_number, format_value};

/// Display format attached to a cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    #[default]
    General,

    /// Built-in format by id (the ids shared by both container formats)
    BuiltIn(u32),

    /// Format code such as `mm-dd-yyyy`
    Custom(String),
}

impl NumberFormat {
    /// First id available for custom formats in both containers
    pub const FIRST_CUSTOM_ID: u32 = 164;

    /// Pattern stored on cells written from a `MM-dd-yyyy` date
    pub const DATE_PATTERN: &'static str = "mm-dd-yyyy";

    /// Custom format from a code; `General` and known built-in codes are
    /// folded into their canonical variants
    pub fn from_code<S: AsRef<str>>(code: S) -> Self {
        let code = code.as_ref();
        if code.eq_ignore_ascii_case("General") {
            return NumberFormat::General;
        }
        match BUILTIN_FORMATS.iter().find(|(_, c)| *c == code) {
            Some((id, _)) => NumberFormat::BuiltIn(*id),
            None => NumberFormat::Custom(code.to_string()),
        }
    }

    /// Format for a format id read from a file, without a custom code table
    pub fn from_id(id: u32) -> Self {
        if id == 0 {
            NumberFormat::General
        } else {
            NumberFormat::BuiltIn(id)
        }
    }

    /// The `mm-dd-yyyy` date format
    pub fn date() -> Self {
        NumberFormat::Custom(Self::DATE_PATTERN.to_string())
    }

    pub fn is_general(&self) -> bool {
        matches!(self, NumberFormat::General | NumberFormat::BuiltIn(0))
    }

    /// Format code
    pub fn code(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::BuiltIn(id) => Self::builtin_code(*id),
            NumberFormat::Custom(s) => s,
        }
    }

    /// Built-in id, if this format has one
    pub fn builtin_id(&self) -> Option<u32> {
        match self {
            NumberFormat::General => Some(0),
            NumberFormat::BuiltIn(id) => Some(*id),
            NumberFormat::Custom(_) => None,
        }
    }

    /// Code for a built-in id; unknown ids fall back to `General`
    pub fn builtin_code(id: u32) -> &'static str {
        BUILTIN_FORMATS
            .iter()
            .find(|(builtin, _)| *builtin == id)
            .map(|(_, code)| *code)
            .unwrap_or("General")
    }

    /// Whether values in this format display as dates or times
    pub fn is_date_format(&self) -> bool {
        match self {
            NumberFormat::General => false,
            NumberFormat::BuiltIn(id) => matches!(id, 14..=22 | 45..=47),
            NumberFormat::Custom(code) => render::is_date_code(code),
        }
    }
}

const BUILTIN_FORMATS: &[(u32, &str)] = &[
    (0, "General"),
    (1, "0"),
    (2, "0.00"),
    (3, "#,##0"),
    (4, "#,##0.00"),
    (9, "0%"),
    (10, "0.00%"),
    (11, "0.00E+00"),
    (12, "# ?/?"),
    (13, "# ??/??"),
    (14, "m/d/yy"),
    (15, "d-mmm-yy"),
    (16, "d-mmm"),
    (17, "mmm-yy"),
    (18, "h:mm AM/PM"),
    (19, "h:mm:ss AM/PM"),
    (20, "h:mm"),
    (21, "h:mm:ss"),
    (22, "m/d/yy h:mm"),
    (37, "#,##0_);(#,##0)"),
    (38, "#,##0_);[Red](#,##0)"),
    (39, "#,##0.00_);(#,##0.00)"),
    (40, "#,##0.00_);[Red](#,##0.00)"),
    (45, "mm:ss"),
    (46, "[h]:mm:ss"),
    (47, "mm:ss.0"),
    (48, "##0.0E+0"),
    (49, "@"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_folds_builtins() {
        assert_eq!(NumberFormat::from_code("general"), NumberFormat::General);
        assert_eq!(NumberFormat::from_code("0.00"), NumberFormat::BuiltIn(2));
        assert_eq!(
            NumberFormat::from_code("mm-dd-yyyy"),
            NumberFormat::Custom("mm-dd-yyyy".into())
        );
    }

    #[test]
    fn test_date_detection() {
        assert!(NumberFormat::date().is_date_format());
        assert!(NumberFormat::BuiltIn(14).is_date_format());
        assert!(NumberFormat::from_code("h:mm AM/PM").is_date_format());
        assert!(!NumberFormat::from_code("#,##0.00").is_date_format());
        assert!(!NumberFormat::from_code("\"days\" 0").is_date_format());
        assert!(!NumberFormat::General.is_date_format());
    }
}
