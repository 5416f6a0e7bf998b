//! Rendering values the way they display in a sheet

use chrono::{Datelike, NaiveDateTime, Timelike};

use super::NumberFormat;
use crate::cell::CellValue;
use crate::date::serial_to_datetime;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Text shown for a value in a cell with `format`.
///
/// Formulas render their cached result. Booleans render as `true`/`false`.
pub fn format_value(value: &CellValue, format: &NumberFormat, date_1904: bool) -> String {
    match value.effective_value() {
        CellValue::Empty => String::new(),
        CellValue::Boolean(b) => b.to_string(),
        CellValue::Number(n) => format_number(*n, format, date_1904),
        CellValue::String(s) => s.to_string(),
        CellValue::Error(e) => e.as_str().to_string(),
        CellValue::Formula { .. } => String::new(),
    }
}

/// Render a number through a format code
pub fn format_number(value: f64, format: &NumberFormat, date_1904: bool) -> String {
    if format.is_general() || format.code().trim().is_empty() || !value.is_finite() {
        return format_general(value);
    }
    let (section, signed) = pick_section(format.code(), value);
    let tokens = tokenize(section);

    if tokens.iter().any(|t| matches!(t, Token::General)) {
        let shown = if signed { value } else { value.abs() };
        return render_literals(&tokens, &format_general(shown));
    }
    if tokens.iter().any(Token::is_date_part) {
        return match serial_to_datetime(value, date_1904) {
            Some(dt) => render_date(&tokens, dt),
            None => format_general(value),
        };
    }
    if !tokens.iter().any(|t| matches!(t, Token::Digit(_))) {
        return render_literals(&tokens, "");
    }
    if tokens.iter().any(|t| matches!(t, Token::Literal(l) if l == "/")) {
        return format_general(value);
    }
    render_numeric(&tokens, value, signed)
}

/// General format: integers without a fraction, otherwise ten significant
/// digits, scientific notation for very large or tiny magnitudes
pub fn format_general(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return "#NUM!".to_string();
    }
    let magnitude = value.abs();
    if !(1e-9..1e11).contains(&magnitude) {
        return format_scientific_general(value);
    }
    if value.fract() == 0.0 {
        return format!("{}", value as i64);
    }
    let exponent = magnitude.log10().floor() as i32;
    let decimals = (9 - exponent).clamp(0, 17) as usize;
    trim_fraction(format!("{:.*}", decimals, value))
}

fn format_scientific_general(value: f64) -> String {
    let text = format!("{:.5E}", value);
    let (mantissa, exponent) = text.split_once('E').unwrap_or((&text, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    format!(
        "{}E{}{:02}",
        trim_fraction(mantissa.to_string()),
        if exponent < 0 { '-' } else { '+' },
        exponent.abs()
    )
}

fn trim_fraction(text: String) -> String {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Section for the value and whether the value keeps its sign in it
fn pick_section(code: &str, value: f64) -> (&str, bool) {
    match split_sections(code).as_slice() {
        [] => ("General", true),
        [only] => (*only, true),
        [_, negative, ..] if value < 0.0 => (*negative, false),
        [_, _, zero, ..] if value == 0.0 => (*zero, false),
        [first, ..] => (*first, true),
    }
}

fn split_sections(code: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let (mut start, mut quoted, mut escaped) = (0, false, false);
    for (i, c) in code.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => {
                sections.push(&code[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    sections.push(&code[start..]);
    sections
}

/// Whether the first section of a format code displays a date or time
pub(crate) fn is_date_code(code: &str) -> bool {
    let (section, _) = pick_section(code, 1.0);
    tokenize(section).iter().any(Token::is_date_part)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    /// `0`, `#` or `?`
    Digit(char),
    Point,
    Comma,
    Percent,
    /// `E+` / `E-`
    Exponent(bool),
    /// Run of one date letter, lowercased: `yyyy`, `mm`, `d`, `h`, `ss`
    Date(String),
    /// `AM/PM` (true) or `A/P` (false)
    AmPm(bool),
    General,
}

impl Token {
    fn is_date_part(&self) -> bool {
        matches!(self, Token::Date(_) | Token::AmPm(_))
    }
}

fn tokenize(section: &str) -> Vec<Token> {
    let chars: Vec<char> = section.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let rest: String = chars[i..].iter().collect();
        let lower = rest.to_ascii_lowercase();
        match c {
            '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&c| c == '"')
                    .map_or(chars.len(), |p| i + 1 + p);
                tokens.push(Token::Literal(chars[i + 1..end].iter().collect()));
                i = end + 1;
            }
            '\\' => {
                if let Some(&next) = chars.get(i + 1) {
                    tokens.push(Token::Literal(next.to_string()));
                }
                i += 2;
            }
            '_' => {
                tokens.push(Token::Literal(" ".into()));
                i += 2;
            }
            '*' => i += 2,
            '[' => {
                let end = chars[i..].iter().position(|&c| c == ']').map_or(chars.len(), |p| i + p);
                let inner: String = chars[i + 1..end].iter().collect::<String>().to_ascii_lowercase();
                if !inner.is_empty() && inner.chars().all(|c| matches!(c, 'h' | 'm' | 's')) {
                    tokens.push(Token::Date(inner));
                }
                i = end + 1;
            }
            '0' | '#' | '?' => {
                tokens.push(Token::Digit(c));
                i += 1;
            }
            '.' => {
                tokens.push(Token::Point);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            'E' | 'e' if matches!(chars.get(i + 1), Some('+') | Some('-')) => {
                tokens.push(Token::Exponent(chars[i + 1] == '+'));
                i += 2;
            }
            _ if lower.starts_with("am/pm") => {
                tokens.push(Token::AmPm(true));
                i += 5;
            }
            _ if lower.starts_with("a/p") => {
                tokens.push(Token::AmPm(false));
                i += 3;
            }
            _ if lower.starts_with("general") => {
                tokens.push(Token::General);
                i += 7;
            }
            _ if matches!(c.to_ascii_lowercase(), 'y' | 'm' | 'd' | 'h' | 's') => {
                let letter = c.to_ascii_lowercase();
                let run = chars[i..]
                    .iter()
                    .take_while(|c| c.to_ascii_lowercase() == letter)
                    .count();
                tokens.push(Token::Date(letter.to_string().repeat(run)));
                i += run;
            }
            _ => {
                tokens.push(Token::Literal(c.to_string()));
                i += 1;
            }
        }
    }
    tokens
}

fn render_literals(tokens: &[Token], placeholder: &str) -> String {
    let mut out = String::new();
    let mut placed = false;
    for token in tokens {
        match token {
            Token::Literal(l) => out.push_str(l),
            Token::Percent => out.push('%'),
            Token::General if !placed => {
                out.push_str(placeholder);
                placed = true;
            }
            _ => {}
        }
    }
    out
}

fn render_date(tokens: &[Token], dt: NaiveDateTime) -> String {
    let twelve_hour = tokens.iter().any(|t| matches!(t, Token::AmPm(_)));
    let date_parts: Vec<(usize, &str)> = tokens
        .iter()
        .enumerate()
        .filter_map(|(i, t)| match t {
            Token::Date(part) => Some((i, part.as_str())),
            _ => None,
        })
        .collect();
    let is_minute = |index: usize| {
        let pos = date_parts.iter().position(|(i, _)| *i == index);
        pos.map_or(false, |p| {
            let after_hour = p > 0 && date_parts[p - 1].1.starts_with('h');
            let before_second = date_parts
                .get(p + 1)
                .map_or(false, |(_, part)| part.starts_with('s'));
            after_hour || before_second
        })
    };

    let hour = if twelve_hour {
        match dt.hour() % 12 {
            0 => 12,
            h => h,
        }
    } else {
        dt.hour()
    };

    let mut out = String::new();
    for (index, token) in tokens.iter().enumerate() {
        match token {
            Token::Literal(l) => out.push_str(l),
            Token::Point => out.push('.'),
            Token::Comma => out.push(','),
            Token::Percent => out.push('%'),
            Token::Digit(_) => out.push('0'),
            Token::AmPm(full) => {
                let pm = dt.hour() >= 12;
                out.push_str(match (full, pm) {
                    (true, false) => "AM",
                    (true, true) => "PM",
                    (false, false) => "A",
                    (false, true) => "P",
                });
            }
            Token::Date(part) => {
                let len = part.len();
                let text = match part.as_bytes()[0] {
                    b'y' if len <= 2 => format!("{:02}", dt.year().rem_euclid(100)),
                    b'y' => format!("{:04}", dt.year()),
                    b'm' if len <= 2 && is_minute(index) => pad(dt.minute(), len),
                    b'm' if len <= 2 => pad(dt.month(), len),
                    b'm' if len == 3 => MONTHS[dt.month0() as usize][..3].to_string(),
                    b'm' if len == 4 => MONTHS[dt.month0() as usize].to_string(),
                    b'm' => MONTHS[dt.month0() as usize][..1].to_string(),
                    b'd' if len <= 2 => pad(dt.day(), len),
                    b'd' if len == 3 => {
                        WEEKDAYS[dt.weekday().num_days_from_monday() as usize][..3].to_string()
                    }
                    b'd' => WEEKDAYS[dt.weekday().num_days_from_monday() as usize].to_string(),
                    b'h' => pad(hour, len),
                    b's' => pad(dt.second(), len),
                    _ => String::new(),
                };
                out.push_str(&text);
            }
            Token::Exponent(_) | Token::General => {}
        }
    }
    out
}

fn pad(value: u32, width: usize) -> String {
    if width >= 2 {
        format!("{:02}", value)
    } else {
        value.to_string()
    }
}

fn render_numeric(tokens: &[Token], value: f64, signed: bool) -> String {
    let percents = tokens.iter().filter(|t| matches!(t, Token::Percent)).count();
    let exponent_at = tokens.iter().position(|t| matches!(t, Token::Exponent(_)));
    let point_at = tokens.iter().position(|t| matches!(t, Token::Point));
    let mantissa_end = exponent_at.unwrap_or(tokens.len());
    let int_end = point_at.unwrap_or(mantissa_end).min(mantissa_end);

    let int_digits: Vec<char> = digits_in(&tokens[..int_end]);
    let frac_digits: Vec<char> = match point_at {
        Some(p) if p < mantissa_end => digits_in(&tokens[p + 1..mantissa_end]),
        _ => Vec::new(),
    };
    let last_int_digit = tokens[..int_end]
        .iter()
        .rposition(|t| matches!(t, Token::Digit(_)));
    let grouping = tokens[..int_end].iter().enumerate().any(|(i, t)| {
        matches!(t, Token::Comma) && last_int_digit.map_or(false, |last| i < last)
    });
    let scaling = match last_int_digit {
        Some(last) => tokens[last + 1..int_end]
            .iter()
            .filter(|t| matches!(t, Token::Comma))
            .count(),
        None => 0,
    };

    let mut magnitude = value.abs() * 100f64.powi(percents as i32) / 1000f64.powi(scaling as i32);
    let decimals = frac_digits.len();
    let min_decimals = frac_digits.iter().filter(|&&d| d == '0').count();
    let min_int = int_digits.iter().filter(|&&d| d == '0').count();

    let mut exponent_text = String::new();
    if let Some(at) = exponent_at {
        let exp_width = digits_in(&tokens[at + 1..]).len().max(1);
        let mut exponent = if magnitude == 0.0 {
            0
        } else {
            magnitude.log10().floor() as i32
        };
        magnitude /= 10f64.powi(exponent);
        if format!("{:.*}", decimals, magnitude).starts_with("10") {
            magnitude /= 10.0;
            exponent += 1;
        }
        let always_sign = matches!(tokens[at], Token::Exponent(true));
        let sign = match (exponent < 0, always_sign) {
            (true, _) => "-",
            (false, true) => "+",
            (false, false) => "",
        };
        exponent_text = format!("E{}{:0width$}", sign, exponent.abs(), width = exp_width);
    }

    let rounded = format!("{:.*}", decimals, magnitude);
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((&rounded, ""));
    let mut frac_part = frac_part.to_string();
    while frac_part.len() > min_decimals && frac_part.ends_with('0') {
        frac_part.pop();
    }
    let mut int_part = int_part.trim_start_matches('0').to_string();
    while int_part.len() < min_int {
        int_part.insert(0, '0');
    }
    if grouping {
        int_part = group_thousands(&int_part);
    }

    let nonzero = int_part.chars().any(|c| c.is_ascii_digit() && c != '0')
        || frac_part.chars().any(|c| c != '0');
    let negative = signed && value < 0.0 && nonzero;
    let mut number = String::new();
    if negative {
        number.push('-');
    }
    number.push_str(&int_part);
    if decimals > 0 && (!frac_part.is_empty() || point_at.is_some()) {
        number.push('.');
        number.push_str(&frac_part);
    }
    number.push_str(&exponent_text);

    let mut out = String::new();
    let mut placed = false;
    for token in tokens {
        match token {
            Token::Literal(l) => out.push_str(l),
            Token::Percent => out.push('%'),
            Token::Digit(_) if !placed => {
                out.push_str(&number);
                placed = true;
            }
            _ => {}
        }
    }
    out
}

fn digits_in(tokens: &[Token]) -> Vec<char> {
    tokens
        .iter()
        .filter_map(|t| match t {
            Token::Digit(d) => Some(*d),
            _ => None,
        })
        .collect()
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
