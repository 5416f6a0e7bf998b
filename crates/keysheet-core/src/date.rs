//! Excel date serials
//!
//! Serials count days from the workbook epoch with the time of day as the
//! fraction. The 1900 system keeps Excel's phantom 1900-02-29 (serial 60), so
//! serials below 61 are shifted by one day.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

const SECONDS_PER_DAY: f64 = 86_400.0;

fn epoch_1900() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

fn epoch_1904() -> NaiveDate {
    NaiveDate::from_ymd_opt(1904, 1, 1).unwrap_or_default()
}

/// Serial for a calendar date
pub fn date_to_serial(date: NaiveDate, date_1904: bool) -> f64 {
    if date_1904 {
        return (date - epoch_1904()).num_days() as f64;
    }
    let days = (date - epoch_1900()).num_days();
    if days < 61 {
        (days - 1) as f64
    } else {
        days as f64
    }
}

/// Serial for a date and time
pub fn datetime_to_serial(datetime: NaiveDateTime, date_1904: bool) -> f64 {
    let seconds = datetime.time().num_seconds_from_midnight();
    date_to_serial(datetime.date(), date_1904) + seconds as f64 / SECONDS_PER_DAY
}

/// Date and time for a serial, rounded to the second.
///
/// Returns `None` for negative, non-finite or out-of-calendar serials.
pub fn serial_to_datetime(serial: f64, date_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial > 2_958_465.0 {
        return None;
    }
    let mut days = serial.trunc() as i64;
    let mut seconds = (serial.fract() * SECONDS_PER_DAY).round() as i64;
    if seconds >= SECONDS_PER_DAY as i64 {
        days += 1;
        seconds -= SECONDS_PER_DAY as i64;
    }

    let date = if date_1904 {
        epoch_1904() + Duration::days(days)
    } else if days < 61 {
        epoch_1900() + Duration::days(days + 1)
    } else {
        epoch_1900() + Duration::days(days)
    };
    Some(date.and_hms_opt(0, 0, 0)? + Duration::seconds(seconds))
}
