//! Value helpers shared by the validator units: date parsing, age arithmetic
//! and label normalization.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};

use censo_model::RawCell;

/// Day zero of the spreadsheet serial date system (1900 leap-year bug included).
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
/// Largest serial a spreadsheet accepts (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

// Two-digit years first: `%Y` would otherwise read "10" as year 10.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%y", "%d-%m-%y", "%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y", "%Y/%m/%d", "%d.%m.%Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"];

/// Converts a spreadsheet serial day number to a date.
///
/// ```
/// use chrono::NaiveDate;
/// use censo_validate::util::from_serial;
///
/// assert_eq!(from_serial(43831.0), NaiveDate::from_ymd_opt(2020, 1, 1));
/// assert_eq!(from_serial(-3.0), None);
/// ```
pub fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let (year, month, day) = SERIAL_EPOCH;
    NaiveDate::from_ymd_opt(year, month, day)?.checked_add_days(Days::new(serial.trunc() as u64))
}

/// Parses a date cell: spreadsheet serials, day-first text and ISO text.
pub fn parse_date(cell: &RawCell) -> Option<NaiveDate> {
    match cell {
        RawCell::Number(serial) => from_serial(*serial),
        RawCell::Text(text) => parse_date_text(text),
        RawCell::Empty | RawCell::Bool(_) => None,
    }
}

pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text.len() <= 5 && text.chars().all(|c| c.is_ascii_digit()) {
        return text.parse::<f64>().ok().and_then(from_serial);
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|datetime| datetime.date())
        })
}

/// Complete years elapsed from `from` to `to`; negative spans yield `None`.
pub fn whole_years(from: NaiveDate, to: NaiveDate) -> Option<u32> {
    to.years_since(from)
}

/// Elapsed years as a fraction, for prorated legal benefits.
pub fn fractional_years(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64 / 365.25
}

/// Builds a date from a `YYMMDD` fragment.
///
/// `century` is 1900 or 2000 when it is known; otherwise the latest century
/// that does not put the date after `reference` is chosen.
pub fn date_from_yymmdd(
    digits: &str,
    century: Option<i32>,
    reference: NaiveDate,
) -> Option<NaiveDate> {
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let yy: i32 = digits[0..2].parse().ok()?;
    let month: u32 = digits[2..4].parse().ok()?;
    let day: u32 = digits[4..6].parse().ok()?;
    let century = century.unwrap_or(if 2000 + yy > reference.year() { 1900 } else { 2000 });
    NaiveDate::from_ymd_opt(century + yy, month, day)
}

/// Lower-case, accent-folded, punctuation-free form used for label lookups.
pub fn normalize_label(text: &str) -> String {
    censo_map::normalize_text(text)
}

/// First element of `items` that `label` equals or contains as whole words.
pub fn match_label<'a, T: Copy>(label: &str, items: &'a [(&'a str, T)]) -> Option<T> {
    let normalized = normalize_label(label);
    if normalized.is_empty() {
        return None;
    }
    items
        .iter()
        .find(|(key, _)| normalized == *key)
        .or_else(|| {
            items.iter().find(|(key, _)| {
                let padded = format!(" {normalized} ");
                padded.contains(&format!(" {key} "))
            })
        })
        .map(|(_, value)| *value)
}

/// Linear-interpolated quantile of an ascending slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}
