use std::collections::HashSet;

use calamine::Data;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::models::CellValue;

const DATETIME_FORMATS: [&str; 12] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%b %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 16] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%m-%d-%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%a, %d %b %Y",
    "%A, %B %d, %Y",
];

/// Returns `name` unchanged the first time it is seen, then `name_1`,
/// `name_2`, ... for repeats, skipping suffixes that are already taken.
pub fn unique_header(name: &str, existing_names: &mut HashSet<String>) -> String {
    let mut header = name.to_string();
    let mut counter = 1;
    while !existing_names.insert(header.clone()) {
        header = format!("{}_{}", name, counter);
        counter += 1;
    }
    header
}

/// Permissive calendar date parser. US layouts win over EU ones when both match.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS.iter() {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

pub fn is_date_string(s: &str) -> bool {
    parse_date(s).is_some()
}

/// Converts one calamine cell. Empty cells, empty strings and error cells are absent.
pub fn cell_value(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::DateTime(dt) => Some(match dt.as_datetime() {
            Some(datetime) if !dt.is_duration() => CellValue::DateTime(datetime),
            _ => CellValue::Number(dt.as_f64()),
        }),
        Data::DateTimeIso(s) => Some(match parse_date(s) {
            Some(datetime) => CellValue::DateTime(datetime),
            None => CellValue::Text(s.clone()),
        }),
        Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
    }
}

/// Header text for a header-row cell; non-string cells are rendered as text.
pub fn header_text(cell: &Data) -> Option<String> {
    cell_value(cell).map(|value| value.to_string())
}

/// Resolves a date-like cell for ordering purposes.
pub fn as_datetime(value: &CellValue) -> Option<NaiveDateTime> {
    match value {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::Text(s) => parse_date(s),
        _ => None,
    }
}
