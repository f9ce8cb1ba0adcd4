use chrono::{Datelike, Duration, NaiveDate, Utc};

use super::sheet::Cell;

/// Tokens that mean "no data" regardless of which tool exported the sheet.
/// Compared case-insensitively after trimming.
const PLACEHOLDER_TOKENS: &[&str] = &["nan", "none", "null", "-", "na", "n/a", "0", "0.0"];

/// Spreadsheet serial date epoch (the 1900 system, day 0 = 1899-12-30).
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
/// Serial for 9999-12-31; anything outside (0, this] is not a date.
const SERIAL_MAX: f64 = 2_958_465.0;

/// Textual date formats, tried in order; first hit wins.
const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%d-%b-%y", "%d/%m/%Y", "%B %d, %Y"];

/// Name suffixes recognised when splitting a combined full-name cell.
const NAME_SUFFIXES: &[&str] = &["JR", "SR", "II", "III", "IV", "V"];

/// Trim a raw string and collapse placeholder tokens to empty.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    let lowered = trimmed.to_lowercase();
    if PLACEHOLDER_TOKENS.contains(&lowered.as_str()) {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Cleaned text of a cell.
pub fn clean(cell: &Cell) -> String {
    clean_str(&cell.render())
}

/// Cleaned text of a cell, `None` when empty.
pub fn opt(cell: &Cell) -> Option<String> {
    let value = clean(cell);
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(serial > 0.0 && serial <= SERIAL_MAX) {
        return None;
    }
    let (y, m, d) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Best-effort date extraction. Priority: native date cells, numeric
/// serials, then the textual formats. Anything unparseable is `None` —
/// a bad date never fails a row.
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(dt) => Some(dt.date()),
        Cell::Number(n) => serial_to_date(*n),
        Cell::Text(_) => {
            let value = clean(cell);
            if value.is_empty() {
                return None;
            }
            for format in DATE_FORMATS {
                if let Ok(date) = NaiveDate::parse_from_str(&value, format) {
                    return Some(date);
                }
            }
            // Sheets exported with raw cell values sometimes leave the
            // serial behind as text.
            if value.chars().all(|c| c.is_ascii_digit()) {
                if let Ok(serial) = value.parse::<f64>() {
                    if serial >= 1000.0 {
                        return serial_to_date(serial);
                    }
                }
            }
            None
        }
        Cell::Empty | Cell::Bool(_) => None,
    }
}

/// Whether a sector cell counts as checked. The usual affirmatives are `\`,
/// `/`, check glyphs, `1`, `yes`/`y`, `true` — but source forms used every
/// marker imaginable, so any value surviving [`clean`] counts (placeholder
/// tokens, including bare `0`, have already been folded to empty).
pub fn is_checked(cell: &Cell) -> bool {
    if let Cell::Bool(b) = cell {
        return *b;
    }
    !clean(cell).is_empty()
}

/// Split `"DELA CRUZ, JUAN A. JR"` into (last, first, middle, ext).
///
/// Everything before the comma is the surname; a recognised suffix is peeled
/// off the tail; a trailing one-letter token (optionally dotted) is taken as
/// the middle initial.
pub fn split_full_name(raw: &str) -> (String, String, String, Option<String>) {
    let cleaned = clean_str(raw);
    if cleaned.is_empty() {
        return (String::new(), String::new(), String::new(), None);
    }

    let (last, rest) = match cleaned.split_once(',') {
        Some((last, rest)) => (last.trim().to_string(), rest.trim().to_string()),
        None => return (cleaned, String::new(), String::new(), None),
    };

    let mut tokens: Vec<&str> = rest.split_whitespace().collect();

    // Suffix first, so "CRUZ, JUAN V" keeps V as an extension, not a middle
    // initial (matching how the paper forms read).
    let mut ext = None;
    if let Some(tail) = tokens.last() {
        let bare = tail.trim_end_matches('.').to_uppercase();
        if NAME_SUFFIXES.contains(&bare.as_str()) {
            ext = Some(bare);
            tokens.pop();
        }
    }

    if tokens.len() > 1 {
        let tail = tokens[tokens.len() - 1];
        let is_initial =
            tail.chars().count() == 1 || (tail.chars().count() == 2 && tail.ends_with('.'));
        if is_initial {
            let middle = tail.trim_end_matches('.').to_string();
            let first = tokens[..tokens.len() - 1].join(" ");
            return (last, first, middle, ext);
        }
    }
    (last, tokens.join(" "), String::new(), ext)
}

/// Estimate a birthdate from a bare age: January 1st of the computed year.
pub fn estimate_birthdate_from_age(age: &str) -> Option<NaiveDate> {
    let age: i32 = clean_str(age).parse().ok()?;
    if !(0..=130).contains(&age) {
        return None;
    }
    let year = Utc::now().year() - age;
    NaiveDate::from_ymd_opt(year, 1, 1)
}
