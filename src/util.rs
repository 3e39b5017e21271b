// Utility helpers for parsing and formatting sheet cells.
//
// Spreadsheet exports are loosely typed: every cell arrives as text and the
// same column can hold `24/10/2025`, `2025-10-24` or a full timestamp. This
// module centralizes that handling so the pipeline stages can assume clean
// keys and numbers.
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use log::warn;
use num_format::{Locale, ToFormattedString};
use once_cell::sync::Lazy;
use std::collections::HashMap;

static SHIFT_CODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("morning", "T1"),
        ("manha", "T1"),
        ("afternoon", "T2"),
        ("tarde", "T2"),
        ("night", "T3"),
        ("noite", "T3"),
    ])
});

const FALLBACK_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Map a domain shift label (`morning`, `afternoon`, `night`, or the
/// Portuguese `manha`, `tarde`, `noite`) to the sheet code `T1`..`T3`.
///
/// Unknown labels pass through trimmed and uppercased, so a caller that
/// already holds `t2` gets `T2`.
pub fn shift_code(label: &str) -> String {
    let key = label.trim().to_lowercase();
    match SHIFT_CODES.get(key.as_str()) {
        Some(code) => code.to_string(),
        None => label.trim().to_uppercase(),
    }
}

/// `true` when `s` has exactly the shape of `pattern`, where `d` stands for
/// an ASCII digit and every other pattern byte must match literally.
fn has_shape(s: &str, pattern: &str) -> bool {
    s.len() == pattern.len()
        && s
            .bytes()
            .zip(pattern.bytes())
            .all(|(c, p)| if p == b'd' { c.is_ascii_digit() } else { c == p })
}

fn parse_loose_date(s: &str) -> Option<NaiveDate> {
    // Timestamps carrying an offset are read in the local timezone so a
    // late-evening UTC value does not land on the next calendar day.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Local).date_naive());
    }
    FALLBACK_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            FALLBACK_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Normalize a sheet or request date into the sheet display form
/// `DD/MM/YYYY`, returning `None` when the text cannot be interpreted.
///
/// Empty input normalizes to the empty string.
pub fn try_normalize_date(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return Some(String::new());
    }
    if has_shape(s, "dd/dd/dddd") {
        return Some(s.to_string());
    }
    if s.len() >= 10 && s.is_char_boundary(10) && has_shape(&s[..10], "dddd-dd-dd") {
        let (year, month, day) = (&s[0..4], &s[5..7], &s[8..10]);
        return Some(format!("{}/{}/{}", day, month, year));
    }
    if has_shape(s, "dd-dd-dddd") {
        return Some(s.replace('-', "/"));
    }
    parse_loose_date(s).map(|d| d.format("%d/%m/%Y").to_string())
}

/// Like [`try_normalize_date`], but falls back to the trimmed input and logs
/// a warning instead of failing.
pub fn normalize_date(raw: &str) -> String {
    match try_normalize_date(raw) {
        Some(d) => d,
        None => {
            warn!("could not normalize date '{}'", raw.trim());
            raw.trim().to_string()
        }
    }
}

/// Leading-integer parse of a cell: optional sign, then digits up to the
/// first non-digit. Empty or non-numeric text is 0, never an error. Digit
/// runs too long for `i64` saturate.
pub fn parse_int_cell(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return 0;
    }
    let value: i64 = digits[..end].parse().unwrap_or(i64::MAX);
    if negative {
        -value
    } else {
        value
    }
}

/// Parse the longest numeric prefix of `s` (sign, digits, one decimal point).
fn leading_float(s: &str) -> Option<f64> {
    let s = s.trim();
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;
    for (i, c) in s.char_indices() {
        match c {
            '-' | '+' if i == 0 => {}
            '.' if !seen_dot => seen_dot = true,
            c if c.is_ascii_digit() => seen_digit = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    s[..end].trim_end_matches('.').parse::<f64>().ok()
}

/// Parse a pt-BR formatted number (`1.234,5` → `1234.5`).
pub fn parse_locale_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let cleaned = s.replace('.', "").replace(',', ".");
    leading_float(&cleaned)
}

/// Parse a decimal cell that may use `,` as the decimal mark (`125,4`).
pub fn parse_decimal_cell(s: &str) -> Option<f64> {
    leading_float(&s.trim().replace(',', "."))
}

/// Parse a percentage cell. `%` and `,` decimal marks are accepted; values
/// strictly between 0 and 1 are fractions and get scaled to percent.
pub fn parse_percent_cell(s: &str) -> Option<f64> {
    let value = parse_decimal_cell(&s.replace('%', ""))?;
    if value > 0.0 && value < 1.0 {
        Some(value * 100.0)
    } else {
        Some(value)
    }
}

/// Round to `places` decimals on the exact binary value of `x`, halves away
/// from zero. `0.35` is stored just below the half and rounds to `0.3`,
/// matching `toFixed` in the sheets' scripting layer.
fn round_fixed(x: f64, places: usize) -> f64 {
    if !x.is_finite() || x.abs() >= 1e15 {
        return x;
    }
    // Enough digits to print the binary value exactly.
    let exact = format!("{:.*}", places + 64, x.abs());
    let (int_part, frac) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let kept = frac.get(..places).unwrap_or("");
    let mut scaled: u64 = format!("{}{}", int_part, kept).parse().unwrap_or(0);
    if frac.as_bytes().get(places).map_or(false, |d| *d >= b'5') {
        scaled += 1;
    }
    let rounded = scaled as f64 / 10f64.powi(places as i32);
    if x < 0.0 {
        -rounded
    } else {
        rounded
    }
}

pub fn round1(x: f64) -> f64 {
    round_fixed(x, 1)
}

pub fn round2(x: f64) -> f64 {
    round_fixed(x, 2)
}

/// Percentage display string, e.g. `format_percent(12.34, 1) == "12.3%"`.
pub fn format_percent(x: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, x)
}

/// Spreadsheet column name for a zero-based index (`0 → A`, `26 → AA`).
pub fn column_letter(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Zero-based index for a spreadsheet column name (`AM → 38`).
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut idx = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let v = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        idx = idx.checked_mul(26)?.checked_add(v)?;
    }
    Some(idx - 1)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (`1,234.5`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
