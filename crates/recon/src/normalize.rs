//! Scalar coercion: currency strings, free-text numbers and dates.
//!
//! Every function here is total. Malformed input degrades to `0.0` or `None`.

use chrono::{Datelike, NaiveDate};

use crate::model::RawValue;

/// Parse a money-like value such as `"₹1,650"` into `1650.0`.
///
/// Every character outside `[0-9.-]` is stripped before parsing.
pub fn to_money(value: &RawValue) -> f64 {
    match value {
        RawValue::Empty => 0.0,
        RawValue::Number(n) => finite_or_zero(*n),
        RawValue::Text(s) => {
            let stripped: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            if stripped.is_empty() {
                return 0.0;
            }
            stripped.parse::<f64>().map(finite_or_zero).unwrap_or(0.0)
        }
    }
}

/// Direct float conversion. Anything that is not a plain number is `0.0`.
pub fn to_number(value: &RawValue) -> f64 {
    match value {
        RawValue::Empty => 0.0,
        RawValue::Number(n) => finite_or_zero(*n),
        RawValue::Text(s) => s.trim().parse::<f64>().map(finite_or_zero).unwrap_or(0.0),
    }
}

/// Best-effort calendar date, preferring day-first for ambiguous input.
pub fn to_date(value: &RawValue) -> Option<NaiveDate> {
    if value.is_blank() {
        return None;
    }
    parse_date_text(&value.as_trimmed())
}

fn finite_or_zero(n: f64) -> f64 {
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

// Day-first formats come before month-first so `05/01/2026` is 5 January.
const DATE_FORMATS: &[&str] = &[
    "%d %B %Y",
    "%d-%B-%Y",
    "%d %B, %Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%B %d %Y",
    "%B %d, %Y",
    "%d %B %y",
    "%d-%B-%y",
    "%d/%m/%y",
    "%d-%m-%y",
    "%d.%m.%y",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m/%d/%y",
];

const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let cleaned = clean_date_text(raw);
    if cleaned.is_empty() {
        return None;
    }
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(&cleaned, fmt)
            .ok()
            .filter(|d| (1000..=9999).contains(&d.year()))
    })
}

/// Drop time-of-day, weekday prefixes and ordinal suffixes.
fn clean_date_text(raw: &str) -> String {
    let s = raw.trim();
    // ISO datetime: 2026-01-05T10:30:00Z
    let s = match s.find('T') {
        Some(i) if i >= 8 && s[..i].chars().all(|c| c.is_ascii_digit() || c == '-' || c == '/') => {
            &s[..i]
        }
        _ => s,
    };

    let mut tokens: Vec<String> = s
        .split_whitespace()
        .take_while(|t| !t.contains(':'))
        .map(strip_ordinal)
        .collect();

    if let Some(first) = tokens.first() {
        let word = first.trim_end_matches([',', '.']).to_ascii_lowercase();
        if word.len() >= 3
            && word.chars().all(|c| c.is_ascii_alphabetic())
            && WEEKDAYS.iter().any(|w| word.starts_with(w))
        {
            tokens.remove(0);
        }
    }

    tokens
        .into_iter()
        .map(|t| if t.eq_ignore_ascii_case("sept") { "Sep".to_string() } else { t })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `5th` → `5`, `21st,` → `21,`.
fn strip_ordinal(token: &str) -> String {
    let (core, tail) = match token.strip_suffix(',') {
        Some(core) => (core, ","),
        None => (token, ""),
    };
    let lower = core.to_ascii_lowercase();
    for suffix in ["st", "nd", "rd", "th"] {
        if let Some(digits) = lower.strip_suffix(suffix) {
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                return format!("{digits}{tail}");
            }
        }
    }
    token.to_string()
}
