use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

/// Position of the first AM/PM marker, case-insensitive.
fn meridiem_position(s: &str) -> Option<usize> {
    let lower = s.to_ascii_lowercase();
    match (lower.find("am"), lower.find("pm")) {
        (Some(a), Some(p)) => Some(a.min(p)),
        (a, p) => a.or(p),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn from_24_hour(s: &str) -> Option<String> {
    let mut parts = s.split(':');
    let hour: u32 = parts.next()?.trim().parse().ok()?;
    let minutes = parts.next()?.trim();
    if hour > 23 || minutes.is_empty() || !minutes.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let period = if hour >= 12 { "PM" } else { "AM" };
    let hour = match hour {
        0 => 12,
        h if h > 12 => h - 12,
        h => h,
    };
    Some(format!("{hour:02}.{minutes} {period}"))
}

fn normalize_annotated(s: &str) -> String {
    let mut chars: Vec<char> = s.replace(':', ".").chars().collect();

    // Zero-pad a lone hour digit ("9.00" but not "19.00").
    let pad_at = (0..chars.len().saturating_sub(1)).find(|&i| {
        chars[i].is_ascii_digit()
            && chars[i + 1] == '.'
            && (i == 0 || !(chars[i - 1].is_alphanumeric() || chars[i - 1] == '_'))
    });
    if let Some(i) = pad_at {
        chars.insert(i, '0');
    }
    let s: String = chars.into_iter().collect();

    match meridiem_position(&s) {
        Some(pos) => {
            let head = s[..pos].trim_end();
            let marker = s[pos..pos + 2].to_ascii_uppercase();
            let tail = &s[pos + 2..];
            let joined = if head.is_empty() {
                format!("{marker}{tail}")
            } else {
                format!("{head} {marker}{tail}")
            };
            collapse_whitespace(&joined)
        }
        None => collapse_whitespace(&s),
    }
}

/// Sheet time format: "21:00" -> "09.00 PM", "9:00 pm" -> "09.00 PM".
pub fn format_sheet_time(time: &str) -> String {
    let s = time.trim();
    if s.is_empty() {
        return String::new();
    }
    if s.contains(':') && meridiem_position(s).is_none() {
        if let Some(formatted) = from_24_hour(s) {
            return formatted;
        }
    }
    normalize_annotated(s)
}

/// Form date (`YYYY-MM-DD`) to the sheet's `MM/DD/YYYY`.
pub fn format_submission_date(date: &str) -> Option<String> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%m/%d/%Y").to_string())
}

fn parse_timestamp(s: &str, offset: &FixedOffset) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(offset).naive_local());
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    // Script-side Date.toString(): "Fri Mar 07 2025 00:00:00 GMT+0530 (India Standard Time)"
    let head = s.split(" (").next().unwrap_or(s);
    if let Ok(dt) = DateTime::parse_from_str(head, "%a %b %d %Y %H:%M:%S GMT%z") {
        return Some(dt.with_timezone(offset).naive_local());
    }
    None
}

/// Calendar date of a sheet cell in the display offset, for filtering.
pub fn parse_sheet_date(value: &str, offset: &FixedOffset) -> Option<NaiveDate> {
    let s = value.trim();
    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    parse_timestamp(s, offset).map(|dt| dt.date())
}

/// Human date ("Mar 7, 2025") for ISO-like values. Short plain strings
/// are assumed to be formatted already.
pub fn format_display_date(value: &str, offset: &FixedOffset) -> String {
    let s = value.trim();
    if s.is_empty() {
        return "-".to_string();
    }
    if s.len() < 15 && !s.contains('T') {
        return s.to_string();
    }
    match parse_timestamp(s, offset) {
        Some(dt) => dt.format("%b %-d, %Y").to_string(),
        None => s.to_string(),
    }
}

/// Dates edited in the dashboard go back as `MM/DD/YYYY` when they look ISO-ish.
pub fn clean_edit_date(value: &str, offset: &FixedOffset) -> String {
    let s = value.trim();
    if !(s.contains('T') || s.contains('-')) {
        return s.to_string();
    }
    if let Some(formatted) = format_submission_date(s) {
        return formatted;
    }
    match parse_timestamp(s, offset) {
        Some(dt) => dt.format("%m/%d/%Y").to_string(),
        None => s.to_string(),
    }
}

/// Last nine digits of a phone number, the key the sheet searches on.
pub fn phone_suffix(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let start = digits.len().saturating_sub(9);
    digits[start..].iter().collect()
}

/// Grouped amount for messages: 8100.0 -> "8,100", 1250.5 -> "1,250.5".
pub fn format_amount(amount: f64) -> String {
    let rounded = (amount * 100.0).round() / 100.0;
    let negative = rounded < 0.0;
    let abs = rounded.abs();
    let whole = abs.trunc() as u64;
    let cents = ((abs - abs.trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let mut out = if negative { format!("-{grouped}") } else { grouped };
    if cents > 0 {
        let frac = format!("{cents:02}");
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }
    out
}
