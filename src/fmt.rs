use chrono::DateTime;

/// Format an epoch timestamp with a chrono format string (UTC). Zero or
/// negative means "never" and renders as a dash.
pub fn epoch(secs: i64, format: &str) -> String {
    if secs <= 0 {
        return "-".to_string();
    }
    match DateTime::from_timestamp(secs, 0) {
        Some(dt) => dt.format(format).to_string(),
        None => "-".to_string(),
    }
}

/// Join first and last name the way user lists display them.
pub fn fullname(first: &str, last: &str) -> String {
    let first = first.trim();
    let last = last.trim();
    match (first.is_empty(), last.is_empty()) {
        (true, true) => "-".to_string(),
        (false, true) => first.to_string(),
        (true, false) => last.to_string(),
        (false, false) => format!("{first} {last}"),
    }
}

pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Integer with thousands separators: 1,234,567
pub fn count(val: i64) -> String {
    let digits = val.unsigned_abs().to_string();
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();
    if val < 0 {
        format!("-{with_commas}")
    } else {
        with_commas
    }
}
