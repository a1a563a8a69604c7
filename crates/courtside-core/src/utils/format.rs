use chrono::{DateTime, NaiveDate, NaiveTime};

/// Parse a backend date: either `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    if let Ok(d) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return Some(d);
    }
    DateTime::parse_from_rfc3339(date).ok().map(|dt| dt.date_naive())
}

/// Format a date for listings: "06 Jan 2026".
/// Unparseable input is returned unchanged.
pub fn format_date(date: &str) -> String {
    if date.trim().is_empty() {
        return String::new();
    }
    match parse_date(date) {
        Some(d) => d.format("%d %b %Y").to_string(),
        None => date.to_string(),
    }
}

/// Convert a 24-hour "HH:MM" (or "HH:MM:SS") time to "6:30 PM".
pub fn format_time_12h(time: &str) -> String {
    let trimmed = time.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let parsed = NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"));
    match parsed {
        Ok(t) => {
            let formatted = t.format("%I:%M %p").to_string();
            formatted.trim_start_matches('0').to_string()
        }
        Err(_) => time.to_string(),
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
