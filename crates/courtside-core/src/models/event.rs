use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::{format_date, format_time_12h, parse_date};

/// Event ids arrive as numbers from the API but as strings from some admin forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventId::Number(n) => write!(f, "{}", n),
            EventId::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryFee {
    Amount(f64),
    Text(String),
}

impl std::fmt::Display for EntryFee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryFee::Amount(a) if a.fract() == 0.0 => write!(f, "₹{}", *a as i64),
            EntryFee::Amount(a) => write!(f, "₹{:.2}", a),
            EntryFee::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationStatus {
    NotYetOpen(NaiveDate),
    Open,
    Closed(NaiveDate),
}

impl RegistrationStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, RegistrationStatus::Open)
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationStatus::NotYetOpen(d) => {
                write!(f, "Registration opens on {}", d.format("%d %b %Y"))
            }
            RegistrationStatus::Open => write!(f, "Registration open"),
            RegistrationStatus::Closed(d) => {
                write!(f, "Registration closed on {}", d.format("%d %b %Y"))
            }
        }
    }
}

/// A tournament listed on the upcoming page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingEvent {
    pub id: EventId,
    pub event_name: String,
    pub registration_from: String,
    pub registration_to: String,
    #[serde(default)]
    pub registration_deadline_time: Option<String>,
    pub event_from: String,
    #[serde(default)]
    pub event_to: Option<String>,
    #[serde(default)]
    pub event_time: Option<String>,
    pub event_place: String,
    #[serde(default)]
    pub age_limit: Option<String>,
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(default)]
    pub category_times: Option<String>,
    #[serde(default)]
    pub entry_fee: Option<EntryFee>,
    #[serde(default)]
    pub winner_prize: Option<String>,
    #[serde(default)]
    pub runner_prize: Option<String>,
    #[serde(default)]
    pub semifinalist_prize: Option<String>,
    #[serde(default)]
    pub other_awards: Option<String>,
    #[serde(default)]
    pub rules: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl UpcomingEvent {
    /// Registration state on `today`. The closing day itself is still open.
    pub fn registration_status(&self, today: NaiveDate) -> RegistrationStatus {
        if let Some(from) = parse_date(&self.registration_from) {
            if today < from {
                return RegistrationStatus::NotYetOpen(from);
            }
        }
        if let Some(to) = parse_date(&self.registration_to) {
            if today > to {
                return RegistrationStatus::Closed(to);
            }
        }
        RegistrationStatus::Open
    }

    /// Category names from the free-form `categories` field, without start times.
    pub fn category_names(&self) -> Vec<String> {
        self.categories
            .as_deref()
            .map(|c| split_lines(c).map(strip_times).filter(|c| !c.is_empty()).collect())
            .unwrap_or_default()
    }

    /// Category names paired with the start time written next to them, if any.
    pub fn category_schedule(&self) -> Vec<(String, Option<String>)> {
        self.categories
            .as_deref()
            .map(|c| {
                split_lines(c)
                    .filter_map(|line| {
                        let name = strip_times(line);
                        (!name.is_empty()).then(|| (name, find_time(line)))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Individual rules from the comma/newline separated `rules` field.
    pub fn rule_list(&self) -> Vec<String> {
        self.rules
            .as_deref()
            .map(|r| split_lines(r).map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn date_range_display(&self) -> String {
        range_display(&self.event_from, self.event_to.as_deref())
    }

    pub fn registration_window_display(&self) -> String {
        range_display(&self.registration_from, Some(&self.registration_to))
    }

    pub fn event_time_display(&self) -> Option<String> {
        self.event_time.as_deref().map(format_time_12h)
    }
}

/// A finished tournament shown on the completed page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedEvent {
    pub id: i64,
    pub event_name: String,
    pub event_conducted_date: String,
    #[serde(default)]
    pub poster: Option<String>,
    pub created_at: String,
}

impl CompletedEvent {
    /// Results recorded for this event, matched by name ignoring case and padding.
    pub fn matching_results<'a>(&self, results: &'a [EventResult]) -> Vec<&'a EventResult> {
        let name = normalize_name(&self.event_name);
        results
            .iter()
            .filter(|r| normalize_name(&r.event_name) == name)
            .collect()
    }

    pub fn formatted_date(&self) -> String {
        format_date(&self.event_conducted_date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultImage {
    pub id: i64,
    pub image: String,
    pub image_order: i64,
}

/// Winner and gallery photos uploaded after a tournament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResult {
    pub id: i64,
    pub event_name: String,
    pub event_date: String,
    pub winner: String,
    #[serde(default)]
    pub images: Vec<ResultImage>,
    pub created_at: String,
}

impl EventResult {
    pub fn ordered_images(&self) -> Vec<&ResultImage> {
        let mut images: Vec<&ResultImage> = self.images.iter().collect();
        images.sort_by_key(|i| i.image_order);
        images
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn range_display(from: &str, to: Option<&str>) -> String {
    match to {
        Some(to) if !to.trim().is_empty() && to != from => {
            format!("{} - {}", format_date(from), format_date(to))
        }
        _ => format_date(from),
    }
}

fn split_lines(s: &str) -> impl Iterator<Item = &str> {
    s.split([',', '\n']).map(str::trim).filter(|l| !l.is_empty())
}

fn is_meridiem(word: &str) -> bool {
    word.eq_ignore_ascii_case("am") || word.eq_ignore_ascii_case("pm")
}

/// Split "10:30AM" into ("10:30", Some("AM")). Trailing punctuation is dropped.
fn split_meridiem(word: &str) -> (&str, Option<&str>) {
    let word = word.trim_end_matches(|c: char| !c.is_ascii_alphanumeric());
    match word.len().checked_sub(2).and_then(|at| word.get(at..).map(|m| (at, m))) {
        Some((at, m)) if at > 0 && is_meridiem(m) => (&word[..at], Some(m)),
        _ => (word, None),
    }
}

/// `H:MM` or `HH:MM`, optionally glued to AM/PM and trailing punctuation.
fn is_time(word: &str) -> bool {
    let (word, _) = split_meridiem(word);
    match word.split_once(':') {
        Some((h, m)) => {
            (1..=2).contains(&h.len())
                && m.len() == 2
                && h.chars().all(|c| c.is_ascii_digit())
                && m.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Split a word like "Singles:10:30" into its label when the rest is a time.
fn label_before_time(word: &str) -> Option<&str> {
    let (label, rest) = word.split_once(':')?;
    is_time(rest).then_some(label)
}

/// Remove start times and "starts at" phrases from a category line.
fn strip_times(line: &str) -> String {
    let words: Vec<&str> = line.split_whitespace().collect();
    let mut kept: Vec<String> = Vec::new();
    let mut i = 0;
    while i < words.len() {
        let word = words[i];
        let next = words.get(i + 1).copied();
        if word.eq_ignore_ascii_case("starts") && next.is_some_and(|n| n.eq_ignore_ascii_case("at")) {
            i += 2;
            continue;
        }
        if is_time(word) {
            i += 1;
            if words.get(i).is_some_and(|w| is_meridiem(w)) {
                i += 1;
            }
            continue;
        }
        if let Some(label) = label_before_time(word) {
            kept.push(label.to_string());
        } else if word.ends_with(':') && next.is_some_and(is_time) {
            kept.push(word.trim_end_matches(':').to_string());
        } else {
            kept.push(word.to_string());
        }
        i += 1;
    }
    kept.join(" ").trim().to_string()
}

/// First start time written in a category line, as "6:30 PM".
fn find_time(line: &str) -> Option<String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    for (i, word) in words.iter().enumerate() {
        let candidate = if is_time(word) {
            *word
        } else if let Some((_, rest)) = word.split_once(':').filter(|(_, r)| is_time(r)) {
            rest
        } else {
            continue;
        };
        let (digits, glued) = split_meridiem(candidate);
        let meridiem = glued.or_else(|| words.get(i + 1).copied().filter(|w| is_meridiem(w)));
        return Some(match meridiem {
            Some(m) => format!("{} {}", digits.trim_start_matches('0'), m.to_uppercase()),
            None => format_time_12h(digits),
        });
    }
    None
}
