//! Plain-text rendering of club records.

use chrono::NaiveDate;

use courtside_core::models::{CompletedEvent, EventResult, Registration, UpcomingEvent};
use courtside_core::utils::{format_date, truncate_string};

const NAME_WIDTH: usize = 40;

pub fn upcoming_event(event: &UpcomingEvent, today: NaiveDate) -> String {
    let mut lines = vec![
        format!("[{}] {}", event.id, event.event_name),
        format!("  When:   {}", event.date_range_display()),
    ];
    if let Some(time) = event.event_time_display() {
        lines.push(format!("  Time:   {}", time));
    }
    lines.push(format!("  Where:  {}", event.event_place));
    if let Some(fee) = &event.entry_fee {
        lines.push(format!("  Fee:    {}", fee));
    }
    if let Some(age) = event.age_limit.as_deref().filter(|a| !a.trim().is_empty()) {
        lines.push(format!("  Ages:   {}", age));
    }

    let schedule = event.category_schedule();
    if !schedule.is_empty() {
        lines.push("  Categories:".to_string());
        for (name, time) in schedule {
            match time {
                Some(time) => lines.push(format!("    - {} ({})", name, time)),
                None => lines.push(format!("    - {}", name)),
            }
        }
    }

    lines.push(format!(
        "  {} ({})",
        event.registration_status(today),
        event.registration_window_display()
    ));
    lines.join("\n")
}

pub fn upcoming_events(events: &[UpcomingEvent], today: NaiveDate) -> String {
    if events.is_empty() {
        return "No upcoming tournaments.".to_string();
    }
    events
        .iter()
        .map(|e| upcoming_event(e, today))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn completed_events(events: &[CompletedEvent]) -> String {
    if events.is_empty() {
        return "No completed tournaments.".to_string();
    }
    events
        .iter()
        .map(|e| {
            format!(
                "{:>4}  {:<width$}  {}",
                e.id,
                truncate_string(&e.event_name, NAME_WIDTH),
                e.formatted_date(),
                width = NAME_WIDTH
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn event_result(result: &EventResult) -> String {
    let mut lines = vec![
        format!("{} ({})", result.event_name, format_date(&result.event_date)),
        format!("  Winner: {}", result.winner),
    ];
    for image in result.ordered_images() {
        lines.push(format!("  - {}", image.image));
    }
    lines.join("\n")
}

pub fn event_results(results: &[EventResult]) -> String {
    if results.is_empty() {
        return "No results published yet.".to_string();
    }
    results
        .iter()
        .map(event_result)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// A completed event with the results posted for it.
pub fn event_detail(event: &CompletedEvent, results: &[&EventResult]) -> String {
    let mut out = format!("{}\n  Conducted: {}", event.event_name, event.formatted_date());
    if let Some(poster) = &event.poster {
        out.push_str(&format!("\n  Poster:    {}", poster));
    }
    if results.is_empty() {
        out.push_str("\n\nNo results published yet.");
    }
    for result in results {
        out.push_str("\n\n");
        out.push_str(&event_result(result));
    }
    out
}

pub fn registrations(registrations: &[Registration]) -> String {
    if registrations.is_empty() {
        return "No registrations.".to_string();
    }
    let mut lines = vec![format!(
        "{:>4}  {:<24}  {:<8}  {:<10}  {:<14}  {}",
        "ID", "NAME", "GENDER", "LEVEL", "PHONE", "EMAIL"
    )];
    for r in registrations {
        let doc = if r.document_exists == Some(false) {
            "  (document missing)"
        } else {
            ""
        };
        lines.push(format!(
            "{:>4}  {:<24}  {:<8}  {:<10}  {:<14}  {}{}",
            r.id,
            truncate_string(&r.name, 24),
            r.gender,
            r.level,
            r.phone_no,
            r.email,
            doc
        ));
    }
    lines.push(format!("\n{} registration(s)", registrations.len()));
    lines.join("\n")
}
