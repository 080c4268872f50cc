use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{NaiveTime, Weekday};
use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::error::AppError;
use crate::models::{DraftEntry, FinalizedSchedule};

static TIME_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,2}):?(\d{2})\s*-\s*(\d{1,2}):?(\d{2})\s*([A-Za-z]*)")
        .expect("valid time range regex")
});

/// "MWF" -> ["Monday", "Wednesday", "Friday"]. Unknown letters pass through.
pub fn expand_days(days: &str) -> Vec<String> {
    days.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match day_letter(c) {
            Some(day) => day_name(day).to_string(),
            None => c.to_string(),
        })
        .collect()
}

fn day_letter(c: char) -> Option<Weekday> {
    match c.to_ascii_uppercase() {
        'M' => Some(Weekday::Mon),
        'T' => Some(Weekday::Tue),
        'W' => Some(Weekday::Wed),
        'R' => Some(Weekday::Thu),
        'F' => Some(Weekday::Fri),
        _ => None,
    }
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// A weekly recurring event derived from one confirmed schedule row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedEvent {
    pub summary: String,
    pub weekdays: Vec<Weekday>,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
    pub location: String,
}

pub fn plan_events(schedule: &FinalizedSchedule) -> Vec<PlannedEvent> {
    schedule.entries.iter().map(plan_event).collect()
}

fn plan_event(entry: &DraftEntry) -> PlannedEvent {
    let (start, end, time_days) = match TIME_RANGE.captures(&entry.time) {
        Some(caps) => (
            naive_time(&caps[1], &caps[2]),
            naive_time(&caps[3], &caps[4]),
            caps[5].to_string(),
        ),
        None => (None, None, String::new()),
    };

    let days = if entry.days.trim().is_empty() {
        time_days
    } else {
        entry.days.clone()
    };

    PlannedEvent {
        summary: format!("{} {}", entry.course.trim(), entry.title.trim()),
        weekdays: days.chars().filter_map(day_letter).collect(),
        start,
        end,
        location: entry.location.trim().to_string(),
    }
}

fn naive_time(hour: &str, minute: &str) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour.parse().ok()?, minute.parse().ok()?, 0)
}

#[async_trait]
pub trait CalendarSink: Send + Sync {
    async fn create_events(&self, events: &[PlannedEvent]) -> Result<usize, AppError>;
}

/// Stands in for a real calendar backend; only logs what would be created.
pub struct LoggingCalendarSink;

#[async_trait]
impl CalendarSink for LoggingCalendarSink {
    async fn create_events(&self, events: &[PlannedEvent]) -> Result<usize, AppError> {
        for event in events {
            info!(
                "Creating calendar event: {} on {:?} {:?}-{:?} at {}",
                event.summary, event.weekdays, event.start, event.end, event.location
            );
        }
        Ok(events.len())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub created: usize,
    pub events: Vec<PlannedEvent>,
}

/// An empty schedule is a no-op and never reaches the sink.
pub async fn export(
    schedule: &FinalizedSchedule,
    sink: &dyn CalendarSink,
) -> Result<ExportSummary, AppError> {
    if schedule.is_empty() {
        info!("Finalized schedule is empty; no calendar events to create");
        return Ok(ExportSummary {
            created: 0,
            events: Vec::new(),
        });
    }

    let events = plan_events(schedule);
    let created = sink.create_events(&events).await?;
    Ok(ExportSummary { created, events })
}
