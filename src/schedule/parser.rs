use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::models::CourseRecord;

/// Anchor line plus the two lines that follow it.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

// e.g. "BUSA 285A"
static COURSE_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([A-Z]{2,4})\s*(\d{3}[A-Z]*)").expect("valid course anchor regex")
});
// e.g. "10:00-11:30 TR"
static MEETING_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,2}:?\d{2})\s*-\s*(\d{1,2}:?\d{2})\s*([MTWRF]+)")
        .expect("valid meeting time regex")
});
// e.g. "ROW 205"
static ROOM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)\s+(\d+)").expect("valid room regex"));
// e.g. "M. Lamb"
static INSTRUCTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]\.\s*[A-Z][a-zA-Z]+").expect("valid instructor regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Number of lines, starting at the anchor line, searched for time,
    /// room and instructor. Values below 1 behave like 1.
    pub context_lines: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            context_lines: DEFAULT_CONTEXT_LINES,
        }
    }
}

pub fn parse(text: &str) -> Vec<CourseRecord> {
    parse_with(text, ParserOptions::default())
}

/// Extract course records from recognized schedule text.
///
/// Every line holding a department + course number anchor yields one record,
/// in input order. Secondary fields come from a window made of the anchor
/// line without the anchor itself and the lines following it; the title comes from the
/// anchor line alone. Noisy input degrades to empty fields, never to an error.
pub fn parse_with(text: &str, options: ParserOptions) -> Vec<CourseRecord> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut courses = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let Some(anchor) = COURSE_ANCHOR.captures(line) else {
            continue;
        };
        let (Some(whole), Some(department), Some(number)) = (anchor.get(0), anchor.get(1), anchor.get(2))
        else {
            continue;
        };

        let before = line[..whole.start()].trim();
        let remainder = line[whole.end()..].trim();
        let window = context_window(&lines, index, before, remainder, options.context_lines);

        let mut course = CourseRecord {
            department: department.as_str().to_uppercase(),
            course_number: number.as_str().to_string(),
            ..CourseRecord::default()
        };

        let time_match = MEETING_TIME.captures(&window);
        if let Some(caps) = &time_match {
            let days = caps[3].to_uppercase();
            course.time = format!("{}-{} {}", &caps[1], &caps[2], days);
            course.days = days;
        }

        let room_match = ROOM.captures(&window);
        if let Some(caps) = &room_match {
            course.location = format!("{} {}", &caps[1], &caps[2]);
        }

        if let Some(found) = INSTRUCTOR.find(&window) {
            course.instructor = found.as_str().to_string();
        }

        course.title = extract_title(
            remainder,
            time_match.as_ref().and_then(|c| c.get(0)).map(|m| m.as_str()),
            room_match.as_ref().and_then(|c| c.get(0)).map(|m| m.as_str()),
        );

        if course.is_complete() {
            debug!("line {}: detected {} \"{}\"", index, course.code(), course.title);
            courses.push(course);
        }
    }

    courses
}

/// The anchor line (minus the anchor itself) joined with up to
/// `context_lines - 1` following lines.
fn context_window(
    lines: &[&str],
    anchor_index: usize,
    before: &str,
    remainder: &str,
    context_lines: usize,
) -> String {
    let end = lines.len().min(anchor_index.saturating_add(context_lines.max(1)));
    let following = lines.get(anchor_index + 1..end).unwrap_or_default();

    [before, remainder]
        .into_iter()
        .chain(following.iter().copied())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// Time is cut before room: a room printed after the time is already gone by
// the time the room cut runs.
fn extract_title(remainder: &str, time_text: Option<&str>, room_text: Option<&str>) -> String {
    let mut title = remainder.trim();
    if let Some(time_text) = time_text {
        title = truncate_at(title, time_text);
    }
    if let Some(room_text) = room_text {
        title = truncate_at(title, room_text);
    }
    title.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_at<'a>(text: &'a str, needle: &str) -> &'a str {
    match text.find(needle) {
        Some(pos) => text[..pos].trim(),
        None => text,
    }
}
