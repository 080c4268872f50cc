use chrono::Utc;

use crate::models::{DraftEntry, FinalizedSchedule, Suggestion};
use crate::recognition::RecognitionResult;

/// Editable rows for a recognition result: one per suggestion, or a single
/// blank row to start manual entry from.
pub fn draft_entries(result: &RecognitionResult) -> Vec<DraftEntry> {
    if result.suggestions.is_empty() {
        return vec![DraftEntry::blank()];
    }

    result.suggestions.iter().map(from_suggestion).collect()
}

fn from_suggestion(suggestion: &Suggestion) -> DraftEntry {
    DraftEntry {
        course: suggestion.course.clone().unwrap_or_default(),
        title: suggestion.title.clone().unwrap_or_default(),
        days: suggestion.days.clone().unwrap_or_default(),
        time: suggestion.time.clone().unwrap_or_default(),
        location: suggestion.location.clone().unwrap_or_default(),
    }
}

/// Keeps the rows that have both a course and a title, in order and untouched.
pub fn save(entries: &[DraftEntry]) -> Vec<DraftEntry> {
    entries
        .iter()
        .filter(|entry| entry.is_complete())
        .cloned()
        .collect()
}

pub fn finalize(entries: &[DraftEntry]) -> FinalizedSchedule {
    FinalizedSchedule {
        entries: save(entries),
        confirmed_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(course: &str, title: &str) -> DraftEntry {
        DraftEntry {
            course: course.to_string(),
            title: title.to_string(),
            ..DraftEntry::default()
        }
    }

    #[test]
    fn test_no_suggestions_gives_one_blank_row() {
        let rows = draft_entries(&RecognitionResult::default());
        assert_eq!(rows, vec![DraftEntry::blank()]);
    }

    #[test]
    fn test_suggestions_map_in_order_with_defaults() {
        let result = RecognitionResult {
            text: "raw".to_string(),
            structured: Vec::new(),
            suggestions: vec![
                Suggestion {
                    course: Some("CSE 143".to_string()),
                    title: Some("Computer Programming II".to_string()),
                    days: Some("MWF".to_string()),
                    time: None,
                    location: Some("KNE 120".to_string()),
                },
                Suggestion {
                    title: Some("Calculus".to_string()),
                    ..Suggestion::default()
                },
            ],
        };

        let rows = draft_entries(&result);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].course, "CSE 143");
        assert_eq!(rows[0].days, "MWF");
        assert_eq!(rows[0].time, "");
        assert_eq!(rows[0].location, "KNE 120");
        assert_eq!(rows[1].course, "");
        assert_eq!(rows[1].title, "Calculus");
    }

    #[test]
    fn test_save_keeps_only_complete_rows() {
        let first = DraftEntry {
            days: "MWF".to_string(),
            ..entry("CSE 143", "Data Structures")
        };
        let saved = save(&[first.clone(), entry("", "X"), entry("Y", "")]);
        assert_eq!(saved, vec![first]);
    }

    #[test]
    fn test_save_does_not_trim_kept_rows() {
        let padded = entry(" CSE 143 ", "Data Structures ");
        assert_eq!(save(&[padded.clone()]), vec![padded]);
    }

    #[test]
    fn test_finalize_empty_schedule() {
        let schedule = finalize(&[entry("  ", "  ")]);
        assert!(schedule.is_empty());
    }
}
