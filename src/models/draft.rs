use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// An editable row of the manual schedule table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftEntry {
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub days: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub location: String,
}

impl DraftEntry {
    pub fn blank() -> Self {
        Self::default()
    }

    /// Saved rows need a course code and a title; the other columns may stay empty.
    pub fn is_complete(&self) -> bool {
        !self.course.trim().is_empty() && !self.title.trim().is_empty()
    }

    pub fn set(&mut self, field: DraftField, value: String) {
        match field {
            DraftField::Course => self.course = value,
            DraftField::Title => self.title = value,
            DraftField::Days => self.days = value.to_uppercase(),
            DraftField::Time => self.time = value,
            DraftField::Location => self.location = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    Course,
    Title,
    Days,
    Time,
    Location,
}

/// A course-shaped object proposed by the recognition service.
///
/// Every field is optional. Vision models are loose with JSON types, so
/// numbers and booleans are accepted and rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default, deserialize_with = "lenient_text")]
    pub course: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub days: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub location: Option<String>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// The user-confirmed rows, ready for calendar export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedSchedule {
    pub entries: Vec<DraftEntry>,
    pub confirmed_at: DateTime<Utc>,
}

impl FinalizedSchedule {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_are_uppercased_on_edit() {
        let mut entry = DraftEntry::blank();
        entry.set(DraftField::Days, "mwf".to_string());
        entry.set(DraftField::Title, "Data Structures".to_string());
        assert_eq!(entry.days, "MWF");
        assert_eq!(entry.title, "Data Structures");
    }

    #[test]
    fn test_whitespace_only_fields_are_incomplete() {
        let entry = DraftEntry {
            course: "   ".to_string(),
            title: "Calculus".to_string(),
            ..DraftEntry::default()
        };
        assert!(!entry.is_complete());
    }

    #[test]
    fn test_suggestion_accepts_loose_json_types() {
        let s: Suggestion = serde_json::from_str(
            r#"{"course": "CSE 143", "title": null, "time": 1030, "days": true}"#,
        )
        .expect("suggestion should deserialize");
        assert_eq!(s.course.as_deref(), Some("CSE 143"));
        assert_eq!(s.title, None);
        assert_eq!(s.time.as_deref(), Some("1030"));
        assert_eq!(s.days.as_deref(), Some("true"));
        assert_eq!(s.location, None);
    }
}
