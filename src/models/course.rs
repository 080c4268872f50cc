use serde::{Deserialize, Serialize};

/// A course detected by the schedule text parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub department: String,
    pub course_number: String,
    pub title: String,
    /// Day letters taken from the meeting time suffix ("TR" in "10:00-11:30 TR").
    pub days: String,
    pub time: String,
    pub location: String,
    pub instructor: String,
}

impl CourseRecord {
    /// Parsed rows are kept only when both halves of the course code are present.
    pub fn is_complete(&self) -> bool {
        !self.department.is_empty() && !self.course_number.is_empty()
    }

    pub fn code(&self) -> String {
        format!("{} {}", self.department, self.course_number)
    }
}
