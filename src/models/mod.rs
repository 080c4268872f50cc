pub mod course;
pub mod draft;

pub use course::CourseRecord;
pub use draft::{DraftEntry, DraftField, FinalizedSchedule, Suggestion};
