use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{CourseRecord, DraftEntry, DraftField, FinalizedSchedule};
use crate::preview::PreviewHandle;
use crate::recognition::RecognitionResult;
use crate::schedule::{ParserOptions, draft_entries, finalize, parse_with};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    FileSelected,
    Recognizing,
    Reviewing,
    Finalized,
}

/// Last known state of the recognition backend, as seen by one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum Readiness {
    Unknown,
    Ready,
    ServiceUnavailable(String),
    ModelMissing(String),
}

impl Readiness {
    pub fn from_check(check: &Result<(), AppError>) -> Self {
        match check {
            Ok(()) => Readiness::Ready,
            Err(AppError::ModelMissing(msg)) => Readiness::ModelMissing(msg.clone()),
            Err(AppError::ServiceUnavailable(msg)) => Readiness::ServiceUnavailable(msg.clone()),
            Err(e) => Readiness::ServiceUnavailable(e.to_string()),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }

    fn rejection(&self) -> AppError {
        match self {
            Readiness::ModelMissing(msg) => AppError::ModelMissing(msg.clone()),
            Readiness::ServiceUnavailable(msg) => AppError::ServiceUnavailable(msg.clone()),
            Readiness::Unknown | Readiness::Ready => {
                AppError::ServiceUnavailable("OCR not initialized. Please wait...".to_string())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Arc<[u8]>,
}

impl SelectedFile {
    /// Accepts images and PDFs. Empty payloads count as "no file".
    pub fn new(name: &str, content_type: &str, bytes: Vec<u8>) -> Result<Self, AppError> {
        if bytes.is_empty() {
            return Err(AppError::InputRejected("Please select a file first!".to_string()));
        }

        let content_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        if !(content_type.starts_with("image/") || content_type == "application/pdf") {
            return Err(AppError::InputRejected(
                "Please drop an image or PDF file".to_string(),
            ));
        }

        Ok(Self {
            name: name.to_string(),
            content_type,
            bytes: Arc::from(bytes),
        })
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// Ticket for one in-flight recognition call.
#[derive(Debug)]
pub struct RecognitionJob {
    pub session_id: Uuid,
    pub generation: u64,
    pub image: Arc<[u8]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub name: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub id: Uuid,
    pub status: SessionStatus,
    pub file: Option<FileSummary>,
    pub preview_url: Option<String>,
    pub recognizer_ready: bool,
    pub readiness: Readiness,
    pub raw_text: String,
    pub detected: Vec<CourseRecord>,
    pub drafts: Vec<DraftEntry>,
    pub schedule: Option<FinalizedSchedule>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One upload, recognize, review, confirm lifecycle.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    status: SessionStatus,
    file: Option<SelectedFile>,
    preview: Option<PreviewHandle>,
    readiness: Readiness,
    raw_text: String,
    detected: Vec<CourseRecord>,
    drafts: Vec<DraftEntry>,
    schedule: Option<FinalizedSchedule>,
    last_error: Option<String>,
    // bumped on every file selection so late results for an old file are dropped
    generation: u64,
    // where a failed or interrupted recognition call lands
    resume_status: SessionStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: SessionStatus::Idle,
            file: None,
            preview: None,
            readiness: Readiness::Unknown,
            raw_text: String::new(),
            detected: Vec::new(),
            drafts: vec![DraftEntry::blank()],
            schedule: None,
            last_error: None,
            generation: 0,
            resume_status: SessionStatus::FileSelected,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn detected(&self) -> &[CourseRecord] {
        &self.detected
    }

    pub fn drafts(&self) -> &[DraftEntry] {
        &self.drafts
    }

    pub fn schedule(&self) -> Option<&FinalizedSchedule> {
        self.schedule.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_readiness(&mut self, readiness: Readiness) {
        self.readiness = readiness;
        self.touch();
    }

    /// Allowed from every state. Drops the previous preview and any
    /// recognition output or confirmed schedule.
    pub fn select_file(&mut self, file: SelectedFile, preview: Option<PreviewHandle>) {
        info!(
            "session {}: selected {} ({}, {} bytes)",
            self.id,
            file.name,
            file.content_type,
            file.bytes.len()
        );
        self.generation += 1;
        self.file = Some(file);
        self.preview = preview;
        self.reset_review();
        self.last_error = None;
        self.status = SessionStatus::FileSelected;
        self.touch();
    }

    pub fn begin_processing(&mut self) -> Result<RecognitionJob, AppError> {
        let Some(file) = &self.file else {
            return Err(AppError::InputRejected("Please select a file first!".to_string()));
        };
        if self.status == SessionStatus::Recognizing {
            return Err(AppError::Conflict(
                "Schedule is already being processed".to_string(),
            ));
        }
        if !self.readiness.is_ready() {
            return Err(self.readiness.rejection());
        }

        let job = RecognitionJob {
            session_id: self.id,
            generation: self.generation,
            image: file.bytes.clone(),
        };
        self.resume_status = self.status;
        self.status = SessionStatus::Recognizing;
        self.last_error = None;
        self.touch();
        Ok(job)
    }

    pub fn is_current(&self, job: &RecognitionJob) -> bool {
        job.session_id == self.id && self.is_recognizing(job.generation)
    }

    fn is_recognizing(&self, generation: u64) -> bool {
        self.status == SessionStatus::Recognizing && generation == self.generation
    }

    pub fn complete_recognition(
        &mut self,
        job: &RecognitionJob,
        result: RecognitionResult,
        options: ParserOptions,
    ) -> Result<(), AppError> {
        if !self.is_current(job) {
            return Err(AppError::Conflict(
                "A new file was selected while this one was processing".to_string(),
            ));
        }

        self.detected = parse_with(&result.source_text(), options);
        self.drafts = draft_entries(&result);
        self.raw_text = result.text;
        self.schedule = None;
        self.status = SessionStatus::Reviewing;
        info!(
            "session {}: recognized {} draft rows, {} detected courses",
            self.id,
            self.drafts.len(),
            self.detected.len()
        );
        self.touch();
        Ok(())
    }

    /// Returns false when the job no longer belongs to this session's file.
    ///
    /// A first run goes back to `FileSelected` with a fresh seed row. A re-run
    /// from `Reviewing` or `Finalized` goes back there with the drafts intact.
    pub fn fail_recognition(&mut self, job: &RecognitionJob, error: &AppError) -> bool {
        job.session_id == self.id && self.abort_recognition(job.generation, error.to_string())
    }

    /// Same as a failure, for a call whose caller went away before it finished.
    pub fn abandon_recognition(&mut self, generation: u64) -> bool {
        self.abort_recognition(
            generation,
            "Recognition was interrupted before it finished".to_string(),
        )
    }

    fn abort_recognition(&mut self, generation: u64, message: String) -> bool {
        if !self.is_recognizing(generation) {
            return false;
        }
        match self.resume_status {
            SessionStatus::Reviewing | SessionStatus::Finalized => {
                self.status = self.resume_status;
            }
            _ => {
                self.reset_review();
                self.status = SessionStatus::FileSelected;
            }
        }
        self.last_error = Some(message);
        self.touch();
        true
    }

    pub fn add_entry(&mut self) -> Result<usize, AppError> {
        self.require(SessionStatus::Reviewing)?;
        self.drafts.push(DraftEntry::blank());
        self.touch();
        Ok(self.drafts.len() - 1)
    }

    pub fn update_entry(
        &mut self,
        index: usize,
        field: DraftField,
        value: String,
    ) -> Result<&DraftEntry, AppError> {
        self.require(SessionStatus::Reviewing)?;
        let entry = self.drafts.get_mut(index).ok_or(AppError::NotFound)?;
        entry.set(field, value);
        self.updated_at = Utc::now();
        Ok(&self.drafts[index])
    }

    pub fn remove_entry(&mut self, index: usize) -> Result<DraftEntry, AppError> {
        self.require(SessionStatus::Reviewing)?;
        if index >= self.drafts.len() {
            return Err(AppError::NotFound);
        }
        let removed = self.drafts.remove(index);
        self.touch();
        Ok(removed)
    }

    pub fn replace_entries(&mut self, entries: Vec<DraftEntry>) -> Result<(), AppError> {
        self.require(SessionStatus::Reviewing)?;
        self.drafts = entries
            .into_iter()
            .map(|mut entry| {
                entry.days = entry.days.to_uppercase();
                entry
            })
            .collect();
        self.touch();
        Ok(())
    }

    /// Confirms the complete draft rows. An empty result still finalizes.
    pub fn save(&mut self) -> Result<&FinalizedSchedule, AppError> {
        self.require(SessionStatus::Reviewing)?;
        let schedule = finalize(&self.drafts);
        info!(
            "session {}: finalized {} of {} rows",
            self.id,
            schedule.entries.len(),
            self.drafts.len()
        );
        self.status = SessionStatus::Finalized;
        self.touch();
        Ok(self.schedule.insert(schedule))
    }

    pub fn clear_schedule(&mut self) -> Result<(), AppError> {
        self.require(SessionStatus::Finalized)?;
        self.reset_review();
        self.status = SessionStatus::FileSelected;
        self.touch();
        Ok(())
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            status: self.status,
            file: self.file.as_ref().map(|f| FileSummary {
                name: f.name.clone(),
                content_type: f.content_type.clone(),
                size: f.bytes.len(),
            }),
            preview_url: self.preview.as_ref().map(PreviewHandle::url),
            recognizer_ready: self.readiness.is_ready(),
            readiness: self.readiness.clone(),
            raw_text: self.raw_text.clone(),
            detected: self.detected.clone(),
            drafts: self.drafts.clone(),
            schedule: self.schedule.clone(),
            last_error: self.last_error.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn require(&self, expected: SessionStatus) -> Result<(), AppError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(AppError::Conflict(format!(
                "Session is {:?}, expected {:?}",
                self.status, expected
            )))
        }
    }

    fn reset_review(&mut self) {
        self.raw_text.clear();
        self.detected.clear();
        self.drafts = vec![DraftEntry::blank()];
        self.schedule = None;
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
