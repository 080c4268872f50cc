use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{DraftEntry, DraftField, FinalizedSchedule};
use crate::preview::PreviewRegistry;
use crate::recognition::RecognitionClient;
use crate::schedule::ParserOptions;
use crate::services::session::{Readiness, SelectedFile, Session, SessionView};

/// In-memory sessions plus the recognition backend they share.
///
/// Session state only changes under the map lock; the recognition call
/// itself runs with the lock released.
#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
    recognizer: Arc<dyn RecognitionClient>,
    previews: PreviewRegistry,
    parser: ParserOptions,
}

impl SessionService {
    pub fn new(recognizer: Arc<dyn RecognitionClient>, parser: ParserOptions) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            recognizer,
            previews: PreviewRegistry::new(),
            parser,
        }
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    pub fn parser_options(&self) -> ParserOptions {
        self.parser
    }

    pub async fn create_session(&self) -> SessionView {
        let readiness = self.check_readiness().await;
        let mut session = Session::new();
        session.set_readiness(readiness);

        let view = session.view();
        self.sessions.lock().await.insert(session.id(), session);
        info!("session {} created (recognizer ready: {})", view.id, view.recognizer_ready);
        view
    }

    pub async fn get(&self, id: Uuid) -> Result<SessionView, AppError> {
        self.with_session(id, |session| Ok(session.view())).await
    }

    /// Dropping the session releases its preview.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.sessions
            .lock()
            .await
            .remove(&id)
            .map(|_| info!("session {} deleted", id))
            .ok_or(AppError::NotFound)
    }

    pub async fn refresh_readiness(&self, id: Uuid) -> Result<SessionView, AppError> {
        // fail fast on unknown ids before talking to the backend
        self.get(id).await?;
        let readiness = self.check_readiness().await;
        self.with_session(id, move |session| {
            session.set_readiness(readiness);
            Ok(session.view())
        })
        .await
    }

    pub async fn select_file(
        &self,
        id: Uuid,
        name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<SessionView, AppError> {
        let file = SelectedFile::new(name, content_type, bytes)?;
        let previews = self.previews.clone();
        self.with_session(id, move |session| {
            let preview = file
                .is_image()
                .then(|| previews.register(&file.content_type, file.bytes.clone()));
            session.select_file(file, preview);
            Ok(session.view())
        })
        .await
    }

    /// Runs recognition for the session's current file.
    ///
    /// Failures put the session back where processing started and are
    /// returned to the caller; so does dropping this future mid-call. A
    /// result for a file that was replaced mid-call is dropped.
    pub async fn process(&self, id: Uuid) -> Result<SessionView, AppError> {
        let job = self.with_session(id, |session| session.begin_processing()).await?;
        info!("session {}: recognizing {} bytes", id, job.image.len());

        let mut guard = InFlight {
            sessions: self.sessions.clone(),
            session_id: id,
            generation: job.generation,
            armed: true,
        };
        let outcome = self.recognizer.recognize(&job.image).await;

        let mut sessions = self.sessions.lock().await;
        guard.armed = false;
        let Some(session) = sessions.get_mut(&id) else {
            warn!("session {} was deleted during recognition", id);
            return Err(AppError::NotFound);
        };

        match outcome {
            Ok(result) => {
                if let Err(e) = session.complete_recognition(&job, result, self.parser) {
                    warn!("session {}: discarding recognition result: {}", id, e);
                    return Err(e);
                }
                Ok(session.view())
            }
            Err(e) => {
                if session.fail_recognition(&job, &e) {
                    warn!("session {}: recognition failed: {}", id, e);
                } else {
                    warn!("session {}: ignoring failure for a replaced file: {}", id, e);
                }
                Err(e)
            }
        }
    }

    pub async fn entries(&self, id: Uuid) -> Result<Vec<DraftEntry>, AppError> {
        self.with_session(id, |session| Ok(session.drafts().to_vec())).await
    }

    pub async fn add_entry(&self, id: Uuid) -> Result<Vec<DraftEntry>, AppError> {
        self.with_session(id, |session| {
            session.add_entry()?;
            Ok(session.drafts().to_vec())
        })
        .await
    }

    pub async fn update_entry(
        &self,
        id: Uuid,
        index: usize,
        field: DraftField,
        value: String,
    ) -> Result<DraftEntry, AppError> {
        self.with_session(id, move |session| {
            session.update_entry(index, field, value).cloned()
        })
        .await
    }

    pub async fn remove_entry(&self, id: Uuid, index: usize) -> Result<Vec<DraftEntry>, AppError> {
        self.with_session(id, |session| {
            session.remove_entry(index)?;
            Ok(session.drafts().to_vec())
        })
        .await
    }

    pub async fn replace_entries(
        &self,
        id: Uuid,
        entries: Vec<DraftEntry>,
    ) -> Result<Vec<DraftEntry>, AppError> {
        self.with_session(id, move |session| {
            session.replace_entries(entries)?;
            Ok(session.drafts().to_vec())
        })
        .await
    }

    pub async fn save(&self, id: Uuid) -> Result<FinalizedSchedule, AppError> {
        self.with_session(id, |session| session.save().cloned()).await
    }

    pub async fn clear_schedule(&self, id: Uuid) -> Result<SessionView, AppError> {
        self.with_session(id, |session| {
            session.clear_schedule()?;
            Ok(session.view())
        })
        .await
    }

    pub async fn schedule(&self, id: Uuid) -> Result<FinalizedSchedule, AppError> {
        self.with_session(id, |session| {
            session
                .schedule()
                .cloned()
                .ok_or_else(|| AppError::Conflict("No schedule has been saved yet".to_string()))
        })
        .await
    }

    async fn check_readiness(&self) -> Readiness {
        let check = self.recognizer.check_ready().await;
        if let Err(e) = &check {
            warn!("recognition backend not ready: {}", e);
        }
        Readiness::from_check(&check)
    }

    async fn with_session<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Session) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id).ok_or(AppError::NotFound)?;
        f(session)
    }
}

/// Rolls the session back out of `Recognizing` when `process` is dropped
/// before the recognition call returns.
struct InFlight {
    sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
    session_id: Uuid,
    generation: u64,
    armed: bool,
}

impl InFlight {
    fn release(sessions: &mut HashMap<Uuid, Session>, id: Uuid, generation: u64) {
        if let Some(session) = sessions.get_mut(&id) {
            if session.abandon_recognition(generation) {
                warn!("session {}: recognition call dropped before completion", id);
            }
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let (id, generation) = (self.session_id, self.generation);

        if let Ok(mut sessions) = self.sessions.try_lock() {
            Self::release(&mut sessions, id, generation);
            return;
        }

        // someone else holds the map; finish the rollback once it is free
        let sessions = self.sessions.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    Self::release(&mut *sessions.lock().await, id, generation);
                });
            }
            Err(_) => warn!("session {}: left recognizing, no runtime to roll back on", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::recognition::{NoopRecognitionClient, RecognitionResult};
    use crate::services::session::SessionStatus;

    struct StalledRecognizer;

    #[async_trait]
    impl RecognitionClient for StalledRecognizer {
        async fn check_ready(&self) -> Result<(), AppError> {
            Ok(())
        }

        async fn recognize(&self, _image: &[u8]) -> Result<RecognitionResult, AppError> {
            std::future::pending().await
        }
    }

    fn service() -> SessionService {
        SessionService::new(Arc::new(NoopRecognitionClient), ParserOptions::default())
    }

    #[tokio::test]
    async fn test_full_lifecycle_with_noop_backend() {
        let service = service();
        let created = service.create_session().await;
        assert_eq!(created.status, SessionStatus::Idle);
        assert!(created.recognizer_ready);

        let selected = service
            .select_file(created.id, "schedule.png", "image/png", vec![1, 2, 3])
            .await
            .expect("file accepted");
        assert_eq!(selected.status, SessionStatus::FileSelected);
        assert!(selected.preview_url.is_some());
        assert_eq!(service.previews().len(), 1);

        let reviewed = service.process(created.id).await.expect("processing succeeds");
        assert_eq!(reviewed.status, SessionStatus::Reviewing);
        assert_eq!(reviewed.drafts, vec![DraftEntry::blank()]);

        service
            .update_entry(created.id, 0, DraftField::Course, "CSE 143".to_string())
            .await
            .expect("update");
        service
            .update_entry(created.id, 0, DraftField::Title, "Data Structures".to_string())
            .await
            .expect("update");

        let schedule = service.save(created.id).await.expect("save");
        assert_eq!(schedule.entries.len(), 1);
        assert_eq!(service.schedule(created.id).await.expect("saved"), schedule);

        service.delete(created.id).await.expect("delete");
        assert!(service.previews().is_empty());
        assert!(matches!(service.get(created.id).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_pdf_selection_has_no_preview() {
        let service = service();
        let created = service.create_session().await;
        let selected = service
            .select_file(created.id, "schedule.pdf", "application/pdf", vec![1])
            .await
            .expect("pdf accepted");
        assert!(selected.preview_url.is_none());
        assert!(service.previews().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_process_call_releases_session() {
        let service = SessionService::new(Arc::new(StalledRecognizer), ParserOptions::default());
        let created = service.create_session().await;
        service
            .select_file(created.id, "schedule.png", "image/png", vec![1, 2, 3])
            .await
            .expect("file accepted");

        let timed_out = tokio::time::timeout(Duration::from_millis(50), service.process(created.id)).await;
        assert!(timed_out.is_err());

        let view = service.get(created.id).await.expect("session exists");
        assert_eq!(view.status, SessionStatus::FileSelected);
        assert!(view.last_error.is_some());

        // a second attempt is not blocked by the abandoned one
        let retried = tokio::time::timeout(Duration::from_millis(50), service.process(created.id)).await;
        assert!(retried.is_err());
        assert_eq!(
            service.get(created.id).await.expect("session exists").status,
            SessionStatus::FileSelected
        );
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let service = service();
        assert!(matches!(service.process(Uuid::new_v4()).await, Err(AppError::NotFound)));
        assert!(matches!(
            service.refresh_readiness(Uuid::new_v4()).await,
            Err(AppError::NotFound)
        ));
    }
}
