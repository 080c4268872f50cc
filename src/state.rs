use std::sync::Arc;

use crate::calendar::CalendarSink;
use crate::recognition::RecognitionClient;
use crate::services::SessionService;

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionService,
    pub recognizer: Arc<dyn RecognitionClient>,
    pub calendar: Arc<dyn CalendarSink>,
}

impl AppState {
    pub fn new(
        recognizer: Arc<dyn RecognitionClient>,
        calendar: Arc<dyn CalendarSink>,
        parser: crate::schedule::ParserOptions,
    ) -> Self {
        Self {
            sessions: SessionService::new(recognizer.clone(), parser),
            recognizer,
            calendar,
        }
    }
}
