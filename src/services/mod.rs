pub mod session;
pub mod session_service;

pub use session::{Readiness, SelectedFile, Session, SessionStatus, SessionView};
pub use session_service::SessionService;
