use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PreviewImage {
    pub content_type: String,
    pub bytes: Arc<[u8]>,
}

/// Preview images currently referenced by some session.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    entries: Arc<Mutex<HashMap<Uuid, PreviewImage>>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an image; it stays served until the returned handle is dropped.
    pub fn register(&self, content_type: &str, bytes: Arc<[u8]>) -> PreviewHandle {
        let id = Uuid::new_v4();
        self.lock().insert(
            id,
            PreviewImage {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        debug!("preview {} registered", id);
        PreviewHandle {
            id,
            registry: self.clone(),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<PreviewImage> {
        self.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, id: &Uuid) {
        if self.lock().remove(id).is_some() {
            debug!("preview {} released", id);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, PreviewImage>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
pub struct PreviewHandle {
    id: Uuid,
    registry: PreviewRegistry,
}

impl PreviewHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> String {
        format!("/previews/{}", self.id)
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.release(&self.id);
    }
}
