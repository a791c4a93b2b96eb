use std::sync::Arc;

use crate::auth::{PasswordHashing, SessionError, SessionIssuer};
use crate::config::AppConfig;
use crate::contexts::Contexts;
use crate::database::Store;
use crate::storage::ObjectStore;

/// Shared handles injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub objects: Arc<dyn ObjectStore>,
    pub sessions: Arc<SessionIssuer>,
    pub hashing: PasswordHashing,
    pub contexts: Arc<Contexts>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, objects: Arc<dyn ObjectStore>) -> Result<Self, SessionError> {
        let sessions = SessionIssuer::from_config(&config.security)?;
        Ok(Self {
            store,
            objects,
            sessions: Arc::new(sessions),
            hashing: PasswordHashing::from_config(&config.security),
            contexts: Arc::new(Contexts::from_config(&config)),
            config: Arc::new(config),
        })
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn objects(&self) -> &dyn ObjectStore {
        self.objects.as_ref()
    }
}
