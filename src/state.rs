use std::sync::Arc;

use crate::{
    auth::session::SessionService, config::AppConfig, mailer::Mailer, provider::AuthProvider,
    storage::ObjectStorage, store::Store,
};

/// Public avatar bucket plus the URL prefix objects are served from.
#[derive(Clone)]
pub struct HostedAvatars {
    pub storage: Arc<dyn ObjectStorage>,
    pub public_base_url: String,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub storage: Arc<dyn ObjectStorage>,
    pub avatars: Option<HostedAvatars>,
    pub provider: Arc<dyn AuthProvider>,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub sessions: SessionService,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn Store>,
        storage: Arc<dyn ObjectStorage>,
        provider: Arc<dyn AuthProvider>,
        sessions: SessionService,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            storage,
            avatars: None,
            provider,
            mailer: None,
            sessions,
        }
    }

    pub fn with_avatars(mut self, avatars: HostedAvatars) -> Self {
        self.avatars = Some(avatars);
        self
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }
}
