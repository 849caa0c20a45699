//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::db::Repositories;
use crate::services::{
    ActivityLogger, MailService, SettingsStore, UploadStorage, UploadValidator,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: Option<PgPool>,
    repos: Repositories,
    settings: SettingsStore,
    activity: ActivityLogger,
    uploads: UploadValidator,
    storage: UploadStorage,
    mail: MailService,
}

impl AppState {
    /// Wire services over the given repositories.
    ///
    /// `pool` is only used by the readiness probe; without one the probe
    /// reports ready.
    ///
    /// # Errors
    ///
    /// Returns an SMTP error if mail is configured but the relay is invalid.
    pub fn new(
        config: AdminConfig,
        pool: Option<PgPool>,
        repos: Repositories,
    ) -> Result<Self, lettre::transport::smtp::Error> {
        let settings = SettingsStore::new(Arc::clone(&repos.settings), config.settings_cache_ttl);
        let activity = ActivityLogger::new(Arc::clone(&repos.activity));
        let uploads = UploadValidator::new(config.uploads.max_bytes);
        let storage = UploadStorage::new(config.uploads.dir.clone());
        let mail = MailService::new(config.email.as_ref(), settings.clone())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                repos,
                settings,
                activity,
                uploads,
                storage,
                mail,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    #[must_use]
    pub fn repos(&self) -> &Repositories {
        &self.inner.repos
    }

    #[must_use]
    pub fn settings(&self) -> &SettingsStore {
        &self.inner.settings
    }

    #[must_use]
    pub fn activity(&self) -> &ActivityLogger {
        &self.inner.activity
    }

    #[must_use]
    pub fn uploads(&self) -> &UploadValidator {
        &self.inner.uploads
    }

    #[must_use]
    pub fn storage(&self) -> &UploadStorage {
        &self.inner.storage
    }

    #[must_use]
    pub fn mail(&self) -> &MailService {
        &self.inner.mail
    }
}
