// src/state.rs
use std::sync::{Arc, OnceLock};

use crate::config::{AppConfig, CREDENTIALS_ENV};
use crate::errors::{RelayError, RelayResult};
use crate::services::messaging_service::{FcmConfig, FcmNotificationService, NotificationService};

type NotifierSlot = OnceLock<Result<Arc<dyn NotificationService>, String>>;

pub struct AppState {
    pub config: AppConfig,
    notifier: NotifierSlot,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            notifier: OnceLock::new(),
        }
    }

    /// State whose messaging client is already in place; credentials from the
    /// config are never read.
    pub fn with_notifier(config: AppConfig, notification_service: Arc<dyn NotificationService>) -> Self {
        let notifier = OnceLock::new();
        let _ = notifier.set(Ok(notification_service));
        Self { config, notifier }
    }

    /// The process-wide messaging client, built on first use.
    ///
    /// The outcome of that first attempt is kept either way: bad credentials
    /// fail every request until the process is restarted with a fixed config.
    pub fn notifier(&self) -> RelayResult<Arc<dyn NotificationService>> {
        self.notifier
            .get_or_init(|| self.build_notifier())
            .clone()
            .map_err(RelayError::Configuration)
    }

    fn build_notifier(&self) -> Result<Arc<dyn NotificationService>, String> {
        let raw = self
            .config
            .service_account_json
            .as_deref()
            .ok_or_else(|| format!("Missing {} configuration", CREDENTIALS_ENV))?;

        let fcm_config = FcmConfig {
            base_url: self.config.fcm_base_url.clone(),
        };
        let service = FcmNotificationService::from_credentials_json(raw, fcm_config)?;

        tracing::info!(project_id = %service.project_id(), "FCM client initialized");
        Ok(Arc::new(service))
    }
}
