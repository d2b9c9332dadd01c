//! Append-only operational log (§3 `system_events`). Every poller, collector,
//! and alert engine failure that's swallowed rather than propagated (per
//! §7's policy) gets recorded here so an operator can still see it.

use chrono::Utc;
use netmon_model::SystemEventLevel;
use tracing::{error, info, warn};

use crate::error::StoreError;
use crate::store::models::SystemEvent;
use crate::store::ports::SystemEventRepository;

type Result<T> = std::result::Result<T, StoreError>;

pub struct SystemEventLogger<'a, R: SystemEventRepository> {
    repo: &'a R,
    source: &'static str,
}

impl<'a, R: SystemEventRepository> SystemEventLogger<'a, R> {
    pub fn new(repo: &'a R, source: &'static str) -> Self {
        Self { repo, source }
    }

    async fn record(
        &self,
        level: SystemEventLevel,
        event_type: &str,
        resource_type: Option<&str>,
        resource_id: Option<&str>,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> Result<()> {
        let message = message.into();
        match level {
            SystemEventLevel::Info => info!(source = self.source, event_type, "{message}"),
            SystemEventLevel::Warning => warn!(source = self.source, event_type, "{message}"),
            SystemEventLevel::Error => error!(source = self.source, event_type, "{message}"),
        }

        self.repo
            .record(&SystemEvent {
                level,
                source: self.source.to_string(),
                event_type: event_type.to_string(),
                resource_type: resource_type.map(str::to_string),
                resource_id: resource_id.map(str::to_string),
                message,
                details,
                created_at: Utc::now(),
            })
            .await
    }

    pub async fn info(&self, event_type: &str, message: impl Into<String>) -> Result<()> {
        self.record(SystemEventLevel::Info, event_type, None, None, message, None).await
    }

    pub async fn warning(
        &self,
        event_type: &str,
        resource_type: &str,
        resource_id: &str,
        message: impl Into<String>,
    ) -> Result<()> {
        self.record(
            SystemEventLevel::Warning,
            event_type,
            Some(resource_type),
            Some(resource_id),
            message,
            None,
        )
        .await
    }

    pub async fn error(
        &self,
        event_type: &str,
        resource_type: &str,
        resource_id: &str,
        message: impl Into<String>,
    ) -> Result<()> {
        self.record(
            SystemEventLevel::Error,
            event_type,
            Some(resource_type),
            Some(resource_id),
            message,
            None,
        )
        .await
    }
}
