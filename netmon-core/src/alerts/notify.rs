//! Concrete [`NotificationSink`]s fired by the alert engines (§4.6). A rule
//! carries its own `email_sink`/`webhook_sink` addresses; `dispatch` fans
//! an envelope out to whichever of the two are configured and logs
//! failures instead of propagating them, matching the original's
//! fire-and-forget `asyncio.create_task` behavior.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use netmon_config::SmtpConfig;
use netmon_contracts::notify::{NotificationEnvelope, NotificationSink, NotifyError};
use reqwest::Client;
use tracing::warn;

pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait::async_trait]
impl NotificationSink for WebhookSink {
    async fn send(&self, envelope: &NotificationEnvelope) -> Result<(), NotifyError> {
        self.client
            .post(&self.url)
            .json(envelope)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(())
    }
}

pub struct EmailSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    to: String,
}

impl EmailSink {
    pub fn new(config: &SmtpConfig, to: String) -> Result<Self, NotifyError> {
        if !config.enabled {
            return Err(NotifyError::NotConfigured);
        }

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .port(config.port);

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(config.username.clone(), config.password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: format!("{} <{}>", config.from_name, config.from_address),
            to,
        })
    }
}

#[async_trait::async_trait]
impl NotificationSink for EmailSink {
    async fn send(&self, envelope: &NotificationEnvelope) -> Result<(), NotifyError> {
        let kind_label = envelope.kind.map(|k| format!(" ({k})")).unwrap_or_default();
        let subject = format!("[NetMon Alert{kind_label}] {}: {}", envelope.severity, envelope.rule_name);
        let body = format!(
            "<h2>NetMon Alert Triggered</h2>\n\
             <p><strong>Rule:</strong> {}</p>\n\
             <p><strong>Severity:</strong> {}</p>\n\
             <p><strong>Message:</strong> {}</p>\n\
             <p><strong>Value:</strong> {} (threshold: {})</p>\n\
             <p><strong>Time:</strong> {}</p>",
            envelope.rule_name,
            envelope.severity,
            envelope.message,
            envelope.metric_value,
            envelope.threshold,
            envelope.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        );

        let message = Message::builder()
            .from(self.from.parse().map_err(|e: lettre::address::AddressError| NotifyError::Transport(e.to_string()))?)
            .to(self.to.parse().map_err(|e: lettre::address::AddressError| NotifyError::Transport(e.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body)
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// Fires whichever sinks a rule configured, logging (not propagating) any
/// failure — a bad webhook URL must never block the evaluation tick.
pub async fn dispatch(
    http: &Client,
    smtp: &SmtpConfig,
    email_sink: Option<&str>,
    webhook_sink: Option<&str>,
    envelope: &NotificationEnvelope,
) {
    if let Some(to) = email_sink {
        match EmailSink::new(smtp, to.to_string()) {
            Ok(sink) => {
                if let Err(err) = sink.send(envelope).await {
                    warn!(rule = %envelope.rule_name, %err, "alert email failed");
                }
            }
            Err(err) => warn!(rule = %envelope.rule_name, %err, "alert email not sent"),
        }
    }

    if let Some(url) = webhook_sink {
        let sink = WebhookSink::new(http.clone(), url.to_string());
        if let Err(err) = sink.send(envelope).await {
            warn!(rule = %envelope.rule_name, %err, "alert webhook failed");
        }
    }
}
