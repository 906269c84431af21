//! Error alerting layer for tracing.
//!
//! Intercepts ERROR-level events (a failed block sweep, a lost database
//! connection) and forwards them to the console or a chat webhook.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{Layer, layer::Context};

/// Alert message containing error details.
#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub service: String,
    pub level: Level,
    pub message: String,
    pub target: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub fields: Vec<(String, String)>,
}

impl AlertMessage {
    /// One-line summary followed by `key=value` fields.
    pub fn render(&self) -> String {
        let mut text = format!(
            "[{}] {} {}: {}",
            self.service, self.level, self.target, self.message
        );
        for (key, value) in &self.fields {
            text.push_str(&format!("\n  {}={}", key, value));
        }
        text
    }
}

/// Configuration for the alert layer.
#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// Least severe level that triggers an alert (default: ERROR).
    pub min_level: Level,
    /// Alerts queued beyond this are dropped.
    pub buffer_size: usize,
    pub service_name: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            min_level: Level::ERROR,
            buffer_size: 100,
            service_name: "guitar-notepad".to_string(),
        }
    }
}

/// Trait for alert senders - implement this for different backends.
#[async_trait::async_trait]
pub trait AlertSender: Send + Sync {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Failed to send alert: {0}")]
    SendError(String),
}

/// Console alert sender - writes alerts to stderr (for development).
pub struct ConsoleAlertSender;

#[async_trait::async_trait]
impl AlertSender for ConsoleAlertSender {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
        eprintln!("ALERT {} {}", alert.timestamp.to_rfc3339(), alert.render());
        Ok(())
    }
}

/// Webhook alert sender - posts `{"text": ...}` (Slack, Discord, Mattermost).
pub struct WebhookAlertSender {
    url: String,
    client: reqwest::Client,
}

impl WebhookAlertSender {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl AlertSender for WebhookAlertSender {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
        let payload = serde_json::json!({
            "text": format!("{}\n{}", alert.timestamp.to_rfc3339(), alert.render()),
        });

        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AlertError::SendError(e.to_string()))?;

        Ok(())
    }
}

/// Tracing layer that queues alerts for a background sender task.
pub struct AlertLayer {
    sender: mpsc::Sender<AlertMessage>,
    config: AlertConfig,
}

impl AlertLayer {
    /// Create a new alert layer with the given sender. Must be called inside a Tokio runtime.
    pub fn new(config: AlertConfig, alert_sender: Arc<dyn AlertSender>) -> Self {
        let (tx, mut rx) = mpsc::channel::<AlertMessage>(config.buffer_size.max(1));

        tokio::spawn(async move {
            while let Some(alert) = rx.recv().await {
                // Not through tracing: a failing sender would alert about itself.
                if let Err(e) = alert_sender.send(alert).await {
                    eprintln!("{}", e);
                }
            }
        });

        Self { sender: tx, config }
    }

    /// Create an alert layer that logs to console.
    pub fn console(config: AlertConfig) -> Self {
        Self::new(config, Arc::new(ConsoleAlertSender))
    }

    /// Create an alert layer that sends to a webhook.
    pub fn webhook(config: AlertConfig, url: String) -> Self {
        Self::new(config, Arc::new(WebhookAlertSender::new(url)))
    }
}

/// Visitor to extract fields from events.
#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields
                .push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }
    }
}

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // Level ordering is by verbosity: ERROR is the "smallest".
        if *event.metadata().level() > self.config.min_level {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let alert = AlertMessage {
            service: self.config.service_name.clone(),
            level: *event.metadata().level(),
            message: visitor.message,
            target: event.metadata().target().to_string(),
            timestamp: chrono::Utc::now(),
            fields: visitor.fields,
        };

        // Never block the logging call site; drop the alert when the queue is full.
        let _ = self.sender.try_send(alert);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    struct ChannelSender(mpsc::UnboundedSender<AlertMessage>);

    #[async_trait::async_trait]
    impl AlertSender for ChannelSender {
        async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
            self.0
                .send(alert)
                .map_err(|e| AlertError::SendError(e.to_string()))
        }
    }

    #[tokio::test]
    async fn test_only_errors_are_forwarded() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let layer = AlertLayer::new(AlertConfig::default(), Arc::new(ChannelSender(tx)));
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("just a warning");
            tracing::error!(user_id = 42, "Expired block sweep failed");
        });

        let alert = rx.recv().await.unwrap();
        assert_eq!(alert.level, Level::ERROR);
        assert_eq!(alert.message, "Expired block sweep failed");
        assert!(alert.fields.iter().any(|(k, v)| k == "user_id" && v == "42"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_render_lists_fields() {
        let alert = AlertMessage {
            service: "guitar-notepad".into(),
            level: Level::ERROR,
            message: "Database connection lost".into(),
            target: "api_server".into(),
            timestamp: chrono::Utc::now(),
            fields: vec![("error".into(), "timeout".into())],
        };

        let text = alert.render();
        assert!(text.starts_with("[guitar-notepad] ERROR api_server: Database connection lost"));
        assert!(text.contains("error=timeout"));
    }
}
