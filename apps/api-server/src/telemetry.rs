//! Telemetry initialization - tracing and alerting setup.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::flag_var;
use crate::observability::{AlertConfig, AlertLayer};

const DEFAULT_FILTER: &str = "info,api_server=debug,notepad_infra=debug";

/// Telemetry configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Enable JSON logging (for production).
    pub json_logs: bool,
    /// Service name attached to startup logs and alerts.
    pub service_name: String,
    /// Enable error alerting.
    pub alerts_enabled: bool,
    /// Webhook URL for alerts (Slack, Discord, etc.).
    pub alert_webhook_url: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            json_logs: false,
            service_name: "guitar-notepad".to_string(),
            alerts_enabled: true,
            alert_webhook_url: None,
        }
    }
}

impl TelemetryConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            json_logs: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.json_logs),
            service_name: std::env::var("SERVICE_NAME").unwrap_or(defaults.service_name),
            alerts_enabled: flag_var("ALERTS_ENABLED", defaults.alerts_enabled),
            alert_webhook_url: std::env::var("ALERT_WEBHOOK_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
        }
    }
}

/// Initialize telemetry (tracing and alerting). Must run inside the Tokio runtime.
pub fn init_telemetry(config: &TelemetryConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let alert_layer = config.alerts_enabled.then(|| {
        let alert_config = AlertConfig {
            service_name: config.service_name.clone(),
            ..AlertConfig::default()
        };
        match &config.alert_webhook_url {
            Some(url) => AlertLayer::webhook(alert_config, url.clone()),
            None => AlertLayer::console(alert_config),
        }
    });

    // Build and init subscriber based on log format
    if config.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .with(alert_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .with(alert_layer)
            .init();
    }

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        alerts_enabled = config.alerts_enabled,
        alert_webhook = config.alert_webhook_url.is_some(),
        "Telemetry initialized"
    );
}
