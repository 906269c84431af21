//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use notepad_core::services::Registration;
use notepad_infra::JwtConfig;
use notepad_infra::database::DatabaseConfig;

#[cfg(feature = "rate-limit")]
use notepad_infra::RateLimitConfig;

#[cfg(feature = "scheduler")]
use crate::background::SchedulerConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the server on the in-memory store.
    pub database: Option<DatabaseConfig>,
    /// Apply pending migrations on startup.
    pub run_migrations: bool,
    pub jwt: JwtConfig,
    /// Account promoted to (or created as) administrator on startup.
    pub admin: Option<AdminConfig>,
    #[cfg(feature = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    #[cfg(feature = "scheduler")]
    pub scheduler: SchedulerConfig,
}

/// Bootstrap administrator credentials.
#[derive(Clone)]
pub struct AdminConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl From<AdminConfig> for Registration {
    fn from(admin: AdminConfig) -> Self {
        Registration {
            username: admin.username,
            email: admin.email,
            password: admin.password,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| {
            let defaults = DatabaseConfig::new(url);
            DatabaseConfig {
                max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.max_connections),
                min_connections: parse_var("DB_MIN_CONNECTIONS", defaults.min_connections),
                ..defaults
            }
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 8080),
            database,
            run_migrations: flag_var("RUN_MIGRATIONS", true),
            jwt: JwtConfig::from_env(),
            admin: Self::admin_from_env(),
            #[cfg(feature = "rate-limit")]
            rate_limit: RateLimitConfig::from_env(),
            #[cfg(feature = "scheduler")]
            scheduler: SchedulerConfig::from_env(),
        }
    }

    /// All three of `ADMIN_USERNAME`, `ADMIN_EMAIL` and `ADMIN_PASSWORD` must be set.
    fn admin_from_env() -> Option<AdminConfig> {
        let username = env::var("ADMIN_USERNAME").ok();
        let email = env::var("ADMIN_EMAIL").ok();
        let password = env::var("ADMIN_PASSWORD").ok();

        match (username, email, password) {
            (Some(username), Some(email), Some(password)) => Some(AdminConfig {
                username,
                email,
                password,
            }),
            (None, None, None) => None,
            _ => {
                tracing::warn!(
                    "Incomplete admin bootstrap: set ADMIN_USERNAME, ADMIN_EMAIL and ADMIN_PASSWORD together"
                );
                None
            }
        }
    }
}

/// Parse an environment variable, falling back to `default` when unset or malformed.
pub(crate) fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Boolean switch: anything but `false` or `0` turns it on.
pub(crate) fn flag_var(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v != "false" && v != "0")
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_falls_back_on_garbage() {
        assert_eq!(parse_var("NOTEPAD_TEST_UNSET_PORT", 8080u16), 8080);
    }

    #[test]
    fn test_admin_debug_hides_password() {
        let admin = AdminConfig {
            username: "root".into(),
            email: "root@example.com".into(),
            password: "hunter2hunter2".into(),
        };
        let rendered = format!("{:?}", admin);

        assert!(rendered.contains("root@example.com"));
        assert!(!rendered.contains("hunter2"));
    }
}
