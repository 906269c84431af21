//! Application state - shared across all handlers.

use std::sync::Arc;

use notepad_core::DomainError;
use notepad_core::ports::{ChordRepository, PasswordService, TokenService, UserRepository};
use notepad_core::services::{AuthService, ChordService, ModerationService};
use notepad_infra::{
    Argon2PasswordService, InMemoryChordRepository, InMemoryUserRepository, JwtTokenService,
};

#[cfg(feature = "postgres")]
use notepad_infra::database::{self, DatabaseConfig};
#[cfg(feature = "postgres")]
use notepad_infra::{PostgresChordRepository, PostgresUserRepository};

#[cfg(feature = "rate-limit")]
use notepad_core::ports::{RateLimitError, RateLimiter};
#[cfg(feature = "rate-limit")]
use notepad_infra::InMemoryRateLimiter;

use crate::config::AppConfig;

/// Which backing store the repositories talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Postgres,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Memory => "memory",
            StoreKind::Postgres => "postgres",
        }
    }
}

/// Errors that abort startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[cfg(feature = "postgres")]
    #[error("database connection failed: {0}")]
    Database(String),

    #[cfg(feature = "postgres")]
    #[error("migrations failed: {0}")]
    Migration(String),

    #[cfg(not(feature = "postgres"))]
    #[error("DATABASE_URL is set but the server was built without the postgres feature")]
    PostgresDisabled,

    #[cfg(feature = "rate-limit")]
    #[error("invalid rate limit configuration: {0}")]
    RateLimit(#[from] RateLimitError),

    #[error("admin bootstrap failed: {0}")]
    Admin(#[from] DomainError),
}

/// Repositories behind the services.
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub chords: Arc<dyn ChordRepository>,
    pub store: StoreKind,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            chords: Arc::new(InMemoryChordRepository::new()),
            store: StoreKind::Memory,
        }
    }

    #[cfg(feature = "postgres")]
    async fn postgres(config: &DatabaseConfig, run_migrations: bool) -> Result<Self, StartupError> {
        use migration::{Migrator, MigratorTrait};

        let db = database::connect(config)
            .await
            .map_err(|e| StartupError::Database(e.to_string()))?;

        if run_migrations {
            Migrator::up(&db, None)
                .await
                .map_err(|e| StartupError::Migration(e.to_string()))?;
            tracing::info!("Database migrations applied");
        }

        let db = Arc::new(db);
        Ok(Self {
            users: Arc::new(PostgresUserRepository::new(Arc::clone(&db))),
            chords: Arc::new(PostgresChordRepository::new(db)),
            store: StoreKind::Postgres,
        })
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub chords: Arc<ChordService>,
    pub moderation: Arc<ModerationService>,
    pub tokens: Arc<dyn TokenService>,
    /// `None` disables request limiting.
    #[cfg(feature = "rate-limit")]
    pub rate_limiter: Option<Arc<dyn RateLimiter>>,
    pub store: StoreKind,
}

impl AppState {
    /// Build the application state from configuration: pick the store, run
    /// migrations and bootstrap the administrator account.
    pub async fn new(config: &AppConfig) -> Result<Self, StartupError> {
        let repositories = match &config.database {
            #[cfg(feature = "postgres")]
            Some(db_config) => Repositories::postgres(db_config, config.run_migrations).await?,
            #[cfg(not(feature = "postgres"))]
            Some(_) => return Err(StartupError::PostgresDisabled),
            None => {
                tracing::warn!("DATABASE_URL not set. Running on the in-memory store; data is lost on restart.");
                Repositories::in_memory()
            }
        };

        let state = Self::from_parts(
            repositories,
            Arc::new(JwtTokenService::new(config.jwt.clone())),
            Arc::new(Argon2PasswordService::new()),
        );

        #[cfg(feature = "rate-limit")]
        let state = state.with_rate_limiter(Arc::new(InMemoryRateLimiter::new(
            config.rate_limit.clone(),
        )?));

        if let Some(admin) = config.admin.clone() {
            let user = state.auth.ensure_admin(admin.into()).await?;
            tracing::info!(user_id = %user.id, username = %user.username, "Administrator account ready");
        }

        tracing::info!(store = state.store.as_str(), "Application state initialized");
        Ok(state)
    }

    /// Wire services over already-built adapters.
    pub fn from_parts(
        repositories: Repositories,
        tokens: Arc<dyn TokenService>,
        passwords: Arc<dyn PasswordService>,
    ) -> Self {
        let Repositories {
            users,
            chords,
            store,
        } = repositories;

        Self {
            auth: Arc::new(AuthService::new(users.clone(), passwords, tokens.clone())),
            chords: Arc::new(ChordService::new(chords)),
            moderation: Arc::new(ModerationService::new(users)),
            tokens,
            #[cfg(feature = "rate-limit")]
            rate_limiter: None,
            store,
        }
    }

    #[cfg(feature = "rate-limit")]
    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }
}
