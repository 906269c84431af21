//! # Notepad Infrastructure
//!
//! Concrete implementations of the ports defined in `notepad-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory store only
//! - `postgres` - PostgreSQL store via SeaORM
//! - `auth` - JWT + Argon2 authentication
//! - `rate-limit` - Per-client rate limiting via governor

pub mod database;
pub mod memory;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

pub use memory::{InMemoryChordRepository, InMemoryUserRepository};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

#[cfg(feature = "postgres")]
pub use database::{PostgresChordRepository, PostgresUserRepository};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};
