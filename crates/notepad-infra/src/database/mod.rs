//! Relational store: connection management and SeaORM repositories.

mod connection;

#[cfg(feature = "postgres")]
pub mod entity;
#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
mod postgres_repo;

pub use connection::DatabaseConfig;

#[cfg(feature = "postgres")]
pub use connection::connect;
#[cfg(feature = "postgres")]
pub use postgres_base::PostgresBaseRepository;
#[cfg(feature = "postgres")]
pub use postgres_repo::{PostgresChordRepository, PostgresUserRepository};
