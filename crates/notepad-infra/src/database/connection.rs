use std::time::Duration;

#[cfg(feature = "postgres")]
use sea_orm::{ConnectOptions, Database, DbConn, DbErr};

/// Configuration for the main database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 20,
            min_connections: 2,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Open the connection pool.
#[cfg(feature = "postgres")]
pub async fn connect(config: &DatabaseConfig) -> Result<DbConn, DbErr> {
    tracing::info!("Connecting to database...");

    let opts = ConnectOptions::new(&config.url)
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false)
        .to_owned();

    let conn = Database::connect(opts).await?;
    tracing::info!(
        max_connections = config.max_connections,
        "Database connected"
    );
    Ok(conn)
}
