//! Postgres connection management.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5432,
            user: "postgres".into(),
            password: "postgres".into(),
            dbname: "gatehouse".into(),
            max_connections: 10,
        }
    }
}

impl DbConfig {
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.dbname
        )
    }
}

/// Open a connection pool against the configured database.
pub async fn connect(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        host = %config.host,
        port = config.port,
        dbname = %config.dbname,
        "connecting to Postgres"
    );

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url())
        .await
}
