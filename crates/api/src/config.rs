//! Environment-backed configuration.

use gatehouse_store::DbConfig;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub postgres: DbConfig,
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: String,
    pub port: u16,
    pub env: String,
    /// Static key gating the external surface.
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret_key: String,
}

impl Config {
    /// Read configuration from the environment, falling back to development
    /// defaults (with a warning for the secrets).
    pub fn from_env() -> Self {
        let secret_key = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set; using insecure dev default");
            "dev-secret".to_string()
        });
        let api_key = std::env::var("APP_API_KEY").unwrap_or_else(|_| {
            warn!("APP_API_KEY not set; using insecure dev default");
            "dev-api-key".to_string()
        });

        Self {
            app: AppConfig {
                name: env_or("APP_NAME", "gatehouse"),
                port: env_or("APP_PORT", "8080").parse().unwrap_or(8080),
                env: env_or("APP_ENV", "local"),
                api_key,
            },
            postgres: DbConfig {
                host: env_or("POSTGRES_HOST", "127.0.0.1"),
                port: env_or("POSTGRES_PORT", "5432").parse().unwrap_or(5432),
                user: env_or("POSTGRES_USER", "postgres"),
                password: env_or("POSTGRES_PASSWORD", "postgres"),
                dbname: env_or("POSTGRES_DB", "gatehouse"),
                max_connections: env_or("POSTGRES_MAX_CONNECTIONS", "10").parse().unwrap_or(10),
            },
            jwt: JwtConfig { secret_key },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
