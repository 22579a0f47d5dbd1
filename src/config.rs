use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Postgres when set, in-memory store otherwise.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub telegram_token: String,
    pub api_base_url: String,
    pub poll_timeout_secs: u64,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: env_or("JWT_ISSUER", "userdir"),
            audience: env_or("JWT_AUDIENCE", "userdir-users"),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60),
        };
        Ok(Self {
            database_url,
            jwt,
            host: env_or("APP_HOST", "0.0.0.0"),
            port: env_parse("APP_PORT", 8080),
        })
    }
}

impl BotConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let telegram_token = std::env::var("TELEGRAM_TOKEN")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .context("TELEGRAM_TOKEN is not set")?;
        Ok(Self {
            telegram_token,
            api_base_url: env_or("API_BASE_URL", "http://localhost:8080"),
            poll_timeout_secs: env_parse("BOT_POLL_TIMEOUT_SECS", 30),
        })
    }
}
