use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// SMTP relay and sender identity.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from: String,
    pub password: String,
}

/// Upper bounds for calls that leave the process.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Timeouts {
    pub store: Duration,
    pub mail: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    /// Public base URL of the web frontend, used to build email links.
    pub frontend_url: String,
    pub timeouts: Timeouts,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => format!(
                "postgres://{}:{}@{}:{}/{}",
                env_or("DB_USER", "user"),
                env_or("DB_PASSWORD", "password"),
                env_or("DB_HOST", "localhost"),
                env_parse("DB_PORT", 5432u16),
                env_or("DB_NAME", "dbname"),
            ),
        };
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: env_or("JWT_ISSUER", "campus-portal"),
            audience: env_or("JWT_AUDIENCE", "campus-portal-users"),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        let mail = MailConfig {
            smtp_host: env_or("SMTP_HOST", "smtp.gmail.com"),
            smtp_port: env_parse("SMTP_PORT", 587),
            from: env_or("EMAIL", "email@gmail.com"),
            password: env_or("EMAIL_PASSWORD", "passwd"),
        };
        let timeouts = Timeouts {
            store: Duration::from_millis(env_parse("STORE_TIMEOUT_MS", 5_000)),
            mail: Duration::from_millis(env_parse("MAIL_TIMEOUT_MS", 10_000)),
        };
        Ok(Self {
            database_url,
            jwt,
            mail,
            frontend_url: env_or("FRONTEND_URL", "http://localhost:5000")
                .trim_end_matches('/')
                .to_string(),
            timeouts,
        })
    }
}

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(fallback)
}
