use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    /// Token lifetime in hours; fractional values are allowed.
    pub ttl_hours: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let ttl_hours = match std::env::var("JWT_TTL_HOURS") {
            Ok(v) => v
                .trim()
                .parse::<f64>()
                .with_context(|| format!("JWT_TTL_HOURS is not a number: {v}"))?,
            Err(_) => 24.0,
        };
        anyhow::ensure!(
            ttl_hours.is_finite() && ttl_hours > 0.0,
            "JWT_TTL_HOURS must be positive"
        );

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "qa-forum".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "qa-forum-users".into()),
            ttl_hours,
        };
        Ok(Self { database_url, jwt })
    }

    #[cfg(test)]
    pub fn for_tests(secret: &str, ttl_hours: f64) -> Self {
        Self {
            database_url: None,
            jwt: JwtConfig {
                secret: secret.into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_hours,
            },
        }
    }
}
