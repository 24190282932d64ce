use std::env;

use anyhow::{bail, Context};

#[derive(Debug, Clone)]
pub struct Config {
    /// Unset selects the in-memory store.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,

    pub default_reminder_hour: u32,
    pub default_reminder_minute: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .context("PORT must be a number")?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:8081".into()),
            cors_extra_origins: env::var("CORS_EXTRA_ORIGINS")
                .map(|extra| {
                    extra
                        .split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),

            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").ok().filter(|s| !s.is_empty()),

            default_reminder_hour: env::var("DEFAULT_REMINDER_HOUR")
                .unwrap_or_else(|_| "20".into()) // 8:00 PM local time
                .parse()
                .context("DEFAULT_REMINDER_HOUR must be a number")?,
            default_reminder_minute: env::var("DEFAULT_REMINDER_MINUTE")
                .unwrap_or_else(|_| "0".into())
                .parse()
                .context("DEFAULT_REMINDER_MINUTE must be a number")?,
        };

        if config.jwt_secret.is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        if config.default_reminder_hour > 23 || config.default_reminder_minute > 59 {
            bail!(
                "Default reminder time {:02}:{:02} is not a valid time of day",
                config.default_reminder_hour,
                config.default_reminder_minute
            );
        }

        Ok(config)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:8081".into(),
            cors_extra_origins: Vec::new(),
            jwt_secret: "test-secret".into(),
            jwt_issuer: None,
            default_reminder_hour: 20,
            default_reminder_minute: 0,
        }
    }
}
