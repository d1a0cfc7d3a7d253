use anyhow::{Context, Result, bail};

use crate::services::token_service::{DEFAULT_ACCESS_TTL_SECS, DEFAULT_REFRESH_TTL_DAYS};

const MIN_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_idle: u32,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_secs: usize,
    pub refresh_token_ttl_days: i64,
    pub admin_email: String,
    pub admin_password: String,
    pub log_level: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        // Load .env if present
        let _ = dotenvy::dotenv();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid u16")?;
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/gatehouse".to_string());
        let db_max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid u32")?;
        let db_min_idle = std::env::var("DB_MIN_IDLE")
            .unwrap_or_else(|_| "1".to_string())
            .parse::<u32>()
            .context("DB_MIN_IDLE must be a valid u32")?;
        let access_token_ttl_secs = std::env::var("ACCESS_TOKEN_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_TTL_SECS.to_string())
            .parse::<usize>()
            .context("ACCESS_TOKEN_TTL_SECS must be a valid usize")?;
        let refresh_token_ttl_days = std::env::var("REFRESH_TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| DEFAULT_REFRESH_TTL_DAYS.to_string())
            .parse::<i64>()
            .context("REFRESH_TOKEN_TTL_DAYS must be a valid i64")?;
        let admin_email =
            std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
        let admin_password = required_secret("ADMIN_PASSWORD", "admin-change-me-1")?;
        let log_level =
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=info".to_string());

        let access_token_secret = required_secret(
            "ACCESS_TOKEN_SECRET",
            "dev-access-secret-change-me-32b!!",
        )?;
        let refresh_token_secret = required_secret(
            "REFRESH_TOKEN_SECRET",
            "dev-refresh-secret-change-me-32b!",
        )?;

        let cfg = Self {
            host,
            port,
            database_url,
            db_max_connections,
            db_min_idle,
            access_token_secret,
            refresh_token_secret,
            access_token_ttl_secs,
            refresh_token_ttl_days,
            admin_email,
            admin_password,
            log_level,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.host.trim().is_empty() {
            errors.push("HOST must not be empty".to_string());
        }
        if self.database_url.trim().is_empty() {
            errors.push("DATABASE_URL must not be empty".to_string());
        }
        if self.db_min_idle > self.db_max_connections {
            errors.push(format!(
                "DB_MIN_IDLE ({}) must be <= DB_MAX_CONNECTIONS ({})",
                self.db_min_idle, self.db_max_connections
            ));
        }
        if self.access_token_secret.len() < MIN_SECRET_BYTES {
            errors.push(format!(
                "ACCESS_TOKEN_SECRET must be at least {MIN_SECRET_BYTES} bytes"
            ));
        }
        if self.refresh_token_secret.len() < MIN_SECRET_BYTES {
            errors.push(format!(
                "REFRESH_TOKEN_SECRET must be at least {MIN_SECRET_BYTES} bytes"
            ));
        }
        if self.access_token_secret == self.refresh_token_secret {
            errors.push(
                "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must use independent key material"
                    .to_string(),
            );
        }
        if self.refresh_token_ttl_days <= 0 {
            errors.push("REFRESH_TOKEN_TTL_DAYS must be > 0".to_string());
        }
        if self.admin_password.len() < 8 {
            errors.push("ADMIN_PASSWORD must be at least 8 characters".to_string());
        }

        if errors.is_empty() {
            return Ok(());
        }
        bail!("invalid app config:\n- {}", errors.join("\n- "))
    }
}

fn required_secret(name: &str, debug_fallback: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(val) => Ok(val),
        Err(_) if cfg!(debug_assertions) => Ok(debug_fallback.to_string()),
        Err(err) => {
            Err(anyhow::anyhow!(err)).context(format!("{name} is required in release builds"))
        }
    }
}
