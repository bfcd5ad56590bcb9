use std::fmt;

use cleantrack_core::compliance::DEFAULT_WARNING_PERCENT;
use cleantrack_core::token::{DEFAULT_PERSISTED_TTL_MINUTES, MAX_TTL_MINUTES};

use crate::auth::jwt::JwtConfig;

/// Default interval between compliance sweeps: 15 minutes.
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 900;

/// Default interval between compliance report emails: one week.
const DEFAULT_REPORT_INTERVAL_SECS: u64 = 7 * 24 * 3600;

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long background tasks get to stop after the server drains (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT verification settings for the bearer tokens that identify actors.
    pub jwt: JwtConfig,
    /// HMAC secret for equipment tokens. Must be stable across restarts.
    pub token_secret: String,
    /// Lifetime of persisted public tokens in minutes (default: `5`).
    pub public_token_ttl_minutes: i64,
    /// Due-soon window as a percentage of the cleaning frequency (default: `20`).
    pub due_soon_warning_percent: u32,
    /// Seconds between background compliance sweeps (default: `900`).
    pub sweep_interval_secs: u64,
    /// Seconds between compliance report emails, also the period each report
    /// covers (default: one week).
    pub report_interval_secs: u64,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cors_origins", &self.cors_origins)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("shutdown_timeout_secs", &self.shutdown_timeout_secs)
            .field("jwt", &self.jwt)
            .field("token_secret", &"<redacted>")
            .field("public_token_ttl_minutes", &self.public_token_ttl_minutes)
            .field("due_soon_warning_percent", &self.due_soon_warning_percent)
            .field("sweep_interval_secs", &self.sweep_interval_secs)
            .field("report_interval_secs", &self.report_interval_secs)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `HOST`                     | `0.0.0.0`                  |
    /// | `PORT`                     | `3000`                     |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `30`                       |
    /// | `TOKEN_SECRET`             | **required**               |
    /// | `PUBLIC_TOKEN_TTL_MINUTES` | `5` (at most ten years)    |
    /// | `DUE_SOON_WARNING_PERCENT` | `20`                       |
    /// | `SWEEP_INTERVAL_SECS`      | `900`                      |
    /// | `REPORT_INTERVAL_SECS`     | `604800` (one week)        |
    ///
    /// See [`JwtConfig::from_env`] for the JWT variables.
    ///
    /// # Panics
    ///
    /// Panics on unparseable values or a missing/empty `TOKEN_SECRET`, so
    /// misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();

        let token_secret =
            std::env::var("TOKEN_SECRET").expect("TOKEN_SECRET must be set in the environment");
        assert!(!token_secret.is_empty(), "TOKEN_SECRET must not be empty");

        let public_token_ttl_minutes: i64 = std::env::var("PUBLIC_TOKEN_TTL_MINUTES")
            .unwrap_or_else(|_| DEFAULT_PERSISTED_TTL_MINUTES.to_string())
            .parse()
            .expect("PUBLIC_TOKEN_TTL_MINUTES must be a valid i64");
        assert!(
            (1..=MAX_TTL_MINUTES).contains(&public_token_ttl_minutes),
            "PUBLIC_TOKEN_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}"
        );

        let due_soon_warning_percent: u32 = std::env::var("DUE_SOON_WARNING_PERCENT")
            .unwrap_or_else(|_| DEFAULT_WARNING_PERCENT.to_string())
            .parse()
            .expect("DUE_SOON_WARNING_PERCENT must be a valid u32");

        let sweep_interval_secs: u64 = std::env::var("SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_SWEEP_INTERVAL_SECS.to_string())
            .parse()
            .expect("SWEEP_INTERVAL_SECS must be a valid u64");
        assert!(sweep_interval_secs > 0, "SWEEP_INTERVAL_SECS must be positive");

        let report_interval_secs: u64 = std::env::var("REPORT_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_REPORT_INTERVAL_SECS.to_string())
            .parse()
            .expect("REPORT_INTERVAL_SECS must be a valid u64");
        assert!(report_interval_secs > 0, "REPORT_INTERVAL_SECS must be positive");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt,
            token_secret,
            public_token_ttl_minutes,
            due_soon_warning_percent,
            sweep_interval_secs,
            report_interval_secs,
        }
    }
}
