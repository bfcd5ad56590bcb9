use std::sync::Arc;
use std::time::Duration;

use cleantrack_core::compliance::CompliancePolicy;
use cleantrack_core::error::CoreError;
use cleantrack_core::token::{validate_ttl_minutes, TokenPolicy, TokenSigner};
use cleantrack_events::EventBus;

use crate::config::ServerConfig;
use crate::engine::sweep::SweepStatus;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Copy`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: cleantrack_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Signs and validates equipment tokens.
    pub token_signer: Arc<TokenSigner>,
    /// Due-soon window used when classifying equipment.
    pub compliance_policy: CompliancePolicy,
    /// Event bus for alert, cleaning, and report events.
    pub event_bus: Arc<EventBus>,
    /// Outcome of the latest compliance sweep, reported by `/health`.
    pub sweep_status: Arc<SweepStatus>,
}

impl AppState {
    /// Build the state from loaded configuration.
    ///
    /// Fails if the token secret is empty, or the persisted token TTL or the
    /// warning percentage is out of range.
    pub fn new(
        pool: cleantrack_db::DbPool,
        config: ServerConfig,
        event_bus: Arc<EventBus>,
    ) -> Result<Self, CoreError> {
        let token_signer = TokenSigner::new(config.token_secret.as_bytes())?;
        validate_ttl_minutes(config.public_token_ttl_minutes)?;
        let compliance_policy = CompliancePolicy::new(config.due_soon_warning_percent)?;
        Ok(Self {
            pool,
            config: Arc::new(config),
            token_signer: Arc::new(token_signer),
            compliance_policy,
            event_bus,
            sweep_status: Arc::new(SweepStatus::new()),
        })
    }

    /// Period covered by each compliance report: the report interval.
    pub fn report_period(&self) -> chrono::Duration {
        let interval = Duration::from_secs(self.config.report_interval_secs);
        chrono::Duration::from_std(interval).unwrap_or(chrono::Duration::weeks(1))
    }

    /// Policy for tokens stored on the equipment row.
    pub fn persisted_token_policy(&self) -> TokenPolicy {
        TokenPolicy::persisted(self.config.public_token_ttl_minutes)
    }
}
