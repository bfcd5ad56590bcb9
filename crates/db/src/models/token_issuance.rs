//! Token issuance audit model.

use cleantrack_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `token_issuances` table.
///
/// Audit only: token validation never reads this table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TokenIssuance {
    pub id: DbId,
    pub equipment_id: DbId,
    #[serde(skip_serializing)]
    pub token: String,
    pub issued_by: Option<DbId>,
    /// `temporary` or `persisted`.
    pub policy: String,
    pub ttl_minutes: i32,
    pub expires_at: Timestamp,
    pub was_used: bool,
    pub used_at: Option<Timestamp>,
    pub times_accessed: i32,
    pub issued_from_ip: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert payload for an issuance record.
#[derive(Debug, Clone)]
pub struct CreateTokenIssuance {
    pub equipment_id: DbId,
    pub token: String,
    pub issued_by: Option<DbId>,
    pub policy: String,
    pub ttl_minutes: i32,
    pub expires_at: Timestamp,
    pub issued_from_ip: Option<String>,
}
