//! Repository for the `token_issuances` audit table.

use cleantrack_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::token_issuance::{CreateTokenIssuance, TokenIssuance};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, equipment_id, token, issued_by, policy, ttl_minutes, expires_at, \
                       was_used, used_at, times_accessed, issued_from_ip, created_at, updated_at";

/// Records token issuance and usage for traceability.
pub struct TokenIssuanceRepo;

impl TokenIssuanceRepo {
    /// Insert an issuance record.
    pub async fn create(
        pool: &PgPool,
        input: &CreateTokenIssuance,
    ) -> Result<TokenIssuance, sqlx::Error> {
        let query = format!(
            "INSERT INTO token_issuances
                (equipment_id, token, issued_by, policy, ttl_minutes, expires_at, issued_from_ip)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TokenIssuance>(&query)
            .bind(input.equipment_id)
            .bind(&input.token)
            .bind(input.issued_by)
            .bind(&input.policy)
            .bind(input.ttl_minutes)
            .bind(input.expires_at)
            .bind(&input.issued_from_ip)
            .fetch_one(pool)
            .await
    }

    /// Bump the access counter for a token. Tokens without an audit row are
    /// ignored.
    pub async fn record_access(pool: &PgPool, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE token_issuances SET times_accessed = times_accessed + 1 WHERE token = $1")
            .bind(token)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Flag a token as used by a cleaning submission.
    pub async fn mark_used(
        conn: &mut PgConnection,
        token: &str,
        at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE token_issuances SET was_used = TRUE, used_at = COALESCE(used_at, $2)
             WHERE token = $1",
        )
        .bind(token)
        .bind(at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Newest-first issuance history for one equipment item.
    pub async fn list_for_equipment(
        pool: &PgPool,
        equipment_id: DbId,
    ) -> Result<Vec<TokenIssuance>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM token_issuances
             WHERE equipment_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, TokenIssuance>(&query)
            .bind(equipment_id)
            .fetch_all(pool)
            .await
    }
}
