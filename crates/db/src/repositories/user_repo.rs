//! Repository for the `users` table.

use cleantrack_core::roles::{Role, ROLE_ADMIN, ROLE_MANAGER};
use cleantrack_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, Recipient, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, full_name, role, is_active, created_at, updated_at";

/// Provides lookups over user accounts.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, full_name, role)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.full_name)
            .bind(input.role.as_str())
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Who gets compliance email for a facility: every active admin plus the
    /// active managers linked to that facility.
    pub async fn alert_recipients(
        pool: &PgPool,
        facility_id: DbId,
    ) -> Result<Vec<Recipient>, sqlx::Error> {
        sqlx::query_as::<_, Recipient>(
            "SELECT u.id, u.email, u.full_name
             FROM users u
             WHERE u.is_active
               AND (u.role = $2
                    OR (u.role = $3 AND EXISTS (
                        SELECT 1 FROM facility_managers fm
                        WHERE fm.user_id = u.id AND fm.facility_id = $1)))
             ORDER BY u.id",
        )
        .bind(facility_id)
        .bind(ROLE_ADMIN)
        .bind(ROLE_MANAGER)
        .fetch_all(pool)
        .await
    }

    /// Who gets the periodic compliance report: every active user whose role
    /// receives compliance email, regardless of facility.
    pub async fn report_recipients(pool: &PgPool) -> Result<Vec<Recipient>, sqlx::Error> {
        let roles: Vec<&'static str> = Role::ALL
            .into_iter()
            .filter(|r| r.receives_alerts())
            .map(Role::as_str)
            .collect();
        sqlx::query_as::<_, Recipient>(
            "SELECT id, email, full_name FROM users
             WHERE is_active AND role = ANY($1)
             ORDER BY id",
        )
        .bind(roles)
        .fetch_all(pool)
        .await
    }
}
