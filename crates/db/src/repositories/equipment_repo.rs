//! Repository for the `equipment` table.

use cleantrack_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::equipment::{CreateEquipment, Equipment, UpdateEquipment};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, facility_id, name, serial_number, category, location, description, \
                       cleaning_frequency_hours, is_active, last_cleaned_at, public_token, \
                       token_created_at, created_at, updated_at";

/// Provides CRUD operations for equipment.
///
/// `last_cleaned_at` is only written by the cleaning flow and the token
/// fields only by token issuance; general updates never touch them.
pub struct EquipmentRepo;

impl EquipmentRepo {
    /// Insert new equipment, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateEquipment) -> Result<Equipment, sqlx::Error> {
        let query = format!(
            "INSERT INTO equipment
                (facility_id, name, serial_number, category, location, description,
                 cleaning_frequency_hours)
             VALUES ($1, $2, $3, COALESCE($4, 'other'), $5, $6, COALESCE($7, 24))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Equipment>(&query)
            .bind(input.facility_id)
            .bind(&input.name)
            .bind(&input.serial_number)
            .bind(&input.category)
            .bind(&input.location)
            .bind(&input.description)
            .bind(input.cleaning_frequency_hours)
            .fetch_one(pool)
            .await
    }

    /// Find equipment by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Equipment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM equipment WHERE id = $1");
        sqlx::query_as::<_, Equipment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lock an equipment row for the rest of the transaction.
    ///
    /// Serializes concurrent cleaning submissions for the same item.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Equipment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM equipment WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Equipment>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// List equipment, optionally limited to one facility, ordered by name.
    pub async fn list(
        pool: &PgPool,
        facility_id: Option<DbId>,
    ) -> Result<Vec<Equipment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM equipment
             WHERE ($1::BIGINT IS NULL OR facility_id = $1)
             ORDER BY name, id"
        );
        sqlx::query_as::<_, Equipment>(&query)
            .bind(facility_id)
            .fetch_all(pool)
            .await
    }

    /// All active equipment, for the compliance sweep.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Equipment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM equipment WHERE is_active ORDER BY id");
        sqlx::query_as::<_, Equipment>(&query).fetch_all(pool).await
    }

    /// Update equipment. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateEquipment,
    ) -> Result<Option<Equipment>, sqlx::Error> {
        let query = format!(
            "UPDATE equipment SET
                name = COALESCE($2, name),
                category = COALESCE($3, category),
                location = COALESCE($4, location),
                description = COALESCE($5, description),
                cleaning_frequency_hours = COALESCE($6, cleaning_frequency_hours),
                is_active = COALESCE($7, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Equipment>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.category)
            .bind(&input.location)
            .bind(&input.description)
            .bind(input.cleaning_frequency_hours)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Store a persisted public token on the equipment row.
    pub async fn set_public_token(
        pool: &PgPool,
        id: DbId,
        token: &str,
        created_at: Timestamp,
    ) -> Result<Option<Equipment>, sqlx::Error> {
        let query = format!(
            "UPDATE equipment SET public_token = $2, token_created_at = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Equipment>(&query)
            .bind(id)
            .bind(token)
            .bind(created_at)
            .fetch_optional(pool)
            .await
    }

    /// Overwrite `last_cleaned_at`. `None` clears it (all logs rejected).
    pub async fn set_last_cleaned(
        conn: &mut PgConnection,
        id: DbId,
        last_cleaned_at: Option<Timestamp>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE equipment SET last_cleaned_at = $2 WHERE id = $1")
            .bind(id)
            .bind(last_cleaned_at)
            .execute(conn)
            .await?;
        Ok(())
    }
}
