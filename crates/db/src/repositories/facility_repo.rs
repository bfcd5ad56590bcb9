//! Repository for the `facilities` and `facility_managers` tables.

use cleantrack_core::types::DbId;
use sqlx::PgPool;

use crate::models::facility::{CreateFacility, Facility};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, address, is_active, created_at, updated_at";

/// Provides CRUD operations for facilities.
pub struct FacilityRepo;

impl FacilityRepo {
    /// Insert a new facility, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateFacility) -> Result<Facility, sqlx::Error> {
        let query = format!(
            "INSERT INTO facilities (name, address)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Facility>(&query)
            .bind(&input.name)
            .bind(&input.address)
            .fetch_one(pool)
            .await
    }

    /// Find a facility by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Facility>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM facilities WHERE id = $1");
        sqlx::query_as::<_, Facility>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List facilities ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Facility>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM facilities ORDER BY name");
        sqlx::query_as::<_, Facility>(&query).fetch_all(pool).await
    }

    /// Link a manager to a facility. Linking twice is a no-op.
    pub async fn add_manager(
        pool: &PgPool,
        facility_id: DbId,
        user_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO facility_managers (facility_id, user_id)
             VALUES ($1, $2)
             ON CONFLICT (facility_id, user_id) DO NOTHING",
        )
        .bind(facility_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
