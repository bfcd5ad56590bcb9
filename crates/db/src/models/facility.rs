//! Facility entity model and DTOs.

use cleantrack_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `facilities` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Facility {
    pub id: DbId,
    pub name: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new facility.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFacility {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 500))]
    pub address: Option<String>,
}
