//! Equipment entity model and DTOs.

use cleantrack_core::compliance::CleaningSchedule;
use cleantrack_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `equipment` table.
///
/// `public_token` is a bearer credential for anonymous cleaning submission;
/// it is skipped when serializing and only returned by the issuance endpoint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Equipment {
    pub id: DbId,
    pub facility_id: DbId,
    pub name: String,
    pub serial_number: String,
    pub category: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub cleaning_frequency_hours: i32,
    pub is_active: bool,
    pub last_cleaned_at: Option<Timestamp>,
    #[serde(skip_serializing)]
    pub public_token: Option<String>,
    pub token_created_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Equipment {
    pub fn schedule(&self) -> CleaningSchedule {
        CleaningSchedule {
            cleaning_frequency_hours: self.cleaning_frequency_hours,
            last_cleaned_at: self.last_cleaned_at,
        }
    }
}

/// DTO for creating new equipment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEquipment {
    pub facility_id: DbId,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub serial_number: String,
    /// Defaults to `other` if omitted.
    pub category: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Defaults to 24 if omitted.
    pub cleaning_frequency_hours: Option<i32>,
}

/// DTO for updating equipment. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateEquipment {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub category: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub cleaning_frequency_hours: Option<i32>,
    pub is_active: Option<bool>,
}
