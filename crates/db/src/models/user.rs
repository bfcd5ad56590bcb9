//! User entity model and DTOs.
//!
//! Accounts are provisioned by the identity service; this table mirrors the
//! fields needed for authorization and notification routing.

use cleantrack_core::error::CoreError;
use cleantrack_core::roles::Role;
use cleantrack_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub full_name: String,
    /// One of `admin`, `manager`, `technician`, `auditor`.
    pub role: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn role(&self) -> Result<Role, CoreError> {
        self.role
            .parse()
            .map_err(|e: String| CoreError::Internal(format!("user {}: {e}", self.id)))
    }
}

/// DTO for creating a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

/// Minimal projection used when addressing notification emails.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct Recipient {
    pub id: DbId,
    pub email: String,
    pub full_name: String,
}
