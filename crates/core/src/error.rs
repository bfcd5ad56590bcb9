use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Malformed, expired, or forged public token. The three causes are
    /// deliberately indistinguishable to callers.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// A cleaning log already exists for the equipment within the spam window.
    #[error("A cleaning was already registered for equipment {equipment_id} in the last hour")]
    DuplicateCleaningWindow { equipment_id: DbId },

    /// A lifecycle action is not allowed from the current state.
    #[error("Invalid transition: cannot {action} from '{from}'")]
    InvalidTransition { from: String, action: &'static str },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
