//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role lacks
//! the required [`Capability`]. Use these in route handlers to enforce
//! authorization at the type level.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use cleantrack_core::error::CoreError;
use cleantrack_core::roles::{Capability, Role};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticate, then check that the user's role grants `capability`.
async fn require_capability(
    parts: &mut Parts,
    state: &AppState,
    capability: Capability,
    message: &'static str,
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if !user.role.can(capability) {
        tracing::debug!(user_id = user.user_id, role = %user.role, ?capability, "Capability denied");
        return Err(AppError::Core(CoreError::Forbidden(message.into())));
    }
    Ok(user)
}

/// Declare an extractor that requires one capability.
macro_rules! capability_extractor {
    ($(#[$meta:meta])* $name:ident, $capability:expr, $message:literal) => {
        $(#[$meta])*
        pub struct $name(pub AuthUser);

        impl FromRequestParts<AppState> for $name {
            type Rejection = AppError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                require_capability(parts, state, $capability, $message)
                    .await
                    .map($name)
            }
        }
    };
}

capability_extractor!(
    /// Create equipment and facilities, issue tokens.
    RequireManageEquipment,
    Capability::ManageEquipment,
    "Equipment management permission required"
);

capability_extractor!(
    /// Submit authenticated cleaning logs.
    RequireLogCleaning,
    Capability::LogCleaning,
    "Cleaning log permission required"
);

capability_extractor!(
    /// Approve, reject, or flag cleaning logs.
    RequireReviewCleanings,
    Capability::ReviewCleanings,
    "Cleaning review permission required"
);

capability_extractor!(
    /// Acknowledge, resolve, or dismiss alerts.
    RequireManageAlerts,
    Capability::ManageAlerts,
    "Alert management permission required"
);

capability_extractor!(
    /// Export audit data such as the token issuance trail.
    RequireExportData,
    Capability::ExportData,
    "Data export permission required"
);

capability_extractor!(
    /// Read compliance reports.
    RequireViewReports,
    Capability::ViewReports,
    "Report access permission required"
);

/// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}

/// Requires any authenticated user (any valid role).
///
/// Functionally equivalent to [`AuthUser`] but named explicitly for routes
/// where "this requires authentication" should be self-documenting.
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(RequireAuth(user))
    }
}
