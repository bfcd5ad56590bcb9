//! Compliance alert entity model.

use cleantrack_core::alert::{AlertStatus, AlertType, NewAlert};
use cleantrack_core::error::CoreError;
use cleantrack_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `compliance_alerts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ComplianceAlert {
    pub id: DbId,
    pub equipment_id: DbId,
    pub alert_type: String,
    pub severity: String,
    pub title: String,
    pub message: String,
    pub suggested_action: Option<String>,
    pub status: String,
    pub acknowledged_by: Option<DbId>,
    pub acknowledged_at: Option<Timestamp>,
    pub resolved_by: Option<DbId>,
    pub resolved_at: Option<Timestamp>,
    pub resolution_notes: Option<String>,
    pub dismissed_by: Option<DbId>,
    pub dismissed_at: Option<Timestamp>,
    pub related_cleaning_log_id: Option<DbId>,
    pub email_sent: bool,
    pub email_sent_at: Option<Timestamp>,
    pub due_by: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ComplianceAlert {
    pub fn status(&self) -> Result<AlertStatus, CoreError> {
        self.status.parse()
    }

    pub fn alert_type(&self) -> Result<AlertType, CoreError> {
        self.alert_type.parse()
    }
}

/// Insert payload for an alert. Mirrors the core's planned alert.
#[derive(Debug, Clone)]
pub struct CreateAlert {
    pub equipment_id: DbId,
    pub alert_type: String,
    pub severity: String,
    pub title: String,
    pub message: String,
    pub suggested_action: Option<String>,
    pub due_by: Option<Timestamp>,
    pub related_cleaning_log_id: Option<DbId>,
}

impl From<NewAlert> for CreateAlert {
    fn from(alert: NewAlert) -> Self {
        Self {
            equipment_id: alert.equipment_id,
            alert_type: alert.alert_type.as_str().to_string(),
            severity: alert.severity.as_str().to_string(),
            title: alert.title,
            message: alert.message,
            suggested_action: Some(alert.suggested_action),
            due_by: alert.due_by,
            related_cleaning_log_id: None,
        }
    }
}

/// Query filters for listing alerts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertFilter {
    pub status: Option<String>,
    pub equipment_id: Option<DbId>,
    pub alert_type: Option<String>,
}
