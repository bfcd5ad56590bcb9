//! Account roles and their capability sets.
//!
//! Role names must match the `CHECK` constraint on `users.role` in
//! `20260301000002_create_users.sql`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_TECHNICIAN: &str = "technician";
pub const ROLE_AUDITOR: &str = "auditor";

/// A user's role within the organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Technician,
    /// Read-only access to reports and exports.
    Auditor,
}

/// A single permission checked at request boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ManageEquipment,
    LogCleaning,
    ViewReports,
    ExportData,
    /// Acknowledge, resolve, or dismiss compliance alerts.
    ManageAlerts,
    /// Approve, reject, or flag submitted cleaning logs.
    ReviewCleanings,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Manager, Role::Technician, Role::Auditor];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Manager => ROLE_MANAGER,
            Role::Technician => ROLE_TECHNICIAN,
            Role::Auditor => ROLE_AUDITOR,
        }
    }

    /// The capability set granted to this role.
    pub fn capabilities(self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Role::Admin => &[
                ManageEquipment,
                LogCleaning,
                ViewReports,
                ExportData,
                ManageAlerts,
                ReviewCleanings,
            ],
            Role::Manager => &[
                ManageEquipment,
                LogCleaning,
                ViewReports,
                ExportData,
                ManageAlerts,
                ReviewCleanings,
            ],
            Role::Technician => &[LogCleaning],
            Role::Auditor => &[ViewReports, ExportData],
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Whether this role receives compliance notification emails.
    pub fn receives_alerts(self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("Unknown role '{s}'"))
    }
}
