//! Staff roles, account status and the authenticated principal
//!
//! # Roles and levels
//!
//! Every role maps to a numeric privilege level carried in the token
//! audience (`staff:<level>`). Bearer-guarded routes compare against it.
//!
//! | Role | Level |
//! |------|-------|
//! | `citizen` | 1 |
//! | `collector` | 4 |
//! | `driver` | 4 |
//! | `route_manager` | 7 |
//! | `admin` | 9 |

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Staff role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Admin,
    RouteManager,
    Driver,
    Collector,
    Citizen,
}

impl StaffRole {
    /// All roles, most privileged first
    pub const ALL: [StaffRole; 5] = [
        Self::Admin,
        Self::RouteManager,
        Self::Driver,
        Self::Collector,
        Self::Citizen,
    ];

    /// Parse role from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "route_manager" => Some(Self::RouteManager),
            "driver" => Some(Self::Driver),
            "collector" => Some(Self::Collector),
            "citizen" => Some(Self::Citizen),
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::RouteManager => "route_manager",
            Self::Driver => "driver",
            Self::Collector => "collector",
            Self::Citizen => "citizen",
        }
    }

    /// Privilege level encoded in issued tokens
    pub fn level(&self) -> u8 {
        match self {
            Self::Admin => 9,
            Self::RouteManager => 7,
            Self::Driver | Self::Collector => 4,
            Self::Citizen => 1,
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffStatus {
    Active,
    Inactive,
    OnLeave,
}

impl StaffStatus {
    /// Parse status from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "on_leave" => Some(Self::OnLeave),
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::OnLeave => "on_leave",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for StaffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Authenticated identity attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub email: String,
    pub role: StaffRole,
    pub status: StaffStatus,
}

impl Principal {
    pub fn new(id: i64, email: impl Into<String>, role: StaffRole, status: StaffStatus) -> Self {
        Self {
            id,
            email: email.into(),
            role,
            status,
        }
    }

    /// Check if the principal holds one of the given roles
    pub fn has_any_role(&self, roles: &[StaffRole]) -> bool {
        roles.contains(&self.role)
    }
}

/// Persisted staff record
#[derive(Debug, Clone, Serialize)]
pub struct StaffRecord {
    pub id: i64,
    pub prefix: String,
    #[serde(rename = "firstname")]
    pub first_name: String,
    #[serde(rename = "lastname")]
    pub last_name: String,
    pub email: String,
    /// Argon2 PHC string, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: StaffRole,
    pub status: StaffStatus,
    #[serde(rename = "phone_number")]
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl StaffRecord {
    /// Identity snapshot for token issuance
    pub fn to_principal(&self) -> Principal {
        Principal::new(self.id, &self.email, self.role, self.status)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Fields required to create a staff record
#[derive(Debug, Clone, Deserialize)]
pub struct NewStaff {
    #[serde(default)]
    pub prefix: String,
    #[serde(default, rename = "firstname")]
    pub first_name: String,
    #[serde(default, rename = "lastname")]
    pub last_name: String,
    pub email: String,
    /// Plain-text password, hashed before storage
    pub password: String,
    pub role: StaffRole,
    #[serde(default = "default_status")]
    pub status: StaffStatus,
    #[serde(default, rename = "phone_number")]
    pub phone: String,
}

fn default_status() -> StaffStatus {
    StaffStatus::Active
}

impl NewStaff {
    /// Minimal record with empty contact fields
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        role: StaffRole,
        status: StaffStatus,
    ) -> Self {
        Self {
            prefix: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            email: email.into(),
            password: password.into(),
            role,
            status,
            phone: String::new(),
        }
    }
}
