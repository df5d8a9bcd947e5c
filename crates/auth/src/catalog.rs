//! Permission catalog
//!
//! The complete set of permission strings the system knows about. The
//! seeder writes exactly these rows and routes declare their requirements
//! with the same types, so a guard can never ask for a permission that
//! was never seeded.
//!
//! A permission renders as `group:action`, e.g. `user:create`.

use std::fmt;

use serde::{Serialize, Serializer};

/// Resource group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PermissionGroup {
    User,
    Role,
    Permission,
    RolePermission,
    UserRole,
}

impl PermissionGroup {
    pub const ALL: [PermissionGroup; 5] = [
        Self::User,
        Self::Role,
        Self::Permission,
        Self::RolePermission,
        Self::UserRole,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "role" => Some(Self::Role),
            "permission" => Some(Self::Permission),
            "role_permission" => Some(Self::RolePermission),
            "user_role" => Some(Self::UserRole),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Role => "role",
            Self::Permission => "permission",
            Self::RolePermission => "role_permission",
            Self::UserRole => "user_role",
        }
    }
}

/// Action on a resource group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PermissionAction {
    Create,
    Read,
    Update,
    Delete,
    List,
}

impl PermissionAction {
    pub const ALL: [PermissionAction; 5] = [
        Self::Create,
        Self::Read,
        Self::Update,
        Self::Delete,
        Self::List,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Self::Create),
            "read" => Some(Self::Read),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "list" => Some(Self::List),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::List => "list",
        }
    }
}

/// A catalog permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Permission {
    pub group: PermissionGroup,
    pub action: PermissionAction,
}

impl Permission {
    pub const fn new(group: PermissionGroup, action: PermissionAction) -> Self {
        Self { group, action }
    }

    /// Parse `group:action`; anything outside the catalog is `None`
    pub fn parse(s: &str) -> Option<Self> {
        let (group, action) = s.split_once(':')?;
        Some(Self::new(
            PermissionGroup::parse(group)?,
            PermissionAction::parse(action)?,
        ))
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group.as_str(), self.action.as_str())
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Every group × action pair
pub fn catalog() -> impl Iterator<Item = Permission> {
    PermissionGroup::ALL.into_iter().flat_map(|group| {
        PermissionAction::ALL
            .into_iter()
            .map(move |action| Permission::new(group, action))
    })
}

/// Roles created by the seeder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalRole {
    /// Full catalog
    Admin,
    /// Read and list on users
    User,
}

impl CanonicalRole {
    pub const ALL: [CanonicalRole; 2] = [Self::Admin, Self::User];

    /// Stored role name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::User => "User",
        }
    }

    /// Permissions granted to this role
    pub fn grants(&self) -> Vec<Permission> {
        match self {
            Self::Admin => catalog().collect(),
            Self::User => vec![
                Permission::new(PermissionGroup::User, PermissionAction::Read),
                Permission::new(PermissionGroup::User, PermissionAction::List),
            ],
        }
    }
}
