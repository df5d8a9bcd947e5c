//! Role-permission storage and effective permission resolution
//!
//! ```text
//! staff ──< user_roles >── roles ──< role_permissions >── permissions
//! ```
//!
//! A staff member's effective permissions are the union of the permissions
//! of every role assigned to them. They are resolved with a single join on
//! every request and never cached. Soft-deleted staff resolve to nothing.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use sqlx::Row;
use sqlx::sqlite::SqlitePool;
use tracing::{debug, info};

use crate::catalog::{CanonicalRole, Permission, catalog};
use crate::error::{AuthError, Result};

/// Stored permission row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionRecord {
    pub id: i64,
    pub group: String,
    pub name: String,
}

impl PermissionRecord {
    /// `group:name`
    pub fn key(&self) -> String {
        format!("{}:{}", self.group, self.name)
    }
}

/// Stored role with its granted permission strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleRecord {
    pub id: i64,
    pub name: String,
    pub permissions: Vec<String>,
}

/// Rows inserted by one seeding run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub permissions_created: u64,
    pub roles_created: u64,
    pub grants_created: u64,
}

impl SeedReport {
    /// True when the run changed nothing
    pub fn is_noop(&self) -> bool {
        self.permissions_created == 0 && self.roles_created == 0 && self.grants_created == 0
    }
}

/// Role-based access control storage
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Union of `group:name` strings over all roles held by `staff_id`
    ///
    /// A staff member without roles has an empty set, not an error.
    async fn resolve_effective_permissions(&self, staff_id: i64) -> Result<BTreeSet<String>>;

    /// Insert the catalog, the canonical roles and their grants where missing
    async fn ensure_canonical_permissions(&self) -> Result<SeedReport>;

    async fn list_permissions(&self) -> Result<Vec<PermissionRecord>>;

    async fn list_roles(&self) -> Result<Vec<RoleRecord>>;

    async fn find_role(&self, name: &str) -> Result<Option<RoleRecord>>;

    /// Role by id with its grants
    async fn get_role(&self, role_id: i64) -> Result<RoleRecord>;

    /// Create an empty role; duplicate names are rejected
    async fn create_role(&self, name: &str) -> Result<RoleRecord>;

    async fn rename_role(&self, role_id: i64, name: &str) -> Result<RoleRecord>;

    /// Delete a role, dropping its grants and assignments
    ///
    /// `false` if no such role existed.
    async fn delete_role(&self, role_id: i64) -> Result<bool>;

    /// `group:name` strings granted to one role
    async fn list_role_permissions(&self, role_id: i64) -> Result<Vec<String>>;

    /// Roles assigned to a staff member
    async fn list_user_roles(&self, staff_id: i64) -> Result<Vec<RoleRecord>>;

    /// Grant a permission to a role; `false` if it was already granted
    async fn grant_permission(&self, role_id: i64, permission: Permission) -> Result<bool>;

    /// Revoke a permission from a role; `false` if it was not granted
    async fn revoke_permission(&self, role_id: i64, permission: Permission) -> Result<bool>;

    /// Assign a role to a staff member; `false` if already assigned
    async fn assign_role(&self, staff_id: i64, role_id: i64) -> Result<bool>;

    /// Remove a role from a staff member; `false` if it was not assigned
    async fn unassign_role(&self, staff_id: i64, role_id: i64) -> Result<bool>;
}

/// SQLite-backed permission store
#[derive(Debug, Clone)]
pub struct SqlitePermissionStore {
    pool: SqlitePool,
}

impl SqlitePermissionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn require_role(&self, role_id: i64) -> Result<()> {
        let exists = sqlx::query("SELECT 1 FROM roles WHERE id = ?")
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await?;
        match exists {
            Some(_) => Ok(()),
            None => Err(AuthError::RoleNotFound(role_id.to_string())),
        }
    }

    async fn require_staff(&self, staff_id: i64) -> Result<()> {
        let exists = sqlx::query("SELECT 1 FROM staff WHERE id = ? AND deleted_at IS NULL")
            .bind(staff_id)
            .fetch_optional(&self.pool)
            .await?;
        match exists {
            Some(_) => Ok(()),
            None => Err(AuthError::StaffNotFound(staff_id)),
        }
    }

    async fn role_permissions(&self, role_id: i64) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT p.group_name || ':' || p.name AS permission
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = ?
            ORDER BY p.id
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get("permission").map_err(AuthError::from))
            .collect()
    }
}

#[async_trait]
impl PermissionStore for SqlitePermissionStore {
    async fn resolve_effective_permissions(&self, staff_id: i64) -> Result<BTreeSet<String>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT p.group_name || ':' || p.name AS permission
            FROM user_roles ur
            JOIN staff s ON s.id = ur.user_id AND s.deleted_at IS NULL
            JOIN role_permissions rp ON rp.role_id = ur.role_id
            JOIN permissions p ON p.id = rp.permission_id
            WHERE ur.user_id = ?
            "#,
        )
        .bind(staff_id)
        .fetch_all(&self.pool)
        .await?;

        let permissions = rows
            .iter()
            .map(|row| row.try_get::<String, _>("permission"))
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;

        debug!(staff_id, count = permissions.len(), "resolved effective permissions");
        Ok(permissions)
    }

    async fn ensure_canonical_permissions(&self) -> Result<SeedReport> {
        let now = Utc::now();
        let mut report = SeedReport::default();
        let mut tx = self.pool.begin().await?;

        for permission in catalog() {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO permissions (group_name, name, created_at) VALUES (?, ?, ?)",
            )
            .bind(permission.group.as_str())
            .bind(permission.action.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;
            report.permissions_created += result.rows_affected();
        }

        for role in CanonicalRole::ALL {
            let result = sqlx::query("INSERT OR IGNORE INTO roles (name, created_at) VALUES (?, ?)")
                .bind(role.name())
                .bind(now)
                .execute(&mut *tx)
                .await?;
            report.roles_created += result.rows_affected();

            for permission in role.grants() {
                let result = sqlx::query(
                    r#"
                    INSERT OR IGNORE INTO role_permissions (role_id, permission_id, created_at)
                    SELECT r.id, p.id, ?
                    FROM roles r, permissions p
                    WHERE r.name = ? AND p.group_name = ? AND p.name = ?
                    "#,
                )
                .bind(now)
                .bind(role.name())
                .bind(permission.group.as_str())
                .bind(permission.action.as_str())
                .execute(&mut *tx)
                .await?;
                report.grants_created += result.rows_affected();
            }
        }

        tx.commit().await?;

        info!(
            permissions_created = report.permissions_created,
            roles_created = report.roles_created,
            grants_created = report.grants_created,
            "canonical permissions ensured"
        );
        Ok(report)
    }

    async fn list_permissions(&self) -> Result<Vec<PermissionRecord>> {
        let rows = sqlx::query("SELECT id, group_name, name FROM permissions ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(PermissionRecord {
                    id: row.try_get("id")?,
                    group: row.try_get("group_name")?,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    async fn list_roles(&self) -> Result<Vec<RoleRecord>> {
        let roles = sqlx::query("SELECT id, name FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        let grants = sqlx::query(
            r#"
            SELECT rp.role_id, p.group_name || ':' || p.name AS permission
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            ORDER BY rp.role_id, p.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(roles.len());
        for row in &roles {
            records.push(RoleRecord {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                permissions: Vec::new(),
            });
        }
        for row in &grants {
            let role_id: i64 = row.try_get("role_id")?;
            if let Some(record) = records.iter_mut().find(|r| r.id == role_id) {
                record.permissions.push(row.try_get("permission")?);
            }
        }
        Ok(records)
    }

    async fn find_role(&self, name: &str) -> Result<Option<RoleRecord>> {
        let row = sqlx::query("SELECT id, name FROM roles WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let id: i64 = row.try_get("id")?;
        Ok(Some(RoleRecord {
            id,
            name: row.try_get("name")?,
            permissions: self.role_permissions(id).await?,
        }))
    }

    async fn get_role(&self, role_id: i64) -> Result<RoleRecord> {
        let row = sqlx::query("SELECT id, name FROM roles WHERE id = ?")
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AuthError::RoleNotFound(role_id.to_string()))?;

        Ok(RoleRecord {
            id: role_id,
            name: row.try_get("name")?,
            permissions: self.role_permissions(role_id).await?,
        })
    }

    async fn create_role(&self, name: &str) -> Result<RoleRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::invalid_value("role name", name));
        }

        let result = sqlx::query("INSERT INTO roles (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AuthError::AlreadyExists(format!("role '{}'", name))
                }
                _ => AuthError::from(e),
            })?;

        info!(role = name, "role created");
        Ok(RoleRecord {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            permissions: Vec::new(),
        })
    }

    async fn rename_role(&self, role_id: i64, name: &str) -> Result<RoleRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::invalid_value("role name", name));
        }

        let result = sqlx::query("UPDATE roles SET name = ? WHERE id = ?")
            .bind(name)
            .bind(role_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AuthError::AlreadyExists(format!("role '{}'", name))
                }
                _ => AuthError::from(e),
            })?;
        if result.rows_affected() == 0 {
            return Err(AuthError::RoleNotFound(role_id.to_string()));
        }

        info!(role_id, role = name, "role renamed");
        self.get_role(role_id).await
    }

    async fn delete_role(&self, role_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM roles WHERE id = ?")
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(role_id, "role deleted");
        }
        Ok(deleted)
    }

    async fn list_role_permissions(&self, role_id: i64) -> Result<Vec<String>> {
        self.require_role(role_id).await?;
        self.role_permissions(role_id).await
    }

    async fn list_user_roles(&self, staff_id: i64) -> Result<Vec<RoleRecord>> {
        self.require_staff(staff_id).await?;

        let rows = sqlx::query(
            r#"
            SELECT r.id, r.name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = ?
            ORDER BY r.id
            "#,
        )
        .bind(staff_id)
        .fetch_all(&self.pool)
        .await?;

        let mut roles = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: i64 = row.try_get("id")?;
            roles.push(RoleRecord {
                id,
                name: row.try_get("name")?,
                permissions: self.role_permissions(id).await?,
            });
        }
        Ok(roles)
    }

    async fn grant_permission(&self, role_id: i64, permission: Permission) -> Result<bool> {
        self.require_role(role_id).await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT OR IGNORE INTO permissions (group_name, name, created_at) VALUES (?, ?, ?)",
        )
        .bind(permission.group.as_str())
        .bind(permission.action.as_str())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO role_permissions (role_id, permission_id, created_at)
            SELECT ?, p.id, ?
            FROM permissions p
            WHERE p.group_name = ? AND p.name = ?
            "#,
        )
        .bind(role_id)
        .bind(Utc::now())
        .bind(permission.group.as_str())
        .bind(permission.action.as_str())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        let granted = result.rows_affected() > 0;
        if granted {
            info!(role_id, permission = %permission, "permission granted");
        }
        Ok(granted)
    }

    async fn revoke_permission(&self, role_id: i64, permission: Permission) -> Result<bool> {
        self.require_role(role_id).await?;

        let result = sqlx::query(
            r#"
            DELETE FROM role_permissions
            WHERE role_id = ?
              AND permission_id IN (
                  SELECT id FROM permissions WHERE group_name = ? AND name = ?
              )
            "#,
        )
        .bind(role_id)
        .bind(permission.group.as_str())
        .bind(permission.action.as_str())
        .execute(&self.pool)
        .await?;

        let revoked = result.rows_affected() > 0;
        if revoked {
            info!(role_id, permission = %permission, "permission revoked");
        }
        Ok(revoked)
    }

    async fn assign_role(&self, staff_id: i64, role_id: i64) -> Result<bool> {
        self.require_staff(staff_id).await?;
        self.require_role(role_id).await?;

        let result = sqlx::query(
            "INSERT OR IGNORE INTO user_roles (user_id, role_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(staff_id)
        .bind(role_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let assigned = result.rows_affected() > 0;
        if assigned {
            info!(staff_id, role_id, "role assigned");
        }
        Ok(assigned)
    }

    async fn unassign_role(&self, staff_id: i64, role_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = ? AND role_id = ?")
            .bind(staff_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            info!(staff_id, role_id, "role unassigned");
        }
        Ok(removed)
    }
}
