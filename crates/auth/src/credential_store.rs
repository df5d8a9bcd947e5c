//! Staff credential storage
//!
//! Staff rows are never physically removed: deletion sets `deleted_at` and
//! every lookup filters tombstoned rows out.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use crate::error::{AuthError, Result};
use crate::password::hash_password;
use crate::staff::{NewStaff, StaffRecord, StaffRole, StaffStatus};

/// Storage operations the authorization core needs for staff records
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a live staff record by email
    async fn find_by_email(&self, email: &str) -> Result<Option<StaffRecord>>;

    /// Look up a live staff record by id
    async fn find_by_id(&self, id: i64) -> Result<Option<StaffRecord>>;

    /// Persist every mutable field of an existing record
    async fn save(&self, staff: &StaffRecord) -> Result<()>;

    /// Create a record, hashing the supplied password
    async fn create(&self, staff: NewStaff) -> Result<StaffRecord>;

    /// All live records ordered by id
    async fn list(&self) -> Result<Vec<StaffRecord>>;

    /// Tombstone a record
    async fn soft_delete(&self, id: i64) -> Result<()>;
}

const STAFF_COLUMNS: &str = "id, prefix, first_name, last_name, email, password_hash, role, \
                             status, phone, created_at, updated_at, deleted_at";

/// SQLite-backed credential store
#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_staff(row: &SqliteRow) -> Result<StaffRecord> {
    let id: i64 = row.try_get("id")?;
    let role: String = row.try_get("role")?;
    let status: String = row.try_get("status")?;

    Ok(StaffRecord {
        id,
        prefix: row.try_get("prefix")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: StaffRole::parse(&role).ok_or_else(|| {
            AuthError::DatabaseError(format!("staff {} has unknown role '{}'", id, role))
        })?,
        status: StaffStatus::parse(&status).ok_or_else(|| {
            AuthError::DatabaseError(format!("staff {} has unknown status '{}'", id, status))
        })?,
        phone: row.try_get("phone")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

fn map_unique(e: sqlx::Error, what: impl FnOnce() -> String) -> AuthError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::AlreadyExists(what()),
        _ => AuthError::from(e),
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<StaffRecord>> {
        let sql = format!(
            "SELECT {} FROM staff WHERE email = ? AND deleted_at IS NULL",
            STAFF_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_staff).transpose()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<StaffRecord>> {
        let sql = format!(
            "SELECT {} FROM staff WHERE id = ? AND deleted_at IS NULL",
            STAFF_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_staff).transpose()
    }

    async fn save(&self, staff: &StaffRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE staff
            SET prefix = ?, first_name = ?, last_name = ?, email = ?, password_hash = ?,
                role = ?, status = ?, phone = ?, updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&staff.prefix)
        .bind(&staff.first_name)
        .bind(&staff.last_name)
        .bind(&staff.email)
        .bind(&staff.password_hash)
        .bind(staff.role.as_str())
        .bind(staff.status.as_str())
        .bind(&staff.phone)
        .bind(Utc::now())
        .bind(staff.id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, || format!("staff email '{}'", staff.email)))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::StaffNotFound(staff.id));
        }
        Ok(())
    }

    async fn create(&self, staff: NewStaff) -> Result<StaffRecord> {
        let password_hash = hash_password(&staff.password)?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO staff (prefix, first_name, last_name, email, password_hash,
                               role, status, phone, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&staff.prefix)
        .bind(&staff.first_name)
        .bind(&staff.last_name)
        .bind(&staff.email)
        .bind(&password_hash)
        .bind(staff.role.as_str())
        .bind(staff.status.as_str())
        .bind(&staff.phone)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, || format!("staff email '{}'", staff.email)))?;

        let id = result.last_insert_rowid();
        self.find_by_id(id)
            .await?
            .ok_or(AuthError::StaffNotFound(id))
    }

    async fn list(&self) -> Result<Vec<StaffRecord>> {
        let sql = format!(
            "SELECT {} FROM staff WHERE deleted_at IS NULL ORDER BY id",
            STAFF_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(row_to_staff).collect()
    }

    async fn soft_delete(&self, id: i64) -> Result<()> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE staff SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::StaffNotFound(id));
        }
        Ok(())
    }
}
