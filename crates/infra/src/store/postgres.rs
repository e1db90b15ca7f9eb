//! Postgres-backed submission store.
//!
//! Course and status are stored as their lowercase wire names and parsed back
//! on read; a row that no longer parses is reported as a storage error.
//!
//! | SQLx error | Code | `StoreError` |
//! |------------|------|--------------|
//! | Database (unique violation) | `23505` | `AlreadyExists` |
//! | anything else | | `Storage` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use academy_core::{Course, Submission, SubmissionId, SubmissionStatus};

use super::{StoreError, SubmissionPage, SubmissionStore, page_offset};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS contact_submissions (
    id            UUID PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL,
    phone         TEXT NOT NULL,
    course        TEXT NOT NULL,
    message       TEXT NOT NULL,
    ip_address    TEXT NOT NULL,
    user_agent    TEXT NOT NULL,
    submitted_at  TIMESTAMPTZ NOT NULL,
    status        TEXT NOT NULL DEFAULT 'pending'
);
CREATE INDEX IF NOT EXISTS contact_submissions_submitted_at_idx
    ON contact_submissions (submitted_at DESC, id DESC);
"#;

const COLUMNS: &str =
    "id, name, email, phone, course, message, ip_address, user_agent, submitted_at, status";

#[derive(Debug, Clone)]
pub struct PostgresSubmissionStore {
    pool: Arc<PgPool>,
}

impl PostgresSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Connect and make sure the table exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", None, e))?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", None, e))?;
        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for PostgresSubmissionStore {
    #[instrument(skip(self, submission), fields(id = %submission.id), err)]
    async fn insert(&self, submission: &Submission) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO contact_submissions ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ))
        .bind(submission.id.as_uuid())
        .bind(&submission.name)
        .bind(&submission.email)
        .bind(&submission.phone)
        .bind(submission.course.as_str())
        .bind(&submission.message)
        .bind(&submission.ip_address)
        .bind(&submission.user_agent)
        .bind(submission.submitted_at)
        .bind(submission.status.as_str())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", Some(submission.id), e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list(&self, page: u32, limit: u32) -> Result<SubmissionPage, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contact_submissions")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count", None, e))?;

        let offset = i64::try_from(page_offset(page, limit)).unwrap_or(i64::MAX);
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM contact_submissions ORDER BY submitted_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list", None, e))?;

        let items = rows.iter().map(row_to_submission).collect::<Result<Vec<_>, _>>()?;
        Ok(SubmissionPage {
            items,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn get(&self, id: SubmissionId) -> Result<Option<Submission>, StoreError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM contact_submissions WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", Some(id), e))?;
        row.as_ref().map(row_to_submission).transpose()
    }

    #[instrument(skip(self), fields(id = %id, status = %status), err)]
    async fn set_status(
        &self,
        id: SubmissionId,
        status: SubmissionStatus,
    ) -> Result<Option<Submission>, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE contact_submissions SET status = $2 WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(status.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_status", Some(id), e))?;
        row.as_ref().map(row_to_submission).transpose()
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

fn row_to_submission(row: &PgRow) -> Result<Submission, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Storage(format!("failed to decode submission row: {e}"));

    let id: Uuid = row.try_get("id").map_err(decode)?;
    let course: String = row.try_get("course").map_err(decode)?;
    let status: String = row.try_get("status").map_err(decode)?;
    let submitted_at: DateTime<Utc> = row.try_get("submitted_at").map_err(decode)?;

    Ok(Submission {
        id: SubmissionId::from_uuid(id),
        name: row.try_get("name").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        phone: row.try_get("phone").map_err(decode)?,
        course: course
            .parse::<Course>()
            .map_err(|e| StoreError::Storage(e.to_string()))?,
        message: row.try_get("message").map_err(decode)?,
        ip_address: row.try_get("ip_address").map_err(decode)?,
        user_agent: row.try_get("user_agent").map_err(decode)?,
        submitted_at,
        status: status
            .parse::<SubmissionStatus>()
            .map_err(|e| StoreError::Storage(e.to_string()))?,
    })
}

fn map_sqlx_error(operation: &str, id: Option<SubmissionId>, err: sqlx::Error) -> StoreError {
    match (&err, id) {
        (sqlx::Error::Database(db_err), Some(id)) if db_err.code().as_deref() == Some("23505") => {
            StoreError::AlreadyExists(id)
        }
        (sqlx::Error::PoolClosed, _) => {
            StoreError::Storage(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Storage(format!("database error in {operation}: {err}")),
    }
}
