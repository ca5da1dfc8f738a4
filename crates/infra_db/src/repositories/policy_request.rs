//! Policy request repository implementation
//!
//! Row-level access to the `policy_requests` and `policy_status_history`
//! tables. History rows are append-only: a save only inserts the positions
//! the table does not hold yet.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use crate::error::DatabaseError;

const SELECT_REQUEST: &str = r#"
    SELECT
        id,
        customer_id,
        product_id,
        category,
        sales_channel,
        payment_method,
        total_monthly_premium_amount,
        insured_amount,
        coverages,
        assistances,
        status,
        created_at,
        finished_at,
        version
    FROM policy_requests
"#;

/// Repository for policy request rows and their status history
#[derive(Debug, Clone)]
pub struct PolicyRequestStore {
    pool: PgPool,
}

impl PolicyRequestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Retrieves a request row by identifier
    pub async fn find(&self, id: Uuid) -> Result<Option<PolicyRequestRow>, DatabaseError> {
        let row = sqlx::query_as::<_, PolicyRequestRow>(&format!("{SELECT_REQUEST} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Retrieves every request row of a customer, oldest first
    pub async fn find_by_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<PolicyRequestRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PolicyRequestRow>(&format!(
            "{SELECT_REQUEST} WHERE customer_id = $1 ORDER BY created_at, id"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Retrieves the history of several requests, ordered by request then position
    pub async fn history_for(&self, ids: &[Uuid]) -> Result<Vec<StatusHistoryRow>, DatabaseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, StatusHistoryRow>(
            r#"
            SELECT policy_request_id, position, status, recorded_at
            FROM policy_status_history
            WHERE policy_request_id = ANY($1)
            ORDER BY policy_request_id, position
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Inserts a new request row together with its initial history
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEntry` if a row with the same id already exists
    pub async fn insert(
        &self,
        row: &PolicyRequestRow,
        history: &[StatusHistoryRow],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO policy_requests (
                id,
                customer_id,
                product_id,
                category,
                sales_channel,
                payment_method,
                total_monthly_premium_amount,
                insured_amount,
                coverages,
                assistances,
                status,
                created_at,
                finished_at,
                version,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NOW())
            "#,
        )
        .bind(row.id)
        .bind(row.customer_id)
        .bind(row.product_id)
        .bind(&row.category)
        .bind(&row.sales_channel)
        .bind(&row.payment_method)
        .bind(row.total_monthly_premium_amount)
        .bind(row.insured_amount)
        .bind(&row.coverages)
        .bind(&row.assistances)
        .bind(&row.status)
        .bind(row.created_at)
        .bind(row.finished_at)
        .bind(row.version)
        .execute(&mut *tx)
        .await?;

        append_history(&mut tx, row.id, 0, history).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Updates the mutable columns of a request and appends its new history
    ///
    /// The update only applies when the stored version equals
    /// `expected_version`; the row is then written with `row.version`.
    ///
    /// # Errors
    ///
    /// Returns `VersionConflict` when the stored version differs or the row
    /// is missing
    pub async fn update(
        &self,
        row: &PolicyRequestRow,
        expected_version: i64,
        history: &[StatusHistoryRow],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE policy_requests
            SET status = $1, finished_at = $2, version = $3, updated_at = NOW()
            WHERE id = $4 AND version = $5
            "#,
        )
        .bind(&row.status)
        .bind(row.finished_at)
        .bind(row.version)
        .bind(row.id)
        .bind(expected_version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::VersionConflict(format!(
                "policy request {} is not at version {}",
                row.id, expected_version
            )));
        }

        let stored: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM policy_status_history WHERE policy_request_id = $1",
        )
        .bind(row.id)
        .fetch_one(&mut *tx)
        .await?;

        append_history(&mut tx, row.id, stored, history).await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Inserts the history rows at or after position `from`
async fn append_history(
    tx: &mut Transaction<'_, Postgres>,
    policy_request_id: Uuid,
    from: i64,
    history: &[StatusHistoryRow],
) -> Result<(), DatabaseError> {
    for entry in history.iter().filter(|entry| i64::from(entry.position) >= from) {
        sqlx::query(
            r#"
            INSERT INTO policy_status_history (policy_request_id, position, status, recorded_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(policy_request_id)
        .bind(entry.position)
        .bind(&entry.status)
        .bind(entry.recorded_at)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Database row for `policy_requests`
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PolicyRequestRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub category: String,
    pub sales_channel: String,
    pub payment_method: String,
    pub total_monthly_premium_amount: Decimal,
    pub insured_amount: Decimal,
    pub coverages: Json<BTreeMap<String, Decimal>>,
    pub assistances: Json<BTreeSet<String>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub version: i64,
}

/// Database row for `policy_status_history`
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StatusHistoryRow {
    pub policy_request_id: Uuid,
    pub position: i32,
    pub status: String,
    pub recorded_at: DateTime<Utc>,
}
