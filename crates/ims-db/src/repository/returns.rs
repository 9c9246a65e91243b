//! # Return Repository
//!
//! Append-only log of processed returns. Records are inserted by the
//! reconciler inside its transaction and never updated afterwards.
//!
//! Returned quantities are stored as a JSON object in one column:
//!
//! ```text
//! id   sale_id  return_condition        quantities
//! R1   S        ADD_PRODUCT_QUANTITY    {"N/A":2}
//! R2   NULL     DEDUCT_PRODUCT_QUANTITY {"L":2}
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use ims_core::{ReturnCondition, ReturnRecord, SizeQuantities};

const SELECT_RETURN: &str = r#"
    SELECT id, product_id, sale_id, return_condition, quantities,
           reason, return_date, created_at
    FROM returns
"#;

#[derive(Debug, sqlx::FromRow)]
struct ReturnRow {
    id: String,
    product_id: Option<String>,
    sale_id: Option<String>,
    return_condition: ReturnCondition,
    quantities: String,
    reason: String,
    return_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReturnRow> for ReturnRecord {
    type Error = crate::error::DbError;

    fn try_from(row: ReturnRow) -> DbResult<Self> {
        let quantities: SizeQuantities = serde_json::from_str(&row.quantities)?;
        Ok(ReturnRecord {
            id: row.id,
            product_id: row.product_id,
            sale_id: row.sale_id,
            condition: row.return_condition,
            quantities,
            reason: row.reason,
            return_date: row.return_date,
            created_at: row.created_at,
        })
    }
}

/// Repository for return records.
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: SqlitePool,
}

impl ReturnRepository {
    /// Creates a new ReturnRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRepository { pool }
    }

    /// Appends a record outside any service transaction.
    pub async fn insert(&self, record: &ReturnRecord) -> DbResult<ReturnRecord> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_in(&mut conn, record).await?;
        Ok(record.clone())
    }

    /// Gets a return by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ReturnRecord>> {
        let sql = format!("{} WHERE id = ?", SELECT_RETURN);

        let row: Option<ReturnRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ReturnRecord::try_from).transpose()
    }

    /// Lists returns, newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<ReturnRecord>> {
        let sql = format!("{} ORDER BY rowid DESC LIMIT ?", SELECT_RETURN);

        let rows: Vec<ReturnRow> = sqlx::query_as(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ReturnRecord::try_from).collect()
    }

    /// Lists the returns filed against one sale, newest first.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<ReturnRecord>> {
        let sql = format!("{} WHERE sale_id = ? ORDER BY rowid DESC", SELECT_RETURN);

        let rows: Vec<ReturnRow> = sqlx::query_as(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ReturnRecord::try_from).collect()
    }

    /// Counts returns (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM returns")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub(crate) async fn insert_in(conn: &mut SqliteConnection, record: &ReturnRecord) -> DbResult<()> {
        debug!(
            id = %record.id,
            condition = %record.condition,
            sale_id = ?record.sale_id,
            product_id = ?record.product_id,
            "Inserting return"
        );

        let quantities = serde_json::to_string(&record.quantities)?;

        sqlx::query(
            r#"
            INSERT INTO returns (
                id, product_id, sale_id, return_condition, quantities,
                reason, return_date, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.product_id)
        .bind(&record.sale_id)
        .bind(record.condition)
        .bind(quantities)
        .bind(&record.reason)
        .bind(record.return_date)
        .bind(record.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

/// Generates a new return ID.
pub fn generate_return_id() -> String {
    Uuid::new_v4().to_string()
}
