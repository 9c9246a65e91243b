//! Size-bucket persistence shared by the product and sale stores.
//!
//! A record's `StockLevel` is split across two places: `has_sizes` and
//! `flat_quantity` on the owning row, and one row per size in the matching
//! `*_sizes` table.

use sqlx::SqliteConnection;

use crate::error::{DbError, DbResult};
use ims_core::{SizeQuantities, StockLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SizeTable {
    Product,
    Sale,
}

impl SizeTable {
    fn table(self) -> &'static str {
        match self {
            SizeTable::Product => "product_sizes",
            SizeTable::Sale => "sale_sizes",
        }
    }

    fn owner_column(self) -> &'static str {
        match self {
            SizeTable::Product => "product_id",
            SizeTable::Sale => "sale_id",
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SizeRow {
    size: String,
    quantity: i64,
}

/// Loads every size bucket of one record.
pub(crate) async fn load_sizes(
    conn: &mut SqliteConnection,
    table: SizeTable,
    owner_id: &str,
) -> DbResult<SizeQuantities> {
    let sql = format!(
        "SELECT size, quantity FROM {} WHERE {} = ? ORDER BY size",
        table.table(),
        table.owner_column()
    );

    let rows: Vec<SizeRow> = sqlx::query_as(&sql)
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await?;

    let mut sizes = SizeQuantities::new();
    for row in rows {
        sizes.set(row.size, to_quantity(table.table(), row.quantity)?);
    }
    Ok(sizes)
}

/// Replaces the size buckets of one record. Zero buckets are kept.
pub(crate) async fn replace_sizes(
    conn: &mut SqliteConnection,
    table: SizeTable,
    owner_id: &str,
    sizes: &SizeQuantities,
) -> DbResult<()> {
    let delete = format!(
        "DELETE FROM {} WHERE {} = ?",
        table.table(),
        table.owner_column()
    );
    sqlx::query(&delete).bind(owner_id).execute(&mut *conn).await?;

    let insert = format!(
        "INSERT INTO {} ({}, size, quantity) VALUES (?, ?, ?)",
        table.table(),
        table.owner_column()
    );
    for (size, quantity) in sizes.iter() {
        sqlx::query(&insert)
            .bind(owner_id)
            .bind(size)
            .bind(i64::from(quantity))
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Splits a level into the `(has_sizes, flat_quantity)` row columns.
pub(crate) fn stock_columns(level: &StockLevel) -> (bool, i64) {
    match level {
        StockLevel::Sized(_) => (true, 0),
        StockLevel::Flat(n) => (false, i64::from(*n)),
    }
}

/// Rebuilds a level from the row columns and the loaded buckets.
pub(crate) fn stock_level(
    table: &str,
    has_sizes: bool,
    flat_quantity: i64,
    sizes: SizeQuantities,
) -> DbResult<StockLevel> {
    if has_sizes {
        Ok(StockLevel::Sized(sizes))
    } else {
        Ok(StockLevel::Flat(to_quantity(table, flat_quantity)?))
    }
}

fn to_quantity(table: &str, value: i64) -> DbResult<u32> {
    u32::try_from(value)
        .map_err(|_| DbError::corrupt(table, format!("quantity {} out of range", value)))
}
