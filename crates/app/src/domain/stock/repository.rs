//! Stock Ledger Repository

use imprint::stock::{EntryContext, StockChange, StockHistoryEntry, StockReason};
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar};
use uuid::Uuid;

use crate::domain::variants::records::VariantUuid;

const APPLY_STOCK_DELTA_SQL: &str = include_str!("sql/apply_stock_delta.sql");
const GET_STOCK_SQL: &str = include_str!("sql/get_stock.sql");
const LOCK_STOCK_SQL: &str = include_str!("sql/lock_stock.sql");
const CREATE_HISTORY_ENTRY_SQL: &str = include_str!("sql/create_history_entry.sql");
const LIST_HISTORY_SQL: &str = include_str!("sql/list_history.sql");

/// Wrapper decoding a `stock_history` row into a checked [`StockHistoryEntry`].
struct HistoryRow(StockHistoryEntry);

#[derive(Debug, Clone, Default)]
pub(crate) struct PgStockRepository;

impl PgStockRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Add `delta` to the stock quantity unless the result would be negative.
    ///
    /// Returns the previous and new quantities, or `None` when no row was updated.
    pub(crate) async fn apply_delta(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        variant: VariantUuid,
        delta: i64,
    ) -> Result<Option<(i64, i64)>, sqlx::Error> {
        query_as::<Postgres, (i64, i64)>(APPLY_STOCK_DELTA_SQL)
            .bind(variant.into_uuid())
            .bind(delta)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn get_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        variant: VariantUuid,
    ) -> Result<Option<u64>, sqlx::Error> {
        let quantity: Option<i64> = query_scalar(GET_STOCK_SQL)
            .bind(variant.into_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        quantity.map(|q| decode_quantity("stock_quantity", q)).transpose()
    }

    /// Read the stock quantity and hold a row lock until the transaction ends.
    pub(crate) async fn lock_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        variant: VariantUuid,
    ) -> Result<Option<u64>, sqlx::Error> {
        let quantity: Option<i64> = query_scalar(LOCK_STOCK_SQL)
            .bind(variant.into_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        quantity.map(|q| decode_quantity("stock_quantity", q)).transpose()
    }

    pub(crate) async fn create_entry(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        variant: VariantUuid,
        change: StockChange,
        reason: StockReason,
        context: EntryContext,
    ) -> Result<StockHistoryEntry, sqlx::Error> {
        let previous = encode_quantity("previous_quantity", change.previous_quantity())?;
        let new = encode_quantity("new_quantity", change.new_quantity())?;

        let row = query_as::<Postgres, HistoryRow>(CREATE_HISTORY_ENTRY_SQL)
            .bind(Uuid::now_v7())
            .bind(variant.into_uuid())
            .bind(context.order)
            .bind(change.quantity_change())
            .bind(previous)
            .bind(new)
            .bind(reason.as_str())
            .bind(context.notes)
            .bind(context.created_by)
            .fetch_one(&mut **tx)
            .await?;

        Ok(row.0)
    }

    pub(crate) async fn list_history(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        variant: VariantUuid,
        limit: u32,
    ) -> Result<Vec<StockHistoryEntry>, sqlx::Error> {
        let rows = query_as::<Postgres, HistoryRow>(LIST_HISTORY_SQL)
            .bind(variant.into_uuid())
            .bind(i64::from(limit))
            .fetch_all(&mut **tx)
            .await?;

        Ok(rows.into_iter().map(|row| row.0).collect())
    }
}

fn decode_quantity(column: &str, value: i64) -> Result<u64, sqlx::Error> {
    u64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn encode_quantity(column: &str, value: u64) -> Result<i64, sqlx::Error> {
    i64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, PgRow> for HistoryRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let previous = decode_quantity("previous_quantity", row.try_get("previous_quantity")?)?;
        let new = decode_quantity("new_quantity", row.try_get("new_quantity")?)?;

        let change = StockChange::from_parts(previous, row.try_get("quantity_change")?, new)
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "quantity_change".to_string(),
                source: Box::new(e),
            })?;

        let reason = row
            .try_get::<String, _>("reason")?
            .parse::<StockReason>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "reason".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self(StockHistoryEntry::new(
            row.try_get("uuid")?,
            row.try_get("product_variant_uuid")?,
            change,
            reason,
            EntryContext {
                order: row.try_get("order_uuid")?,
                notes: row.try_get("notes")?,
                created_by: row.try_get("created_by")?,
            },
            row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        )))
    }
}
