//! Order Fulfillment Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::domain::{
    coupons::records::CouponUuid,
    fulfillment::{
        data::OrderLine,
        records::{FulfillmentLine, FulfillmentStatus, OrderFulfillmentRecord, OrderUuid},
    },
    variants::records::VariantUuid,
};

const CLAIM_ORDER_SQL: &str = include_str!("sql/claim_order.sql");
const CREATE_LINE_SQL: &str = include_str!("sql/create_line.sql");
const GET_FULFILLMENT_SQL: &str = include_str!("sql/get_fulfillment.sql");
const LIST_LINES_SQL: &str = include_str!("sql/list_lines.sql");
const TRANSITION_STATUS_SQL: &str = include_str!("sql/transition_status.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgFulfillmentRepository;

impl PgFulfillmentRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert the order row unless it already exists.
    ///
    /// Returns `false` when another delivery claimed the order first.
    pub(crate) async fn claim_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        coupon: Option<CouponUuid>,
        actor: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        let claimed: Option<Uuid> = query_scalar(CLAIM_ORDER_SQL)
            .bind(order.into_uuid())
            .bind(coupon.map(CouponUuid::into_uuid))
            .bind(actor)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(claimed.is_some())
    }

    pub(crate) async fn create_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        lines: &[OrderLine],
    ) -> Result<(), sqlx::Error> {
        for (position, line) in lines.iter().enumerate() {
            let position = i32::try_from(position).map_err(|e| sqlx::Error::ColumnDecode {
                index: "position".to_string(),
                source: Box::new(e),
            })?;

            let quantity = i64::try_from(line.quantity).map_err(|e| sqlx::Error::ColumnDecode {
                index: "quantity".to_string(),
                source: Box::new(e),
            })?;

            query(CREATE_LINE_SQL)
                .bind(order.into_uuid())
                .bind(position)
                .bind(line.variant.into_uuid())
                .bind(quantity)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }

    pub(crate) async fn get_fulfillment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderFulfillmentRecord, sqlx::Error> {
        let mut record = query_as::<Postgres, OrderFulfillmentRecord>(GET_FULFILLMENT_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        record.lines = query_as::<Postgres, FulfillmentLine>(LIST_LINES_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        Ok(record)
    }

    /// Move the order from `from` to `to`, optionally replacing the review notes.
    ///
    /// Returns `false` when the order is not currently in `from`.
    pub(crate) async fn transition(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        from: FulfillmentStatus,
        to: FulfillmentStatus,
        notes: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = query(TRANSITION_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(from.as_str())
            .bind(to.as_str())
            .bind(notes)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

impl<'r> FromRow<'r, PgRow> for OrderFulfillmentRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;

        let status = status
            .parse::<FulfillmentStatus>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            coupon_uuid: row
                .try_get::<Option<Uuid>, _>("coupon_uuid")?
                .map(CouponUuid::from_uuid),
            status,
            review_notes: row.try_get("review_notes")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            lines: Vec::new(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for FulfillmentLine {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let position: i32 = row.try_get("position")?;
        let quantity: i64 = row.try_get("quantity")?;

        Ok(Self {
            position: u32::try_from(position).map_err(|e| sqlx::Error::ColumnDecode {
                index: "position".to_string(),
                source: Box::new(e),
            })?,
            variant: VariantUuid::from_uuid(row.try_get("product_variant_uuid")?),
            quantity: u64::try_from(quantity).map_err(|e| sqlx::Error::ColumnDecode {
                index: "quantity".to_string(),
                source: Box::new(e),
            })?,
        })
    }
}
