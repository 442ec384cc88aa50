//! Coupons Repository

use imprint::coupons::CouponCode;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use sqlx::{
    FromRow, Postgres, Row, Transaction,
    postgres::{PgArguments, PgRow},
    query::QueryAs,
    query_as, query_scalar,
};
use uuid::Uuid;

use crate::domain::coupons::{
    data::{CouponDetails, CouponValue},
    records::{CouponRecord, CouponUuid},
};

const CREATE_COUPON_SQL: &str = include_str!("sql/create_coupon.sql");
const UPDATE_COUPON_SQL: &str = include_str!("sql/update_coupon.sql");
const GET_COUPON_SQL: &str = include_str!("sql/get_coupon.sql");
const GET_COUPON_BY_CODE_SQL: &str = include_str!("sql/get_coupon_by_code.sql");
const LIST_COUPONS_SQL: &str = include_str!("sql/list_coupons.sql");
const INCREMENT_USAGE_SQL: &str = include_str!("sql/increment_usage.sql");
const CORRECT_USAGE_SQL: &str = include_str!("sql/correct_usage.sql");
const COUPON_EXISTS_SQL: &str = include_str!("sql/coupon_exists.sql");

type CouponQuery<'q> = QueryAs<'q, Postgres, CouponRecord, PgArguments>;

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCouponsRepository;

impl PgCouponsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
        details: CouponDetails,
    ) -> Result<CouponRecord, sqlx::Error> {
        bind_details(
            query_as::<Postgres, CouponRecord>(CREATE_COUPON_SQL).bind(coupon.into_uuid()),
            details,
        )?
        .fetch_one(&mut **tx)
        .await
    }

    pub(crate) async fn update_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
        details: CouponDetails,
    ) -> Result<CouponRecord, sqlx::Error> {
        bind_details(
            query_as::<Postgres, CouponRecord>(UPDATE_COUPON_SQL).bind(coupon.into_uuid()),
            details,
        )?
        .fetch_one(&mut **tx)
        .await
    }

    pub(crate) async fn get_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<CouponRecord, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(GET_COUPON_SQL)
            .bind(coupon.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_by_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &CouponCode,
    ) -> Result<Option<CouponRecord>, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(GET_COUPON_BY_CODE_SQL)
            .bind(code.as_str())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn list_coupons(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<CouponRecord>, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(LIST_COUPONS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    /// Add one redemption unless the usage limit has been reached.
    ///
    /// Returns `None` when the coupon is missing or exhausted.
    pub(crate) async fn increment_usage(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<Option<CouponRecord>, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(INCREMENT_USAGE_SQL)
            .bind(coupon.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn correct_usage(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
        usage_count: u64,
    ) -> Result<CouponRecord, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(CORRECT_USAGE_SQL)
            .bind(coupon.into_uuid())
            .bind(encode_u64("usage_count", usage_count)?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn coupon_exists(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<bool, sqlx::Error> {
        query_scalar(COUPON_EXISTS_SQL)
            .bind(coupon.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}

fn bind_details(
    query: CouponQuery<'_>,
    details: CouponDetails,
) -> Result<CouponQuery<'_>, sqlx::Error> {
    let (percentage, amount) = match details.value {
        CouponValue::Percentage(points) => (Some(points), None),
        CouponValue::Fixed(amount) => (None, Some(encode_u64("amount", amount)?)),
    };

    Ok(query
        .bind(details.code.as_str().to_string())
        .bind(details.value.kind_as_str())
        .bind(percentage)
        .bind(amount)
        .bind(encode_optional("min_purchase_amount", details.min_purchase_amount)?)
        .bind(encode_optional("max_discount_amount", details.max_discount_amount)?)
        .bind(SqlxTimestamp::from(details.valid_from))
        .bind(SqlxTimestamp::from(details.valid_until))
        .bind(encode_optional("usage_limit", details.usage_limit)?)
        .bind(details.is_active)
        .bind(details.applicable_products)
        .bind(details.applicable_categories))
}

fn encode_u64(column: &str, value: u64) -> Result<i64, sqlx::Error> {
    i64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn encode_optional(column: &str, value: Option<u64>) -> Result<Option<i64>, sqlx::Error> {
    value.map(|v| encode_u64(column, v)).transpose()
}

fn decode_optional(row: &PgRow, column: &str) -> Result<Option<u64>, sqlx::Error> {
    row.try_get::<Option<i64>, _>(column)?
        .map(|v| {
            u64::try_from(v).map_err(|e| sqlx::Error::ColumnDecode {
                index: column.to_string(),
                source: Box::new(e),
            })
        })
        .transpose()
}

impl<'r> FromRow<'r, PgRow> for CouponRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let kind: String = row.try_get("kind")?;

        let value = match kind.as_str() {
            "percentage" => CouponValue::Percentage(row.try_get::<Decimal, _>("percentage")?),
            "fixed" => CouponValue::Fixed(decode_optional(row, "amount")?.ok_or_else(|| {
                sqlx::Error::ColumnDecode {
                    index: "amount".to_string(),
                    source: "fixed coupon without amount".into(),
                }
            })?),
            other => {
                return Err(sqlx::Error::ColumnDecode {
                    index: "kind".to_string(),
                    source: format!("unknown coupon kind: {other}").into(),
                });
            }
        };

        let code: String = row.try_get("code")?;

        let code = CouponCode::new(&code).map_err(|e| sqlx::Error::ColumnDecode {
            index: "code".to_string(),
            source: Box::new(e),
        })?;

        let usage_count_i64: i64 = row.try_get("usage_count")?;

        let usage_count = u64::try_from(usage_count_i64).map_err(|e| sqlx::Error::ColumnDecode {
            index: "usage_count".to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            uuid: CouponUuid::from_uuid(row.try_get("uuid")?),
            details: CouponDetails {
                code,
                value,
                min_purchase_amount: decode_optional(row, "min_purchase_amount")?,
                max_discount_amount: decode_optional(row, "max_discount_amount")?,
                valid_from: row.try_get::<SqlxTimestamp, _>("valid_from")?.to_jiff(),
                valid_until: row.try_get::<SqlxTimestamp, _>("valid_until")?.to_jiff(),
                usage_limit: decode_optional(row, "usage_limit")?,
                is_active: row.try_get("is_active")?,
                applicable_products: row.try_get::<Vec<Uuid>, _>("applicable_products")?,
                applicable_categories: row.try_get::<Vec<Uuid>, _>("applicable_categories")?,
            },
            usage_count,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
