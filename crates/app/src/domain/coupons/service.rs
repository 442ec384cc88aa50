//! Coupons service.

use async_trait::async_trait;
use imprint::coupons::{CartContents, CouponCode, CouponRejection, EvaluationError, evaluate};
use jiff::Timestamp;
use mockall::automock;
use rusty_money::{Money, iso::Currency};
use tracing::{Span, error, info};

use crate::{
    database::Db,
    domain::coupons::{
        data::{CouponDetails, NewCoupon},
        errors::CouponsServiceError,
        records::{CouponRecord, CouponUuid},
        repository::PgCouponsRepository,
    },
};

/// Outcome of validating a coupon code against a cart.
#[derive(Debug, Clone, PartialEq)]
pub enum CouponValidation {
    /// The coupon applies; `discount` is computed on the given subtotal.
    Valid {
        coupon: CouponRecord,
        discount: Money<'static, Currency>,
    },

    /// The coupon cannot be used, for a reason the shopper can read.
    Rejected(CouponRejection),
}

#[derive(Debug, Clone)]
pub struct PgCouponsService {
    db: Db,
    repository: PgCouponsRepository,
    currency: &'static Currency,
}

impl PgCouponsService {
    #[must_use]
    pub fn new(db: Db, currency: &'static Currency) -> Self {
        Self {
            db,
            repository: PgCouponsRepository::new(),
            currency,
        }
    }

    /// Check terms against the core rules before they are written.
    fn check_details(&self, details: &CouponDetails) -> Result<(), CouponsServiceError> {
        let record = CouponRecord {
            uuid: CouponUuid::new(),
            details: details.clone(),
            usage_count: 0,
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        };

        record.to_coupon(self.currency)?;

        if details.valid_from > details.valid_until {
            return Err(CouponsServiceError::InvalidData);
        }

        Ok(())
    }
}

#[async_trait]
impl CouponsService for PgCouponsService {
    #[tracing::instrument(
        name = "coupons.service.create_coupon",
        skip(self, coupon),
        fields(coupon_uuid = %coupon.uuid, coupon_code = %coupon.details.code),
        err
    )]
    async fn create_coupon(&self, coupon: NewCoupon) -> Result<CouponRecord, CouponsServiceError> {
        self.check_details(&coupon.details)?;

        let mut tx = self.db.begin().await?;

        let created = self
            .repository
            .create_coupon(&mut tx, coupon.uuid, coupon.details.normalised())
            .await?;

        tx.commit().await?;

        info!(coupon_uuid = %created.uuid, coupon_code = %created.code(), "created coupon");

        Ok(created)
    }

    #[tracing::instrument(
        name = "coupons.service.update_coupon",
        skip(self, details),
        fields(coupon_uuid = %coupon, coupon_code = %details.code),
        err
    )]
    async fn update_coupon(
        &self,
        coupon: CouponUuid,
        details: CouponDetails,
    ) -> Result<CouponRecord, CouponsServiceError> {
        self.check_details(&details)?;

        let mut tx = self.db.begin().await?;

        let updated = self
            .repository
            .update_coupon(&mut tx, coupon, details.normalised())
            .await?;

        tx.commit().await?;

        info!(coupon_uuid = %coupon, "updated coupon");

        Ok(updated)
    }

    async fn get_coupon(&self, coupon: CouponUuid) -> Result<CouponRecord, CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self.repository.get_coupon(&mut tx, coupon).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn list_coupons(&self) -> Result<Vec<CouponRecord>, CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        let records = self.repository.list_coupons(&mut tx).await?;

        tx.commit().await?;

        Ok(records)
    }

    #[tracing::instrument(
        name = "coupons.service.validate_coupon",
        skip(self, subtotal, contents),
        fields(
            coupon_code = %code.trim(),
            subtotal_minor = subtotal.to_minor_units(),
            coupon_uuid = tracing::field::Empty,
            outcome = tracing::field::Empty
        ),
        err
    )]
    async fn validate_coupon(
        &self,
        code: &str,
        subtotal: Money<'static, Currency>,
        contents: CartContents,
        point_in_time: Timestamp,
    ) -> Result<CouponValidation, CouponsServiceError> {
        let span = Span::current();

        let Ok(code) = CouponCode::new(code) else {
            span.record("outcome", "invalid_code");

            return Ok(CouponValidation::Rejected(CouponRejection::InvalidCode));
        };

        let record = async {
            let mut tx = self.db.begin().await?;
            let record = self.repository.find_by_code(&mut tx, &code).await?;

            tx.commit().await?;

            Ok::<_, sqlx::Error>(record)
        }
        .await
        .map_err(|e| {
            error!(coupon_code = %code, error = %e, "coupon lookup failed");

            CouponsServiceError::Sql(e)
        })?;

        let Some(record) = record else {
            span.record("outcome", "invalid_code");

            return Ok(CouponValidation::Rejected(CouponRejection::InvalidCode));
        };

        span.record("coupon_uuid", tracing::field::display(record.uuid));

        let coupon = record.to_coupon(self.currency)?;

        match evaluate(&coupon, subtotal, &contents, point_in_time) {
            Ok(discount) => {
                span.record("outcome", "valid");

                Ok(CouponValidation::Valid {
                    coupon: record,
                    discount,
                })
            }
            Err(EvaluationError::Rejected(rejection)) => {
                span.record("outcome", tracing::field::debug(&rejection));

                Ok(CouponValidation::Rejected(rejection))
            }
            Err(EvaluationError::Discount(error)) => Err(error.into()),
        }
    }

    #[tracing::instrument(
        name = "coupons.service.increment_usage",
        skip(self),
        fields(coupon_uuid = %coupon),
        err
    )]
    async fn increment_usage(&self, coupon: CouponUuid) -> Result<CouponRecord, CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        let Some(record) = self.repository.increment_usage(&mut tx, coupon).await? else {
            let exists = self.repository.coupon_exists(&mut tx, coupon).await?;

            return Err(if exists {
                CouponsServiceError::LimitReached
            } else {
                CouponsServiceError::NotFound
            });
        };

        tx.commit().await?;

        info!(coupon_uuid = %coupon, usage_count = record.usage_count, "redeemed coupon");

        Ok(record)
    }

    #[tracing::instrument(
        name = "coupons.service.correct_usage",
        skip(self),
        fields(coupon_uuid = %coupon),
        err
    )]
    async fn correct_usage(
        &self,
        coupon: CouponUuid,
        usage_count: u64,
    ) -> Result<CouponRecord, CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self
            .repository
            .correct_usage(&mut tx, coupon, usage_count)
            .await?;

        tx.commit().await?;

        info!(coupon_uuid = %coupon, usage_count, "corrected coupon usage");

        Ok(record)
    }
}

#[automock]
#[async_trait]
pub trait CouponsService: Send + Sync {
    /// Create a coupon. Codes are stored upper-cased and must be unique.
    async fn create_coupon(&self, coupon: NewCoupon) -> Result<CouponRecord, CouponsServiceError>;

    /// Replace a coupon's terms. The usage count is left untouched.
    async fn update_coupon(
        &self,
        coupon: CouponUuid,
        details: CouponDetails,
    ) -> Result<CouponRecord, CouponsServiceError>;

    /// Retrieve a single coupon.
    async fn get_coupon(&self, coupon: CouponUuid) -> Result<CouponRecord, CouponsServiceError>;

    /// List all coupons, newest first.
    async fn list_coupons(&self) -> Result<Vec<CouponRecord>, CouponsServiceError>;

    /// Validate a shopper-entered code against a cart subtotal and contents.
    ///
    /// Read-only. Business rule failures are returned as [`CouponValidation::Rejected`];
    /// only store and arithmetic failures are errors.
    async fn validate_coupon(
        &self,
        code: &str,
        subtotal: Money<'static, Currency>,
        contents: CartContents,
        point_in_time: Timestamp,
    ) -> Result<CouponValidation, CouponsServiceError>;

    /// Record one redemption, refusing to exceed the usage limit.
    async fn increment_usage(&self, coupon: CouponUuid) -> Result<CouponRecord, CouponsServiceError>;

    /// Overwrite the usage count.
    async fn correct_usage(
        &self,
        coupon: CouponUuid,
        usage_count: u64,
    ) -> Result<CouponRecord, CouponsServiceError>;
}
