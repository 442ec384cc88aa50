//! Coupon Records

use imprint::coupons::{Coupon, CouponCode, CouponDiscount, CouponTerms};
use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use crate::{
    domain::coupons::{
        data::{CouponDetails, CouponValue},
        errors::CouponsServiceError,
    },
    uuids::typed_uuid,
};

typed_uuid! {
    /// Coupon UUID
    pub struct CouponUuid;
}

/// Coupon Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponRecord {
    pub uuid: CouponUuid,
    pub details: CouponDetails,
    pub usage_count: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CouponRecord {
    /// Normalised code.
    pub fn code(&self) -> &CouponCode {
        &self.details.code
    }

    /// Build the pricing view of this coupon in the shop currency.
    ///
    /// # Errors
    ///
    /// Returns an error when a stored amount does not fit in minor units or the stored
    /// percentage is out of range.
    pub fn to_coupon(
        &self,
        currency: &'static Currency,
    ) -> Result<Coupon<'static>, CouponsServiceError> {
        let money = |minor: u64| -> Result<Money<'static, Currency>, CouponsServiceError> {
            Ok(Money::from_minor(i64::try_from(minor)?, currency))
        };

        let discount = match self.details.value {
            CouponValue::Percentage(points) => CouponDiscount::percentage(points)?,
            CouponValue::Fixed(amount) => CouponDiscount::fixed(money(amount)?)?,
        };

        Ok(Coupon::new(CouponTerms {
            code: self.details.code.clone(),
            discount,
            min_purchase: self.details.min_purchase_amount.map(money).transpose()?,
            max_discount: self.details.max_discount_amount.map(money).transpose()?,
            valid_from: self.details.valid_from,
            valid_until: self.details.valid_until,
            usage_limit: self.details.usage_limit,
            usage_count: self.usage_count,
            is_active: self.details.is_active,
            applicable_products: self.details.applicable_products.clone(),
            applicable_categories: self.details.applicable_categories.clone(),
        }))
    }
}

/// Identifiers carried alongside an applied coupon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCoupon {
    pub uuid: CouponUuid,
    pub code: CouponCode,
}

impl From<&CouponRecord> for AppliedCoupon {
    fn from(record: &CouponRecord) -> Self {
        Self {
            uuid: record.uuid,
            code: record.details.code.clone(),
        }
    }
}
