//! Coupons Data

use imprint::coupons::CouponCode;
use jiff::Timestamp;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::coupons::records::CouponUuid;

/// Discount value as stored: percentage points or a fixed amount in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponValue {
    Percentage(Decimal),
    Fixed(u64),
}

impl CouponValue {
    /// Storage name of the discount kind.
    pub const fn kind_as_str(&self) -> &'static str {
        match self {
            Self::Percentage(_) => "percentage",
            Self::Fixed(_) => "fixed",
        }
    }
}

/// Editable coupon terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponDetails {
    pub code: CouponCode,
    pub value: CouponValue,
    pub min_purchase_amount: Option<u64>,
    pub max_discount_amount: Option<u64>,
    pub valid_from: Timestamp,
    pub valid_until: Timestamp,
    pub usage_limit: Option<u64>,
    pub is_active: bool,
    pub applicable_products: Vec<Uuid>,
    pub applicable_categories: Vec<Uuid>,
}

impl CouponDetails {
    /// Sort and deduplicate the scoping id lists.
    #[must_use]
    pub(crate) fn normalised(mut self) -> Self {
        for ids in [&mut self.applicable_products, &mut self.applicable_categories] {
            ids.sort_unstable();
            ids.dedup();
        }

        self
    }
}

/// New Coupon Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCoupon {
    pub uuid: CouponUuid,
    pub details: CouponDetails,
}
