//! Test Helpers

use imprint::coupons::{CouponCode, CouponError};
use jiff::{SignedDuration, Timestamp};
use rust_decimal::Decimal;
use testresult::TestResult;
use uuid::Uuid;

use crate::{
    domain::{
        coupons::{
            CouponsService, CouponsServiceError,
            data::{CouponDetails, CouponValue, NewCoupon},
            records::{CouponRecord, CouponUuid},
        },
        stock::{StockLedgerService, data::StockCorrection},
        variants::{
            VariantsService, VariantsServiceError,
            data::NewVariant,
            records::{VariantRecord, VariantUuid},
        },
    },
    test::TestContext,
};

pub(crate) fn new_variant(product: Uuid, name: &str) -> NewVariant {
    NewVariant {
        uuid: VariantUuid::new(),
        product_uuid: product,
        category_uuid: None,
        name: name.to_string(),
        price_adjustment: 0,
    }
}

pub(crate) async fn create_variant(
    ctx: &TestContext,
) -> Result<VariantRecord, VariantsServiceError> {
    ctx.variants
        .create_variant(new_variant(Uuid::now_v7(), "M / white"))
        .await
}

/// Create a variant and book `quantity` units as its initial stock.
pub(crate) async fn create_stocked_variant(
    ctx: &TestContext,
    quantity: u64,
) -> TestResult<VariantUuid> {
    let variant = create_variant(ctx).await?;

    ctx.stock
        .correct(StockCorrection {
            variant: variant.uuid,
            quantity,
            notes: Some("initial stock".to_string()),
            actor: None,
        })
        .await?;

    Ok(variant.uuid)
}

/// Active 10% coupon with a 20.00 minimum, valid from yesterday until tomorrow.
pub(crate) fn coupon_details(code: &str) -> Result<CouponDetails, CouponError> {
    let now = Timestamp::now();

    Ok(CouponDetails {
        code: CouponCode::new(code)?,
        value: CouponValue::Percentage(Decimal::TEN),
        min_purchase_amount: Some(2000),
        max_discount_amount: None,
        valid_from: now - SignedDuration::from_hours(24),
        valid_until: now + SignedDuration::from_hours(24),
        usage_limit: None,
        is_active: true,
        applicable_products: Vec::new(),
        applicable_categories: Vec::new(),
    })
}

pub(crate) async fn create_coupon(
    ctx: &TestContext,
    details: CouponDetails,
) -> Result<CouponRecord, CouponsServiceError> {
    ctx.coupons
        .create_coupon(NewCoupon {
            uuid: CouponUuid::new(),
            details,
        })
        .await
}
