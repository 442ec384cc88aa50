//! Coupon eligibility rules

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    coupons::{CartContents, Coupon},
    discounts::{DiscountError, calculate_discount},
};

/// Reason a coupon cannot be used on a cart.
///
/// Each variant's message is safe to show to a shopper.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CouponRejection {
    /// No coupon exists with that code.
    #[error("invalid coupon code")]
    InvalidCode,

    /// The coupon has been switched off.
    #[error("this coupon is not active")]
    NotActive,

    /// The validity window has not started yet.
    #[error("this coupon is not valid yet")]
    NotYetValid,

    /// The validity window has ended.
    #[error("this coupon has expired")]
    Expired,

    /// All redemptions have been used.
    #[error("this coupon has reached its usage limit")]
    LimitReached,

    /// The subtotal is below the coupon's minimum purchase.
    #[error("a minimum purchase of {minimum} is required for this coupon")]
    BelowMinimum {
        /// Formatted minimum purchase amount.
        minimum: String,
    },

    /// None of the cart contents are covered by the coupon.
    #[error("this coupon does not apply to the items in your cart")]
    NotApplicable,
}

/// Errors from a full coupon evaluation.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// The coupon failed a business rule.
    #[error(transparent)]
    Rejected(#[from] CouponRejection),

    /// The discount could not be computed.
    #[error(transparent)]
    Discount(#[from] DiscountError),
}

/// Run the eligibility rules against a cart, stopping at the first failure.
///
/// Rules run in this order: active flag, validity window, usage limit, minimum purchase,
/// product/category scope.
///
/// # Errors
///
/// Returns the [`CouponRejection`] of the first rule that fails.
pub fn check_eligibility(
    coupon: &Coupon<'_>,
    subtotal: &Money<'_, Currency>,
    contents: &CartContents,
    now: Timestamp,
) -> Result<(), CouponRejection> {
    if !coupon.is_active() {
        return Err(CouponRejection::NotActive);
    }

    if now < coupon.valid_from() {
        return Err(CouponRejection::NotYetValid);
    }

    if now > coupon.valid_until() {
        return Err(CouponRejection::Expired);
    }

    if coupon.is_exhausted() {
        return Err(CouponRejection::LimitReached);
    }

    if let Some(minimum) = coupon.min_purchase()
        && subtotal.to_minor_units() < minimum.to_minor_units()
    {
        return Err(CouponRejection::BelowMinimum {
            minimum: minimum.to_string(),
        });
    }

    if !coupon.applies_to(contents) {
        return Err(CouponRejection::NotApplicable);
    }

    Ok(())
}

/// Check eligibility and, when it passes, compute the discount for `subtotal`.
///
/// # Errors
///
/// - [`EvaluationError::Rejected`]: a business rule failed.
/// - [`EvaluationError::Discount`]: the discount arithmetic failed.
pub fn evaluate<'a>(
    coupon: &Coupon<'a>,
    subtotal: Money<'a, Currency>,
    contents: &CartContents,
    now: Timestamp,
) -> Result<Money<'a, Currency>, EvaluationError> {
    check_eligibility(coupon, &subtotal, contents, now)?;

    Ok(calculate_discount(coupon, subtotal)?)
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use rust_decimal::Decimal;
    use rusty_money::iso::EUR;
    use testresult::TestResult;
    use uuid::Uuid;

    use crate::coupons::{CouponCode, CouponDiscount, CouponTerms};

    use super::*;

    fn terms<'a>(now: Timestamp) -> CouponTerms<'a> {
        CouponTerms {
            code: CouponCode::new("WELCOME10").expect("valid coupon code"),
            discount: CouponDiscount::Percentage {
                points: Decimal::TEN,
            },
            min_purchase: Some(Money::from_minor(2000, EUR)),
            max_discount: None,
            valid_from: now - SignedDuration::from_hours(24),
            valid_until: now + SignedDuration::from_hours(24),
            usage_limit: Some(100),
            usage_count: 0,
            is_active: true,
            applicable_products: Vec::new(),
            applicable_categories: Vec::new(),
        }
    }

    fn check(coupon: &Coupon<'_>, subtotal: i64, now: Timestamp) -> Result<(), CouponRejection> {
        check_eligibility(
            coupon,
            &Money::from_minor(subtotal, EUR),
            &CartContents::from_products([Uuid::now_v7()]),
            now,
        )
    }

    #[test]
    fn eligible_coupon_passes() {
        let now = Timestamp::now();
        let coupon = Coupon::new(terms(now));

        assert_eq!(check(&coupon, 2500, now), Ok(()));
    }

    #[test]
    fn inactive_coupon_is_rejected() {
        let now = Timestamp::now();
        let coupon = Coupon::new(CouponTerms {
            is_active: false,
            ..terms(now)
        });

        assert_eq!(check(&coupon, 2500, now), Err(CouponRejection::NotActive));
    }

    #[test]
    fn coupon_before_window_is_not_yet_valid() {
        let now = Timestamp::now();
        let coupon = Coupon::new(terms(now));

        let result = check(&coupon, 2500, now - SignedDuration::from_hours(48));

        assert_eq!(result, Err(CouponRejection::NotYetValid));
    }

    #[test]
    fn coupon_after_window_is_expired() {
        let now = Timestamp::now();
        let coupon = Coupon::new(terms(now));

        let result = check(&coupon, 2500, now + SignedDuration::from_hours(48));

        assert_eq!(result, Err(CouponRejection::Expired));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let now = Timestamp::now();
        let coupon = Coupon::new(terms(now));

        assert_eq!(check(&coupon, 2500, coupon.valid_from()), Ok(()));
        assert_eq!(check(&coupon, 2500, coupon.valid_until()), Ok(()));
    }

    #[test]
    fn exhausted_coupon_is_rejected() {
        let now = Timestamp::now();
        let coupon = Coupon::new(CouponTerms {
            usage_count: 100,
            ..terms(now)
        });

        assert_eq!(check(&coupon, 2500, now), Err(CouponRejection::LimitReached));
    }

    #[test]
    fn below_minimum_mentions_the_minimum() {
        let now = Timestamp::now();
        let coupon = Coupon::new(terms(now));

        let result = check(&coupon, 1999, now);

        let rejection = match result {
            Err(rejection) => rejection,
            other => panic!("expected a rejection, got {other:?}"),
        };

        assert!(matches!(rejection, CouponRejection::BelowMinimum { .. }));
        assert!(
            rejection.to_string().contains("20"),
            "message should mention the minimum: {rejection}"
        );
    }

    #[test]
    fn subtotal_equal_to_minimum_is_enough() {
        let now = Timestamp::now();
        let coupon = Coupon::new(terms(now));

        assert_eq!(check(&coupon, 2000, now), Ok(()));
    }

    #[test]
    fn product_scope_is_enforced() {
        let now = Timestamp::now();
        let coupon = Coupon::new(CouponTerms {
            applicable_products: vec![Uuid::now_v7()],
            ..terms(now)
        });

        assert_eq!(check(&coupon, 2500, now), Err(CouponRejection::NotApplicable));
    }

    #[test]
    fn category_match_without_listed_product_is_not_applicable() {
        let now = Timestamp::now();
        let category = Uuid::now_v7();
        let coupon = Coupon::new(CouponTerms {
            applicable_products: vec![Uuid::now_v7()],
            applicable_categories: vec![category],
            ..terms(now)
        });

        let result = check_eligibility(
            &coupon,
            &Money::from_minor(2500, EUR),
            &CartContents::from_products([Uuid::now_v7()]).with_categories([category]),
            now,
        );

        assert_eq!(result, Err(CouponRejection::NotApplicable));
    }

    #[test]
    fn rules_short_circuit_in_order() {
        let now = Timestamp::now();

        // Inactive, expired, exhausted and below minimum all at once: inactive wins.
        let coupon = Coupon::new(CouponTerms {
            is_active: false,
            valid_until: now - SignedDuration::from_hours(1),
            usage_count: 100,
            ..terms(now)
        });

        assert_eq!(check(&coupon, 100, now), Err(CouponRejection::NotActive));

        // Expired and exhausted: expiry is reported first.
        let coupon = Coupon::new(CouponTerms {
            valid_until: now - SignedDuration::from_hours(1),
            usage_count: 100,
            ..terms(now)
        });

        assert_eq!(check(&coupon, 100, now), Err(CouponRejection::Expired));

        // Exhausted and below minimum: the limit is reported first.
        let coupon = Coupon::new(CouponTerms {
            usage_count: 100,
            ..terms(now)
        });

        assert_eq!(check(&coupon, 100, now), Err(CouponRejection::LimitReached));
    }

    #[test]
    fn evaluate_returns_discount_for_eligible_coupon() -> TestResult {
        let now = Timestamp::now();
        let coupon = Coupon::new(terms(now));

        let discount = evaluate(
            &coupon,
            Money::from_minor(2500, EUR),
            &CartContents::default(),
            now,
        )?;

        assert_eq!(discount, Money::from_minor(250, EUR));

        Ok(())
    }

    #[test]
    fn evaluate_surfaces_rejections() {
        let now = Timestamp::now();
        let coupon = Coupon::new(terms(now));

        let result = evaluate(
            &coupon,
            Money::from_minor(1000, EUR),
            &CartContents::default(),
            now,
        );

        assert!(matches!(
            result,
            Err(EvaluationError::Rejected(CouponRejection::BelowMinimum { .. }))
        ));
    }
}
