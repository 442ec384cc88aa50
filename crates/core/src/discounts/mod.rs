//! Discount utilities
//!
//! Turns a coupon's terms into a concrete amount of money for a given subtotal.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::coupons::{Coupon, CouponDiscount};

/// Errors specific to discount calculations.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// The coupon's amounts are in a different currency to the subtotal.
    #[error("coupon currency {coupon} does not match cart currency {cart}")]
    CurrencyMismatch {
        /// ISO code of the coupon amount.
        coupon: &'static str,

        /// ISO code of the subtotal.
        cart: &'static str,
    },

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Calculate the discount a coupon grants on `subtotal`.
///
/// Percentage coupons take `value / 100` of the subtotal, fixed coupons take their amount.
/// The result is capped by the coupon's maximum discount (when set) and by the subtotal
/// itself, and is never negative. Amounts are whole minor units, rounded half-up.
///
/// # Errors
///
/// - [`DiscountError::PercentConversion`]: the percentage product overflowed.
/// - [`DiscountError::CurrencyMismatch`]: the coupon's amounts use another currency.
pub fn calculate_discount<'a>(
    coupon: &Coupon<'a>,
    subtotal: Money<'a, Currency>,
) -> Result<Money<'a, Currency>, DiscountError> {
    let currency = subtotal.currency();
    let subtotal_minor = subtotal.to_minor_units();

    let mut discount_minor = match coupon.discount() {
        CouponDiscount::Percentage { points } => {
            let percent = Percentage::from(*points / Decimal::ONE_HUNDRED);

            percent_of_minor(&percent, subtotal_minor)?
        }
        CouponDiscount::Fixed { amount } => {
            ensure_same_currency(amount, currency)?;

            amount.to_minor_units()
        }
    };

    if let Some(cap) = coupon.max_discount() {
        ensure_same_currency(cap, currency)?;

        discount_minor = discount_minor.min(cap.to_minor_units());
    }

    let discount_minor = discount_minor.min(subtotal_minor).max(0);

    Ok(Money::from_minor(discount_minor, currency))
}

/// Calculate the discount amount in minor units based on a percentage and a minor unit amount.
///
/// Rounds half-up (midpoint away from zero) to a whole minor unit.
///
/// # Errors
///
/// Returns an error if:
/// - The percentage calculation overflows or cannot be safely represented (`DiscountError::PercentConversion`).
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage doesn't expose the underlying Decimal
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

fn ensure_same_currency(
    amount: &Money<'_, Currency>,
    currency: &Currency,
) -> Result<(), DiscountError> {
    if amount.currency() == currency {
        Ok(())
    } else {
        Err(DiscountError::CurrencyMismatch {
            coupon: amount.currency().iso_alpha_code,
            cart: currency.iso_alpha_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use decimal_percentage::Percentage;
    use jiff::{SignedDuration, Timestamp};
    use rust_decimal::Decimal;
    use rusty_money::iso::{EUR, GBP};
    use testresult::TestResult;

    use crate::coupons::{CouponCode, CouponTerms};

    use super::*;

    fn coupon<'a>(discount: CouponDiscount<'a>, cap: Option<Money<'a, Currency>>) -> Coupon<'a> {
        let now = Timestamp::now();

        Coupon::new(CouponTerms {
            code: CouponCode::new("TEST").expect("valid coupon code"),
            discount,
            min_purchase: None,
            max_discount: cap,
            valid_from: now - SignedDuration::from_hours(1),
            valid_until: now + SignedDuration::from_hours(1),
            usage_limit: None,
            usage_count: 0,
            is_active: true,
            applicable_products: Vec::new(),
            applicable_categories: Vec::new(),
        })
    }

    fn percentage<'a>(points: i64) -> CouponDiscount<'a> {
        CouponDiscount::Percentage {
            points: Decimal::from(points),
        }
    }

    #[test]
    fn percentage_discount_is_share_of_subtotal() -> TestResult {
        let discount = calculate_discount(&coupon(percentage(10), None), Money::from_minor(2500, EUR))?;

        assert_eq!(discount, Money::from_minor(250, EUR));

        Ok(())
    }

    #[test]
    fn percentage_discount_rounds_half_up() -> TestResult {
        // 15% of 0.10 is 0.015, which rounds up to 0.02
        let discount = calculate_discount(&coupon(percentage(15), None), Money::from_minor(10, EUR))?;

        assert_eq!(discount, Money::from_minor(2, EUR));

        // 15% of 0.09 is 0.0135, which rounds down to 0.01
        let discount = calculate_discount(&coupon(percentage(15), None), Money::from_minor(9, EUR))?;

        assert_eq!(discount, Money::from_minor(1, EUR));

        Ok(())
    }

    #[test]
    fn fractional_percentage_points_are_supported() -> TestResult {
        let discount = calculate_discount(
            &coupon(
                CouponDiscount::Percentage {
                    points: Decimal::new(125, 1),
                },
                None,
            ),
            Money::from_minor(4000, EUR),
        )?;

        assert_eq!(discount, Money::from_minor(500, EUR));

        Ok(())
    }

    #[test]
    fn fixed_discount_is_its_amount() -> TestResult {
        let discount = calculate_discount(
            &coupon(
                CouponDiscount::Fixed {
                    amount: Money::from_minor(500, EUR),
                },
                Some(Money::from_minor(500, EUR)),
            ),
            Money::from_minor(3000, EUR),
        )?;

        assert_eq!(discount, Money::from_minor(500, EUR));

        Ok(())
    }

    #[test]
    fn discount_is_capped_by_max_discount() -> TestResult {
        let discount = calculate_discount(
            &coupon(percentage(50), Some(Money::from_minor(1000, EUR))),
            Money::from_minor(10_000, EUR),
        )?;

        assert_eq!(discount, Money::from_minor(1000, EUR));

        Ok(())
    }

    #[test]
    fn fixed_discount_never_exceeds_subtotal() -> TestResult {
        let discount = calculate_discount(
            &coupon(
                CouponDiscount::Fixed {
                    amount: Money::from_minor(2000, EUR),
                },
                None,
            ),
            Money::from_minor(1250, EUR),
        )?;

        assert_eq!(discount, Money::from_minor(1250, EUR));

        Ok(())
    }

    #[test]
    fn full_percentage_discount_equals_subtotal() -> TestResult {
        let discount =
            calculate_discount(&coupon(percentage(100), None), Money::from_minor(1999, EUR))?;

        assert_eq!(discount, Money::from_minor(1999, EUR));

        Ok(())
    }

    #[test]
    fn discount_never_leaves_negative_remainder() -> TestResult {
        let subtotals = [0, 1, 99, 100, 2500, 3000, 49_99, 123_457];
        let coupons = [
            coupon(percentage(0), None),
            coupon(percentage(33), None),
            coupon(percentage(100), Some(Money::from_minor(10_000, EUR))),
            coupon(
                CouponDiscount::Fixed {
                    amount: Money::from_minor(5000, EUR),
                },
                None,
            ),
        ];

        for c in &coupons {
            for minor in subtotals {
                let discount = calculate_discount(c, Money::from_minor(minor, EUR))?;

                assert!(discount.to_minor_units() >= 0, "discount must not be negative");
                assert!(
                    minor - discount.to_minor_units() >= 0,
                    "discount {discount} exceeds subtotal {minor}"
                );
            }
        }

        Ok(())
    }

    #[test]
    fn fixed_discount_in_other_currency_errors() {
        let result = calculate_discount(
            &coupon(
                CouponDiscount::Fixed {
                    amount: Money::from_minor(500, GBP),
                },
                None,
            ),
            Money::from_minor(3000, EUR),
        );

        assert!(matches!(
            result,
            Err(DiscountError::CurrencyMismatch {
                coupon: "GBP",
                cart: "EUR"
            })
        ));
    }

    #[test]
    fn percent_of_minor_overflow_returns_error() {
        let percent = Percentage::from(2.0);
        let result = percent_of_minor(&percent, i64::MAX);

        assert!(matches!(result, Err(DiscountError::PercentConversion)));
    }

    #[test]
    fn percent_of_minor_checked_mul_overflow_returns_error() -> TestResult {
        let percent = Percentage::try_from("100000000000000000000")?;
        let result = percent_of_minor(&percent, i64::MAX);

        assert!(matches!(result, Err(DiscountError::PercentConversion)));

        Ok(())
    }

    #[test]
    fn percent_of_minor_calculates_correctly() -> TestResult {
        let percent = Percentage::from(0.25);
        let result = percent_of_minor(&percent, 200)?;

        assert_eq!(result, 50);

        Ok(())
    }
}
