//! Cart pricing
//!
//! Derives subtotal, discount, shipping and total from a set of lines. Totals are never
//! cached; callers recompute them whenever they are read.

use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::{
    coupons::Coupon,
    discounts::{DiscountError, calculate_discount},
    items::CartLineItem,
};

/// Errors from totals calculation.
#[derive(Debug, Error)]
pub enum PricingError {
    /// Line totals overflowed.
    #[error("cart total overflowed")]
    Overflow,

    /// A line is priced in another currency.
    #[error("line priced in {line}, cart currency is {cart}")]
    CurrencyMismatch {
        /// ISO code of the line.
        line: &'static str,

        /// ISO code of the cart.
        cart: &'static str,
    },

    /// Wrapped money error.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Wrapped discount error.
    #[error(transparent)]
    Discount(#[from] DiscountError),
}

/// Flat-fee shipping with a free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShippingPolicy<'a> {
    /// Subtotal at or above which shipping is free.
    pub free_threshold: Money<'a, Currency>,

    /// Fee charged below the threshold.
    pub flat_fee: Money<'a, Currency>,
}

impl<'a> ShippingPolicy<'a> {
    /// Default free-shipping threshold in minor units.
    pub const DEFAULT_FREE_THRESHOLD_MINOR: i64 = 5000;

    /// Default flat fee in minor units.
    pub const DEFAULT_FLAT_FEE_MINOR: i64 = 599;

    /// Policy with the given amounts, in minor units of `currency`.
    pub fn new(currency: &'a Currency, free_threshold_minor: i64, flat_fee_minor: i64) -> Self {
        Self {
            free_threshold: Money::from_minor(free_threshold_minor, currency),
            flat_fee: Money::from_minor(flat_fee_minor, currency),
        }
    }

    /// Free shipping from 50.00, otherwise 5.99.
    pub fn standard(currency: &'a Currency) -> Self {
        Self::new(
            currency,
            Self::DEFAULT_FREE_THRESHOLD_MINOR,
            Self::DEFAULT_FLAT_FEE_MINOR,
        )
    }

    /// Shipping charged on `subtotal`.
    ///
    /// Empty carts ship for free.
    pub fn shipping_for(&self, subtotal: &Money<'a, Currency>) -> Money<'a, Currency> {
        let minor = subtotal.to_minor_units();

        if minor <= 0 || minor >= self.free_threshold.to_minor_units() {
            Money::from_minor(0, subtotal.currency())
        } else {
            Money::from_minor(self.flat_fee.to_minor_units(), subtotal.currency())
        }
    }
}

/// Derived totals of a cart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartTotals<'a> {
    /// Sum of line totals.
    pub subtotal: Money<'a, Currency>,

    /// Coupon discount on the subtotal.
    pub discount: Money<'a, Currency>,

    /// Shipping charged on the subtotal.
    pub shipping: Money<'a, Currency>,

    /// `subtotal - discount + shipping`, never negative.
    pub total: Money<'a, Currency>,
}

/// Sum of `unit_price * quantity` over all lines.
///
/// # Errors
///
/// - [`PricingError::CurrencyMismatch`]: a line is priced in another currency.
/// - [`PricingError::Overflow`]: the sum does not fit in minor units.
pub fn subtotal<'a, 'b>(
    items: impl IntoIterator<Item = &'b CartLineItem<'a>>,
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, PricingError>
where
    'a: 'b,
{
    let mut minor = 0_i64;

    for item in items {
        let line_currency = item.unit_price().currency();

        if line_currency != currency {
            return Err(PricingError::CurrencyMismatch {
                line: line_currency.iso_alpha_code,
                cart: currency.iso_alpha_code,
            });
        }

        let line = item.line_total_minor().ok_or(PricingError::Overflow)?;

        minor = minor.checked_add(line).ok_or(PricingError::Overflow)?;
    }

    Ok(Money::from_minor(minor, currency))
}

/// Compute totals for a set of lines and an optional coupon.
///
/// The coupon's discount is always calculated on the current subtotal. Eligibility is
/// not re-checked here.
///
/// # Errors
///
/// - [`PricingError`]: summing lines or computing the discount failed.
pub fn calculate_totals<'a, 'b>(
    items: impl IntoIterator<Item = &'b CartLineItem<'a>>,
    coupon: Option<&Coupon<'a>>,
    policy: &ShippingPolicy<'a>,
    currency: &'a Currency,
) -> Result<CartTotals<'a>, PricingError>
where
    'a: 'b,
{
    let subtotal = subtotal(items, currency)?;

    let discount = match coupon {
        Some(coupon) => calculate_discount(coupon, subtotal)?,
        None => Money::from_minor(0, currency),
    };

    let shipping = policy.shipping_for(&subtotal);

    let total_minor = subtotal
        .to_minor_units()
        .checked_sub(discount.to_minor_units())
        .and_then(|minor| minor.checked_add(shipping.to_minor_units()))
        .ok_or(PricingError::Overflow)?
        .max(0);

    Ok(CartTotals {
        subtotal,
        discount,
        shipping,
        total: Money::from_minor(total_minor, currency),
    })
}
