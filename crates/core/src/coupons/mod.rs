//! Coupons
//!
//! A coupon is a code that grants a percentage or fixed discount on a cart, subject to a
//! validity window, a usage limit, a minimum purchase and an optional product/category
//! scope.

use jiff::Timestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;
use uuid::Uuid;

mod eligibility;

pub use eligibility::{CouponRejection, EvaluationError, check_eligibility, evaluate};

/// Errors raised while constructing coupon values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CouponError {
    /// The code was empty after trimming.
    #[error("coupon code cannot be empty")]
    EmptyCode,

    /// Percentage discounts must be between 0 and 100.
    #[error("percentage {0} is outside 0-100")]
    PercentageOutOfRange(Decimal),

    /// Fixed discounts cannot be negative.
    #[error("fixed discount cannot be negative")]
    NegativeAmount,
}

/// Normalised coupon code.
///
/// Codes are case-insensitive: they are trimmed and upper-cased on construction, so two
/// codes compare equal exactly when a shopper could type either to mean the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CouponCode(String);

impl CouponCode {
    /// Normalise a raw, user-supplied code.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::EmptyCode`] when nothing but whitespace was supplied.
    pub fn new(raw: &str) -> Result<Self, CouponError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(CouponError::EmptyCode);
        }

        Ok(Self(trimmed.to_uppercase()))
    }

    /// The normalised code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CouponCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a coupon takes off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CouponDiscount<'a> {
    /// Percentage of the subtotal, expressed in points (`10` means 10%).
    Percentage {
        /// Percentage points between 0 and 100.
        points: Decimal,
    },

    /// Fixed amount off the subtotal.
    Fixed {
        /// Amount taken off.
        amount: Money<'a, Currency>,
    },
}

impl<'a> CouponDiscount<'a> {
    /// Percentage discount, validating the 0-100 range.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::PercentageOutOfRange`] for values outside 0-100.
    pub fn percentage(points: Decimal) -> Result<Self, CouponError> {
        if points < Decimal::ZERO || points > Decimal::ONE_HUNDRED {
            return Err(CouponError::PercentageOutOfRange(points));
        }

        Ok(Self::Percentage { points })
    }

    /// Fixed discount, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::NegativeAmount`] when `amount` is below zero.
    pub fn fixed(amount: Money<'a, Currency>) -> Result<Self, CouponError> {
        if amount.to_minor_units() < 0 {
            return Err(CouponError::NegativeAmount);
        }

        Ok(Self::Fixed { amount })
    }

    /// Storage name of the discount kind.
    #[must_use]
    pub const fn kind_as_str(&self) -> &'static str {
        match self {
            Self::Percentage { .. } => "percentage",
            Self::Fixed { .. } => "fixed",
        }
    }
}

/// Plain description of a coupon, used to build a [`Coupon`].
#[derive(Debug, Clone)]
pub struct CouponTerms<'a> {
    /// Normalised code.
    pub code: CouponCode,

    /// Discount granted.
    pub discount: CouponDiscount<'a>,

    /// Minimum subtotal required.
    pub min_purchase: Option<Money<'a, Currency>>,

    /// Upper bound on the discount.
    pub max_discount: Option<Money<'a, Currency>>,

    /// Start of the validity window (inclusive).
    pub valid_from: Timestamp,

    /// End of the validity window (inclusive).
    pub valid_until: Timestamp,

    /// Maximum number of redemptions.
    pub usage_limit: Option<u64>,

    /// Redemptions so far.
    pub usage_count: u64,

    /// Whether an administrator has enabled the coupon.
    pub is_active: bool,

    /// Products the coupon is restricted to; empty means no product restriction.
    pub applicable_products: Vec<Uuid>,

    /// Categories the coupon is restricted to; empty means no category restriction.
    pub applicable_categories: Vec<Uuid>,
}

/// Coupon
#[derive(Debug, Clone)]
pub struct Coupon<'a> {
    code: CouponCode,
    discount: CouponDiscount<'a>,
    min_purchase: Option<Money<'a, Currency>>,
    max_discount: Option<Money<'a, Currency>>,
    valid_from: Timestamp,
    valid_until: Timestamp,
    usage_limit: Option<u64>,
    usage_count: u64,
    is_active: bool,
    applicable_products: FxHashSet<Uuid>,
    applicable_categories: FxHashSet<Uuid>,
}

impl<'a> Coupon<'a> {
    /// Build a coupon from its terms.
    #[must_use]
    pub fn new(terms: CouponTerms<'a>) -> Self {
        Self {
            code: terms.code,
            discount: terms.discount,
            min_purchase: terms.min_purchase,
            max_discount: terms.max_discount,
            valid_from: terms.valid_from,
            valid_until: terms.valid_until,
            usage_limit: terms.usage_limit,
            usage_count: terms.usage_count,
            is_active: terms.is_active,
            applicable_products: terms.applicable_products.into_iter().collect(),
            applicable_categories: terms.applicable_categories.into_iter().collect(),
        }
    }

    /// Returns the normalised code.
    pub fn code(&self) -> &CouponCode {
        &self.code
    }

    /// Returns the discount terms.
    pub fn discount(&self) -> &CouponDiscount<'a> {
        &self.discount
    }

    /// Returns the minimum purchase, if any.
    pub fn min_purchase(&self) -> Option<&Money<'a, Currency>> {
        self.min_purchase.as_ref()
    }

    /// Returns the discount cap, if any.
    pub fn max_discount(&self) -> Option<&Money<'a, Currency>> {
        self.max_discount.as_ref()
    }

    /// Returns the start of the validity window.
    pub fn valid_from(&self) -> Timestamp {
        self.valid_from
    }

    /// Returns the end of the validity window.
    pub fn valid_until(&self) -> Timestamp {
        self.valid_until
    }

    /// Returns the usage limit, if any.
    pub fn usage_limit(&self) -> Option<u64> {
        self.usage_limit
    }

    /// Returns the number of redemptions so far.
    pub fn usage_count(&self) -> u64 {
        self.usage_count
    }

    /// Returns whether the coupon is switched on.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Whether the usage limit has been used up.
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit
            .is_some_and(|limit| self.usage_count >= limit)
    }

    /// Whether the coupon is scoped to the given cart contents.
    ///
    /// Each non-empty restriction must hold on its own: a product list needs a listed
    /// product in the cart, and a category list needs a cart line in a listed category.
    pub fn applies_to(&self, contents: &CartContents) -> bool {
        let product_ok = self.applicable_products.is_empty()
            || contents
                .products
                .iter()
                .any(|product| self.applicable_products.contains(product));

        let category_ok = self.applicable_categories.is_empty()
            || contents
                .categories
                .iter()
                .any(|category| self.applicable_categories.contains(category));

        product_ok && category_ok
    }
}

/// Identifiers of what is in a cart, as seen by coupon scoping rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartContents {
    /// Product ids in the cart.
    pub products: SmallVec<[Uuid; 8]>,

    /// Category ids of the cart lines.
    pub categories: SmallVec<[Uuid; 8]>,
}

impl CartContents {
    /// Contents made of the given products only.
    pub fn from_products(products: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            products: products.into_iter().collect(),
            categories: SmallVec::new(),
        }
    }

    /// Adds category ids to the contents.
    #[must_use]
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Uuid>) -> Self {
        self.categories.extend(categories);
        self
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use rusty_money::iso::EUR;
    use testresult::TestResult;

    use super::*;

    fn terms<'a>() -> CouponTerms<'a> {
        let now = Timestamp::now();

        CouponTerms {
            code: CouponCode::new("spring").expect("valid coupon code"),
            discount: CouponDiscount::Fixed {
                amount: Money::from_minor(500, EUR),
            },
            min_purchase: None,
            max_discount: None,
            valid_from: now - SignedDuration::from_hours(1),
            valid_until: now + SignedDuration::from_hours(1),
            usage_limit: None,
            usage_count: 0,
            is_active: true,
            applicable_products: Vec::new(),
            applicable_categories: Vec::new(),
        }
    }

    #[test]
    fn codes_are_trimmed_and_uppercased() -> TestResult {
        let code = CouponCode::new("  welcome10 ")?;

        assert_eq!(code.as_str(), "WELCOME10");
        assert_eq!(code, CouponCode::new("WELCOME10")?);

        Ok(())
    }

    #[test]
    fn blank_codes_are_rejected() {
        assert_eq!(CouponCode::new("   "), Err(CouponError::EmptyCode));
    }

    #[test]
    fn percentage_outside_range_is_rejected() {
        assert!(CouponDiscount::percentage(Decimal::from(101)).is_err());
        assert!(CouponDiscount::percentage(Decimal::from(-1)).is_err());
        assert!(CouponDiscount::percentage(Decimal::ONE_HUNDRED).is_ok());
        assert!(CouponDiscount::percentage(Decimal::ZERO).is_ok());
    }

    #[test]
    fn negative_fixed_amount_is_rejected() {
        let result = CouponDiscount::fixed(Money::from_minor(-1, EUR));

        assert_eq!(result, Err(CouponError::NegativeAmount));
    }

    #[test]
    fn unrestricted_coupon_applies_to_anything() {
        let coupon = Coupon::new(terms());

        assert!(coupon.applies_to(&CartContents::default()));
        assert!(coupon.applies_to(&CartContents::from_products([Uuid::now_v7()])));
    }

    #[test]
    fn product_scoped_coupon_needs_an_intersecting_product() {
        let listed = Uuid::now_v7();

        let coupon = Coupon::new(CouponTerms {
            applicable_products: vec![listed],
            ..terms()
        });

        assert!(coupon.applies_to(&CartContents::from_products([Uuid::now_v7(), listed])));
        assert!(!coupon.applies_to(&CartContents::from_products([Uuid::now_v7()])));
    }

    #[test]
    fn category_scoped_coupon_matches_on_category() {
        let category = Uuid::now_v7();

        let coupon = Coupon::new(CouponTerms {
            applicable_categories: vec![category],
            ..terms()
        });

        let contents = CartContents::from_products([Uuid::now_v7()]).with_categories([category]);

        assert!(coupon.applies_to(&contents));
        assert!(!coupon.applies_to(&CartContents::from_products([Uuid::now_v7()])));
    }

    #[test]
    fn listed_category_does_not_stand_in_for_listed_product() {
        let listed = Uuid::now_v7();
        let category = Uuid::now_v7();

        let coupon = Coupon::new(CouponTerms {
            applicable_products: vec![listed],
            applicable_categories: vec![category],
            ..terms()
        });

        let unlisted_product =
            CartContents::from_products([Uuid::now_v7()]).with_categories([category]);
        let unlisted_category =
            CartContents::from_products([listed]).with_categories([Uuid::now_v7()]);
        let both = CartContents::from_products([listed]).with_categories([category]);

        assert!(!coupon.applies_to(&unlisted_product));
        assert!(!coupon.applies_to(&unlisted_category));
        assert!(coupon.applies_to(&both));
    }

    #[test]
    fn exhausted_when_usage_reaches_limit() {
        let coupon = Coupon::new(CouponTerms {
            usage_limit: Some(3),
            usage_count: 3,
            ..terms()
        });

        assert!(coupon.is_exhausted());

        let coupon = Coupon::new(CouponTerms {
            usage_limit: Some(3),
            usage_count: 2,
            ..terms()
        });

        assert!(!coupon.is_exhausted());
    }
}
