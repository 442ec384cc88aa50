//! Cart session.
//!
//! Holds one shopper's cart in memory and talks to the coupon, stock and variant services
//! when a line is priced, a coupon is applied, or checkout is prepared. Totals are derived
//! from the lines on every read.

use std::sync::Arc;

use imprint::{
    cart::{Cart, CartState},
    coupons::{Coupon, CouponRejection},
    items::{CartLineItem, LineItemKey},
    pricing::{CartTotals, ShippingPolicy},
};
use jiff::Timestamp;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use tracing::{Span, error, info};

use crate::domain::{
    carts::{
        data::{ApplyCouponOutcome, CheckoutSummary, CouponRevalidation, NewCartLine},
        errors::{CartSessionError, CheckoutError},
    },
    coupons::{CouponValidation, CouponsService, CouponsServiceError, records::AppliedCoupon},
    fulfillment::data::OrderLine,
    stock::{StockLedgerError, StockLedgerService},
    variants::{VariantsService, records::VariantUuid},
};

const TRY_AGAIN: &str = "we could not check this coupon right now, please try again";

enum CouponCheck {
    Applies(AppliedCoupon, Coupon<'static>),
    Rejected(CouponRejection),
}

pub struct CartSession {
    cart: Cart<'static>,
    applied: Option<AppliedCoupon>,
    coupon_notice: Option<String>,
    coupons: Arc<dyn CouponsService>,
    stock: Arc<dyn StockLedgerService>,
    variants: Arc<dyn VariantsService>,
    policy: ShippingPolicy<'static>,
    revalidation: CouponRevalidation,
}

impl CartSession {
    /// Start an empty cart priced in the currency of `policy`.
    pub fn new(
        coupons: Arc<dyn CouponsService>,
        stock: Arc<dyn StockLedgerService>,
        variants: Arc<dyn VariantsService>,
        policy: ShippingPolicy<'static>,
        revalidation: CouponRevalidation,
    ) -> Self {
        Self {
            cart: Cart::new(policy.free_threshold.currency()),
            applied: None,
            coupon_notice: None,
            coupons,
            stock,
            variants,
            policy,
            revalidation,
        }
    }

    pub fn currency(&self) -> &'static Currency {
        self.cart.currency()
    }

    pub fn state(&self) -> CartState {
        self.cart.state()
    }

    pub fn cart(&self) -> &Cart<'static> {
        &self.cart
    }

    pub fn applied_coupon(&self) -> Option<&AppliedCoupon> {
        self.applied.as_ref()
    }

    /// Why the coupon was last dropped without the shopper asking, if it was.
    pub fn coupon_notice(&self) -> Option<&str> {
        self.coupon_notice.as_deref()
    }

    /// Price a line and add it, merging with an identical line.
    ///
    /// Lines with a variant are priced at the product base price plus the variant's
    /// adjustment and inherit its category.
    ///
    /// # Errors
    ///
    /// - [`CartSessionError::Variant`]: the variant could not be loaded.
    /// - [`CartSessionError::VariantMismatch`]: the variant belongs to another product.
    /// - [`CartSessionError::Cart`]: the cart refused the line, e.g. a quantity of zero
    ///   or a negative unit price.
    pub async fn add_item(&mut self, line: NewCartLine) -> Result<LineItemKey, CartSessionError> {
        let currency = self.currency();
        let base = Money::from_minor(line.base_price_minor, currency);

        let mut item = match line.variant {
            Some(variant) => {
                let record = self.variants.get_variant(variant).await?;

                if record.product_uuid != line.product {
                    return Err(CartSessionError::VariantMismatch(variant));
                }

                let adjustment = Money::from_minor(record.price_adjustment, currency);
                let item = CartLineItem::priced(line.product, base, adjustment)?
                    .with_variant(variant.into_uuid());

                match line.category.or(record.category_uuid) {
                    Some(category) => item.with_category(category),
                    None => item,
                }
            }
            None => match line.category {
                Some(category) => CartLineItem::new(line.product, base).with_category(category),
                None => CartLineItem::new(line.product, base),
            },
        };

        item = item.with_quantity(line.quantity);

        if let Some(customization) = line.customization {
            item = item.with_customization(customization);
        }

        let key = self.cart.add_item(item)?;

        self.after_change().await;

        Ok(key)
    }

    /// Set a line's quantity; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns [`CartSessionError::Cart`] for an unknown line or a checked-out cart.
    pub async fn set_quantity(
        &mut self,
        key: LineItemKey,
        quantity: u32,
    ) -> Result<(), CartSessionError> {
        self.cart.set_quantity(key, quantity)?;
        self.after_change().await;

        Ok(())
    }

    /// Remove a line. Removing the last line also drops the coupon.
    ///
    /// # Errors
    ///
    /// Returns [`CartSessionError::Cart`] for an unknown line or a checked-out cart.
    pub async fn remove_item(&mut self, key: LineItemKey) -> Result<(), CartSessionError> {
        self.cart.remove_item(key)?;
        self.after_change().await;

        Ok(())
    }

    pub fn clear(&mut self) {
        self.cart.clear();
        self.applied = None;
        self.coupon_notice = None;
    }

    /// Validate `code` against the current cart and keep it only if it applies.
    ///
    /// A failed attempt leaves any previously applied coupon in place.
    pub async fn apply_coupon(&mut self, code: &str) -> ApplyCouponOutcome {
        if self.cart.is_empty() {
            return ApplyCouponOutcome::failed("add something to your cart before using a coupon");
        }

        match self.validate(code).await {
            Ok(CouponCheck::Applies(record, coupon)) => match self.cart.apply_coupon(coupon) {
                Ok(()) => {
                    info!(coupon_uuid = %record.uuid, coupon_code = %record.code, "applied coupon");

                    self.applied = Some(record);
                    self.coupon_notice = None;

                    ApplyCouponOutcome::applied()
                }
                Err(error) => ApplyCouponOutcome::failed(error.to_string()),
            },
            Ok(CouponCheck::Rejected(rejection)) => ApplyCouponOutcome::failed(rejection.to_string()),
            Err(error) => {
                error!(coupon_code = %code.trim(), error = %error, "coupon validation failed");

                ApplyCouponOutcome::failed(TRY_AGAIN)
            }
        }
    }

    pub fn remove_coupon(&mut self) {
        self.cart.remove_coupon();
        self.applied = None;
    }

    /// # Errors
    ///
    /// Returns [`CartSessionError::Pricing`] when the sum overflows.
    pub fn subtotal(&self) -> Result<Money<'static, Currency>, CartSessionError> {
        Ok(self.cart.subtotal()?)
    }

    /// # Errors
    ///
    /// Returns [`CartSessionError::Pricing`] when any amount cannot be computed.
    pub fn total(&self) -> Result<Money<'static, Currency>, CartSessionError> {
        Ok(self.totals()?.total)
    }

    /// # Errors
    ///
    /// Returns [`CartSessionError::Pricing`] when any amount cannot be computed.
    pub fn totals(&self) -> Result<CartTotals<'static>, CartSessionError> {
        Ok(self.cart.totals(&self.policy)?)
    }

    /// Re-validate the coupon and pre-flight stock before payment is attempted.
    ///
    /// A coupon that no longer applies is removed from the cart.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EmptyCart`]: nothing to check out.
    /// - [`CheckoutError::CouponRejected`]: the applied coupon stopped applying.
    /// - [`CheckoutError::InsufficientStock`]: a variant is short.
    /// - [`CheckoutError::UnknownVariant`]: a variant was removed from the catalogue.
    /// - [`CheckoutError::Unavailable`]: a store failure prevented the checks.
    #[tracing::instrument(
        name = "carts.session.prepare_checkout",
        skip(self),
        fields(lines = self.cart.len(), coupon_code = tracing::field::Empty),
        err
    )]
    pub async fn prepare_checkout(&mut self) -> Result<CheckoutSummary, CheckoutError> {
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        if let Some(applied) = &self.applied {
            Span::current().record("coupon_code", tracing::field::display(&applied.code));
        }

        match self.recheck_coupon().await {
            Ok(None) => {}
            Ok(Some(rejection)) => return Err(CheckoutError::CouponRejected(rejection)),
            Err(error) => {
                error!(error = %error, "coupon re-validation failed");

                return Err(CheckoutError::Unavailable);
            }
        }

        let lines = self.stock_lines();

        for line in &lines {
            let availability = match self
                .stock
                .check_availability(line.variant, line.quantity)
                .await
            {
                Ok(availability) => availability,
                Err(StockLedgerError::VariantNotFound) => {
                    return Err(CheckoutError::UnknownVariant(line.variant));
                }
                Err(error) => {
                    error!(variant_uuid = %line.variant, error = %error, "stock check failed");

                    return Err(CheckoutError::Unavailable);
                }
            };

            if !availability.available {
                return Err(CheckoutError::InsufficientStock {
                    variant: line.variant,
                    available: availability.current_stock,
                    requested: line.quantity,
                });
            }
        }

        Ok(CheckoutSummary {
            totals: self.totals()?,
            coupon: self.applied.clone(),
            lines,
        })
    }

    /// Mark the checkout as submitted. The cart is cleared and refuses further changes.
    pub fn complete_checkout(&mut self) {
        self.cart.mark_checked_out();
        self.applied = None;
    }

    async fn validate(&self, code: &str) -> Result<CouponCheck, CouponsServiceError> {
        let subtotal = self
            .cart
            .subtotal()
            .map_err(|_err| CouponsServiceError::InvalidData)?;

        let validation = self
            .coupons
            .validate_coupon(code, subtotal, self.cart.contents(), Timestamp::now())
            .await?;

        match validation {
            CouponValidation::Valid { coupon, .. } => {
                let terms = coupon.to_coupon(self.currency())?;

                Ok(CouponCheck::Applies(AppliedCoupon::from(&coupon), terms))
            }
            CouponValidation::Rejected(rejection) => Ok(CouponCheck::Rejected(rejection)),
        }
    }

    /// Run the applied coupon through the evaluator again.
    ///
    /// Refreshes the stored terms on success and drops the coupon on rejection.
    async fn recheck_coupon(&mut self) -> Result<Option<CouponRejection>, CouponsServiceError> {
        let Some(applied) = self.applied.clone() else {
            return Ok(None);
        };

        match self.validate(applied.code.as_str()).await? {
            CouponCheck::Applies(_record, terms) => {
                self.cart
                    .apply_coupon(terms)
                    .map_err(|_err| CouponsServiceError::InvalidData)?;

                Ok(None)
            }
            CouponCheck::Rejected(rejection) => {
                info!(coupon_code = %applied.code, reason = %rejection, "dropped coupon");

                self.remove_coupon();
                self.coupon_notice = Some(rejection.to_string());

                Ok(Some(rejection))
            }
        }
    }

    async fn after_change(&mut self) {
        if self.cart.coupon().is_none() {
            self.applied = None;
        }

        if self.revalidation != CouponRevalidation::OnEveryChange {
            return;
        }

        if let Err(error) = self.recheck_coupon().await {
            error!(error = %error, "coupon re-validation failed, keeping coupon until checkout");
        }
    }

    /// Quantities per stock-tracked variant, summed across customizations.
    fn stock_lines(&self) -> Vec<OrderLine> {
        let mut positions: FxHashMap<VariantUuid, usize> = FxHashMap::default();
        let mut lines: Vec<OrderLine> = Vec::new();

        for (_key, item) in self.cart.iter() {
            let Some(variant) = item.variant().map(VariantUuid::from_uuid) else {
                continue;
            };

            let quantity = u64::from(item.quantity());

            match positions.get(&variant) {
                Some(&index) => lines[index].quantity += quantity,
                None => {
                    positions.insert(variant, lines.len());
                    lines.push(OrderLine { variant, quantity });
                }
            }
        }

        lines
    }
}

#[cfg(test)]
mod tests {
    use imprint::{
        cart::CartError, coupons::CouponCode, items::Customization, stock::check_availability,
    };
    use jiff::SignedDuration;
    use rust_decimal::Decimal;
    use rusty_money::iso::EUR;
    use testresult::TestResult;
    use uuid::Uuid;

    use crate::domain::{
        coupons::{
            MockCouponsService,
            data::{CouponDetails, CouponValue},
            records::{CouponRecord, CouponUuid},
        },
        stock::MockStockLedgerService,
        variants::{MockVariantsService, records::VariantRecord},
    };

    use super::*;

    fn eur(minor: i64) -> Money<'static, Currency> {
        Money::from_minor(minor, EUR)
    }

    fn welcome10() -> CouponRecord {
        let now = Timestamp::now();

        CouponRecord {
            uuid: CouponUuid::new(),
            details: CouponDetails {
                code: CouponCode::new("WELCOME10").expect("valid coupon code"),
                value: CouponValue::Percentage(Decimal::TEN),
                min_purchase_amount: Some(2000),
                max_discount_amount: None,
                valid_from: now - SignedDuration::from_hours(1),
                valid_until: now + SignedDuration::from_hours(1),
                usage_limit: None,
                is_active: true,
                applicable_products: Vec::new(),
                applicable_categories: Vec::new(),
            },
            usage_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Coupon service that accepts WELCOME10 from 20.00 and rejects below it.
    fn welcome10_service() -> MockCouponsService {
        let record = welcome10();
        let mut coupons = MockCouponsService::new();

        coupons
            .expect_validate_coupon()
            .returning(move |_, subtotal, _, _| {
                if subtotal.to_minor_units() < 2000 {
                    Ok(CouponValidation::Rejected(CouponRejection::BelowMinimum {
                        minimum: "€20.00".to_string(),
                    }))
                } else {
                    Ok(CouponValidation::Valid {
                        coupon: record.clone(),
                        discount: eur(subtotal.to_minor_units() / 10),
                    })
                }
            });

        coupons
    }

    fn variant(product: Uuid, price_adjustment: i64, category: Option<Uuid>) -> VariantRecord {
        let now = Timestamp::now();

        VariantRecord {
            uuid: VariantUuid::new(),
            product_uuid: product,
            category_uuid: category,
            name: "XL / black".to_string(),
            price_adjustment,
            stock_quantity: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn session(
        coupons: MockCouponsService,
        stock: MockStockLedgerService,
        variants: MockVariantsService,
        revalidation: CouponRevalidation,
    ) -> CartSession {
        CartSession::new(
            Arc::new(coupons),
            Arc::new(stock),
            Arc::new(variants),
            ShippingPolicy::standard(EUR),
            revalidation,
        )
    }

    fn plain_session(coupons: MockCouponsService) -> CartSession {
        session(
            coupons,
            MockStockLedgerService::new(),
            MockVariantsService::new(),
            CouponRevalidation::OnCheckout,
        )
    }

    #[tokio::test]
    async fn welcome10_totals() -> TestResult {
        let mut cart = plain_session(welcome10_service());

        cart.add_item(NewCartLine::new(Uuid::now_v7(), 2500)).await?;

        let outcome = cart.apply_coupon(" welcome10 ").await;

        assert_eq!(outcome, ApplyCouponOutcome::applied());
        assert_eq!(cart.state(), CartState::HasItemsWithCoupon);

        let totals = cart.totals()?;

        assert_eq!(totals.subtotal, eur(2500));
        assert_eq!(totals.discount, eur(250));
        assert_eq!(totals.shipping, eur(599));
        assert_eq!(totals.total, eur(2849));
        assert_eq!(cart.total()?, eur(2849));

        Ok(())
    }

    #[tokio::test]
    async fn rejected_coupon_is_not_stored() -> TestResult {
        let mut cart = plain_session(welcome10_service());

        cart.add_item(NewCartLine::new(Uuid::now_v7(), 1500)).await?;

        let outcome = cart.apply_coupon("WELCOME10").await;

        assert!(!outcome.success);
        assert_eq!(
            outcome.error.as_deref(),
            Some("a minimum purchase of €20.00 is required for this coupon")
        );
        assert_eq!(cart.state(), CartState::HasItems);
        assert!(cart.applied_coupon().is_none());
        assert_eq!(cart.totals()?.discount, eur(0));

        Ok(())
    }

    #[tokio::test]
    async fn store_failure_asks_to_try_again() -> TestResult {
        let mut coupons = MockCouponsService::new();

        coupons
            .expect_validate_coupon()
            .returning(|_, _, _, _| Err(CouponsServiceError::Sql(sqlx::Error::PoolTimedOut)));

        let mut cart = plain_session(coupons);

        cart.add_item(NewCartLine::new(Uuid::now_v7(), 2500)).await?;

        let outcome = cart.apply_coupon("WELCOME10").await;

        assert_eq!(outcome, ApplyCouponOutcome::failed(TRY_AGAIN));
        assert!(cart.applied_coupon().is_none());

        Ok(())
    }

    #[tokio::test]
    async fn coupon_needs_items() {
        let mut cart = plain_session(MockCouponsService::new());

        let outcome = cart.apply_coupon("WELCOME10").await;

        assert!(!outcome.success);
        assert_eq!(cart.state(), CartState::Empty);
    }

    #[tokio::test]
    async fn removing_last_line_drops_coupon() -> TestResult {
        let mut cart = plain_session(welcome10_service());

        let key = cart.add_item(NewCartLine::new(Uuid::now_v7(), 2500)).await?;

        assert!(cart.apply_coupon("WELCOME10").await.success);

        cart.remove_item(key).await?;

        assert_eq!(cart.state(), CartState::Empty);
        assert!(cart.applied_coupon().is_none());

        Ok(())
    }

    #[tokio::test]
    async fn variant_lines_use_adjusted_price_and_category() -> TestResult {
        let product = Uuid::now_v7();
        let category = Uuid::now_v7();
        let record = variant(product, 350, Some(category));
        let variant_uuid = record.uuid;

        let mut variants = MockVariantsService::new();

        variants
            .expect_get_variant()
            .returning(move |_| Ok(record.clone()));

        let mut cart = session(
            MockCouponsService::new(),
            MockStockLedgerService::new(),
            variants,
            CouponRevalidation::OnCheckout,
        );

        let key = cart
            .add_item(
                NewCartLine::new(product, 2000)
                    .with_variant(variant_uuid)
                    .with_quantity(2),
            )
            .await?;

        let line = cart.cart().get_item(key)?;

        assert_eq!(line.unit_price(), &eur(2350));
        assert_eq!(line.category(), Some(category));
        assert_eq!(line.variant(), Some(variant_uuid.into_uuid()));
        assert_eq!(cart.subtotal()?, eur(4700));

        Ok(())
    }

    #[tokio::test]
    async fn variant_of_another_product_is_refused() {
        let record = variant(Uuid::now_v7(), 0, None);
        let variant_uuid = record.uuid;

        let mut variants = MockVariantsService::new();

        variants
            .expect_get_variant()
            .returning(move |_| Ok(record.clone()));

        let mut cart = session(
            MockCouponsService::new(),
            MockStockLedgerService::new(),
            variants,
            CouponRevalidation::OnCheckout,
        );

        let result = cart
            .add_item(NewCartLine::new(Uuid::now_v7(), 2000).with_variant(variant_uuid))
            .await;

        assert!(
            matches!(result, Err(CartSessionError::VariantMismatch(v)) if v == variant_uuid),
            "expected VariantMismatch, got {result:?}"
        );
        assert!(cart.cart().is_empty());
    }

    #[tokio::test]
    async fn zero_quantity_line_is_refused() {
        let mut cart = plain_session(MockCouponsService::new());

        let result = cart
            .add_item(NewCartLine::new(Uuid::now_v7(), 2000).with_quantity(0))
            .await;

        assert!(
            matches!(result, Err(CartSessionError::Cart(CartError::InvalidQuantity))),
            "expected InvalidQuantity, got {result:?}"
        );
        assert!(cart.cart().is_empty());
    }

    #[tokio::test]
    async fn adjustment_below_base_price_is_refused() -> TestResult {
        let product = Uuid::now_v7();
        let record = variant(product, -3000, None);
        let variant_uuid = record.uuid;

        let mut variants = MockVariantsService::new();

        variants
            .expect_get_variant()
            .returning(move |_| Ok(record.clone()));

        let mut cart = session(
            MockCouponsService::new(),
            MockStockLedgerService::new(),
            variants,
            CouponRevalidation::OnCheckout,
        );

        cart.add_item(NewCartLine::new(Uuid::now_v7(), 2000)).await?;
        cart.add_item(NewCartLine::new(Uuid::now_v7(), 6000)).await?;

        let result = cart
            .add_item(NewCartLine::new(product, 500).with_variant(variant_uuid))
            .await;

        assert!(
            matches!(result, Err(CartSessionError::Cart(CartError::NegativePrice))),
            "expected NegativePrice, got {result:?}"
        );
        assert_eq!(cart.subtotal()?, eur(8000));
        assert_eq!(cart.totals()?.shipping, eur(0));

        Ok(())
    }

    #[tokio::test]
    async fn clearing_forgets_dropped_coupon_notice() -> TestResult {
        let mut cart = session(
            welcome10_service(),
            MockStockLedgerService::new(),
            MockVariantsService::new(),
            CouponRevalidation::OnEveryChange,
        );

        let key = cart
            .add_item(NewCartLine::new(Uuid::now_v7(), 1200).with_quantity(2))
            .await?;

        assert!(cart.apply_coupon("WELCOME10").await.success);

        cart.set_quantity(key, 1).await?;

        assert!(cart.coupon_notice().is_some());

        cart.clear();

        assert_eq!(cart.state(), CartState::Empty);
        assert!(cart.coupon_notice().is_none());

        Ok(())
    }

    #[tokio::test]
    async fn every_change_policy_drops_coupon_below_minimum() -> TestResult {
        let mut cart = session(
            welcome10_service(),
            MockStockLedgerService::new(),
            MockVariantsService::new(),
            CouponRevalidation::OnEveryChange,
        );

        let key = cart
            .add_item(NewCartLine::new(Uuid::now_v7(), 1200).with_quantity(2))
            .await?;

        assert!(cart.apply_coupon("WELCOME10").await.success);

        cart.set_quantity(key, 1).await?;

        assert_eq!(cart.state(), CartState::HasItems);
        assert!(cart.applied_coupon().is_none());
        assert!(
            cart.coupon_notice()
                .is_some_and(|notice| notice.contains("minimum purchase")),
            "got {:?}",
            cart.coupon_notice()
        );

        Ok(())
    }

    #[tokio::test]
    async fn checkout_policy_keeps_coupon_until_checkout() -> TestResult {
        let mut cart = plain_session(welcome10_service());

        let key = cart
            .add_item(NewCartLine::new(Uuid::now_v7(), 1200).with_quantity(2))
            .await?;

        assert!(cart.apply_coupon("WELCOME10").await.success);

        cart.set_quantity(key, 1).await?;

        assert_eq!(cart.state(), CartState::HasItemsWithCoupon);

        let result = cart.prepare_checkout().await;

        assert!(
            matches!(
                result,
                Err(CheckoutError::CouponRejected(CouponRejection::BelowMinimum { .. }))
            ),
            "expected CouponRejected, got {result:?}"
        );
        assert_eq!(cart.state(), CartState::HasItems);

        Ok(())
    }

    #[tokio::test]
    async fn checkout_sums_quantities_per_variant() -> TestResult {
        let product = Uuid::now_v7();
        let record = variant(product, 0, None);
        let variant_uuid = record.uuid;

        let mut variants = MockVariantsService::new();

        variants
            .expect_get_variant()
            .returning(move |_| Ok(record.clone()));

        let mut stock = MockStockLedgerService::new();

        stock
            .expect_check_availability()
            .withf(move |variant, requested| *variant == variant_uuid && *requested == 3)
            .times(1)
            .returning(|_, requested| Ok(check_availability(10, requested)));

        let mut cart = session(
            MockCouponsService::new(),
            stock,
            variants,
            CouponRevalidation::OnCheckout,
        );

        cart.add_item(
            NewCartLine::new(product, 1500)
                .with_variant(variant_uuid)
                .with_quantity(2),
        )
        .await?;

        cart.add_item(NewCartLine {
            customization: Some(Customization {
                text: Some("Happy birthday".to_string()),
                image: None,
            }),
            ..NewCartLine::new(product, 1500).with_variant(variant_uuid)
        })
        .await?;

        assert_eq!(cart.cart().len(), 2);

        let summary = cart.prepare_checkout().await?;

        assert_eq!(
            summary.lines,
            vec![OrderLine {
                variant: variant_uuid,
                quantity: 3
            }]
        );
        assert_eq!(summary.totals.subtotal, eur(4500));
        assert_eq!(summary.totals.total, eur(5099));
        assert!(summary.coupon.is_none());

        let order = summary.into_paid_order(Default::default(), None);

        assert_eq!(order.lines.len(), 1);
        assert!(order.coupon.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn checkout_reports_short_stock() -> TestResult {
        let product = Uuid::now_v7();
        let record = variant(product, 0, None);
        let variant_uuid = record.uuid;

        let mut variants = MockVariantsService::new();

        variants
            .expect_get_variant()
            .returning(move |_| Ok(record.clone()));

        let mut stock = MockStockLedgerService::new();

        stock
            .expect_check_availability()
            .returning(|_, requested| Ok(check_availability(1, requested)));

        let mut cart = session(
            MockCouponsService::new(),
            stock,
            variants,
            CouponRevalidation::OnCheckout,
        );

        cart.add_item(
            NewCartLine::new(product, 1500)
                .with_variant(variant_uuid)
                .with_quantity(2),
        )
        .await?;

        let result = cart.prepare_checkout().await;

        assert!(
            matches!(
                result,
                Err(CheckoutError::InsufficientStock {
                    available: 1,
                    requested: 2,
                    ..
                })
            ),
            "expected InsufficientStock, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn checkout_store_failure_is_unavailable() -> TestResult {
        let product = Uuid::now_v7();
        let record = variant(product, 0, None);
        let variant_uuid = record.uuid;

        let mut variants = MockVariantsService::new();

        variants
            .expect_get_variant()
            .returning(move |_| Ok(record.clone()));

        let mut stock = MockStockLedgerService::new();

        stock
            .expect_check_availability()
            .returning(|_, _| Err(StockLedgerError::Sql(sqlx::Error::PoolTimedOut)));

        let mut cart = session(
            MockCouponsService::new(),
            stock,
            variants,
            CouponRevalidation::OnCheckout,
        );

        cart.add_item(NewCartLine::new(product, 1500).with_variant(variant_uuid))
            .await?;

        let result = cart.prepare_checkout().await;

        assert!(
            matches!(result, Err(CheckoutError::Unavailable)),
            "expected Unavailable, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn empty_cart_cannot_check_out() {
        let mut cart = plain_session(MockCouponsService::new());

        let result = cart.prepare_checkout().await;

        assert!(
            matches!(result, Err(CheckoutError::EmptyCart)),
            "expected EmptyCart, got {result:?}"
        );
    }

    #[tokio::test]
    async fn completed_checkout_clears_the_cart() -> TestResult {
        let mut cart = plain_session(welcome10_service());

        cart.add_item(NewCartLine::new(Uuid::now_v7(), 2500)).await?;

        assert!(cart.apply_coupon("WELCOME10").await.success);

        let summary = cart.prepare_checkout().await?;

        assert_eq!(summary.totals.total, eur(2849));
        assert_eq!(
            summary.coupon.as_ref().map(|coupon| coupon.code.as_str()),
            Some("WELCOME10")
        );

        cart.complete_checkout();

        assert_eq!(cart.state(), CartState::Cleared);

        let result = cart.add_item(NewCartLine::new(Uuid::now_v7(), 2500)).await;

        assert!(
            matches!(result, Err(CartSessionError::Cart(_))),
            "expected Cart error, got {result:?}"
        );

        Ok(())
    }
}
