//! Cart Session Data

use imprint::{items::Customization, pricing::CartTotals};
use uuid::Uuid;

use crate::domain::{
    coupons::records::AppliedCoupon,
    fulfillment::{
        data::{OrderLine, PaidOrder},
        records::OrderUuid,
    },
    variants::records::VariantUuid,
};

/// When an applied coupon is checked again against the current cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CouponRevalidation {
    /// Only when checkout is prepared.
    #[default]
    OnCheckout,

    /// After every cart mutation as well; a coupon that stops applying is dropped.
    OnEveryChange,
}

/// A line to add to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartLine {
    pub product: Uuid,

    /// Product base price in minor units of the shop currency.
    pub base_price_minor: i64,

    pub variant: Option<VariantUuid>,

    /// Overrides the variant's category when set.
    pub category: Option<Uuid>,

    pub quantity: u32,
    pub customization: Option<Customization>,
}

impl NewCartLine {
    pub fn new(product: Uuid, base_price_minor: i64) -> Self {
        Self {
            product,
            base_price_minor,
            variant: None,
            category: None,
            quantity: 1,
            customization: None,
        }
    }

    #[must_use]
    pub fn with_variant(mut self, variant: VariantUuid) -> Self {
        self.variant = Some(variant);
        self
    }

    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }
}

/// Result of `apply_coupon`, shaped for the storefront.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyCouponOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl ApplyCouponOutcome {
    pub(crate) fn applied() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub(crate) fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Everything the payment step needs once checkout has been pre-flighted.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSummary {
    pub totals: CartTotals<'static>,
    pub coupon: Option<AppliedCoupon>,

    /// Stock-tracked quantities per variant, in first-seen order.
    pub lines: Vec<OrderLine>,
}

impl CheckoutSummary {
    /// The order to hand to fulfillment once payment has cleared.
    pub fn into_paid_order(self, order: OrderUuid, actor: Option<Uuid>) -> PaidOrder {
        PaidOrder {
            order,
            lines: self.lines,
            coupon: self.coupon.map(|coupon| coupon.uuid),
            actor,
        }
    }
}
