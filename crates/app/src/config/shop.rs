//! Shop Config

use clap::Args;
use imprint::pricing::ShippingPolicy;
use rusty_money::{Findable, iso::Currency};
use thiserror::Error;

use crate::domain::carts::CouponRevalidation;

/// Errors raised while interpreting shop settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShopConfigError {
    /// The currency code is not a known ISO 4217 code.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Shipping amounts cannot be negative.
    #[error("shipping amounts cannot be negative")]
    NegativeShipping,
}

/// Pricing settings.
#[derive(Debug, Clone, Args)]
pub struct ShopConfig {
    /// ISO 4217 code of the shop currency
    #[arg(long, env = "SHOP_CURRENCY", default_value = "EUR")]
    pub currency: String,

    /// Subtotal, in minor units, from which shipping is free
    #[arg(long, env = "FREE_SHIPPING_THRESHOLD_MINOR", default_value_t = ShippingPolicy::DEFAULT_FREE_THRESHOLD_MINOR)]
    pub free_shipping_threshold_minor: i64,

    /// Flat shipping fee, in minor units, below the threshold
    #[arg(long, env = "FLAT_SHIPPING_FEE_MINOR", default_value_t = ShippingPolicy::DEFAULT_FLAT_FEE_MINOR)]
    pub flat_shipping_fee_minor: i64,

    /// When an applied coupon is re-validated
    #[arg(long, env = "COUPON_REVALIDATION", value_enum, default_value_t = CouponRevalidation::OnCheckout)]
    pub coupon_revalidation: CouponRevalidation,
}

impl ShopConfig {
    /// Resolve the configured currency.
    ///
    /// # Errors
    ///
    /// Returns [`ShopConfigError::UnknownCurrency`] for codes that are not ISO 4217.
    pub fn currency(&self) -> Result<&'static Currency, ShopConfigError> {
        let code = self.currency.trim().to_uppercase();

        Currency::find(&code).ok_or(ShopConfigError::UnknownCurrency(code))
    }

    /// Build the shipping policy in the configured currency.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown currency or negative amounts.
    pub fn shipping_policy(&self) -> Result<ShippingPolicy<'static>, ShopConfigError> {
        if self.free_shipping_threshold_minor < 0 || self.flat_shipping_fee_minor < 0 {
            return Err(ShopConfigError::NegativeShipping);
        }

        Ok(ShippingPolicy::new(
            self.currency()?,
            self.free_shipping_threshold_minor,
            self.flat_shipping_fee_minor,
        ))
    }
}
