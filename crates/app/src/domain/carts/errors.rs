//! Cart session errors.

use imprint::{cart::CartError, coupons::CouponRejection, pricing::PricingError};
use rusty_money::MoneyError;
use thiserror::Error;

use crate::domain::variants::{VariantsServiceError, records::VariantUuid};

#[derive(Debug, Error)]
pub enum CartSessionError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("invalid price: {0}")]
    Money(#[from] MoneyError),

    #[error("variant {0} does not belong to this product")]
    VariantMismatch(VariantUuid),

    #[error(transparent)]
    Variant(#[from] VariantsServiceError),
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error(transparent)]
    CouponRejected(CouponRejection),

    #[error("only {available} of variant {variant} in stock, {requested} requested")]
    InsufficientStock {
        variant: VariantUuid,
        available: u64,
        requested: u64,
    },

    #[error("variant {0} no longer exists")]
    UnknownVariant(VariantUuid),

    #[error("checkout is temporarily unavailable, please try again")]
    Unavailable,

    #[error(transparent)]
    Session(#[from] CartSessionError),
}
