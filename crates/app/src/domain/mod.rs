//! Imprint Domain Concerns

pub mod carts;
pub mod coupons;
pub mod fulfillment;
pub mod stock;
pub mod variants;
