//! Cart Sessions

pub mod data;
pub mod errors;
pub mod session;

pub use data::{ApplyCouponOutcome, CheckoutSummary, CouponRevalidation, NewCartLine};
pub use errors::{CartSessionError, CheckoutError};
pub use session::*;
