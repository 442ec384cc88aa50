//! Imprint
//!
//! Pricing and inventory ledger rules for a custom-print shop: coupon eligibility and
//! discount maths, stock change arithmetic with an append-only history entry type, and
//! cart totals that compose both.
//!
//! Everything in this crate is pure; persistence and concurrency control live in
//! `imprint-app`.

pub mod cart;
pub mod coupons;
pub mod discounts;
pub mod items;
pub mod pricing;
pub mod stock;
