//! Order Fulfillment Data

use uuid::Uuid;

use crate::domain::{
    coupons::records::CouponUuid, fulfillment::records::OrderUuid,
    variants::records::VariantUuid,
};

/// One paid line: a variant and the number of units sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub variant: VariantUuid,
    pub quantity: u64,
}

/// A paid order as delivered by the payment webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaidOrder {
    pub order: OrderUuid,
    pub lines: Vec<OrderLine>,
    pub coupon: Option<CouponUuid>,
    pub actor: Option<Uuid>,
}
