//! Order Fulfillment Records

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use jiff::Timestamp;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    domain::{coupons::records::CouponUuid, variants::records::VariantUuid},
    uuids::typed_uuid,
};

typed_uuid! {
    /// Order UUID, also the idempotency key of a fulfillment.
    pub struct OrderUuid;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown fulfillment status: {0}")]
pub struct UnknownStatus(String);

/// Where an order is in the fulfillment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FulfillmentStatus {
    /// Claimed; stock and coupon bookkeeping in flight.
    Processing,
    Fulfilled,
    /// Something could not be booked and a person has to look at it.
    NeedsReview,
    Cancelled,
}

impl FulfillmentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Fulfilled => "fulfilled",
            Self::NeedsReview => "needs_review",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for FulfillmentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for FulfillmentStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "processing" => Ok(Self::Processing),
            "fulfilled" => Ok(Self::Fulfilled),
            "needs_review" => Ok(Self::NeedsReview),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A stored order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FulfillmentLine {
    pub position: u32,
    pub variant: VariantUuid,
    pub quantity: u64,
}

/// Order Fulfillment Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFulfillmentRecord {
    pub order_uuid: OrderUuid,
    pub coupon_uuid: Option<CouponUuid>,
    pub status: FulfillmentStatus,
    pub review_notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub lines: Vec<FulfillmentLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_names() {
        for status in [
            FulfillmentStatus::Processing,
            FulfillmentStatus::Fulfilled,
            FulfillmentStatus::NeedsReview,
            FulfillmentStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<FulfillmentStatus>(), Ok(status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result = "shipped".parse::<FulfillmentStatus>();

        assert_eq!(result, Err(UnknownStatus("shipped".to_string())));
    }
}
