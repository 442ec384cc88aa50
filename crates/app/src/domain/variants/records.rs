//! Product Variant Records

use jiff::Timestamp;
use uuid::Uuid;

use crate::uuids::typed_uuid;

typed_uuid! {
    /// Product Variant UUID
    pub struct VariantUuid;
}

/// Product Variant Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    pub uuid: VariantUuid,
    pub product_uuid: Uuid,
    pub category_uuid: Option<Uuid>,
    pub name: String,
    pub price_adjustment: i64,
    pub stock_quantity: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
