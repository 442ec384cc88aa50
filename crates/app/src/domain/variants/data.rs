//! Product Variants Data

use uuid::Uuid;

use crate::domain::variants::records::VariantUuid;

/// New Product Variant Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVariant {
    pub uuid: VariantUuid,
    pub product_uuid: Uuid,
    pub category_uuid: Option<Uuid>,
    pub name: String,

    /// Signed minor units added to the product's base price.
    pub price_adjustment: i64,
}
