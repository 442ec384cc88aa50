//! Stock Ledger Data

use uuid::Uuid;

use crate::domain::variants::records::VariantUuid;

/// Signed manual adjustment of a variant's stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    pub variant: VariantUuid,
    pub delta: i64,
    pub notes: Option<String>,
    pub actor: Option<Uuid>,
}

/// Stock count that replaces the current quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockCorrection {
    pub variant: VariantUuid,
    pub quantity: u64,
    pub notes: Option<String>,
    pub actor: Option<Uuid>,
}
