//! Stock
//!
//! Arithmetic and audit types for stock movements. Every change to a variant's stock
//! quantity is described by a [`StockChange`] and recorded as exactly one
//! [`StockHistoryEntry`].

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by stock arithmetic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StockError {
    /// Quantities moved by orders must be at least one unit.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// The change would take stock below zero.
    #[error("insufficient stock: {available} available, {requested} requested")]
    InsufficientStock {
        /// Units currently in stock.
        available: u64,

        /// Units the change tried to remove.
        requested: u64,
    },

    /// The change would overflow the stock counter.
    #[error("stock quantity overflow")]
    Overflow,

    /// Stored quantities do not add up.
    #[error("unbalanced stock entry: {previous} + {change} != {new}")]
    Unbalanced {
        /// Quantity before the change.
        previous: u64,

        /// Signed change.
        change: i64,

        /// Quantity after the change.
        new: u64,
    },

    /// Unknown reason string.
    #[error("unknown stock change reason: {0}")]
    UnknownReason(String),
}

/// Why a stock quantity changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockReason {
    /// Units sold to a paid order.
    OrderCreated,

    /// Units returned to stock by a cancelled order.
    OrderCancelled,

    /// Signed adjustment by an administrator.
    ManualAdjustment,

    /// Stock counted and set to an absolute quantity.
    StockCorrection,
}

impl StockReason {
    /// Storage name of the reason.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OrderCreated => "order_created",
            Self::OrderCancelled => "order_cancelled",
            Self::ManualAdjustment => "manual_adjustment",
            Self::StockCorrection => "stock_correction",
        }
    }
}

impl fmt::Display for StockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockReason {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order_created" => Ok(Self::OrderCreated),
            "order_cancelled" => Ok(Self::OrderCancelled),
            "manual_adjustment" => Ok(Self::ManualAdjustment),
            "stock_correction" => Ok(Self::StockCorrection),
            other => Err(StockError::UnknownReason(other.to_string())),
        }
    }
}

/// A balanced stock movement: `new = previous + change`, with `new >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    previous: u64,
    change: i64,
    new: u64,
}

impl StockChange {
    /// Apply a signed change to the current quantity.
    ///
    /// # Errors
    ///
    /// - [`StockError::InsufficientStock`]: the result would be negative.
    /// - [`StockError::Overflow`]: the result does not fit.
    pub fn apply(previous: u64, change: i64) -> Result<Self, StockError> {
        let new = if change.is_negative() {
            let requested = change.unsigned_abs();

            previous
                .checked_sub(requested)
                .ok_or(StockError::InsufficientStock {
                    available: previous,
                    requested,
                })?
        } else {
            previous
                .checked_add(change.unsigned_abs())
                .ok_or(StockError::Overflow)?
        };

        Ok(Self {
            previous,
            change,
            new,
        })
    }

    /// Set stock to an absolute counted quantity.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::Overflow`] when the difference cannot be represented.
    pub fn correction(previous: u64, target: u64) -> Result<Self, StockError> {
        let previous_i64 = i64::try_from(previous).map_err(|_err| StockError::Overflow)?;
        let target_i64 = i64::try_from(target).map_err(|_err| StockError::Overflow)?;

        Self::apply(previous, target_i64 - previous_i64)
    }

    /// Rebuild a change from stored parts, checking that it balances.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::Unbalanced`] when `previous + change != new`.
    pub fn from_parts(previous: u64, change: i64, new: u64) -> Result<Self, StockError> {
        let unbalanced = StockError::Unbalanced {
            previous,
            change,
            new,
        };

        match Self::apply(previous, change) {
            Ok(applied) if applied.new == new => Ok(applied),
            _ => Err(unbalanced),
        }
    }

    /// Quantity before the change.
    pub fn previous_quantity(&self) -> u64 {
        self.previous
    }

    /// Signed change.
    pub fn quantity_change(&self) -> i64 {
        self.change
    }

    /// Quantity after the change.
    pub fn new_quantity(&self) -> u64 {
        self.new
    }
}

/// Validate a quantity moved by an order and return it as a signed amount.
///
/// # Errors
///
/// - [`StockError::InvalidQuantity`]: `quantity` is zero.
/// - [`StockError::Overflow`]: `quantity` does not fit a signed change.
pub fn order_quantity(quantity: u64) -> Result<i64, StockError> {
    if quantity == 0 {
        return Err(StockError::InvalidQuantity);
    }

    i64::try_from(quantity).map_err(|_err| StockError::Overflow)
}

/// Optional context attached to a stock history entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryContext {
    /// Order the change belongs to.
    pub order: Option<Uuid>,

    /// Free-text notes.
    pub notes: Option<String>,

    /// Who made the change.
    pub created_by: Option<Uuid>,
}

/// Immutable audit record of one stock change.
///
/// Entries are write-once: there are no setters, and the only way to obtain one is to
/// record a balanced [`StockChange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockHistoryEntry {
    uuid: Uuid,
    product_variant: Uuid,
    change: StockChange,
    reason: StockReason,
    context: EntryContext,
    created_at: Timestamp,
}

impl StockHistoryEntry {
    /// Record a change.
    #[must_use]
    pub fn new(
        uuid: Uuid,
        product_variant: Uuid,
        change: StockChange,
        reason: StockReason,
        context: EntryContext,
        created_at: Timestamp,
    ) -> Self {
        Self {
            uuid,
            product_variant,
            change,
            reason,
            context,
            created_at,
        }
    }

    /// Entry id.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Variant whose stock changed.
    pub fn product_variant(&self) -> Uuid {
        self.product_variant
    }

    /// Order the change belongs to, if any.
    pub fn order(&self) -> Option<Uuid> {
        self.context.order
    }

    /// Signed quantity change.
    pub fn quantity_change(&self) -> i64 {
        self.change.quantity_change()
    }

    /// Quantity before the change.
    pub fn previous_quantity(&self) -> u64 {
        self.change.previous_quantity()
    }

    /// Quantity after the change.
    pub fn new_quantity(&self) -> u64 {
        self.change.new_quantity()
    }

    /// Why the quantity changed.
    pub fn reason(&self) -> StockReason {
        self.reason
    }

    /// Notes, if any.
    pub fn notes(&self) -> Option<&str> {
        self.context.notes.as_deref()
    }

    /// Who made the change, if recorded.
    pub fn created_by(&self) -> Option<Uuid> {
        self.context.created_by
    }

    /// When the change was recorded.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// Result of a read-only stock pre-flight check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    /// Whether the requested quantity is in stock right now.
    pub available: bool,

    /// Units currently in stock.
    pub current_stock: u64,

    /// Shopper-facing explanation when not available.
    pub message: Option<String>,
}

/// Check whether `requested` units can be taken from `current` units of stock.
///
/// This is advisory only; decrementing re-checks the quantity atomically.
pub fn check_availability(current: u64, requested: u64) -> Availability {
    let message = if current == 0 && requested > 0 {
        Some("out of stock".to_string())
    } else if requested > current {
        Some(format!("only {current} left in stock"))
    } else {
        None
    };

    Availability {
        available: message.is_none(),
        current_stock: current,
        message,
    }
}
