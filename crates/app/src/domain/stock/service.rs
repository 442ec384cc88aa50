//! Stock ledger service.

use async_trait::async_trait;
use imprint::stock::{
    Availability, EntryContext, StockChange, StockHistoryEntry, StockReason, check_availability,
    order_quantity,
};
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{Span, info};
use uuid::Uuid;

use crate::{
    database::Db,
    domain::{
        stock::{
            data::{StockAdjustment, StockCorrection},
            errors::StockLedgerError,
            repository::PgStockRepository,
        },
        variants::records::VariantUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgStockLedgerService {
    db: Db,
    repository: PgStockRepository,
}

impl PgStockLedgerService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgStockRepository::new(),
        }
    }

    /// Apply a signed change and append its history entry in the caller's transaction.
    ///
    /// The stock row is only touched when the result stays non-negative; otherwise nothing
    /// is written and the shortfall is reported.
    async fn apply(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        variant: VariantUuid,
        delta: i64,
        reason: StockReason,
        context: EntryContext,
    ) -> Result<StockHistoryEntry, StockLedgerError> {
        let Some((previous, new)) = self.repository.apply_delta(tx, variant, delta).await? else {
            let available = self
                .repository
                .get_stock(tx, variant)
                .await?
                .ok_or(StockLedgerError::VariantNotFound)?;

            return Err(StockLedgerError::InsufficientStock {
                available,
                requested: delta.unsigned_abs(),
            });
        };

        let previous = u64::try_from(previous).map_err(|_err| StockLedgerError::InvalidData)?;
        let new = u64::try_from(new).map_err(|_err| StockLedgerError::InvalidData)?;

        let change = StockChange::from_parts(previous, delta, new)?;

        let entry = self
            .repository
            .create_entry(tx, variant, change, reason, context)
            .await?;

        let span = Span::current();

        span.record("previous_quantity", previous);
        span.record("new_quantity", new);

        Ok(entry)
    }

    async fn apply_in_transaction(
        &self,
        variant: VariantUuid,
        delta: i64,
        reason: StockReason,
        context: EntryContext,
    ) -> Result<StockHistoryEntry, StockLedgerError> {
        let mut tx = self.db.begin().await?;

        let entry = self.apply(&mut tx, variant, delta, reason, context).await?;

        tx.commit().await?;

        info!(
            variant_uuid = %variant,
            reason = %reason,
            quantity_change = entry.quantity_change(),
            new_quantity = entry.new_quantity(),
            "recorded stock change"
        );

        Ok(entry)
    }
}

fn order_delta(quantity: u64) -> Result<i64, StockLedgerError> {
    order_quantity(quantity).map_err(|_err| StockLedgerError::InvalidQuantity)
}

#[async_trait]
impl StockLedgerService for PgStockLedgerService {
    #[tracing::instrument(
        name = "stock.service.decrement",
        skip(self),
        fields(
            variant_uuid = %variant,
            previous_quantity = tracing::field::Empty,
            new_quantity = tracing::field::Empty
        ),
        err
    )]
    async fn decrement(
        &self,
        variant: VariantUuid,
        quantity: u64,
        order: Option<Uuid>,
        actor: Option<Uuid>,
    ) -> Result<StockHistoryEntry, StockLedgerError> {
        let delta = -order_delta(quantity)?;

        self.apply_in_transaction(
            variant,
            delta,
            StockReason::OrderCreated,
            EntryContext {
                order,
                notes: None,
                created_by: actor,
            },
        )
        .await
    }

    #[tracing::instrument(
        name = "stock.service.increment",
        skip(self),
        fields(
            variant_uuid = %variant,
            previous_quantity = tracing::field::Empty,
            new_quantity = tracing::field::Empty
        ),
        err
    )]
    async fn increment(
        &self,
        variant: VariantUuid,
        quantity: u64,
        order: Option<Uuid>,
        actor: Option<Uuid>,
    ) -> Result<StockHistoryEntry, StockLedgerError> {
        let delta = order_delta(quantity)?;

        self.apply_in_transaction(
            variant,
            delta,
            StockReason::OrderCancelled,
            EntryContext {
                order,
                notes: None,
                created_by: actor,
            },
        )
        .await
    }

    #[tracing::instrument(
        name = "stock.service.adjust",
        skip(self, adjustment),
        fields(
            variant_uuid = %adjustment.variant,
            delta = adjustment.delta,
            previous_quantity = tracing::field::Empty,
            new_quantity = tracing::field::Empty
        ),
        err
    )]
    async fn adjust(
        &self,
        adjustment: StockAdjustment,
    ) -> Result<StockHistoryEntry, StockLedgerError> {
        if adjustment.delta == 0 {
            return Err(StockLedgerError::InvalidQuantity);
        }

        self.apply_in_transaction(
            adjustment.variant,
            adjustment.delta,
            StockReason::ManualAdjustment,
            EntryContext {
                order: None,
                notes: adjustment.notes,
                created_by: adjustment.actor,
            },
        )
        .await
    }

    #[tracing::instrument(
        name = "stock.service.correct",
        skip(self, correction),
        fields(
            variant_uuid = %correction.variant,
            counted_quantity = correction.quantity,
            previous_quantity = tracing::field::Empty,
            new_quantity = tracing::field::Empty
        ),
        err
    )]
    async fn correct(
        &self,
        correction: StockCorrection,
    ) -> Result<StockHistoryEntry, StockLedgerError> {
        let mut tx = self.db.begin().await?;

        let current = self
            .repository
            .lock_stock(&mut tx, correction.variant)
            .await?
            .ok_or(StockLedgerError::VariantNotFound)?;

        let change = StockChange::correction(current, correction.quantity)?;

        let entry = self
            .apply(
                &mut tx,
                correction.variant,
                change.quantity_change(),
                StockReason::StockCorrection,
                EntryContext {
                    order: None,
                    notes: correction.notes,
                    created_by: correction.actor,
                },
            )
            .await?;

        tx.commit().await?;

        info!(
            variant_uuid = %correction.variant,
            previous_quantity = entry.previous_quantity(),
            new_quantity = entry.new_quantity(),
            "corrected stock"
        );

        Ok(entry)
    }

    #[tracing::instrument(
        name = "stock.service.check_availability",
        skip(self),
        fields(variant_uuid = %variant),
        err
    )]
    async fn check_availability(
        &self,
        variant: VariantUuid,
        requested: u64,
    ) -> Result<Availability, StockLedgerError> {
        let mut tx = self.db.begin().await?;

        let current = self
            .repository
            .get_stock(&mut tx, variant)
            .await?
            .ok_or(StockLedgerError::VariantNotFound)?;

        tx.commit().await?;

        Ok(check_availability(current, requested))
    }

    #[tracing::instrument(
        name = "stock.service.history",
        skip(self),
        fields(variant_uuid = %variant),
        err
    )]
    async fn history(
        &self,
        variant: VariantUuid,
        limit: u32,
    ) -> Result<Vec<StockHistoryEntry>, StockLedgerError> {
        let mut tx = self.db.begin().await?;

        let entries = self
            .repository
            .list_history(&mut tx, variant, limit)
            .await?;

        tx.commit().await?;

        Ok(entries)
    }
}

#[automock]
#[async_trait]
pub trait StockLedgerService: Send + Sync {
    /// Remove units sold to an order. Fails without writing anything when stock is short.
    async fn decrement(
        &self,
        variant: VariantUuid,
        quantity: u64,
        order: Option<Uuid>,
        actor: Option<Uuid>,
    ) -> Result<StockHistoryEntry, StockLedgerError>;

    /// Return units to stock for a cancelled order.
    async fn increment(
        &self,
        variant: VariantUuid,
        quantity: u64,
        order: Option<Uuid>,
        actor: Option<Uuid>,
    ) -> Result<StockHistoryEntry, StockLedgerError>;

    /// Apply a signed manual adjustment.
    async fn adjust(&self, adjustment: StockAdjustment)
    -> Result<StockHistoryEntry, StockLedgerError>;

    /// Replace the stock quantity with a counted value.
    async fn correct(&self, correction: StockCorrection)
    -> Result<StockHistoryEntry, StockLedgerError>;

    /// Read-only pre-flight check.
    async fn check_availability(
        &self,
        variant: VariantUuid,
        requested: u64,
    ) -> Result<Availability, StockLedgerError>;

    /// History entries for a variant, newest first.
    async fn history(
        &self,
        variant: VariantUuid,
        limit: u32,
    ) -> Result<Vec<StockHistoryEntry>, StockLedgerError>;
}
