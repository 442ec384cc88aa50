//! Order fulfillment service.
//!
//! Bridges a paid order into the stock ledger and the coupon usage counter. The order id
//! is the idempotency key: the first delivery claims the order row, later deliveries see
//! the claim and leave stock alone.

use std::{fmt::Write as _, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use tracing::{Span, info, warn};
use uuid::Uuid;

use crate::{
    database::Db,
    domain::{
        coupons::CouponsService,
        fulfillment::{
            data::{OrderLine, PaidOrder},
            errors::FulfillmentServiceError,
            records::{FulfillmentStatus, OrderFulfillmentRecord, OrderUuid},
            repository::PgFulfillmentRepository,
        },
        stock::StockLedgerService,
    },
};

/// Result of handing a paid order to the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FulfillmentOutcome {
    /// Stock was decremented for every line and the coupon redeemed.
    Fulfilled(OrderFulfillmentRecord),

    /// The order had already been claimed; nothing was changed.
    AlreadyProcessed(OrderFulfillmentRecord),

    /// Bookkeeping failed part-way and was flagged for a person to resolve.
    NeedsReview(OrderFulfillmentRecord),
}

impl FulfillmentOutcome {
    pub fn record(&self) -> &OrderFulfillmentRecord {
        match self {
            Self::Fulfilled(record) | Self::AlreadyProcessed(record) | Self::NeedsReview(record) => {
                record
            }
        }
    }
}

#[derive(Clone)]
pub struct PgFulfillmentService {
    db: Db,
    repository: PgFulfillmentRepository,
    stock: Arc<dyn StockLedgerService>,
    coupons: Arc<dyn CouponsService>,
}

impl PgFulfillmentService {
    #[must_use]
    pub fn new(
        db: Db,
        stock: Arc<dyn StockLedgerService>,
        coupons: Arc<dyn CouponsService>,
    ) -> Self {
        Self {
            db,
            repository: PgFulfillmentRepository::new(),
            stock,
            coupons,
        }
    }

    async fn claim(&self, order: &PaidOrder) -> Result<bool, FulfillmentServiceError> {
        let mut tx = self.db.begin().await?;

        let claimed = self
            .repository
            .claim_order(&mut tx, order.order, order.coupon, order.actor)
            .await?;

        if claimed {
            self.repository
                .create_lines(&mut tx, order.order, &order.lines)
                .await?;
        }

        tx.commit().await?;

        Ok(claimed)
    }

    async fn transition(
        &self,
        order: OrderUuid,
        from: FulfillmentStatus,
        to: FulfillmentStatus,
        notes: Option<&str>,
    ) -> Result<OrderFulfillmentRecord, FulfillmentServiceError> {
        let mut tx = self.db.begin().await?;

        let moved = self
            .repository
            .transition(&mut tx, order, from, to, notes)
            .await?;

        let record = self.repository.get_fulfillment(&mut tx, order).await?;

        if !moved {
            return Err(FulfillmentServiceError::StatusChanged(record.status));
        }

        tx.commit().await?;

        Ok(record)
    }

    /// Undo decrements that already succeeded, most recent first.
    ///
    /// Returns a description of every line that could not be restocked.
    async fn compensate(&self, order: &PaidOrder, decremented: &[OrderLine]) -> String {
        let mut failures = String::new();

        for line in decremented.iter().rev() {
            if let Err(error) = self
                .stock
                .increment(
                    line.variant,
                    line.quantity,
                    Some(order.order.into_uuid()),
                    order.actor,
                )
                .await
            {
                warn!(
                    order_uuid = %order.order,
                    variant_uuid = %line.variant,
                    quantity = line.quantity,
                    error = %error,
                    "failed to restock line during compensation"
                );

                let _ = write!(
                    failures,
                    "; restock of {} x{} failed: {error}",
                    line.variant, line.quantity
                );
            }
        }

        failures
    }
}

#[async_trait]
impl FulfillmentService for PgFulfillmentService {
    #[tracing::instrument(
        name = "fulfillment.service.fulfil_paid_order",
        skip(self, order),
        fields(
            order_uuid = %order.order,
            coupon_uuid = tracing::field::Empty,
            actor_uuid = tracing::field::Empty,
            outcome = tracing::field::Empty
        ),
        err
    )]
    async fn fulfil_paid_order(
        &self,
        order: PaidOrder,
    ) -> Result<FulfillmentOutcome, FulfillmentServiceError> {
        let span = Span::current();

        if let Some(coupon) = order.coupon {
            span.record("coupon_uuid", tracing::field::display(coupon));
        }

        if let Some(actor) = order.actor {
            span.record("actor_uuid", tracing::field::display(actor));
        }

        if order.lines.is_empty() {
            return Err(FulfillmentServiceError::EmptyOrder);
        }

        if order.lines.iter().any(|line| line.quantity == 0) {
            return Err(FulfillmentServiceError::InvalidQuantity);
        }

        if !self.claim(&order).await? {
            let mut tx = self.db.begin().await?;
            let record = self.repository.get_fulfillment(&mut tx, order.order).await?;

            tx.commit().await?;

            span.record("outcome", "already_processed");

            info!(order_uuid = %order.order, status = %record.status, "order already processed");

            return Ok(FulfillmentOutcome::AlreadyProcessed(record));
        }

        let mut decremented = Vec::with_capacity(order.lines.len());

        for line in &order.lines {
            let result = self
                .stock
                .decrement(
                    line.variant,
                    line.quantity,
                    Some(order.order.into_uuid()),
                    order.actor,
                )
                .await;

            if let Err(error) = result {
                let failures = self.compensate(&order, &decremented).await;

                let notes = format!(
                    "stock decrement of {} x{} failed: {error}{failures}",
                    line.variant, line.quantity
                );

                warn!(
                    order_uuid = %order.order,
                    variant_uuid = %line.variant,
                    compensated_lines = decremented.len(),
                    error = %error,
                    "fulfillment failed, order flagged for review"
                );

                let record = self
                    .transition(
                        order.order,
                        FulfillmentStatus::Processing,
                        FulfillmentStatus::NeedsReview,
                        Some(&notes),
                    )
                    .await?;

                span.record("outcome", "needs_review");

                return Ok(FulfillmentOutcome::NeedsReview(record));
            }

            decremented.push(*line);
        }

        if let Some(coupon) = order.coupon
            && let Err(error) = self.coupons.increment_usage(coupon).await
        {
            let notes = format!("coupon {coupon} redemption failed: {error}");

            warn!(
                order_uuid = %order.order,
                coupon_uuid = %coupon,
                error = %error,
                "coupon redemption failed, order flagged for review"
            );

            let record = self
                .transition(
                    order.order,
                    FulfillmentStatus::Processing,
                    FulfillmentStatus::NeedsReview,
                    Some(&notes),
                )
                .await?;

            span.record("outcome", "needs_review");

            return Ok(FulfillmentOutcome::NeedsReview(record));
        }

        let record = self
            .transition(
                order.order,
                FulfillmentStatus::Processing,
                FulfillmentStatus::Fulfilled,
                None,
            )
            .await?;

        span.record("outcome", "fulfilled");

        info!(order_uuid = %order.order, lines = record.lines.len(), "fulfilled order");

        Ok(FulfillmentOutcome::Fulfilled(record))
    }

    #[tracing::instrument(
        name = "fulfillment.service.cancel_order",
        skip(self),
        fields(order_uuid = %order),
        err
    )]
    async fn cancel_order(
        &self,
        order: OrderUuid,
        actor: Option<Uuid>,
    ) -> Result<OrderFulfillmentRecord, FulfillmentServiceError> {
        let mut tx = self.db.begin().await?;

        let cancelled = self
            .repository
            .transition(
                &mut tx,
                order,
                FulfillmentStatus::Fulfilled,
                FulfillmentStatus::Cancelled,
                None,
            )
            .await?;

        let record = self.repository.get_fulfillment(&mut tx, order).await?;

        if !cancelled {
            return Err(FulfillmentServiceError::NotCancellable(record.status));
        }

        tx.commit().await?;

        let mut failures = String::new();

        for line in &record.lines {
            if let Err(error) = self
                .stock
                .increment(line.variant, line.quantity, Some(order.into_uuid()), actor)
                .await
            {
                let _ = write!(
                    failures,
                    "restock of {} x{} failed: {error}; ",
                    line.variant, line.quantity
                );
            }
        }

        if !failures.is_empty() {
            warn!(order_uuid = %order, notes = %failures, "cancellation restock incomplete");

            return self
                .transition(
                    order,
                    FulfillmentStatus::Cancelled,
                    FulfillmentStatus::NeedsReview,
                    Some(failures.trim_end_matches("; ")),
                )
                .await;
        }

        info!(order_uuid = %order, lines = record.lines.len(), "cancelled order");

        Ok(record)
    }

    async fn get_fulfillment(
        &self,
        order: OrderUuid,
    ) -> Result<OrderFulfillmentRecord, FulfillmentServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self.repository.get_fulfillment(&mut tx, order).await?;

        tx.commit().await?;

        Ok(record)
    }
}

#[automock]
#[async_trait]
pub trait FulfillmentService: Send + Sync {
    /// Book a paid order against stock and coupon usage, at most once per order id.
    ///
    /// Partial failures are compensated and flagged as
    /// [`FulfillmentOutcome::NeedsReview`] rather than returned as errors.
    async fn fulfil_paid_order(
        &self,
        order: PaidOrder,
    ) -> Result<FulfillmentOutcome, FulfillmentServiceError>;

    /// Cancel a fulfilled order and restock its lines once.
    async fn cancel_order(
        &self,
        order: OrderUuid,
        actor: Option<Uuid>,
    ) -> Result<OrderFulfillmentRecord, FulfillmentServiceError>;

    /// Retrieve an order's fulfillment state with its lines.
    async fn get_fulfillment(
        &self,
        order: OrderUuid,
    ) -> Result<OrderFulfillmentRecord, FulfillmentServiceError>;
}
