//! App Context

use std::sync::Arc;

use imprint::pricing::ShippingPolicy;
use rusty_money::iso::Currency;
use sqlx::migrate::MigrateError;
use thiserror::Error;
use tracing::info;

use crate::{
    config::{DatabaseConfig, ShopConfig, ShopConfigError},
    database::{self, Db},
    domain::{
        carts::{CartSession, CouponRevalidation},
        coupons::{CouponsService, PgCouponsService},
        fulfillment::{FulfillmentService, PgFulfillmentService},
        stock::{PgStockLedgerService, StockLedgerService},
        variants::{PgVariantsService, VariantsService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to apply migrations")]
    Migrate(#[source] MigrateError),

    #[error(transparent)]
    Shop(#[from] ShopConfigError),
}

#[derive(Clone)]
pub struct AppContext {
    pub variants: Arc<dyn VariantsService>,
    pub stock: Arc<dyn StockLedgerService>,
    pub coupons: Arc<dyn CouponsService>,
    pub fulfillment: Arc<dyn FulfillmentService>,
    pub currency: &'static Currency,
    pub shipping: ShippingPolicy<'static>,
    pub coupon_revalidation: CouponRevalidation,
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the shop settings are invalid, the database connection fails
    /// or requested migrations cannot be applied.
    pub async fn from_config(
        database: &DatabaseConfig,
        shop: &ShopConfig,
    ) -> Result<Self, AppInitError> {
        let currency = shop.currency()?;
        let shipping = shop.shipping_policy()?;

        let pool = database::connect(&database.database_url)
            .await
            .map_err(AppInitError::Database)?;

        if database.run_migrations {
            database::migrate(&pool)
                .await
                .map_err(AppInitError::Migrate)?;

            info!("applied pending migrations");
        }

        Ok(Self::from_db(
            Db::new(pool),
            currency,
            shipping,
            shop.coupon_revalidation,
        ))
    }

    /// Wire the Postgres-backed services around an existing handle.
    pub fn from_db(
        db: Db,
        currency: &'static Currency,
        shipping: ShippingPolicy<'static>,
        coupon_revalidation: CouponRevalidation,
    ) -> Self {
        let stock: Arc<dyn StockLedgerService> = Arc::new(PgStockLedgerService::new(db.clone()));
        let coupons: Arc<dyn CouponsService> =
            Arc::new(PgCouponsService::new(db.clone(), currency));

        Self {
            variants: Arc::new(PgVariantsService::new(db.clone())),
            fulfillment: Arc::new(PgFulfillmentService::new(
                db,
                Arc::clone(&stock),
                Arc::clone(&coupons),
            )),
            stock,
            coupons,
            currency,
            shipping,
            coupon_revalidation,
        }
    }

    /// Start a new, empty cart for one shopper.
    pub fn cart_session(&self) -> CartSession {
        CartSession::new(
            Arc::clone(&self.coupons),
            Arc::clone(&self.stock),
            Arc::clone(&self.variants),
            self.shipping,
            self.coupon_revalidation,
        )
    }
}
