//! Application configuration

use clap::Args;

pub mod db;
pub mod observability;
pub mod shop;

pub use db::DatabaseConfig;
pub use observability::{LogFormat, LoggingConfig};
pub use shop::{ShopConfig, ShopConfigError};

/// Settings shared by every command.
#[derive(Debug, Args)]
pub struct AppConfig {
    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Ledger store settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Shop pricing settings.
    #[command(flatten)]
    pub shop: ShopConfig,
}
