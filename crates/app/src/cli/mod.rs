use clap::{Parser, Subcommand};
use imprint_app::{config::AppConfig, context::AppContext, observability::init_subscriber};

mod coupon;
mod stock;
mod variant;

#[derive(Debug, Parser)]
#[command(name = "imprint-app", about = "Imprint ledger CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Coupon(coupon::CouponCommand),
    Variant(variant::VariantCommand),
    Stock(stock::StockCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        init_subscriber(&self.config.logging).map_err(|error| error.to_string())?;

        let ctx = AppContext::from_config(&self.config.database, &self.config.shop)
            .await
            .map_err(|error| format!("failed to initialise: {error}"))?;

        match self.command {
            Commands::Coupon(command) => coupon::run(command, &ctx).await,
            Commands::Variant(command) => variant::run(command, &ctx).await,
            Commands::Stock(command) => stock::run(command, &ctx).await,
        }
    }
}
