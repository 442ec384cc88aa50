use clap::Args;
use imprint_app::{context::AppContext, domain::variants::records::VariantUuid};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct CheckStockArgs {
    /// Variant to check
    #[arg(long)]
    variant_uuid: Uuid,

    /// Units wanted
    #[arg(long, default_value_t = 1)]
    quantity: u64,
}

pub(crate) async fn run(args: CheckStockArgs, ctx: &AppContext) -> Result<(), String> {
    let availability = ctx
        .stock
        .check_availability(VariantUuid::from_uuid(args.variant_uuid), args.quantity)
        .await
        .map_err(|error| format!("failed to check stock: {error}"))?;

    println!("available: {}", availability.available);
    println!("current_stock: {}", availability.current_stock);

    if let Some(message) = availability.message {
        println!("message: {message}");
    }

    Ok(())
}
