use clap::Args;
use imprint_app::{
    context::AppContext,
    domain::{stock::data::StockCorrection, variants::records::VariantUuid},
};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct CorrectStockArgs {
    /// Variant that was counted
    #[arg(long)]
    variant_uuid: Uuid,

    /// Counted quantity
    #[arg(long)]
    quantity: u64,

    /// Context for the correction
    #[arg(long)]
    notes: Option<String>,

    /// Person who counted
    #[arg(long)]
    actor: Option<Uuid>,
}

pub(crate) async fn run(args: CorrectStockArgs, ctx: &AppContext) -> Result<(), String> {
    let entry = ctx
        .stock
        .correct(StockCorrection {
            variant: VariantUuid::from_uuid(args.variant_uuid),
            quantity: args.quantity,
            notes: args.notes,
            actor: args.actor,
        })
        .await
        .map_err(|error| format!("failed to correct stock: {error}"))?;

    super::print_entry(&entry);

    Ok(())
}
