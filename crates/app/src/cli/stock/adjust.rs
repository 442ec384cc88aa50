use clap::Args;
use imprint_app::{
    context::AppContext,
    domain::{stock::data::StockAdjustment, variants::records::VariantUuid},
};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct AdjustStockArgs {
    /// Variant to adjust
    #[arg(long)]
    variant_uuid: Uuid,

    /// Signed change, e.g. 10 or -2
    #[arg(long, allow_negative_numbers = true)]
    delta: i64,

    /// Why the stock changed
    #[arg(long)]
    notes: Option<String>,

    /// Person making the change
    #[arg(long)]
    actor: Option<Uuid>,
}

pub(crate) async fn run(args: AdjustStockArgs, ctx: &AppContext) -> Result<(), String> {
    let entry = ctx
        .stock
        .adjust(StockAdjustment {
            variant: VariantUuid::from_uuid(args.variant_uuid),
            delta: args.delta,
            notes: args.notes,
            actor: args.actor,
        })
        .await
        .map_err(|error| format!("failed to adjust stock: {error}"))?;

    super::print_entry(&entry);

    Ok(())
}
