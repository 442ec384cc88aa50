use clap::Args;
use imprint_app::{context::AppContext, domain::variants::records::VariantUuid};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct StockHistoryArgs {
    /// Variant whose history should be listed
    #[arg(long)]
    variant_uuid: Uuid,

    /// Maximum number of entries, newest first
    #[arg(long, default_value_t = 20)]
    limit: u32,
}

pub(crate) async fn run(args: StockHistoryArgs, ctx: &AppContext) -> Result<(), String> {
    let entries = ctx
        .stock
        .history(VariantUuid::from_uuid(args.variant_uuid), args.limit)
        .await
        .map_err(|error| format!("failed to load stock history: {error}"))?;

    if entries.is_empty() {
        println!("no stock history for variant {}", args.variant_uuid);
        return Ok(());
    }

    for entry in &entries {
        super::print_entry(entry);
        println!();
    }

    Ok(())
}
