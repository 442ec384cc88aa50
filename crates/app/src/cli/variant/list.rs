use clap::Args;
use imprint_app::context::AppContext;
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct ListVariantsArgs {
    /// Product whose variants should be listed
    #[arg(long)]
    product_uuid: Uuid,
}

pub(crate) async fn run(args: ListVariantsArgs, ctx: &AppContext) -> Result<(), String> {
    let variants = ctx
        .variants
        .list_variants(args.product_uuid)
        .await
        .map_err(|error| format!("failed to list variants: {error}"))?;

    if variants.is_empty() {
        println!("no variants found for product {}", args.product_uuid);
        return Ok(());
    }

    for variant in variants {
        println!("variant_uuid: {}", variant.uuid);
        println!("name: {}", variant.name);
        println!("price_adjustment: {}", variant.price_adjustment);
        println!("stock_quantity: {}", variant.stock_quantity);
        println!();
    }

    Ok(())
}
