use clap::Args;
use imprint_app::{
    context::AppContext,
    domain::{
        stock::data::StockCorrection,
        variants::{data::NewVariant, records::VariantUuid},
    },
};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct CreateVariantArgs {
    /// Product the variant belongs to
    #[arg(long)]
    product_uuid: Uuid,

    /// Category used for coupon scoping
    #[arg(long)]
    category_uuid: Option<Uuid>,

    /// Display name, e.g. "XL / black"
    #[arg(long)]
    name: String,

    /// Minor units added to the product base price
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    price_adjustment: i64,

    /// Units on hand, booked as a stock correction
    #[arg(long, default_value_t = 0)]
    initial_stock: u64,

    /// Person or process creating the variant
    #[arg(long)]
    actor: Option<Uuid>,
}

pub(crate) async fn run(args: CreateVariantArgs, ctx: &AppContext) -> Result<(), String> {
    let variant = ctx
        .variants
        .create_variant(NewVariant {
            uuid: VariantUuid::new(),
            product_uuid: args.product_uuid,
            category_uuid: args.category_uuid,
            name: args.name,
            price_adjustment: args.price_adjustment,
        })
        .await
        .map_err(|error| format!("failed to create variant: {error}"))?;

    println!("variant_uuid: {}", variant.uuid);

    if args.initial_stock > 0 {
        let entry = ctx
            .stock
            .correct(StockCorrection {
                variant: variant.uuid,
                quantity: args.initial_stock,
                notes: Some("initial stock".to_string()),
                actor: args.actor,
            })
            .await
            .map_err(|error| format!("failed to book initial stock: {error}"))?;

        println!("stock_quantity: {}", entry.new_quantity());
    } else {
        println!("stock_quantity: 0");
    }

    Ok(())
}
