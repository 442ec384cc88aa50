use clap::Args;
use imprint::coupons::CouponCode;
use imprint_app::{
    context::AppContext,
    domain::coupons::{
        data::{CouponDetails, CouponValue, NewCoupon},
        records::CouponUuid,
    },
};
use jiff::Timestamp;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct CreateCouponArgs {
    /// Code shoppers type in; stored upper-cased
    #[arg(long)]
    code: String,

    /// Percentage off the subtotal (0-100)
    #[arg(long, conflicts_with = "amount", required_unless_present = "amount")]
    percentage: Option<Decimal>,

    /// Fixed amount off, in minor units
    #[arg(long)]
    amount: Option<u64>,

    /// Minimum subtotal, in minor units
    #[arg(long)]
    min_purchase: Option<u64>,

    /// Discount cap, in minor units
    #[arg(long)]
    max_discount: Option<u64>,

    /// Start of the validity window; defaults to now
    #[arg(long)]
    valid_from: Option<Timestamp>,

    /// End of the validity window
    #[arg(long)]
    valid_until: Timestamp,

    /// Maximum number of redemptions
    #[arg(long)]
    usage_limit: Option<u64>,

    /// Create the coupon switched off
    #[arg(long)]
    inactive: bool,

    /// Restrict to a product; repeatable
    #[arg(long = "product")]
    products: Vec<Uuid>,

    /// Restrict to a category; repeatable
    #[arg(long = "category")]
    categories: Vec<Uuid>,
}

pub(crate) async fn run(args: CreateCouponArgs, ctx: &AppContext) -> Result<(), String> {
    let value = match (args.percentage, args.amount) {
        (Some(points), None) => CouponValue::Percentage(points),
        (None, Some(amount)) => CouponValue::Fixed(amount),
        _ => return Err("exactly one of --percentage or --amount is required".to_string()),
    };

    let code = CouponCode::new(&args.code).map_err(|error| error.to_string())?;

    let coupon = ctx
        .coupons
        .create_coupon(NewCoupon {
            uuid: CouponUuid::new(),
            details: CouponDetails {
                code,
                value,
                min_purchase_amount: args.min_purchase,
                max_discount_amount: args.max_discount,
                valid_from: args.valid_from.unwrap_or_else(Timestamp::now),
                valid_until: args.valid_until,
                usage_limit: args.usage_limit,
                is_active: !args.inactive,
                applicable_products: args.products,
                applicable_categories: args.categories,
            },
        })
        .await
        .map_err(|error| format!("failed to create coupon: {error}"))?;

    println!("coupon_uuid: {}", coupon.uuid);
    println!("code: {}", coupon.code());

    Ok(())
}
