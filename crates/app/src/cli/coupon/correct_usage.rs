use clap::Args;
use imprint_app::{context::AppContext, domain::coupons::records::CouponUuid};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct CorrectUsageArgs {
    /// Coupon to correct
    #[arg(long)]
    coupon_uuid: Uuid,

    /// Usage count to store
    #[arg(long)]
    count: u64,
}

pub(crate) async fn run(args: CorrectUsageArgs, ctx: &AppContext) -> Result<(), String> {
    let coupon = ctx
        .coupons
        .correct_usage(CouponUuid::from_uuid(args.coupon_uuid), args.count)
        .await
        .map_err(|error| format!("failed to correct usage: {error}"))?;

    println!("coupon_uuid: {}", coupon.uuid);
    println!("usage_count: {}", coupon.usage_count);

    Ok(())
}
