use clap::Args;
use imprint_app::{context::AppContext, domain::coupons::data::CouponValue};

#[derive(Debug, Args)]
pub(crate) struct ListCouponsArgs {}

pub(crate) async fn run(_args: ListCouponsArgs, ctx: &AppContext) -> Result<(), String> {
    let coupons = ctx
        .coupons
        .list_coupons()
        .await
        .map_err(|error| format!("failed to list coupons: {error}"))?;

    if coupons.is_empty() {
        println!("no coupons found");
        return Ok(());
    }

    for coupon in coupons {
        let details = &coupon.details;

        println!("coupon_uuid: {}", coupon.uuid);
        println!("code: {}", details.code);

        match details.value {
            CouponValue::Percentage(points) => println!("percentage: {points}"),
            CouponValue::Fixed(amount) => println!("amount: {amount}"),
        }

        println!("valid: {} .. {}", details.valid_from, details.valid_until);
        println!(
            "usage: {} / {}",
            coupon.usage_count,
            details
                .usage_limit
                .map_or_else(|| "unlimited".to_string(), |limit| limit.to_string())
        );
        println!("active: {}", details.is_active);
        println!();
    }

    Ok(())
}
