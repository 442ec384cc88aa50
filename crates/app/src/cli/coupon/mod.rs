use clap::{Args, Subcommand};
use imprint_app::context::AppContext;

mod correct_usage;
mod create;
mod list;

#[derive(Debug, Args)]
pub(crate) struct CouponCommand {
    #[command(subcommand)]
    command: CouponSubcommand,
}

#[derive(Debug, Subcommand)]
enum CouponSubcommand {
    Create(create::CreateCouponArgs),
    List(list::ListCouponsArgs),
    CorrectUsage(correct_usage::CorrectUsageArgs),
}

pub(crate) async fn run(command: CouponCommand, ctx: &AppContext) -> Result<(), String> {
    match command.command {
        CouponSubcommand::Create(args) => create::run(args, ctx).await,
        CouponSubcommand::List(args) => list::run(args, ctx).await,
        CouponSubcommand::CorrectUsage(args) => correct_usage::run(args, ctx).await,
    }
}
