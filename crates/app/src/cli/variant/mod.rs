use clap::{Args, Subcommand};
use imprint_app::context::AppContext;

mod create;
mod list;

#[derive(Debug, Args)]
pub(crate) struct VariantCommand {
    #[command(subcommand)]
    command: VariantSubcommand,
}

#[derive(Debug, Subcommand)]
enum VariantSubcommand {
    Create(create::CreateVariantArgs),
    List(list::ListVariantsArgs),
}

pub(crate) async fn run(command: VariantCommand, ctx: &AppContext) -> Result<(), String> {
    match command.command {
        VariantSubcommand::Create(args) => create::run(args, ctx).await,
        VariantSubcommand::List(args) => list::run(args, ctx).await,
    }
}
