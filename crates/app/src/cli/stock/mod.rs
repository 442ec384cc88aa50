use clap::{Args, Subcommand};
use imprint::stock::StockHistoryEntry;
use imprint_app::context::AppContext;

mod adjust;
mod check;
mod correct;
mod history;

#[derive(Debug, Args)]
pub(crate) struct StockCommand {
    #[command(subcommand)]
    command: StockSubcommand,
}

#[derive(Debug, Subcommand)]
enum StockSubcommand {
    Adjust(adjust::AdjustStockArgs),
    Correct(correct::CorrectStockArgs),
    History(history::StockHistoryArgs),
    Check(check::CheckStockArgs),
}

pub(crate) async fn run(command: StockCommand, ctx: &AppContext) -> Result<(), String> {
    match command.command {
        StockSubcommand::Adjust(args) => adjust::run(args, ctx).await,
        StockSubcommand::Correct(args) => correct::run(args, ctx).await,
        StockSubcommand::History(args) => history::run(args, ctx).await,
        StockSubcommand::Check(args) => check::run(args, ctx).await,
    }
}

fn print_entry(entry: &StockHistoryEntry) {
    println!("entry_uuid: {}", entry.uuid());
    println!("reason: {}", entry.reason());
    println!(
        "quantity: {} -> {} ({:+})",
        entry.previous_quantity(),
        entry.new_quantity(),
        entry.quantity_change()
    );

    if let Some(order) = entry.order() {
        println!("order_uuid: {order}");
    }

    if let Some(notes) = entry.notes() {
        println!("notes: {notes}");
    }

    println!("created_at: {}", entry.created_at());
}
