//! Stock Ledger

pub mod data;
pub mod errors;
mod repository;
pub mod service;

pub use errors::StockLedgerError;
pub use service::*;
