//! Ledger store adapter, services and cart sessions for the print shop.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod observability;

#[cfg(test)]
mod test;

pub mod uuids;
