//! Service test support

pub mod helpers;

pub use context::TestContext;
