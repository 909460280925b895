#![doc(test(attr(deny(warnings))))]

//! Split Core records shared household expenses between two parties, works out
//! who paid what and who owes whom, and keeps the ledger in a local key-value
//! store. An optional assistant pre-fills expenses from receipts and suggests
//! categories.

pub mod assistant;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod form;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Split Core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
    }
}
