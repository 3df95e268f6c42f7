#![deny(missing_docs)]

//! Async services of the tournament reward ledger.
//!
//! Every balance change goes through [`Ledger`], which applies one
//! [`LedgerOp`](model::LedgerOp) to one account atomically via an
//! [`AccountStore`](store::AccountStore). Multi-account operations write
//! each account separately and report partial failures instead of rolling
//! back, so they are built to be safe to call again.

/// Error type.
pub mod error;

/// Configuration.
pub mod config;

/// Clocks.
pub mod clock;

/// Store contracts and the in-memory store.
pub mod store;

/// Ledger.
pub mod ledger;

/// Match settlement.
pub mod settlement;

/// Voucher redemption.
pub mod voucher;

/// Referral settlement.
pub mod referral;

/// Share, conversion and adjustment.
pub mod transfer;

/// Match entry.
pub mod entry;

/// Deposits and withdrawals.
pub mod payments;

/// Facade.
pub mod tourney;

mod retry;

/// Model support.
pub mod model {
    pub use tourney_model::*;
}

pub use config::LedgerConfig;
pub use error::{Error, ErrorKind};
pub use ledger::Ledger;
pub use tourney::Tourney;

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;
