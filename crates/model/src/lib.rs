#![deny(missing_docs)]
#![deny(unreachable_pub)]

//! Domain model of the tournament reward ledger.
//!
//! Everything here is synchronous and free of I/O. The types describe the
//! per-user [`Account`] aggregate, the records appended to it, and the rules
//! for applying a [`LedgerOp`] to one aggregate atomically. Match ranking,
//! the settlement diff and voucher claim rules live here as well, so that the
//! async services and the stores share a single definition of them.

/// Identifiers.
pub mod id;

/// Transactions and notifications.
pub mod record;

/// Ledger operations.
pub mod ledger;

/// Account aggregate.
pub mod account;

/// Matches and results.
pub mod matches;

/// Settlement plan.
pub mod settlement;

/// Vouchers.
pub mod voucher;

/// Error type.
pub mod error;


pub use account::{Account, Balances, MatchStanding};
pub use error::Error;
pub use id::{AccountId, MatchId, NotificationId, TransactionId, VoucherCode};
pub use ledger::{ApplyOutcome, BalanceField, FieldDeltas, Guard, LedgerOp};
pub use matches::{Match, MatchStatus, Participant, RankedResult, ResultEntry};
pub use record::{
    Notification, NotificationIcon, Transaction, TransactionKind, TransactionStatus,
    WithdrawalDetails,
};
pub use settlement::{AccountSettlement, SettlementPlan};
pub use voucher::{Claim, ClaimOutcome, CreditTarget, Voucher};

/// Monetary amount.
pub type Amount = rust_decimal::Decimal;

/// Alias for result.
pub type Result<T> = std::result::Result<T, Error>;
