use crate::{ledger::BalanceField, Amount, MatchId, TransactionId, TransactionStatus};

/// Error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Invalid Argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// Overflow.
    #[error("overflow")]
    Overflow,
    /// Insufficient balance.
    #[error("insufficient {field} balance, available={available}, required={required}")]
    InsufficientBalance {
        /// The balance that would go negative.
        field: BalanceField,
        /// Balance before the operation.
        available: Amount,
        /// Amount the operation tried to take.
        required: Amount,
    },
    /// The referral reward of the account has already been approved or rejected.
    #[error("referral reward already resolved")]
    ReferralAlreadyResolved,
    /// The recorded standing of the account does not match the expected previous standing.
    #[error("settlement mismatch for match `{0}`")]
    SettlementMismatch(MatchId),
    /// A transaction with the same id is already live.
    #[error("duplicate transaction: {0}")]
    DuplicateTransaction(TransactionId),
    /// Transaction not found.
    #[error("transaction not found: {0}")]
    TransactionNotFound(TransactionId),
    /// The transaction is not in the expected status.
    #[error("transaction `{id}` is {actual}, expected {expected}")]
    InvalidTransactionStatus {
        /// Transaction id.
        id: TransactionId,
        /// Expected status.
        expected: TransactionStatus,
        /// Actual status.
        actual: TransactionStatus,
    },
}
