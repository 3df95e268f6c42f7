use std::fmt;

use tourney_model::{AccountId, MatchId, TransactionId, VoucherCode};

/// SDK Error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Model Error.
    #[error("model: {0}")]
    Model(#[from] tourney_model::Error),
    /// Invalid input.
    #[error("validation: {0}")]
    Validation(String),
    /// Not found error.
    #[error("not found: {0}")]
    NotFound(NotFound),
    /// Voucher redemption rejected.
    #[error("voucher: {0}")]
    Voucher(VoucherRejection),
    /// Sharing to the sender itself.
    #[error("cannot share balance with yourself")]
    SelfShare,
    /// The account has already joined the match.
    #[error("`{0}` has already joined match `{1}`")]
    AlreadyJoined(AccountId, MatchId),
    /// Some accounts of a multi-account operation failed.
    #[error("partial failure: {0}")]
    PartialFailure(Box<PartialFailure>),
    /// The store is unreachable or failed transiently.
    #[error("store: {0}")]
    Store(String),
}

impl Error {
    /// Create a validation error.
    pub fn validation(msg: impl ToString) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create a store error.
    pub fn store(msg: impl ToString) -> Self {
        Self::Store(msg.to_string())
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        use tourney_model::Error as ModelError;

        match self {
            Self::Model(err) => match err {
                ModelError::InvalidArgument(_) | ModelError::Overflow => ErrorKind::Validation,
                ModelError::TransactionNotFound(_) => ErrorKind::NotFound,
                ModelError::InsufficientBalance { .. }
                | ModelError::ReferralAlreadyResolved
                | ModelError::SettlementMismatch(_)
                | ModelError::DuplicateTransaction(_)
                | ModelError::InvalidTransactionStatus { .. } => ErrorKind::Conflict,
            },
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Voucher(_) | Self::SelfShare | Self::AlreadyJoined(..) => ErrorKind::Conflict,
            Self::PartialFailure(_) => ErrorKind::PartialFailure,
            Self::Store(_) => ErrorKind::Store,
        }
    }

    /// Returns whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Store)
    }

    /// Returns the partial failure report if this is one.
    pub fn as_partial_failure(&self) -> Option<&PartialFailure> {
        match self {
            Self::PartialFailure(report) => Some(report),
            _ => None,
        }
    }
}

impl From<NotFound> for Error {
    fn from(value: NotFound) -> Self {
        Self::NotFound(value)
    }
}

impl From<VoucherRejection> for Error {
    fn from(value: VoucherRejection) -> Self {
        Self::Voucher(value)
    }
}

impl From<PartialFailure> for Error {
    fn from(value: PartialFailure) -> Self {
        Self::PartialFailure(Box::new(value))
    }
}

/// Error classes callers act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input; not retried.
    Validation,
    /// Unknown account, match, voucher or record.
    NotFound,
    /// The current state does not allow the operation.
    Conflict,
    /// Some accounts succeeded and others failed.
    PartialFailure,
    /// The store failed; retryable.
    Store,
}

/// Missing entity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFound {
    /// Account.
    #[error("account `{0}`")]
    Account(AccountId),
    /// Match.
    #[error("match `{0}`")]
    Match(MatchId),
    /// Voucher.
    #[error("voucher `{0}`")]
    Voucher(VoucherCode),
    /// No account owns the referral code.
    #[error("referrer with code `{0}`")]
    Referrer(String),
    /// Transaction.
    #[error("transaction `{0}`")]
    Transaction(TransactionId),
}

/// Why a voucher could not be redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VoucherRejection {
    /// Past its expiry.
    #[error("the voucher has expired")]
    Expired,
    /// Every use has been claimed.
    #[error("the voucher has been fully redeemed")]
    ExhaustedGlobally,
    /// The account used up its own allowance.
    #[error("the voucher has already been used by this account")]
    ExhaustedForAccount,
}

/// Failure of one account in a multi-account operation.
#[derive(Debug, Clone)]
pub struct AccountFailure {
    /// Account.
    pub account_id: AccountId,
    /// Cause.
    pub error: Error,
}

/// Breakdown of a multi-account operation that did not fully succeed.
#[derive(Debug, Clone, Default)]
pub struct PartialFailure {
    /// Accounts whose updates were committed.
    pub succeeded: Vec<AccountId>,
    /// Accounts whose updates were not committed.
    pub failed: Vec<AccountFailure>,
}

impl PartialFailure {
    /// Ids of the failed accounts.
    pub fn failed_accounts(&self) -> impl Iterator<Item = &AccountId> {
        self.failed.iter().map(|failure| &failure.account_id)
    }
}

impl fmt::Display for PartialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed",
            self.succeeded.len(),
            self.failed.len()
        )?;
        for failure in &self.failed {
            write!(f, "; {}: {}", failure.account_id, failure.error)?;
        }
        Ok(())
    }
}
