use std::future::Future;

use time::OffsetDateTime;
use tourney_model::{
    Account, AccountId, ApplyOutcome, ClaimOutcome, LedgerOp, Match, MatchId, Participant,
    RankedResult, Voucher, VoucherCode,
};

/// In-memory store.
#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "memory")]
pub use memory::{FailPoint, MemoryStore, Snapshot};

/// Result of [`AccountStore::apply_delta`].
#[derive(Debug, Clone)]
pub struct Applied {
    /// Whether the op changed the account.
    pub outcome: ApplyOutcome,
    /// The account after the write.
    pub account: Account,
}

/// Durable per-user balance and record storage.
pub trait AccountStore: Send + Sync {
    /// Get account by id.
    fn get_account(&self, id: &AccountId) -> impl Future<Output = crate::Result<Account>> + Send;

    /// Apply a ledger op to one account as a single atomic write.
    fn apply_delta(
        &self,
        id: &AccountId,
        op: &LedgerOp,
    ) -> impl Future<Output = crate::Result<Applied>> + Send;

    /// Find the account owning the given referral code.
    fn find_by_referral_code(
        &self,
        code: &str,
    ) -> impl Future<Output = crate::Result<Option<Account>>> + Send;

    /// All accounts that signed up with a referral code.
    fn referred_accounts(&self) -> impl Future<Output = crate::Result<Vec<Account>>> + Send;
}

/// Match metadata and results.
pub trait MatchStore: Send + Sync {
    /// Get match by id.
    fn get_match(&self, id: &MatchId) -> impl Future<Output = crate::Result<Match>> + Send;

    /// Replace the results of a match and move it to the results state.
    fn set_results(
        &self,
        id: &MatchId,
        results: Vec<RankedResult>,
        winnings_distributed: bool,
    ) -> impl Future<Output = crate::Result<()>> + Send;

    /// Register a participant.
    ///
    /// Must fail with [`Error::AlreadyJoined`](crate::Error::AlreadyJoined)
    /// if the account is already registered.
    fn add_participant(
        &self,
        id: &MatchId,
        participant: Participant,
    ) -> impl Future<Output = crate::Result<()>> + Send;
}

/// Voucher documents.
pub trait VoucherStore: Send + Sync {
    /// Get voucher by code.
    fn get_voucher(&self, code: &VoucherCode)
        -> impl Future<Output = crate::Result<Voucher>> + Send;

    /// Check the caps and record a claim in one atomic step.
    fn try_claim(
        &self,
        code: &VoucherCode,
        account: &AccountId,
        at: OffsetDateTime,
    ) -> impl Future<Output = crate::Result<ClaimOutcome>> + Send;

    /// Undo a claim made at `at`. Returns `false` if there was none.
    fn release_claim(
        &self,
        code: &VoucherCode,
        account: &AccountId,
        at: OffsetDateTime,
    ) -> impl Future<Output = crate::Result<bool>> + Send;
}
