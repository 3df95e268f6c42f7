use std::sync::Arc;

use tourney_model::{
    Account, AccountId, Amount, BalanceField, Balances, MatchId, ResultEntry, Transaction,
    TransactionId, VoucherCode, WithdrawalDetails,
};

use crate::{
    clock::Clock,
    config::LedgerConfig,
    entry::{Entry, EntryService},
    ledger::Ledger,
    payments::PaymentsService,
    referral::{ReferralOutcome, ReferralService, ReferrerCredit},
    settlement::{FinalizeReport, SettlementEngine},
    store::{AccountStore, MatchStore, VoucherStore},
    transfer::{Share, TransferService},
    voucher::{Redemption, VoucherService},
};

/// Entry point to every ledger operation.
pub struct Tourney<S> {
    ledger: Ledger<S>,
}

impl<S> Clone for Tourney<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
        }
    }
}

impl<S> Tourney<S> {
    /// Create with the system clock.
    pub fn new(store: Arc<S>, config: LedgerConfig) -> Self {
        Self {
            ledger: Ledger::new(store, config),
        }
    }

    /// Replace the clock.
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger: self.ledger.with_clock(clock),
        }
    }

    /// Ledger.
    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    /// Store.
    pub fn store(&self) -> &Arc<S> {
        self.ledger.store()
    }

    /// Settlement engine.
    pub fn settlement(&self) -> SettlementEngine<S> {
        SettlementEngine::new(self.ledger.clone())
    }

    /// Voucher service.
    pub fn vouchers(&self) -> VoucherService<S> {
        VoucherService::new(self.ledger.clone())
    }

    /// Referral service.
    pub fn referrals(&self) -> ReferralService<S> {
        ReferralService::new(self.ledger.clone())
    }

    /// Transfer service.
    pub fn transfers(&self) -> TransferService<S> {
        TransferService::new(self.ledger.clone())
    }

    /// Entry service.
    pub fn entries(&self) -> EntryService<S> {
        EntryService::new(self.ledger.clone())
    }

    /// Payments service.
    pub fn payments(&self) -> PaymentsService<S> {
        PaymentsService::new(self.ledger.clone())
    }
}

impl<S: AccountStore + MatchStore + VoucherStore> Tourney<S> {
    /// Get account by id.
    pub async fn account(&self, id: &AccountId) -> crate::Result<Account> {
        self.ledger.account(id).await
    }

    /// Settle a new or edited result list. See [`SettlementEngine::finalize`].
    pub async fn finalize_match(
        &self,
        match_id: &MatchId,
        entries: Vec<ResultEntry>,
    ) -> crate::Result<FinalizeReport> {
        self.settlement().finalize(match_id, entries).await
    }

    /// Redeem a voucher.
    pub async fn redeem_voucher(
        &self,
        code: &VoucherCode,
        account: &AccountId,
    ) -> crate::Result<Redemption> {
        self.vouchers().redeem(code, account).await
    }

    /// Accounts waiting for a referral decision.
    pub async fn pending_referrals(&self) -> crate::Result<Vec<Account>> {
        self.referrals().pending().await
    }

    /// Approve a referral.
    pub async fn approve_referral(&self, referred: &AccountId) -> crate::Result<ReferralOutcome> {
        self.referrals().approve(referred).await
    }

    /// Reject a referral.
    pub async fn reject_referral(&self, referred: &AccountId) -> crate::Result<ReferralOutcome> {
        self.referrals().reject(referred).await
    }

    /// Retry the referrer credit of an approved referral.
    pub async fn settle_referrer(&self, referred: &AccountId) -> crate::Result<ReferrerCredit> {
        self.referrals().settle_referrer(referred).await
    }

    /// Share winnings with another account.
    pub async fn share_balance(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> crate::Result<Share> {
        self.transfers().share(from, to, amount).await
    }

    /// Convert winnings into deposit.
    pub async fn convert_balance(
        &self,
        account: &AccountId,
        amount: Amount,
    ) -> crate::Result<Balances> {
        self.transfers().convert(account, amount).await
    }

    /// Admin adjustment of one balance.
    pub async fn adjust_balance(
        &self,
        account: &AccountId,
        field: BalanceField,
        amount: Amount,
        reason: &str,
    ) -> crate::Result<Balances> {
        self.transfers().adjust(account, field, amount, reason).await
    }

    /// Join a match.
    pub async fn join_match(
        &self,
        account: &AccountId,
        match_id: &MatchId,
        external_player_id: &str,
    ) -> crate::Result<Entry> {
        self.entries()
            .join(account, match_id, external_player_id)
            .await
    }

    /// Record a confirmed deposit.
    pub async fn record_deposit(
        &self,
        account: &AccountId,
        amount: Amount,
        payment_ref: &str,
    ) -> crate::Result<Balances> {
        self.payments()
            .record_deposit(account, amount, payment_ref)
            .await
    }

    /// Request a withdrawal.
    pub async fn request_withdrawal(
        &self,
        account: &AccountId,
        amount: Amount,
        details: WithdrawalDetails,
    ) -> crate::Result<TransactionId> {
        self.payments()
            .request_withdrawal(account, amount, details)
            .await
    }

    /// Approve a pending withdrawal.
    pub async fn approve_withdrawal(
        &self,
        account: &AccountId,
        id: &TransactionId,
    ) -> crate::Result<Transaction> {
        self.payments().approve_withdrawal(account, id).await
    }

    /// Reject a pending withdrawal.
    pub async fn reject_withdrawal(
        &self,
        account: &AccountId,
        id: &TransactionId,
        reason: &str,
    ) -> crate::Result<Transaction> {
        self.payments().reject_withdrawal(account, id, reason).await
    }
}
