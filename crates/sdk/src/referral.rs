use tourney_model::{
    Account, AccountId, Amount, ApplyOutcome, FieldDeltas, Guard, LedgerOp, Notification,
    NotificationIcon, NotificationId, Transaction, TransactionId, TransactionKind,
};

use crate::{
    error::{AccountFailure, NotFound, PartialFailure},
    ledger::Ledger,
    retry::with_retry,
    store::AccountStore,
    Error,
};

/// Outcome of approving or rejecting a referral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferralOutcome {
    /// Both rewards were credited.
    Approved {
        /// Referrer credited.
        referrer: AccountId,
        /// Credited to the referred account.
        new_user_reward: Amount,
        /// Credited to the referrer.
        referrer_reward: Amount,
    },
    /// Closed without any credit.
    Rejected,
    /// The referral had already been approved or rejected; nothing changed.
    AlreadyResolved,
}

/// Outcome of [`ReferralService::settle_referrer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferrerCredit {
    /// Credited now.
    Credited,
    /// Had been credited before.
    AlreadyCredited,
}

/// Two-sided referral bonus settlement.
///
/// The pending set is derived from the accounts: referred, not yet
/// resolved, and without any match played.
pub struct ReferralService<S> {
    ledger: Ledger<S>,
}

impl<S> ReferralService<S> {
    /// Create a service writing through the given ledger.
    pub fn new(ledger: Ledger<S>) -> Self {
        Self { ledger }
    }
}

fn bonus_transaction_id(referred: &AccountId) -> TransactionId {
    TransactionId::keyed(TransactionKind::ReferralBonus, referred)
}

impl<S: AccountStore> ReferralService<S> {
    /// Accounts waiting for a referral decision.
    pub async fn pending(&self) -> crate::Result<Vec<Account>> {
        let store = self.ledger.store();
        let accounts = with_retry(&self.ledger.config().retry, "referred_accounts", || {
            store.referred_accounts()
        })
        .await?;
        Ok(accounts
            .into_iter()
            .filter(Account::is_referral_pending)
            .collect())
    }

    /// Credit both sides of a pending referral.
    ///
    /// The referred account is credited and marked resolved in one write, so
    /// it can never be credited twice. If crediting the referrer fails
    /// afterwards, the referral stays resolved and a partial failure is
    /// returned; [`settle_referrer`](Self::settle_referrer) retries that half.
    pub async fn approve(&self, referred: &AccountId) -> crate::Result<ReferralOutcome> {
        let account = self.ledger.account(referred).await?;
        if account.reward_claimed() {
            return Ok(ReferralOutcome::AlreadyResolved);
        }
        if account.match_count() > 0 {
            return Err(Error::validation(format!(
                "`{referred}` has already played and is no longer eligible"
            )));
        }
        let referrer = self.find_referrer(&account).await?;
        let rewards = &self.ledger.config().referral;
        let now = self.ledger.now();

        let op = LedgerOp::builder()
            .deltas(FieldDeltas {
                deposit: rewards.new_user_reward,
                ..Default::default()
            })
            .upsert_transaction(
                Transaction::builder()
                    .id(bonus_transaction_id(referred))
                    .kind(TransactionKind::ReferralBonus)
                    .amount(rewards.new_user_reward)
                    .created_at(now)
                    .reason("Referral sign-up bonus")
                    .build(),
            )
            .guard(Guard::ReferralUnclaimed)
            .build();
        match self.ledger.apply(referred, &op).await {
            Ok(_) => {}
            Err(Error::Model(tourney_model::Error::ReferralAlreadyResolved)) => {
                // Either resolved concurrently, or our own write committed
                // before its acknowledgement was lost.
                let account = self.ledger.account(referred).await?;
                if account.transaction(&bonus_transaction_id(referred)).is_none() {
                    return Ok(ReferralOutcome::AlreadyResolved);
                }
            }
            Err(err) => return Err(err),
        }

        if let Err(error) = self.credit_referrer(referred, referrer.id()).await {
            tracing::warn!(%error, %referred, referrer = %referrer.id(), "referrer credit failed");
            return Err(PartialFailure {
                succeeded: vec![referred.clone()],
                failed: vec![AccountFailure {
                    account_id: referrer.id().clone(),
                    error,
                }],
            }
            .into());
        }

        tracing::info!(%referred, referrer = %referrer.id(), "referral approved");
        Ok(ReferralOutcome::Approved {
            referrer: referrer.id().clone(),
            new_user_reward: rewards.new_user_reward,
            referrer_reward: rewards.referrer_reward,
        })
    }

    /// Close a pending referral without any credit. Irreversible.
    pub async fn reject(&self, referred: &AccountId) -> crate::Result<ReferralOutcome> {
        let account = self.ledger.account(referred).await?;
        if account.reward_claimed() {
            return Ok(ReferralOutcome::AlreadyResolved);
        }
        if account.referred_by_code().is_none() {
            return Err(Error::validation(format!("`{referred}` was not referred")));
        }
        let op = LedgerOp::builder().guard(Guard::ReferralUnclaimed).build();
        match self.ledger.apply(referred, &op).await {
            Ok(_) => {
                tracing::info!(%referred, "referral rejected");
                Ok(ReferralOutcome::Rejected)
            }
            Err(Error::Model(tourney_model::Error::ReferralAlreadyResolved)) => {
                Ok(ReferralOutcome::AlreadyResolved)
            }
            Err(err) => Err(err),
        }
    }

    /// Credit the referrer of an approved referral if that has not happened yet.
    pub async fn settle_referrer(&self, referred: &AccountId) -> crate::Result<ReferrerCredit> {
        let account = self.ledger.account(referred).await?;
        if !account.reward_claimed()
            || account.transaction(&bonus_transaction_id(referred)).is_none()
        {
            return Err(Error::validation(format!(
                "referral of `{referred}` has not been approved"
            )));
        }
        let referrer = self.find_referrer(&account).await?;
        let credit = self.credit_referrer(referred, referrer.id()).await?;
        tracing::info!(%referred, referrer = %referrer.id(), ?credit, "referrer settled");
        Ok(credit)
    }

    async fn find_referrer(&self, referred: &Account) -> crate::Result<Account> {
        let code = referred.referred_by_code().ok_or_else(|| {
            Error::validation(format!("`{}` was not referred", referred.id()))
        })?;
        let store = self.ledger.store();
        let referrer = with_retry(&self.ledger.config().retry, "find_by_referral_code", || {
            store.find_by_referral_code(code)
        })
        .await?
        .ok_or_else(|| NotFound::Referrer(code.to_string()))?;
        if referrer.id() == referred.id() {
            return Err(Error::validation("an account cannot refer itself"));
        }
        Ok(referrer)
    }

    async fn credit_referrer(
        &self,
        referred: &AccountId,
        referrer: &AccountId,
    ) -> crate::Result<ReferrerCredit> {
        let reward = self.ledger.config().referral.referrer_reward;
        let now = self.ledger.now();
        let id = bonus_transaction_id(referred);
        let op = LedgerOp::builder()
            .deltas(FieldDeltas {
                deposit: reward,
                ..Default::default()
            })
            .upsert_transaction(
                Transaction::builder()
                    .id(id.clone())
                    .kind(TransactionKind::ReferralBonus)
                    .amount(reward)
                    .created_at(now)
                    .reason(format!("Referral bonus for inviting {referred}"))
                    .build(),
            )
            .upsert_notification(
                Notification::builder()
                    .id(NotificationId::keyed(TransactionKind::ReferralBonus, referred))
                    .icon(NotificationIcon::Gift)
                    .title("Referral bonus")
                    .message(format!(
                        "{referred} joined with your code. {reward} was added to your deposit balance."
                    ))
                    .created_at(now)
                    .build(),
            )
            .guard(Guard::TransactionAbsent(id))
            .build();
        match self.ledger.apply(referrer, &op).await {
            Ok(applied) if applied.outcome == ApplyOutcome::Applied => Ok(ReferrerCredit::Credited),
            Ok(_) => Ok(ReferrerCredit::AlreadyCredited),
            Err(Error::Model(tourney_model::Error::DuplicateTransaction(_))) => {
                Ok(ReferrerCredit::AlreadyCredited)
            }
            Err(err) => Err(err),
        }
    }
}
