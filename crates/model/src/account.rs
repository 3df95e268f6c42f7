use indexmap::IndexMap;
use typed_builder::TypedBuilder;

use crate::{
    ledger::{checked_add_balance, BalanceField, Guard, LedgerOp},
    AccountId, Amount, ApplyOutcome, MatchId, Notification, NotificationId, Transaction,
    TransactionId,
};

/// Result of an account in a settled match, as applied to its balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchStanding {
    /// Winning amount.
    pub winning: Amount,
    /// Kills.
    pub kills: u64,
    /// Rank.
    #[builder(default)]
    pub rank: u32,
}

impl MatchStanding {
    /// Returns whether two optional standings carry the same payout.
    ///
    /// Ranks are not compared: a rank may shift because of edits to other
    /// participants without any money moving for this one.
    pub fn same_payout(a: Option<&Self>, b: Option<&Self>) -> bool {
        let winning = |s: Option<&Self>| s.map(|s| s.winning).unwrap_or_default();
        let kills = |s: Option<&Self>| s.map(|s| s.kills).unwrap_or_default();
        winning(a) == winning(b) && kills(a) == kills(b)
    }
}

/// Snapshot of the monetary fields of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Balances {
    /// Deposit balance.
    pub deposit: Amount,
    /// Winnings balance.
    pub winnings: Amount,
    /// Lifetime winnings.
    pub total_winnings: Amount,
}

/// The balance and history aggregate of one user.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Account {
    id: AccountId,
    display_name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    referral_code: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    referred_by_code: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    reward_claimed: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    deposit_balance: Amount,
    #[cfg_attr(feature = "serde", serde(default))]
    winnings_balance: Amount,
    #[cfg_attr(feature = "serde", serde(default))]
    total_winnings: Amount,
    #[cfg_attr(feature = "serde", serde(default))]
    kill_count: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    match_count: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    transactions: IndexMap<TransactionId, Transaction>,
    #[cfg_attr(feature = "serde", serde(default))]
    notifications: IndexMap<NotificationId, Notification>,
    #[cfg_attr(feature = "serde", serde(default))]
    standings: IndexMap<MatchId, MatchStanding>,
}

impl Account {
    /// Create an empty account.
    pub fn new(id: AccountId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            referral_code: None,
            referred_by_code: None,
            reward_claimed: false,
            deposit_balance: Amount::ZERO,
            winnings_balance: Amount::ZERO,
            total_winnings: Amount::ZERO,
            kill_count: 0,
            match_count: 0,
            transactions: IndexMap::new(),
            notifications: IndexMap::new(),
            standings: IndexMap::new(),
        }
    }

    /// Set the code other users can sign up with.
    pub fn with_referral_code(mut self, code: impl Into<String>) -> Self {
        self.referral_code = Some(code.into());
        self
    }

    /// Set the code this user signed up with.
    pub fn with_referred_by(mut self, code: impl Into<String>) -> Self {
        self.referred_by_code = Some(code.into());
        self
    }

    /// Id.
    pub fn id(&self) -> &AccountId {
        &self.id
    }

    /// Display name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Own referral code.
    pub fn referral_code(&self) -> Option<&str> {
        self.referral_code.as_deref()
    }

    /// Referral code used at sign-up.
    pub fn referred_by_code(&self) -> Option<&str> {
        self.referred_by_code.as_deref()
    }

    /// Whether the referral reward has been approved or rejected.
    pub fn reward_claimed(&self) -> bool {
        self.reward_claimed
    }

    /// Whether the account is waiting for a referral decision.
    pub fn is_referral_pending(&self) -> bool {
        self.referred_by_code.is_some() && !self.reward_claimed && self.match_count == 0
    }

    /// Balance of the given field.
    pub fn balance(&self, field: BalanceField) -> Amount {
        match field {
            BalanceField::Deposit => self.deposit_balance,
            BalanceField::Winnings => self.winnings_balance,
        }
    }

    /// All monetary fields.
    pub fn balances(&self) -> Balances {
        Balances {
            deposit: self.deposit_balance,
            winnings: self.winnings_balance,
            total_winnings: self.total_winnings,
        }
    }

    /// Kill count.
    pub fn kill_count(&self) -> u64 {
        self.kill_count
    }

    /// Match count.
    pub fn match_count(&self) -> u64 {
        self.match_count
    }

    /// Transactions, newest first.
    pub fn transactions(&self) -> impl ExactSizeIterator<Item = &Transaction> {
        self.transactions.values()
    }

    /// Get transaction by id.
    pub fn transaction(&self, id: &TransactionId) -> Option<&Transaction> {
        self.transactions.get(id)
    }

    /// Notifications, newest first.
    pub fn notifications(&self) -> impl ExactSizeIterator<Item = &Notification> {
        self.notifications.values()
    }

    /// Get notification by id.
    pub fn notification(&self, id: &NotificationId) -> Option<&Notification> {
        self.notifications.get(id)
    }

    /// Recorded standing in the given match.
    pub fn standing(&self, match_id: &MatchId) -> Option<&MatchStanding> {
        self.standings.get(match_id)
    }

    /// Apply a ledger operation.
    ///
    /// Either the whole op takes effect or the account is left untouched.
    pub fn apply(&mut self, op: &LedgerOp) -> crate::Result<ApplyOutcome> {
        if let Some(guard) = op.guard.as_ref() {
            if self.check_guard(guard, op)? == ApplyOutcome::AlreadyApplied {
                return Ok(ApplyOutcome::AlreadyApplied);
            }
        }

        let deltas = &op.deltas;
        let deposit = checked_add_balance(
            BalanceField::Deposit,
            self.deposit_balance,
            deltas.deposit,
            op.allow_negative,
        )?;
        let winnings = checked_add_balance(
            BalanceField::Winnings,
            self.winnings_balance,
            deltas.winnings,
            op.allow_negative,
        )?;
        let total_winnings = self
            .total_winnings
            .checked_add(deltas.total_winnings)
            .ok_or(crate::Error::Overflow)?;

        // Nothing below can fail.
        self.deposit_balance = deposit;
        self.winnings_balance = winnings;
        self.total_winnings = total_winnings;
        self.kill_count = self.kill_count.saturating_add_signed(deltas.kills);
        self.match_count = self.match_count.saturating_add_signed(deltas.matches);

        if let Some(id) = op.remove_transaction.as_ref() {
            self.transactions.shift_remove(id);
        }
        if let Some(transaction) = op.upsert_transaction.as_ref() {
            upsert_newest_first(&mut self.transactions, &transaction.id, transaction);
        }
        if let Some(id) = op.remove_notification.as_ref() {
            self.notifications.shift_remove(id);
        }
        if let Some(notification) = op.upsert_notification.as_ref() {
            upsert_newest_first(&mut self.notifications, &notification.id, notification);
        }

        match op.guard.as_ref() {
            Some(Guard::ReferralUnclaimed) => {
                self.reward_claimed = true;
            }
            Some(Guard::Settlement { match_id, next, .. }) => match next {
                Some(standing) => {
                    self.standings.insert(match_id.clone(), *standing);
                }
                None => {
                    self.standings.shift_remove(match_id);
                }
            },
            _ => {}
        }

        Ok(ApplyOutcome::Applied)
    }

    fn check_guard(&self, guard: &Guard, op: &LedgerOp) -> crate::Result<ApplyOutcome> {
        match guard {
            Guard::Settlement {
                match_id,
                previous,
                next,
            } => {
                let current = self.standings.get(match_id);
                if MatchStanding::same_payout(current, previous.as_ref()) {
                    Ok(ApplyOutcome::Applied)
                } else if MatchStanding::same_payout(current, next.as_ref()) {
                    Ok(ApplyOutcome::AlreadyApplied)
                } else {
                    Err(crate::Error::SettlementMismatch(match_id.clone()))
                }
            }
            Guard::ReferralUnclaimed => {
                if self.reward_claimed {
                    Err(crate::Error::ReferralAlreadyResolved)
                } else {
                    Ok(ApplyOutcome::Applied)
                }
            }
            Guard::TransactionAbsent(id) => match self.transactions.get(id) {
                None => Ok(ApplyOutcome::Applied),
                // The same op was already committed, e.g. before a lost acknowledgement.
                Some(live) if op.upsert_transaction.as_ref() == Some(live) => {
                    Ok(ApplyOutcome::AlreadyApplied)
                }
                Some(_) => Err(crate::Error::DuplicateTransaction(id.clone())),
            },
            Guard::TransactionStatus { id, expected } => {
                let transaction = self
                    .transactions
                    .get(id)
                    .ok_or_else(|| crate::Error::TransactionNotFound(id.clone()))?;
                if transaction.status == *expected {
                    Ok(ApplyOutcome::Applied)
                } else {
                    Err(crate::Error::InvalidTransactionStatus {
                        id: id.clone(),
                        expected: *expected,
                        actual: transaction.status,
                    })
                }
            }
        }
    }
}

fn upsert_newest_first<K, V>(map: &mut IndexMap<K, V>, key: &K, value: &V)
where
    K: std::hash::Hash + Eq + Clone,
    V: Clone,
{
    match map.get_mut(key) {
        Some(existing) => *existing = value.clone(),
        None => {
            map.shift_insert(0, key.clone(), value.clone());
        }
    }
}
