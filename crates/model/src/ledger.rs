use rust_decimal::Decimal;
use typed_builder::TypedBuilder;

use crate::{
    account::MatchStanding, Amount, MatchId, Notification, NotificationId, Transaction,
    TransactionId, TransactionStatus,
};

/// Spendable balance of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum BalanceField {
    /// Deposit balance.
    Deposit,
    /// Winnings balance.
    Winnings,
}

/// Signed changes to the numeric fields of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDeltas {
    /// Change of deposit balance.
    pub deposit: Amount,
    /// Change of winnings balance.
    pub winnings: Amount,
    /// Change of lifetime winnings.
    pub total_winnings: Amount,
    /// Change of kill count.
    pub kills: i64,
    /// Change of match count.
    pub matches: i64,
}

impl FieldDeltas {
    /// Delta on a single balance.
    pub fn balance(field: BalanceField, amount: Amount) -> Self {
        let mut deltas = Self::default();
        *deltas.balance_mut(field) = amount;
        deltas
    }

    /// Mutable access to the delta of the given balance.
    pub fn balance_mut(&mut self, field: BalanceField) -> &mut Amount {
        match field {
            BalanceField::Deposit => &mut self.deposit,
            BalanceField::Winnings => &mut self.winnings,
        }
    }

    /// Add delta to lifetime winnings.
    pub fn with_total_winnings(mut self, amount: Amount) -> Self {
        self.total_winnings = amount;
        self
    }

    /// Add delta to kill count.
    pub fn with_kills(mut self, kills: i64) -> Self {
        self.kills = kills;
        self
    }

    /// Add delta to match count.
    pub fn with_matches(mut self, matches: i64) -> Self {
        self.matches = matches;
        self
    }

    /// Returns whether all deltas are zero.
    pub fn is_zero(&self) -> bool {
        self.deposit.is_zero()
            && self.winnings.is_zero()
            && self.total_winnings.is_zero()
            && self.kills == 0
            && self.matches == 0
    }
}

/// Precondition checked inside the same atomic write as the rest of a [`LedgerOp`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Guard {
    /// Compare-and-set of the recorded standing of the account in a match.
    ///
    /// `None` means "no standing". If the account already records `next`,
    /// the operation is skipped and reported as [`ApplyOutcome::AlreadyApplied`].
    Settlement {
        /// Match.
        match_id: MatchId,
        /// Standing the deltas were computed from.
        previous: Option<MatchStanding>,
        /// Standing after the deltas.
        next: Option<MatchStanding>,
    },
    /// The referral reward must be unresolved; it is marked resolved by the operation.
    ReferralUnclaimed,
    /// No live transaction with this id.
    ///
    /// If the live transaction is identical to the one the op upserts, the op
    /// is reported as [`ApplyOutcome::AlreadyApplied`] instead of failing.
    TransactionAbsent(TransactionId),
    /// The live transaction must be in the given status.
    TransactionStatus {
        /// Transaction id.
        id: TransactionId,
        /// Expected status.
        expected: TransactionStatus,
    },
}

/// Outcome of applying a [`LedgerOp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The operation changed the account.
    Applied,
    /// The guard found the operation already applied; nothing changed.
    AlreadyApplied,
}

/// The single operation every balance change funnels through.
///
/// One op touches exactly one account and is persisted as one atomic unit.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct LedgerOp {
    /// Field deltas.
    #[builder(default)]
    pub deltas: FieldDeltas,
    /// Transaction to insert, or to replace in place if its id is live.
    #[builder(default, setter(strip_option))]
    pub upsert_transaction: Option<Transaction>,
    /// Transaction to remove.
    #[builder(default, setter(strip_option))]
    pub remove_transaction: Option<TransactionId>,
    /// Notification to insert, or to replace in place if its id is live.
    #[builder(default, setter(strip_option))]
    pub upsert_notification: Option<Notification>,
    /// Notification to remove.
    #[builder(default, setter(strip_option))]
    pub remove_notification: Option<NotificationId>,
    /// Allow balances to be taken below zero.
    #[builder(default)]
    pub allow_negative: bool,
    /// Precondition.
    #[builder(default, setter(strip_option))]
    pub guard: Option<Guard>,
}

impl LedgerOp {
    /// Returns whether the op would not change anything besides its guard.
    pub fn is_noop(&self) -> bool {
        self.deltas.is_zero()
            && self.upsert_transaction.is_none()
            && self.remove_transaction.is_none()
            && self.upsert_notification.is_none()
            && self.remove_notification.is_none()
    }
}

pub(crate) fn checked_add_balance(
    field: BalanceField,
    current: Amount,
    delta: Amount,
    allow_negative: bool,
) -> crate::Result<Amount> {
    let next = current.checked_add(delta).ok_or(crate::Error::Overflow)?;
    if next < Decimal::ZERO && delta.is_sign_negative() && !allow_negative {
        return Err(crate::Error::InsufficientBalance {
            field,
            available: current,
            required: -delta,
        });
    }
    Ok(next)
}
