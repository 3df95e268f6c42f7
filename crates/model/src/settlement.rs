use std::collections::HashSet;

use time::OffsetDateTime;

use crate::{
    matches::rank_results, AccountId, Amount, BalanceField, FieldDeltas, Guard, LedgerOp, MatchId,
    MatchStanding, Notification, NotificationIcon, NotificationId, RankedResult, ResultEntry,
    Transaction, TransactionId, TransactionKind,
};

/// Settlement of one account in a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSettlement {
    /// Account.
    pub account_id: AccountId,
    /// Standing recorded by the previous settlement.
    pub previous: Option<MatchStanding>,
    /// Standing after this settlement. `None` if the account was removed from the results.
    pub next: Option<MatchStanding>,
}

impl AccountSettlement {
    fn winning(standing: Option<&MatchStanding>) -> Amount {
        standing.map(|s| s.winning).unwrap_or_default()
    }

    fn kills(standing: Option<&MatchStanding>) -> u64 {
        standing.map(|s| s.kills).unwrap_or_default()
    }

    /// New winning amount.
    pub fn new_winning(&self) -> Amount {
        Self::winning(self.next.as_ref())
    }

    /// Signed change of winnings.
    pub fn winning_delta(&self) -> crate::Result<Amount> {
        self.new_winning()
            .checked_sub(Self::winning(self.previous.as_ref()))
            .ok_or(crate::Error::Overflow)
    }

    /// Signed change of kills.
    pub fn kill_delta(&self) -> crate::Result<i64> {
        let next = i64::try_from(Self::kills(self.next.as_ref())).map_err(|_| crate::Error::Overflow)?;
        let previous =
            i64::try_from(Self::kills(self.previous.as_ref())).map_err(|_| crate::Error::Overflow)?;
        next.checked_sub(previous).ok_or(crate::Error::Overflow)
    }

    /// Returns whether neither winnings nor kills change.
    pub fn is_unchanged(&self) -> bool {
        MatchStanding::same_payout(self.previous.as_ref(), self.next.as_ref())
    }

    /// Build the ledger operation applying this settlement.
    ///
    /// Lifetime winnings move by the same signed delta as the winnings
    /// balance, so corrections may lower them. Kill counts change without any
    /// transaction; only winnings are recorded.
    pub fn to_ledger_op(
        &self,
        match_id: &MatchId,
        match_title: &str,
        now: OffsetDateTime,
    ) -> crate::Result<LedgerOp> {
        let winning_delta = self.winning_delta()?;
        let deltas = FieldDeltas::balance(BalanceField::Winnings, winning_delta)
            .with_total_winnings(winning_delta)
            .with_kills(self.kill_delta()?);
        let guard = Guard::Settlement {
            match_id: match_id.clone(),
            previous: self.previous,
            next: self.next,
        };

        let op = match self.next.filter(|next| next.winning > Amount::ZERO) {
            Some(next) => {
                let transaction = Transaction::builder()
                    .id(TransactionId::winnings(match_id))
                    .kind(TransactionKind::Winnings)
                    .amount(next.winning)
                    .created_at(now)
                    .reason(format!("Rank #{} in {match_title}", next.rank))
                    .source_match_id(match_id.clone())
                    .build();
                let notification = Notification::builder()
                    .id(NotificationId::winnings(match_id))
                    .icon(NotificationIcon::Trophy)
                    .title("Winnings credited")
                    .message(format!(
                        "You finished #{} in {match_title} and won {}.",
                        next.rank, next.winning
                    ))
                    .created_at(now)
                    .source_match_id(match_id.clone())
                    .build();
                LedgerOp::builder()
                    .deltas(deltas)
                    .upsert_transaction(transaction)
                    .upsert_notification(notification)
                    .allow_negative(true)
                    .guard(guard)
                    .build()
            }
            None => LedgerOp::builder()
                .deltas(deltas)
                .remove_transaction(TransactionId::winnings(match_id))
                .remove_notification(NotificationId::winnings(match_id))
                .allow_negative(true)
                .guard(guard)
                .build(),
        };
        Ok(op)
    }
}

/// Diff between the stored results of a match and a newly submitted result list.
#[derive(Debug, Clone)]
pub struct SettlementPlan {
    match_id: MatchId,
    results: Vec<RankedResult>,
    previous: Vec<RankedResult>,
    accounts: Vec<AccountSettlement>,
    total_distributed: Amount,
}

impl SettlementPlan {
    /// Create a plan from the stored results and the submitted entries.
    ///
    /// The accounts to process are the union of both lists: those in the new
    /// results in rank order, followed by those that were removed.
    pub fn try_new(
        match_id: MatchId,
        previous: &[RankedResult],
        entries: Vec<ResultEntry>,
    ) -> crate::Result<Self> {
        crate::matches::validate_entries(&entries)?;
        let total_distributed = entries
            .iter()
            .try_fold(Amount::ZERO, |acc, entry| acc.checked_add(entry.winning_amount))
            .ok_or(crate::Error::Overflow)?;
        let results = rank_results(entries);

        let standing_in = |list: &[RankedResult], account: &AccountId| {
            list.iter()
                .find(|r| r.entry.account_id == *account)
                .map(RankedResult::standing)
        };

        let mut seen = HashSet::new();
        let accounts = results
            .iter()
            .chain(previous.iter())
            .filter(|r| seen.insert(r.entry.account_id.clone()))
            .map(|r| AccountSettlement {
                account_id: r.entry.account_id.clone(),
                previous: standing_in(previous, &r.entry.account_id),
                next: standing_in(&results, &r.entry.account_id),
            })
            .collect();

        Ok(Self {
            match_id,
            results,
            previous: previous.to_vec(),
            accounts,
            total_distributed,
        })
    }

    /// Match.
    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    /// Ranked results to persist.
    pub fn results(&self) -> &[RankedResult] {
        &self.results
    }

    /// Accounts to process.
    pub fn accounts(&self) -> &[AccountSettlement] {
        &self.accounts
    }

    /// Sum of submitted winning amounts.
    pub fn total_distributed(&self) -> Amount {
        self.total_distributed
    }

    /// Results reflecting what the accounts actually hold after a partially failed run:
    /// the new row for accounts that settled, the previous row for those that failed.
    pub fn reconciled_results(&self, failed: &HashSet<AccountId>) -> Vec<RankedResult> {
        let row = |list: &[RankedResult], account: &AccountId| {
            list.iter()
                .find(|r| r.entry.account_id == *account)
                .map(|r| r.entry.clone())
        };
        let entries = self.accounts.iter().filter_map(|settlement| {
            if failed.contains(&settlement.account_id) {
                row(&self.previous, &settlement.account_id)
            } else {
                row(&self.results, &settlement.account_id)
            }
        });
        rank_results(entries.collect::<Vec<_>>())
    }
}
