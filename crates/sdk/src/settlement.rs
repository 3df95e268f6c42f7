use std::collections::HashSet;

use futures_util::{stream, StreamExt};
use time::OffsetDateTime;
use tourney_model::{
    AccountId, AccountSettlement, Amount, ApplyOutcome, Match, MatchId, MatchStatus, RankedResult,
    ResultEntry, SettlementPlan, TransactionId,
};
use tracing::Instrument;

use crate::{
    error::{AccountFailure, PartialFailure},
    ledger::Ledger,
    retry::with_retry,
    store::{AccountStore, MatchStore},
    Error,
};

/// What happened to one account during a finalize run.
#[derive(Debug, Clone)]
pub enum AccountStatus {
    /// The deltas were applied.
    Applied {
        /// Change of winnings.
        winning_delta: Amount,
        /// Change of kills.
        kill_delta: i64,
    },
    /// A previous run already applied the same standing.
    AlreadyApplied,
    /// Nothing to change.
    Skipped,
    /// The update was not committed.
    Failed(Error),
}

impl AccountStatus {
    /// Returns whether the account holds the submitted standing.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Status of one account.
#[derive(Debug, Clone)]
pub struct AccountReport {
    /// Account.
    pub account_id: AccountId,
    /// Status.
    pub status: AccountStatus,
}

/// Non-fatal findings of a finalize run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementWarning {
    /// The submitted winnings add up to more than the prize pool.
    PrizePoolExceeded {
        /// Sum of the submitted winning amounts.
        distributed: Amount,
        /// Prize pool of the match.
        pool: Amount,
    },
}

/// Outcome of [`SettlementEngine::finalize`].
#[derive(Debug, Clone)]
pub struct FinalizeReport {
    /// Match.
    pub match_id: MatchId,
    /// Results written to the match.
    ///
    /// When some accounts failed, the rows of those accounts are the
    /// previously stored ones, so the stored results always describe what
    /// the accounts actually hold.
    pub results: Vec<RankedResult>,
    /// Status of every account in the union of the old and new results.
    pub accounts: Vec<AccountReport>,
    /// Warnings.
    pub warnings: Vec<SettlementWarning>,
    /// Set if writing [`results`](Self::results) to the match still failed
    /// after retries. The account updates above are committed regardless, and
    /// calling finalize again with the same entries stores the results.
    pub results_error: Option<Error>,
}

impl FinalizeReport {
    /// Returns whether every account was settled and the results were stored.
    pub fn is_complete(&self) -> bool {
        self.results_error.is_none() && self.all_settled()
    }

    fn all_settled(&self) -> bool {
        self.accounts.iter().all(|report| report.status.is_settled())
    }

    /// Accounts whose update failed.
    pub fn failed(&self) -> impl Iterator<Item = (&AccountId, &Error)> {
        self.accounts.iter().filter_map(|report| match &report.status {
            AccountStatus::Failed(err) => Some((&report.account_id, err)),
            _ => None,
        })
    }

    /// Breakdown of the run if some accounts failed.
    pub fn partial_failure(&self) -> Option<PartialFailure> {
        if self.all_settled() {
            return None;
        }
        let (settled, failed): (Vec<_>, Vec<_>) = self
            .accounts
            .iter()
            .partition(|report| report.status.is_settled());
        Some(PartialFailure {
            succeeded: settled.into_iter().map(|r| r.account_id.clone()).collect(),
            failed: failed
                .into_iter()
                .filter_map(|r| match &r.status {
                    AccountStatus::Failed(error) => Some(AccountFailure {
                        account_id: r.account_id.clone(),
                        error: error.clone(),
                    }),
                    _ => None,
                })
                .collect(),
        })
    }

    /// Convert into an error if some accounts failed or the results were not stored.
    pub fn into_result(self) -> crate::Result<Self> {
        if let Some(failure) = self.partial_failure() {
            return Err(failure.into());
        }
        match self.results_error {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// Diff-based settlement of match results.
pub struct SettlementEngine<S> {
    ledger: Ledger<S>,
}

impl<S> SettlementEngine<S> {
    /// Create an engine writing through the given ledger.
    pub fn new(ledger: Ledger<S>) -> Self {
        Self { ledger }
    }
}

impl<S: AccountStore + MatchStore> SettlementEngine<S> {
    /// Settle a new or edited result list of a match.
    ///
    /// Only the difference between the stored results and `entries` moves
    /// money, so calling this again with the same entries changes nothing.
    /// Accounts are settled independently; failures are reported per account
    /// and can be fixed by calling this again with the same entries. A failed
    /// write of the results to the match is reported the same way.
    pub async fn finalize(
        &self,
        match_id: &MatchId,
        entries: Vec<ResultEntry>,
    ) -> crate::Result<FinalizeReport> {
        let retry = &self.ledger.config().retry;
        let store = self.ledger.store();
        let m = with_retry(retry, "get_match", || store.get_match(match_id)).await?;

        if m.status == MatchStatus::Upcoming {
            return Err(Error::validation(format!(
                "match `{match_id}` has not started"
            )));
        }
        let unknown = m
            .unknown_participants(&entries)
            .into_iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>();
        if !unknown.is_empty() {
            return Err(Error::validation(format!(
                "not participants of match `{match_id}`: {}",
                unknown.join(", ")
            )));
        }

        let plan = SettlementPlan::try_new(match_id.clone(), &m.results, entries)?;
        let mut warnings = Vec::new();
        if plan.total_distributed() > m.prize_pool {
            tracing::warn!(
                match_id = %match_id,
                distributed = %plan.total_distributed(),
                pool = %m.prize_pool,
                "winnings exceed the prize pool"
            );
            warnings.push(SettlementWarning::PrizePoolExceeded {
                distributed: plan.total_distributed(),
                pool: m.prize_pool,
            });
        }

        let m = &m;
        let now = self.ledger.now();
        let concurrency = self.ledger.config().settlement_concurrency.get();
        let accounts = stream::iter(plan.accounts())
            .map(|settlement| {
                let account = settlement.account_id.clone();
                async move {
                    let status = match self.settle_account(m, settlement, now).await {
                        Ok(status) => status,
                        Err(err) => {
                            tracing::warn!(%err, "failed to settle account");
                            AccountStatus::Failed(err)
                        }
                    };
                    AccountReport {
                        account_id: account,
                        status,
                    }
                }
                .instrument(tracing::info_span!(
                    "settle_account",
                    account = %settlement.account_id
                ))
            })
            .buffered(concurrency)
            .collect::<Vec<_>>()
            .await;

        let failed = accounts
            .iter()
            .filter(|report| !report.status.is_settled())
            .map(|report| report.account_id.clone())
            .collect::<HashSet<_>>();
        let (results, distributed) = if failed.is_empty() {
            (plan.results().to_vec(), true)
        } else {
            tracing::warn!(
                match_id = %match_id,
                failed = failed.len(),
                "settlement partially failed"
            );
            (plan.reconciled_results(&failed), m.winnings_distributed)
        };
        let results_error = with_retry(retry, "set_results", || {
            store.set_results(match_id, results.clone(), distributed)
        })
        .await
        .err();
        if let Some(err) = &results_error {
            tracing::error!(
                match_id = %match_id,
                %err,
                "accounts settled but the results were not stored"
            );
        }

        tracing::info!(
            match_id = %match_id,
            accounts = accounts.len(),
            failed = failed.len(),
            "match finalized"
        );
        Ok(FinalizeReport {
            match_id: match_id.clone(),
            results,
            accounts,
            warnings,
            results_error,
        })
    }

    async fn settle_account(
        &self,
        m: &Match,
        settlement: &AccountSettlement,
        now: OffsetDateTime,
    ) -> crate::Result<AccountStatus> {
        let account_id = &settlement.account_id;
        if settlement.is_unchanged() {
            let account = self.ledger.account(account_id).await?;
            let live = account.transaction(&TransactionId::winnings(&m.id)).is_some();
            let expects_live = settlement.new_winning() > Amount::ZERO;
            if live == expects_live {
                tracing::debug!("unchanged, skipped");
                return Ok(AccountStatus::Skipped);
            }
        }

        let op = settlement.to_ledger_op(&m.id, &m.title, now)?;
        let applied = self.ledger.apply(account_id, &op).await?;
        let status = match applied.outcome {
            ApplyOutcome::Applied => AccountStatus::Applied {
                winning_delta: settlement.winning_delta()?,
                kill_delta: settlement.kill_delta()?,
            },
            ApplyOutcome::AlreadyApplied => AccountStatus::AlreadyApplied,
        };
        tracing::info!(?status, "account settled");
        Ok(status)
    }
}
