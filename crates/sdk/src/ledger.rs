use std::sync::Arc;

use time::OffsetDateTime;
use tourney_model::{Account, AccountId, ApplyOutcome, LedgerOp};

use crate::{
    clock::{Clock, SystemClock},
    config::LedgerConfig,
    retry::with_retry,
    store::{AccountStore, Applied},
};

/// The single path through which balances change.
///
/// Wraps [`AccountStore::apply_delta`] with retries of store errors. A retried
/// write may have been committed by an earlier attempt whose acknowledgement
/// was lost, so every op sent through here carries a [`Guard`](tourney_model::Guard)
/// or is otherwise safe to apply twice.
pub struct Ledger<S> {
    store: Arc<S>,
    config: Arc<LedgerConfig>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for Ledger<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<S> Ledger<S> {
    /// Create a ledger using the system clock.
    pub fn new(store: Arc<S>, config: LedgerConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Config.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Current time.
    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }
}

impl<S: AccountStore> Ledger<S> {
    /// Get account by id.
    pub async fn account(&self, id: &AccountId) -> crate::Result<Account> {
        with_retry(&self.config.retry, "get_account", || {
            self.store.get_account(id)
        })
        .await
    }

    /// Apply `op` to the account atomically.
    pub async fn apply(&self, id: &AccountId, op: &LedgerOp) -> crate::Result<Applied> {
        let applied = with_retry(&self.config.retry, "apply_delta", || {
            self.store.apply_delta(id, op)
        })
        .await
        .inspect_err(|err| tracing::debug!(%err, account = %id, "ledger op rejected"))?;
        match applied.outcome {
            ApplyOutcome::Applied => {
                let balances = applied.account.balances();
                tracing::debug!(
                    account = %id,
                    deposit = %balances.deposit,
                    winnings = %balances.winnings,
                    "ledger op applied"
                );
            }
            ApplyOutcome::AlreadyApplied => {
                tracing::debug!(account = %id, "ledger op already applied");
            }
        }
        Ok(applied)
    }
}
