use std::{sync::Arc, time::Duration};

use rust_decimal::Decimal;
use tourney_sdk::{
    clock::ManualClock,
    config::RetryPolicy,
    model::{
        test::{at, funded},
        Account, AccountId, Match, MatchId, MatchStatus, Participant, Voucher,
    },
    store::MemoryStore,
    LedgerConfig, Tourney,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Initialize tracing
fn init_tracing() {
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::ERROR.into())
                .from_env_lossy(),
        )
        .with_test_writer()
        .try_init()
    {
        tracing::trace!(%err, "failed to initialize tracing");
    }
}

/// Config with fast retries: every write is attempted 3 times.
pub fn config() -> LedgerConfig {
    LedgerConfig::builder()
        .retry(RetryPolicy {
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        })
        .build()
}

/// Attempts per write under [`config`].
pub const ATTEMPTS: usize = 3;

/// A deployment over a fresh [`MemoryStore`].
pub struct Deployment {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub tourney: Tourney<MemoryStore>,
}

impl Deployment {
    /// Create a deployment with the default test config.
    pub fn new() -> Self {
        Self::with_config(config())
    }

    /// Create a deployment with the given config.
    pub fn with_config(config: LedgerConfig) -> Self {
        init_tracing();
        let store = Arc::new(MemoryStore::default());
        let clock = Arc::new(ManualClock::new(at(0)));
        let tourney = Tourney::new(store.clone(), config).with_clock(clock.clone());
        Self {
            store,
            clock,
            tourney,
        }
    }

    /// Insert an account with the given balances.
    pub async fn add_account(&self, id: &str, deposit: Decimal, winnings: Decimal) -> AccountId {
        self.insert(funded(id, deposit, winnings)).await
    }

    /// Insert a prepared account.
    pub async fn insert(&self, account: Account) -> AccountId {
        let id = account.id().clone();
        self.store.insert_account(account).await;
        id
    }

    /// Insert a match joined by the given accounts.
    pub async fn add_match(
        &self,
        id: &str,
        status: MatchStatus,
        prize_pool: Decimal,
        participants: &[&AccountId],
    ) -> MatchId {
        let m = Match::builder()
            .id(MatchId::new(id))
            .title(format!("Match {id}"))
            .status(status)
            .prize_pool(prize_pool)
            .participants(
                participants
                    .iter()
                    .map(|account| {
                        Participant::builder()
                            .account_id((*account).clone())
                            .display_name(account.as_str())
                            .external_player_id(format!("pid-{account}"))
                            .build()
                    })
                    .collect(),
            )
            .build();
        let id = m.id.clone();
        self.store.insert_match(m).await;
        id
    }

    /// Insert a voucher.
    pub async fn add_voucher(&self, voucher: Voucher) {
        self.store.insert_voucher(voucher).await;
    }

    /// Current state of an account.
    pub async fn account(&self, id: &AccountId) -> eyre::Result<Account> {
        Ok(self.tourney.account(id).await?)
    }
}
