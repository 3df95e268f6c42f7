use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    fmt,
};

use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use tourney_model::{
    Account, AccountId, ClaimOutcome, LedgerOp, Match, MatchId, MatchStatus, Participant,
    RankedResult, Voucher, VoucherCode,
};

use crate::{
    error::NotFound,
    store::{AccountStore, Applied, MatchStore, VoucherStore},
    Error,
};

/// Serializable content of a [`MemoryStore`].
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Accounts.
    pub accounts: Vec<Account>,
    /// Matches.
    pub matches: Vec<Match>,
    /// Vouchers.
    pub vouchers: Vec<Voucher>,
}

/// Target of an injected store failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailPoint {
    /// Writes to an account.
    Account(AccountId),
    /// Writes to a match.
    Match(MatchId),
    /// Writes to a voucher.
    Voucher(VoucherCode),
}

impl fmt::Display for FailPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account(id) => write!(f, "account `{id}`"),
            Self::Match(id) => write!(f, "match `{id}`"),
            Self::Voucher(code) => write!(f, "voucher `{code}`"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    BeforeCommit,
    AfterCommit,
}


/// Store keeping everything in memory.
///
/// Each collection sits behind its own lock, and every write holds the
/// write lock for its whole read-check-write, so a single account write and
/// a single voucher claim are atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: RwLock<BTreeMap<AccountId, Account>>,
    matches: RwLock<BTreeMap<MatchId, Match>>,
    vouchers: Mutex<BTreeMap<VoucherCode, Voucher>>,
    failures: Mutex<HashMap<FailPoint, VecDeque<Stage>>>,
}

impl MemoryStore {
    /// Create a store with the given content.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let Snapshot {
            accounts,
            matches,
            vouchers,
        } = snapshot;
        Self {
            accounts: RwLock::new(
                accounts
                    .into_iter()
                    .map(|account| (account.id().clone(), account))
                    .collect(),
            ),
            matches: RwLock::new(matches.into_iter().map(|m| (m.id.clone(), m)).collect()),
            vouchers: Mutex::new(
                vouchers
                    .into_iter()
                    .map(|voucher| (voucher.code.clone(), voucher))
                    .collect(),
            ),
            failures: Default::default(),
        }
    }

    /// Copy the current content.
    pub async fn snapshot(&self) -> Snapshot {
        Snapshot {
            accounts: self.accounts.read().await.values().cloned().collect(),
            matches: self.matches.read().await.values().cloned().collect(),
            vouchers: self.vouchers.lock().await.values().cloned().collect(),
        }
    }

    /// Insert or replace an account.
    pub async fn insert_account(&self, account: Account) {
        self.accounts
            .write()
            .await
            .insert(account.id().clone(), account);
    }

    /// Insert or replace a match.
    pub async fn insert_match(&self, m: Match) {
        self.matches.write().await.insert(m.id.clone(), m);
    }

    /// Insert or replace a voucher.
    pub async fn insert_voucher(&self, voucher: Voucher) {
        self.vouchers
            .lock()
            .await
            .insert(voucher.code.clone(), voucher);
    }

    /// Make the next `times` writes to `point` fail without committing.
    ///
    /// Injected failures are consumed in the order they were added.
    pub async fn fail_next(&self, point: FailPoint, times: usize) {
        self.inject(point, Stage::BeforeCommit, times).await;
    }

    /// Make the next `times` writes to `point` commit but report a store error,
    /// as if the acknowledgement was lost.
    pub async fn drop_next_ack(&self, point: FailPoint, times: usize) {
        self.inject(point, Stage::AfterCommit, times).await;
    }

    async fn inject(&self, point: FailPoint, stage: Stage, times: usize) {
        self.failures
            .lock()
            .await
            .entry(point)
            .or_default()
            .extend(std::iter::repeat(stage).take(times));
    }

    async fn take_failure(&self, point: &FailPoint) -> Option<Stage> {
        self.failures.lock().await.get_mut(point)?.pop_front()
    }

    /// Consume an injected failure, failing the write now if it is set to fail before commit.
    async fn begin_write(&self, point: &FailPoint) -> crate::Result<Ack> {
        match self.take_failure(point).await {
            Some(Stage::BeforeCommit) => Err(Error::store(format!(
                "injected failure writing {point}"
            ))),
            Some(Stage::AfterCommit) => Ok(Ack { lost: true }),
            None => Ok(Ack { lost: false }),
        }
    }
}

#[must_use]
struct Ack {
    lost: bool,
}

impl Ack {
    fn finish(self, point: &FailPoint) -> crate::Result<()> {
        if self.lost {
            return Err(Error::store(format!(
                "injected lost acknowledgement writing {point}"
            )));
        }
        Ok(())
    }
}

impl From<Snapshot> for MemoryStore {
    fn from(snapshot: Snapshot) -> Self {
        Self::from_snapshot(snapshot)
    }
}

impl AccountStore for MemoryStore {
    async fn get_account(&self, id: &AccountId) -> crate::Result<Account> {
        self.accounts
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| NotFound::Account(id.clone()).into())
    }

    async fn apply_delta(&self, id: &AccountId, op: &LedgerOp) -> crate::Result<Applied> {
        let point = FailPoint::Account(id.clone());
        let ack = self.begin_write(&point).await?;
        let applied = {
            let mut accounts = self.accounts.write().await;
            let account = accounts
                .get_mut(id)
                .ok_or_else(|| NotFound::Account(id.clone()))?;
            let outcome = account.apply(op)?;
            Applied {
                outcome,
                account: account.clone(),
            }
        };
        ack.finish(&point)?;
        Ok(applied)
    }

    async fn find_by_referral_code(&self, code: &str) -> crate::Result<Option<Account>> {
        let code = code.trim();
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|account| account.referral_code() == Some(code))
            .cloned())
    }

    async fn referred_accounts(&self) -> crate::Result<Vec<Account>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .filter(|account| account.referred_by_code().is_some())
            .cloned()
            .collect())
    }
}

impl MatchStore for MemoryStore {
    async fn get_match(&self, id: &MatchId) -> crate::Result<Match> {
        self.matches
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| NotFound::Match(id.clone()).into())
    }

    async fn set_results(
        &self,
        id: &MatchId,
        results: Vec<RankedResult>,
        winnings_distributed: bool,
    ) -> crate::Result<()> {
        let point = FailPoint::Match(id.clone());
        let ack = self.begin_write(&point).await?;
        {
            let mut matches = self.matches.write().await;
            let m = matches
                .get_mut(id)
                .ok_or_else(|| NotFound::Match(id.clone()))?;
            m.results = results;
            m.winnings_distributed = winnings_distributed;
            m.status = MatchStatus::Results;
        }
        ack.finish(&point)
    }

    async fn add_participant(&self, id: &MatchId, participant: Participant) -> crate::Result<()> {
        let point = FailPoint::Match(id.clone());
        let ack = self.begin_write(&point).await?;
        {
            let mut matches = self.matches.write().await;
            let m = matches
                .get_mut(id)
                .ok_or_else(|| NotFound::Match(id.clone()))?;
            if m.is_participant(&participant.account_id) {
                return Err(Error::AlreadyJoined(participant.account_id, id.clone()));
            }
            m.participants.push(participant);
        }
        ack.finish(&point)
    }
}

impl VoucherStore for MemoryStore {
    async fn get_voucher(&self, code: &VoucherCode) -> crate::Result<Voucher> {
        self.vouchers
            .lock()
            .await
            .get(code)
            .cloned()
            .ok_or_else(|| NotFound::Voucher(code.clone()).into())
    }

    async fn try_claim(
        &self,
        code: &VoucherCode,
        account: &AccountId,
        at: OffsetDateTime,
    ) -> crate::Result<ClaimOutcome> {
        let point = FailPoint::Voucher(code.clone());
        let ack = self.begin_write(&point).await?;
        let outcome = self
            .vouchers
            .lock()
            .await
            .get_mut(code)
            .ok_or_else(|| NotFound::Voucher(code.clone()))?
            .try_claim(account, at);
        ack.finish(&point)?;
        Ok(outcome)
    }

    async fn release_claim(
        &self,
        code: &VoucherCode,
        account: &AccountId,
        at: OffsetDateTime,
    ) -> crate::Result<bool> {
        let point = FailPoint::Voucher(code.clone());
        let ack = self.begin_write(&point).await?;
        let released = self
            .vouchers
            .lock()
            .await
            .get_mut(code)
            .ok_or_else(|| NotFound::Voucher(code.clone()))?
            .release_claim(account, at);
        ack.finish(&point)?;
        Ok(released)
    }
}
