use std::collections::HashSet;

use typed_builder::TypedBuilder;

use crate::{AccountId, Amount, MatchId, MatchStanding};

/// Lifecycle status of a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum MatchStatus {
    /// Open for joining.
    #[default]
    Upcoming,
    /// Being played.
    Ongoing,
    /// Results are published.
    Results,
}

/// A joined participant of a match.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Participant {
    /// Account.
    pub account_id: AccountId,
    /// In-game name.
    #[builder(setter(into))]
    pub display_name: String,
    /// In-game player id.
    #[builder(setter(into))]
    pub external_player_id: String,
}

/// One row of a submitted result list.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResultEntry {
    /// Account.
    pub account_id: AccountId,
    /// In-game name.
    #[builder(setter(into))]
    pub display_name: String,
    /// In-game player id.
    #[builder(setter(into))]
    pub external_player_id: String,
    /// Kills.
    #[builder(default)]
    pub kills: u64,
    /// Winning amount.
    #[builder(default)]
    pub winning_amount: Amount,
}

impl ResultEntry {
    /// Returns whether the row produces no record at all.
    pub fn is_empty(&self) -> bool {
        self.kills == 0 && self.winning_amount.is_zero()
    }
}

/// A result row with its derived rank.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedResult {
    /// 1-based rank.
    pub rank: u32,
    /// Row.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub entry: ResultEntry,
}

impl RankedResult {
    /// Standing this row settles to.
    pub fn standing(&self) -> MatchStanding {
        MatchStanding {
            winning: self.entry.winning_amount,
            kills: self.entry.kills,
            rank: self.rank,
        }
    }
}

/// Rank submitted results.
///
/// Rows with neither kills nor winnings are dropped. The rest are sorted by
/// winning amount descending, keeping submission order for ties, and ranked
/// by position.
pub fn rank_results(entries: impl IntoIterator<Item = ResultEntry>) -> Vec<RankedResult> {
    let mut entries = entries
        .into_iter()
        .filter(|entry| !entry.is_empty())
        .collect::<Vec<_>>();
    // `sort_by` is stable.
    entries.sort_by(|a, b| b.winning_amount.cmp(&a.winning_amount));
    entries
        .into_iter()
        .zip(1..)
        .map(|(entry, rank)| RankedResult { rank, entry })
        .collect()
}

/// A match as seen by the settlement engine.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Match {
    /// Id.
    pub id: MatchId,
    /// Title.
    #[builder(default, setter(into))]
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: String,
    /// Status.
    #[builder(default)]
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: MatchStatus,
    /// Entry fee.
    #[builder(default)]
    #[cfg_attr(feature = "serde", serde(default))]
    pub entry_fee: Amount,
    /// Advertised prize pool.
    #[builder(default)]
    #[cfg_attr(feature = "serde", serde(default))]
    pub prize_pool: Amount,
    /// Advertised reward per kill.
    #[builder(default)]
    #[cfg_attr(feature = "serde", serde(default))]
    pub per_kill_reward: Amount,
    /// Joined participants.
    #[builder(default)]
    #[cfg_attr(feature = "serde", serde(default))]
    pub participants: Vec<Participant>,
    /// Stored results.
    #[builder(default)]
    #[cfg_attr(feature = "serde", serde(default))]
    pub results: Vec<RankedResult>,
    /// Whether settlement has run to completion at least once.
    #[builder(default)]
    #[cfg_attr(feature = "serde", serde(default))]
    pub winnings_distributed: bool,
}

impl Match {
    /// Returns whether the account has joined.
    pub fn is_participant(&self, account: &AccountId) -> bool {
        self.participants.iter().any(|p| p.account_id == *account)
    }

    /// Stored result row of the given account.
    pub fn result_of(&self, account: &AccountId) -> Option<&RankedResult> {
        self.results.iter().find(|r| r.entry.account_id == *account)
    }

    /// Accounts in `entries` that have not joined this match.
    pub fn unknown_participants<'a>(
        &self,
        entries: impl IntoIterator<Item = &'a ResultEntry>,
    ) -> Vec<&'a AccountId> {
        entries
            .into_iter()
            .map(|entry| &entry.account_id)
            .filter(|account| !self.is_participant(account))
            .collect()
    }
}

/// Check the shape of submitted results.
pub fn validate_entries<'a>(entries: impl IntoIterator<Item = &'a ResultEntry>) -> crate::Result<()> {
    let mut seen = HashSet::new();
    for entry in entries {
        if entry.winning_amount.is_sign_negative() && !entry.winning_amount.is_zero() {
            return Err(crate::Error::InvalidArgument("negative winning amount"));
        }
        if !seen.insert(&entry.account_id) {
            return Err(crate::Error::InvalidArgument("duplicate participant in results"));
        }
    }
    Ok(())
}
