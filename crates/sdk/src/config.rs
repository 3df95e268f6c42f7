use std::{num::NonZeroUsize, time::Duration};

use rust_decimal::Decimal;
use typed_builder::TypedBuilder;

const DEFAULT_SETTLEMENT_CONCURRENCY: NonZeroUsize = match NonZeroUsize::new(8) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

/// Ledger configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, TypedBuilder)]
#[serde(default)]
pub struct LedgerConfig {
    /// Maximum amount of one share.
    #[builder(default = Decimal::from(1_000))]
    pub share_limit: Decimal,
    /// Minimum amount of one withdrawal.
    #[builder(default = Decimal::from(100))]
    pub min_withdrawal: Decimal,
    /// Maximum number of accounts settled concurrently.
    #[builder(default = DEFAULT_SETTLEMENT_CONCURRENCY)]
    pub settlement_concurrency: NonZeroUsize,
    /// Referral rewards.
    #[builder(default)]
    pub referral: ReferralRewards,
    /// Retry policy for store errors.
    #[builder(default)]
    pub retry: RetryPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Referral rewards, both credited to the deposit balance.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ReferralRewards {
    /// Credited to the referred user.
    pub new_user_reward: Decimal,
    /// Credited to the referrer.
    pub referrer_reward: Decimal,
}

impl Default for ReferralRewards {
    fn default() -> Self {
        Self {
            new_user_reward: Decimal::from(10),
            referrer_reward: Decimal::from(20),
        }
    }
}

/// Exponential backoff for store errors.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    #[serde(with = "humantime_duration")]
    pub initial_backoff: Duration,
    /// Upper bound of the delay.
    #[serde(with = "humantime_duration")]
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    pub(crate) fn backoff(&self, retry: u32) -> Duration {
        let factor = 1_u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }
}

mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        duration: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*duration))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
