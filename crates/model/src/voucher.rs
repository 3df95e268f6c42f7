use time::OffsetDateTime;
use typed_builder::TypedBuilder;

use crate::{AccountId, Amount, BalanceField, VoucherCode};

/// Balance a voucher credits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum CreditTarget {
    /// Deposit balance.
    #[default]
    Deposit,
    /// Winnings balance.
    Winnings,
}

impl From<CreditTarget> for BalanceField {
    fn from(target: CreditTarget) -> Self {
        match target {
            CreditTarget::Deposit => Self::Deposit,
            CreditTarget::Winnings => Self::Winnings,
        }
    }
}

/// One redemption of a voucher.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Claim {
    /// Account.
    pub account_id: AccountId,
    /// Time of the claim.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub claimed_at: OffsetDateTime,
}

/// Result of an attempt to claim a voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Claimed.
    Claimed,
    /// All uses have been claimed.
    ExhaustedGlobally,
    /// The account has used up its own allowance.
    ExhaustedForAccount,
}

/// A capped redemption code.
///
/// `uses` always equals the number of claims.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Voucher {
    /// Code.
    pub code: VoucherCode,
    /// Amount credited per redemption.
    pub amount: Amount,
    /// Balance to credit.
    #[builder(default)]
    #[cfg_attr(feature = "serde", serde(default))]
    pub credit_target: CreditTarget,
    /// Expiry.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub expires_at: OffsetDateTime,
    /// Total redemptions allowed.
    pub max_uses: u32,
    /// Redemptions allowed per account.
    #[builder(default = 1)]
    pub max_uses_per_account: u32,
    #[builder(default, setter(skip))]
    #[cfg_attr(feature = "serde", serde(default))]
    uses: u32,
    #[builder(default, setter(skip))]
    #[cfg_attr(feature = "serde", serde(default))]
    claims: Vec<Claim>,
}

impl Voucher {
    /// Number of redemptions.
    pub fn uses(&self) -> u32 {
        self.uses
    }

    /// All claims.
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// Number of claims made by the given account.
    pub fn claims_by(&self, account: &AccountId) -> usize {
        self.claims
            .iter()
            .filter(|claim| claim.account_id == *account)
            .count()
    }

    /// Returns whether the voucher can no longer be redeemed at `now`.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }

    /// Check the caps and record a claim if both allow it.
    ///
    /// The per-account cap is checked first, so an account that already used
    /// its allowance is told so even when the voucher is also used up.
    ///
    /// The check and the increment must run under the same lock or
    /// transaction of whatever stores the voucher.
    pub fn try_claim(&mut self, account: &AccountId, at: OffsetDateTime) -> ClaimOutcome {
        if self.claims_by(account) >= self.max_uses_per_account as usize {
            return ClaimOutcome::ExhaustedForAccount;
        }
        if self.uses >= self.max_uses {
            return ClaimOutcome::ExhaustedGlobally;
        }
        self.uses += 1;
        self.claims.push(Claim {
            account_id: account.clone(),
            claimed_at: at,
        });
        debug_assert_eq!(self.uses as usize, self.claims.len());
        ClaimOutcome::Claimed
    }

    /// Undo a claim. Returns `false` if no such claim exists.
    pub fn release_claim(&mut self, account: &AccountId, at: OffsetDateTime) -> bool {
        let Some(index) = self
            .claims
            .iter()
            .rposition(|claim| claim.account_id == *account && claim.claimed_at == at)
        else {
            return false;
        };
        self.claims.remove(index);
        self.uses = self.uses.saturating_sub(1);
        true
    }
}
