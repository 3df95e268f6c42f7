use time::OffsetDateTime;
use typed_builder::TypedBuilder;

use crate::{Amount, MatchId, NotificationId, TransactionId};

/// Kind of a transaction.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum TransactionKind {
    /// Deposit from an external payment.
    Deposit,
    /// Withdrawal of winnings.
    Withdrawal,
    /// Conversion from winnings to deposit balance.
    Conversion,
    /// Match entry fee.
    EntryFee,
    /// Peer-to-peer share.
    Share,
    /// Match winnings.
    Winnings,
    /// Manual admin adjustment.
    AdminAdjustment,
    /// Voucher redemption.
    Voucher,
    /// Referral bonus.
    ReferralBonus,
}

/// Status of a transaction.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::EnumString, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum TransactionStatus {
    /// Completed.
    #[default]
    Completed,
    /// Waiting for an admin decision.
    Pending,
    /// Failed.
    Failed,
    /// Rejected by an admin.
    Rejected,
}

/// Payout destination of a withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WithdrawalDetails {
    /// Payout method, e.g. `upi` or `bank`.
    pub method: String,
    /// Destination handle for the method.
    pub destination: String,
    /// Name of the holder of the destination.
    pub holder_name: Option<String>,
}

/// A human-readable record of one balance change.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transaction {
    /// Id.
    pub id: TransactionId,
    /// Kind.
    pub kind: TransactionKind,
    /// Signed amount.
    pub amount: Amount,
    /// Creation time.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub created_at: OffsetDateTime,
    /// Status.
    #[builder(default)]
    pub status: TransactionStatus,
    /// Reason.
    #[builder(default, setter(into))]
    pub reason: String,
    /// The match this transaction originates from.
    #[builder(default, setter(strip_option))]
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub source_match_id: Option<MatchId>,
    /// Payout details of a withdrawal.
    #[builder(default, setter(strip_option))]
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub withdrawal_details: Option<WithdrawalDetails>,
}

/// Icon of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum NotificationIcon {
    /// Generic information.
    #[default]
    Info,
    /// Prize or reward.
    Trophy,
    /// Incoming money.
    Wallet,
    /// Gift.
    Gift,
    /// Warning.
    Alert,
}

/// A message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Notification {
    /// Id.
    pub id: NotificationId,
    /// Icon.
    #[builder(default)]
    pub icon: NotificationIcon,
    /// Title.
    #[builder(setter(into))]
    pub title: String,
    /// Message.
    #[builder(setter(into))]
    pub message: String,
    /// Creation time.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub created_at: OffsetDateTime,
    /// Whether the user has read it.
    #[builder(default)]
    pub read: bool,
    /// The match this notification originates from.
    #[builder(default, setter(strip_option))]
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub source_match_id: Option<MatchId>,
}
