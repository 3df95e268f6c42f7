use std::fmt;

use crate::TransactionKind;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $normalize:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(
            feature = "serde",
            derive(serde::Serialize, serde::Deserialize),
            serde(from = "String")
        )]
        pub struct $name(String);

        impl $name {
            /// Create from the given string, normalizing it.
            pub fn new(value: impl AsRef<str>) -> Self {
                let normalize: fn(&str) -> String = $normalize;
                Self(normalize(value.as_ref()))
            }

            /// Returns the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns whether the id is empty.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self::new(s))
            }
        }
    };
}

string_id!(
    /// Account identifier, the lowercased e-mail of the user.
    AccountId,
    |s| s.trim().to_lowercase()
);

string_id!(
    /// Match identifier.
    MatchId,
    |s| s.trim().to_string()
);

string_id!(
    /// Voucher code. Codes are case-insensitive and stored uppercased.
    VoucherCode,
    |s| s.trim().to_uppercase()
);

string_id!(
    /// Transaction identifier.
    TransactionId,
    |s| s.to_string()
);

string_id!(
    /// Notification identifier.
    NotificationId,
    |s| s.to_string()
);

fn keyed(kind: TransactionKind, source: &str) -> String {
    format!("{}:{source}", kind.as_ref())
}

fn random(kind: TransactionKind) -> String {
    format!("{}:{:016x}", kind.as_ref(), rand::random::<u64>())
}

impl TransactionId {
    /// Id of the live transaction of `kind` for the given source event.
    ///
    /// At most one transaction with this id exists per account, which is what
    /// makes re-applying the same source event replace instead of append.
    pub fn keyed(kind: TransactionKind, source: impl AsRef<str>) -> Self {
        Self(keyed(kind, source.as_ref()))
    }

    /// Fresh id for a one-shot transaction.
    pub fn random(kind: TransactionKind) -> Self {
        Self(random(kind))
    }

    /// Id of the live winnings transaction for the given match.
    pub fn winnings(match_id: &MatchId) -> Self {
        Self::keyed(TransactionKind::Winnings, match_id)
    }
}

impl NotificationId {
    /// Id of the notification paired with a keyed transaction.
    pub fn keyed(kind: TransactionKind, source: impl AsRef<str>) -> Self {
        Self(keyed(kind, source.as_ref()))
    }

    /// Fresh id for a one-shot notification.
    pub fn random(kind: TransactionKind) -> Self {
        Self(random(kind))
    }

    /// Id of the winnings notification for the given match.
    pub fn winnings(match_id: &MatchId) -> Self {
        Self::keyed(TransactionKind::Winnings, match_id)
    }
}
