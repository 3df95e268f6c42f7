use tourney_model::{
    AccountId, Amount, BalanceField, Balances, FieldDeltas, Guard, LedgerOp, Notification,
    NotificationIcon, NotificationId, Transaction, TransactionId, TransactionKind,
};

use crate::{
    error::{AccountFailure, PartialFailure},
    ledger::Ledger,
    store::AccountStore,
    Error,
};

/// A completed share.
#[derive(Debug, Clone)]
pub struct Share {
    /// Amount moved.
    pub amount: Amount,
    /// Balances of the sender afterwards.
    pub sender: Balances,
    /// Balances of the recipient afterwards.
    pub recipient: Balances,
}

fn ensure_positive(amount: Amount) -> crate::Result<()> {
    if amount <= Amount::ZERO {
        return Err(Error::validation("amount must be positive"));
    }
    Ok(())
}

/// Share, conversion and manual adjustment.
///
/// All of these are one-shot: each call records new transactions.
pub struct TransferService<S> {
    ledger: Ledger<S>,
}

impl<S> TransferService<S> {
    /// Create a service writing through the given ledger.
    pub fn new(ledger: Ledger<S>) -> Self {
        Self { ledger }
    }
}

impl<S: AccountStore> TransferService<S> {
    /// Move winnings of `from` into the deposit balance of `to`.
    ///
    /// The two accounts are written separately. If the recipient cannot be
    /// credited after the sender was debited, a partial failure is returned
    /// and the debit stays for manual reconciliation.
    pub async fn share(&self, from: &AccountId, to: &AccountId, amount: Amount) -> crate::Result<Share> {
        ensure_positive(amount)?;
        let limit = self.ledger.config().share_limit;
        if amount > limit {
            return Err(Error::validation(format!(
                "amount exceeds the share limit of {limit}"
            )));
        }
        if from == to {
            return Err(Error::SelfShare);
        }
        let recipient = self.ledger.account(to).await?;

        let reference = format!("{:016x}", rand::random::<u64>());
        let now = self.ledger.now();
        let sent = TransactionId::keyed(TransactionKind::Share, format!("{reference}:out"));
        let debit = LedgerOp::builder()
            .deltas(FieldDeltas::balance(BalanceField::Winnings, -amount))
            .upsert_transaction(
                Transaction::builder()
                    .id(sent.clone())
                    .kind(TransactionKind::Share)
                    .amount(-amount)
                    .created_at(now)
                    .reason(format!("Shared with {}", recipient.display_name()))
                    .build(),
            )
            .guard(Guard::TransactionAbsent(sent))
            .build();
        let sender = self.ledger.apply(from, &debit).await?.account;

        let received = TransactionId::keyed(TransactionKind::Share, format!("{reference}:in"));
        let credit = LedgerOp::builder()
            .deltas(FieldDeltas::balance(BalanceField::Deposit, amount))
            .upsert_transaction(
                Transaction::builder()
                    .id(received.clone())
                    .kind(TransactionKind::Share)
                    .amount(amount)
                    .created_at(now)
                    .reason(format!("Received from {}", sender.display_name()))
                    .build(),
            )
            .upsert_notification(
                Notification::builder()
                    .id(NotificationId::keyed(TransactionKind::Share, &reference))
                    .icon(NotificationIcon::Wallet)
                    .title("Balance received")
                    .message(format!(
                        "{} shared {amount} with you.",
                        sender.display_name()
                    ))
                    .created_at(now)
                    .build(),
            )
            .guard(Guard::TransactionAbsent(received))
            .build();
        let recipient = match self.ledger.apply(to, &credit).await {
            Ok(applied) => applied.account,
            Err(error) => {
                tracing::warn!(%error, %from, %to, %amount, %reference, "share credit failed after debit");
                return Err(PartialFailure {
                    succeeded: vec![from.clone()],
                    failed: vec![AccountFailure {
                        account_id: to.clone(),
                        error,
                    }],
                }
                .into());
            }
        };

        tracing::info!(%from, %to, %amount, "balance shared");
        Ok(Share {
            amount,
            sender: sender.balances(),
            recipient: recipient.balances(),
        })
    }

    /// Move winnings into the deposit balance of the same account.
    pub async fn convert(&self, account: &AccountId, amount: Amount) -> crate::Result<Balances> {
        ensure_positive(amount)?;
        let id = TransactionId::random(TransactionKind::Conversion);
        let op = LedgerOp::builder()
            .deltas(FieldDeltas {
                deposit: amount,
                winnings: -amount,
                ..Default::default()
            })
            .upsert_transaction(
                Transaction::builder()
                    .id(id.clone())
                    .kind(TransactionKind::Conversion)
                    .amount(amount)
                    .created_at(self.ledger.now())
                    .reason("Winnings converted to deposit")
                    .build(),
            )
            .guard(Guard::TransactionAbsent(id))
            .build();
        let balances = self.ledger.apply(account, &op).await?.account.balances();
        tracing::info!(%account, %amount, "balance converted");
        Ok(balances)
    }

    /// Apply a signed admin correction to one balance.
    ///
    /// May take the balance below zero. Lifetime winnings grow with positive
    /// winnings adjustments only.
    pub async fn adjust(
        &self,
        account: &AccountId,
        field: BalanceField,
        amount: Amount,
        reason: &str,
    ) -> crate::Result<Balances> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(Error::validation("a reason is required"));
        }
        if amount.is_zero() {
            return Err(Error::validation("amount must not be zero"));
        }
        let mut deltas = FieldDeltas::balance(field, amount);
        if field == BalanceField::Winnings && amount > Amount::ZERO {
            deltas = deltas.with_total_winnings(amount);
        }
        let now = self.ledger.now();
        let id = TransactionId::random(TransactionKind::AdminAdjustment);
        let op = LedgerOp::builder()
            .deltas(deltas)
            .upsert_transaction(
                Transaction::builder()
                    .id(id.clone())
                    .kind(TransactionKind::AdminAdjustment)
                    .amount(amount)
                    .created_at(now)
                    .reason(reason)
                    .build(),
            )
            .upsert_notification(
                Notification::builder()
                    .id(NotificationId::random(TransactionKind::AdminAdjustment))
                    .icon(NotificationIcon::Info)
                    .title("Balance adjusted")
                    .message(format!("Your {field} balance was adjusted by {amount}: {reason}"))
                    .created_at(now)
                    .build(),
            )
            .allow_negative(true)
            .guard(Guard::TransactionAbsent(id))
            .build();
        let balances = self.ledger.apply(account, &op).await?.account.balances();
        tracing::info!(%account, %field, %amount, "balance adjusted");
        Ok(balances)
    }
}
