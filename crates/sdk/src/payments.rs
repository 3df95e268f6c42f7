use tourney_model::{
    AccountId, Amount, Balances, FieldDeltas, Guard, LedgerOp, Notification, NotificationIcon,
    NotificationId, Transaction, TransactionId, TransactionKind, TransactionStatus,
    WithdrawalDetails,
};

use crate::{error::NotFound, ledger::Ledger, store::AccountStore, Error};

/// Deposits and withdrawals.
pub struct PaymentsService<S> {
    ledger: Ledger<S>,
}

impl<S> PaymentsService<S> {
    /// Create a service writing through the given ledger.
    pub fn new(ledger: Ledger<S>) -> Self {
        Self { ledger }
    }
}

impl<S: AccountStore> PaymentsService<S> {
    /// Credit a confirmed payment to the deposit balance.
    ///
    /// `payment_ref` identifies the payment; recording the same payment
    /// twice is a conflict.
    pub async fn record_deposit(
        &self,
        account: &AccountId,
        amount: Amount,
        payment_ref: &str,
    ) -> crate::Result<Balances> {
        let payment_ref = payment_ref.trim();
        if payment_ref.is_empty() {
            return Err(Error::validation("a payment reference is required"));
        }
        if amount <= Amount::ZERO {
            return Err(Error::validation("amount must be positive"));
        }
        let now = self.ledger.now();
        let id = TransactionId::keyed(TransactionKind::Deposit, payment_ref);
        let op = LedgerOp::builder()
            .deltas(FieldDeltas {
                deposit: amount,
                ..Default::default()
            })
            .upsert_transaction(
                Transaction::builder()
                    .id(id.clone())
                    .kind(TransactionKind::Deposit)
                    .amount(amount)
                    .created_at(now)
                    .reason(format!("Payment {payment_ref}"))
                    .build(),
            )
            .upsert_notification(
                Notification::builder()
                    .id(NotificationId::keyed(TransactionKind::Deposit, payment_ref))
                    .icon(NotificationIcon::Wallet)
                    .title("Deposit received")
                    .message(format!("{amount} was added to your deposit balance."))
                    .created_at(now)
                    .build(),
            )
            .guard(Guard::TransactionAbsent(id))
            .build();
        let balances = self.ledger.apply(account, &op).await?.account.balances();
        tracing::info!(%account, %amount, payment_ref, "deposit recorded");
        Ok(balances)
    }

    /// Debit winnings and record a pending withdrawal for an admin to review.
    pub async fn request_withdrawal(
        &self,
        account: &AccountId,
        amount: Amount,
        details: WithdrawalDetails,
    ) -> crate::Result<TransactionId> {
        let min = self.ledger.config().min_withdrawal;
        if amount < min {
            return Err(Error::validation(format!(
                "the minimum withdrawal is {min}"
            )));
        }
        if details.method.trim().is_empty() || details.destination.trim().is_empty() {
            return Err(Error::validation("payout method and destination are required"));
        }
        let id = TransactionId::random(TransactionKind::Withdrawal);
        let op = LedgerOp::builder()
            .deltas(FieldDeltas {
                winnings: -amount,
                ..Default::default()
            })
            .upsert_transaction(
                Transaction::builder()
                    .id(id.clone())
                    .kind(TransactionKind::Withdrawal)
                    .amount(-amount)
                    .created_at(self.ledger.now())
                    .status(TransactionStatus::Pending)
                    .reason(format!("Withdrawal via {}", details.method))
                    .withdrawal_details(details)
                    .build(),
            )
            .guard(Guard::TransactionAbsent(id.clone()))
            .build();
        self.ledger.apply(account, &op).await?;
        tracing::info!(%account, %amount, transaction = %id, "withdrawal requested");
        Ok(id)
    }

    /// Mark a pending withdrawal as paid out.
    pub async fn approve_withdrawal(
        &self,
        account: &AccountId,
        id: &TransactionId,
    ) -> crate::Result<Transaction> {
        let pending = self.pending_withdrawal(account, id).await?;
        let now = self.ledger.now();
        let completed = Transaction {
            status: TransactionStatus::Completed,
            ..pending
        };
        let op = LedgerOp::builder()
            .upsert_transaction(completed.clone())
            .upsert_notification(
                Notification::builder()
                    .id(NotificationId::keyed(TransactionKind::Withdrawal, id))
                    .icon(NotificationIcon::Wallet)
                    .title("Withdrawal approved")
                    .message(format!("Your withdrawal of {} has been sent.", -completed.amount))
                    .created_at(now)
                    .build(),
            )
            .guard(Guard::TransactionStatus {
                id: id.clone(),
                expected: TransactionStatus::Pending,
            })
            .build();
        self.apply_review(account, &op, TransactionStatus::Completed).await?;
        tracing::info!(%account, transaction = %id, "withdrawal approved");
        Ok(completed)
    }

    /// Refund a pending withdrawal to the winnings balance.
    pub async fn reject_withdrawal(
        &self,
        account: &AccountId,
        id: &TransactionId,
        reason: &str,
    ) -> crate::Result<Transaction> {
        let pending = self.pending_withdrawal(account, id).await?;
        let now = self.ledger.now();
        let refund = -pending.amount;
        let reason = match reason.trim() {
            "" => "Withdrawal rejected".to_string(),
            reason => reason.to_string(),
        };
        let rejected = Transaction {
            status: TransactionStatus::Rejected,
            reason: reason.clone(),
            ..pending
        };
        let op = LedgerOp::builder()
            .deltas(FieldDeltas {
                winnings: refund,
                ..Default::default()
            })
            .upsert_transaction(rejected.clone())
            .upsert_notification(
                Notification::builder()
                    .id(NotificationId::keyed(TransactionKind::Withdrawal, id))
                    .icon(NotificationIcon::Alert)
                    .title("Withdrawal rejected")
                    .message(format!("{refund} was returned to your winnings balance. {reason}"))
                    .created_at(now)
                    .build(),
            )
            .guard(Guard::TransactionStatus {
                id: id.clone(),
                expected: TransactionStatus::Pending,
            })
            .build();
        self.apply_review(account, &op, TransactionStatus::Rejected).await?;
        tracing::info!(%account, transaction = %id, %refund, "withdrawal rejected");
        Ok(rejected)
    }

    /// Reviewing a withdrawal that already has the target status is a no-op.
    async fn apply_review(
        &self,
        account: &AccountId,
        op: &LedgerOp,
        target: TransactionStatus,
    ) -> crate::Result<()> {
        match self.ledger.apply(account, op).await {
            Ok(_) => Ok(()),
            Err(Error::Model(tourney_model::Error::InvalidTransactionStatus { actual, .. }))
                if actual == target =>
            {
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn pending_withdrawal(
        &self,
        account: &AccountId,
        id: &TransactionId,
    ) -> crate::Result<Transaction> {
        let transaction = self
            .ledger
            .account(account)
            .await?
            .transaction(id)
            .cloned()
            .ok_or_else(|| NotFound::Transaction(id.clone()))?;
        if transaction.kind != TransactionKind::Withdrawal {
            return Err(Error::validation(format!("`{id}` is not a withdrawal")));
        }
        Ok(transaction)
    }
}
