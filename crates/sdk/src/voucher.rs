use time::OffsetDateTime;
use tourney_model::{
    AccountId, Amount, Balances, ClaimOutcome, CreditTarget, FieldDeltas, Guard, LedgerOp,
    Notification, NotificationIcon, NotificationId, Transaction, TransactionId, TransactionKind,
    VoucherCode,
};

use crate::{
    error::VoucherRejection,
    ledger::Ledger,
    retry::with_retry,
    store::{AccountStore, VoucherStore},
    Error,
};

/// A successful redemption.
#[derive(Debug, Clone)]
pub struct Redemption {
    /// Voucher code.
    pub code: VoucherCode,
    /// Amount credited.
    pub amount: Amount,
    /// Balance credited.
    pub credit_target: CreditTarget,
    /// Id of the recorded transaction.
    pub transaction_id: TransactionId,
    /// Balances after the credit.
    pub balances: Balances,
}

/// Voucher redemption.
pub struct VoucherService<S> {
    ledger: Ledger<S>,
}

impl<S> VoucherService<S> {
    /// Create a service writing through the given ledger.
    pub fn new(ledger: Ledger<S>) -> Self {
        Self { ledger }
    }
}

impl<S: AccountStore + VoucherStore> VoucherService<S> {
    /// Redeem a voucher for an account.
    ///
    /// The cap check and the claim are a single store operation. If crediting
    /// the account fails afterwards, the claim is released again, unless the
    /// credit turns out to have been committed. If that cannot be told, the
    /// claim is kept.
    pub async fn redeem(&self, code: &VoucherCode, account: &AccountId) -> crate::Result<Redemption> {
        let store = self.ledger.store();
        let retry = &self.ledger.config().retry;

        let voucher = with_retry(retry, "get_voucher", || store.get_voucher(code)).await?;
        let now = self.ledger.now();
        if voucher.is_expired(now) {
            return Err(VoucherRejection::Expired.into());
        }
        // Fail before claiming if the account is unknown.
        self.ledger.account(account).await?;

        // Not retried: a lost acknowledgement would claim twice.
        match store.try_claim(code, account, now).await? {
            ClaimOutcome::Claimed => {}
            ClaimOutcome::ExhaustedGlobally => {
                return Err(VoucherRejection::ExhaustedGlobally.into())
            }
            ClaimOutcome::ExhaustedForAccount => {
                return Err(VoucherRejection::ExhaustedForAccount.into())
            }
        }

        let transaction_id = TransactionId::random(TransactionKind::Voucher);
        let op = LedgerOp::builder()
            .deltas(FieldDeltas::balance(
                voucher.credit_target.into(),
                voucher.amount,
            ))
            .upsert_transaction(
                Transaction::builder()
                    .id(transaction_id.clone())
                    .kind(TransactionKind::Voucher)
                    .amount(voucher.amount)
                    .created_at(now)
                    .reason(format!("Voucher {code}"))
                    .build(),
            )
            .upsert_notification(
                Notification::builder()
                    .id(NotificationId::random(TransactionKind::Voucher))
                    .icon(NotificationIcon::Gift)
                    .title("Voucher redeemed")
                    .message(format!(
                        "{} was added to your {} balance.",
                        voucher.amount, voucher.credit_target
                    ))
                    .created_at(now)
                    .build(),
            )
            .guard(Guard::TransactionAbsent(transaction_id.clone()))
            .build();

        let balances = match self.ledger.apply(account, &op).await {
            Ok(applied) => applied.account.balances(),
            Err(err) if err.is_retryable() => {
                // An earlier attempt may have committed before its acknowledgement was lost.
                match self.ledger.account(account).await {
                    Ok(current) if current.transaction(&transaction_id).is_some() => {
                        tracing::warn!(%err, %code, %account, "voucher credit committed despite store error");
                        current.balances()
                    }
                    Ok(_) => return Err(self.release_claim(code, account, now, err).await),
                    Err(read_err) => {
                        tracing::error!(%err, %read_err, %code, %account, "voucher credit in doubt, keeping claim");
                        return Err(err);
                    }
                }
            }
            Err(err) => return Err(self.release_claim(code, account, now, err).await),
        };

        tracing::info!(%code, %account, amount = %voucher.amount, "voucher redeemed");
        Ok(Redemption {
            code: voucher.code,
            amount: voucher.amount,
            credit_target: voucher.credit_target,
            transaction_id,
            balances,
        })
    }

    async fn release_claim(
        &self,
        code: &VoucherCode,
        account: &AccountId,
        at: OffsetDateTime,
        err: Error,
    ) -> Error {
        tracing::warn!(%err, %code, %account, "voucher credit failed, releasing claim");
        let store = self.ledger.store();
        let released = with_retry(&self.ledger.config().retry, "release_claim", || {
            store.release_claim(code, account, at)
        })
        .await;
        if let Err(release_err) = released {
            tracing::error!(%release_err, %code, %account, "failed to release voucher claim");
        }
        err
    }
}
