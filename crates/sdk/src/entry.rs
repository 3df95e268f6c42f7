use tourney_model::{
    AccountId, Amount, ApplyOutcome, Balances, FieldDeltas, Guard, LedgerOp, MatchId,
    MatchStatus, Participant, Transaction, TransactionId, TransactionKind,
};

use crate::{
    error::{AccountFailure, PartialFailure},
    ledger::Ledger,
    retry::with_retry,
    store::{AccountStore, MatchStore},
    Error,
};

/// A paid entry.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Match joined.
    pub match_id: MatchId,
    /// Entry fee charged.
    pub fee: Amount,
    /// Part of the fee taken from the deposit balance.
    pub from_deposit: Amount,
    /// Part of the fee taken from the winnings balance.
    pub from_winnings: Amount,
    /// Balances after the debit.
    pub balances: Balances,
}

/// Match entry.
pub struct EntryService<S> {
    ledger: Ledger<S>,
}

impl<S> EntryService<S> {
    /// Create a service writing through the given ledger.
    pub fn new(ledger: Ledger<S>) -> Self {
        Self { ledger }
    }
}

impl<S: AccountStore + MatchStore> EntryService<S> {
    /// Pay the entry fee and register the account as a participant.
    ///
    /// The fee is taken from the deposit balance first and from the winnings
    /// balance for the rest. Calling this again after the registration
    /// failed does not charge the fee twice.
    pub async fn join(
        &self,
        account: &AccountId,
        match_id: &MatchId,
        external_player_id: &str,
    ) -> crate::Result<Entry> {
        let external_player_id = external_player_id.trim();
        if external_player_id.is_empty() {
            return Err(Error::validation("a player id is required"));
        }
        let store = self.ledger.store();
        let retry = &self.ledger.config().retry;
        let m = with_retry(retry, "get_match", || store.get_match(match_id)).await?;
        if m.status != MatchStatus::Upcoming {
            return Err(Error::validation(format!(
                "match `{match_id}` is not open for entry"
            )));
        }
        if m.is_participant(account) {
            return Err(Error::AlreadyJoined(account.clone(), match_id.clone()));
        }

        let current = self.ledger.account(account).await?;
        let fee = m.entry_fee;
        let from_deposit = fee.min(current.balances().deposit.max(Amount::ZERO));
        let from_winnings = fee - from_deposit;

        let id = TransactionId::keyed(TransactionKind::EntryFee, match_id);
        let op = LedgerOp::builder()
            .deltas(
                FieldDeltas {
                    deposit: -from_deposit,
                    winnings: -from_winnings,
                    ..Default::default()
                }
                .with_matches(1),
            )
            .upsert_transaction(
                Transaction::builder()
                    .id(id.clone())
                    .kind(TransactionKind::EntryFee)
                    .amount(-fee)
                    .created_at(self.ledger.now())
                    .reason(format!("Entry fee for {}", m.title))
                    .source_match_id(match_id.clone())
                    .build(),
            )
            .guard(Guard::TransactionAbsent(id))
            .build();
        let balances = match self.ledger.apply(account, &op).await {
            Ok(applied) => {
                if applied.outcome == ApplyOutcome::AlreadyApplied {
                    tracing::debug!(%account, %match_id, "entry fee already paid");
                }
                applied.account.balances()
            }
            // Paid by an earlier call whose registration failed.
            Err(Error::Model(tourney_model::Error::DuplicateTransaction(_))) => {
                tracing::info!(%account, %match_id, "entry fee already paid, registering");
                self.ledger.account(account).await?.balances()
            }
            Err(err) => return Err(err),
        };

        let participant = Participant::builder()
            .account_id(account.clone())
            .display_name(current.display_name())
            .external_player_id(external_player_id)
            .build();
        let registered = with_retry(retry, "add_participant", || {
            store.add_participant(match_id, participant.clone())
        })
        .await;
        match registered {
            Ok(()) | Err(Error::AlreadyJoined(..)) => {}
            Err(error) => {
                tracing::warn!(%error, %account, %match_id, "registration failed after the fee was paid");
                return Err(PartialFailure {
                    succeeded: vec![],
                    failed: vec![AccountFailure {
                        account_id: account.clone(),
                        error,
                    }],
                }
                .into());
            }
        }

        tracing::info!(%account, %match_id, %fee, "match joined");
        Ok(Entry {
            match_id: match_id.clone(),
            fee,
            from_deposit,
            from_winnings,
            balances,
        })
    }
}
