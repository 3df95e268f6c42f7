use rust_decimal_macros::dec;
use tourney_sdk::{
    model::{Match, MatchId, MatchStatus, TransactionId, TransactionKind},
    store::{FailPoint, MatchStore},
    Error, ErrorKind,
};

use super::setup::{Deployment, ATTEMPTS};

async fn add_paid_match(deployment: &Deployment, id: &str, fee: rust_decimal::Decimal) -> MatchId {
    let m = Match::builder()
        .id(MatchId::new(id))
        .title(format!("Match {id}"))
        .entry_fee(fee)
        .build();
    let id = m.id.clone();
    deployment.store.insert_match(m).await;
    id
}

#[tokio::test]
async fn fee_is_taken_from_deposit_first() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let alice = deployment.add_account("alice@x.io", dec!(20), dec!(50)).await;
    let m1 = add_paid_match(&deployment, "m1", dec!(30)).await;

    let entry = deployment.tourney.join_match(&alice, &m1, "alice#1").await?;
    assert_eq!(entry.fee, dec!(30));
    assert_eq!(entry.from_deposit, dec!(20));
    assert_eq!(entry.from_winnings, dec!(10));
    assert_eq!(entry.balances.deposit, dec!(0));
    assert_eq!(entry.balances.winnings, dec!(40));

    let account = deployment.account(&alice).await?;
    assert_eq!(account.match_count(), 1);
    let fee = account
        .transaction(&TransactionId::keyed(TransactionKind::EntryFee, &m1))
        .expect("fee record");
    assert_eq!(fee.amount, dec!(-30));

    let m = deployment.store.get_match(&m1).await?;
    assert!(m.is_participant(&alice));
    assert_eq!(m.participants[0].external_player_id, "alice#1");
    Ok(())
}

#[tokio::test]
async fn joining_twice_is_rejected() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let alice = deployment.add_account("alice@x.io", dec!(100), dec!(0)).await;
    let m1 = add_paid_match(&deployment, "m1", dec!(30)).await;

    deployment.tourney.join_match(&alice, &m1, "alice#1").await?;
    let err = deployment
        .tourney
        .join_match(&alice, &m1, "alice#1")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyJoined(..)));
    assert_eq!(deployment.account(&alice).await?.balances().deposit, dec!(70));
    Ok(())
}

#[tokio::test]
async fn invalid_entries_change_nothing() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let alice = deployment.add_account("alice@x.io", dec!(10), dec!(10)).await;
    let m1 = add_paid_match(&deployment, "m1", dec!(30)).await;
    let ongoing = deployment
        .add_match("m2", MatchStatus::Ongoing, dec!(100), &[])
        .await;

    let err = deployment
        .tourney
        .join_match(&alice, &m1, "alice#1")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = deployment
        .tourney
        .join_match(&alice, &ongoing, "alice#1")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = deployment.tourney.join_match(&alice, &m1, " ").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let account = deployment.account(&alice).await?;
    assert_eq!(account.balances().deposit, dec!(10));
    assert_eq!(account.balances().winnings, dec!(10));
    assert_eq!(account.match_count(), 0);
    assert!(deployment.store.get_match(&m1).await?.participants.is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_registration_is_retried_without_charging_again() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let alice = deployment.add_account("alice@x.io", dec!(100), dec!(0)).await;
    let m1 = add_paid_match(&deployment, "m1", dec!(30)).await;
    deployment
        .store
        .fail_next(FailPoint::Match(m1.clone()), ATTEMPTS)
        .await;

    let err = deployment
        .tourney
        .join_match(&alice, &m1, "alice#1")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PartialFailure);
    assert_eq!(deployment.account(&alice).await?.balances().deposit, dec!(70));
    assert!(!deployment.store.get_match(&m1).await?.is_participant(&alice));

    let entry = deployment.tourney.join_match(&alice, &m1, "alice#1").await?;
    assert_eq!(entry.balances.deposit, dec!(70));
    let account = deployment.account(&alice).await?;
    assert_eq!(account.balances().deposit, dec!(70));
    assert_eq!(account.match_count(), 1);
    assert_eq!(account.transactions().len(), 1);
    assert!(deployment.store.get_match(&m1).await?.is_participant(&alice));
    Ok(())
}

#[tokio::test]
async fn lost_registration_acknowledgement_is_tolerated() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let alice = deployment.add_account("alice@x.io", dec!(100), dec!(0)).await;
    let m1 = add_paid_match(&deployment, "m1", dec!(30)).await;
    deployment
        .store
        .drop_next_ack(FailPoint::Match(m1.clone()), 1)
        .await;

    deployment.tourney.join_match(&alice, &m1, "alice#1").await?;
    let m = deployment.store.get_match(&m1).await?;
    assert_eq!(m.participants.len(), 1);
    Ok(())
}
