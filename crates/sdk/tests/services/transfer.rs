use rust_decimal_macros::dec;
use tourney_sdk::{
    model::{BalanceField, TransactionKind},
    store::FailPoint,
    Error, ErrorKind,
};

use super::setup::{Deployment, ATTEMPTS};

#[tokio::test]
async fn share_moves_winnings_into_deposit() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let alice = deployment.add_account("alice@x.io", dec!(0), dec!(100)).await;
    let bob = deployment.add_account("bob@x.io", dec!(5), dec!(0)).await;

    let share = deployment
        .tourney
        .share_balance(&alice, &bob, dec!(40))
        .await?;
    assert_eq!(share.sender.winnings, dec!(60));
    assert_eq!(share.recipient.deposit, dec!(45));

    let alice = deployment.account(&alice).await?;
    let bob = deployment.account(&bob).await?;
    let total = alice.balances().deposit
        + alice.balances().winnings
        + bob.balances().deposit
        + bob.balances().winnings;
    assert_eq!(total, dec!(105));

    let sent = alice.transactions().next().expect("sender record");
    assert_eq!(sent.kind, TransactionKind::Share);
    assert_eq!(sent.amount, dec!(-40));
    let received = bob.transactions().next().expect("recipient record");
    assert_eq!(received.amount, dec!(40));
    assert_eq!(bob.notifications().len(), 1);
    Ok(())
}

#[tokio::test]
async fn invalid_shares_change_nothing() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let alice = deployment.add_account("alice@x.io", dec!(0), dec!(2000)).await;
    let bob = deployment.add_account("bob@x.io", dec!(0), dec!(10)).await;

    let err = deployment
        .tourney
        .share_balance(&alice, &alice, dec!(10))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SelfShare));

    let err = deployment
        .tourney
        .share_balance(&alice, &bob, dec!(1001))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = deployment
        .tourney
        .share_balance(&alice, &bob, dec!(0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = deployment
        .tourney
        .share_balance(&bob, &alice, dec!(11))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = deployment
        .tourney
        .share_balance(&alice, &"ghost@x.io".into(), dec!(10))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_eq!(deployment.account(&alice).await?.balances().winnings, dec!(2000));
    assert_eq!(deployment.account(&bob).await?.balances().winnings, dec!(10));
    assert_eq!(deployment.account(&alice).await?.transactions().len(), 0);
    Ok(())
}

#[tokio::test]
async fn failed_credit_is_a_partial_failure() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let alice = deployment.add_account("alice@x.io", dec!(0), dec!(100)).await;
    let bob = deployment.add_account("bob@x.io", dec!(0), dec!(0)).await;
    deployment
        .store
        .fail_next(FailPoint::Account(bob.clone()), ATTEMPTS)
        .await;

    let err = deployment
        .tourney
        .share_balance(&alice, &bob, dec!(30))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PartialFailure);
    let failure = err.as_partial_failure().expect("must be a partial failure");
    assert_eq!(failure.succeeded, [alice.clone()]);
    assert_eq!(failure.failed_accounts().collect::<Vec<_>>(), [&bob]);

    assert_eq!(deployment.account(&alice).await?.balances().winnings, dec!(70));
    assert_eq!(deployment.account(&bob).await?.balances().deposit, dec!(0));
    Ok(())
}

#[tokio::test]
async fn convert_moves_winnings_into_deposit() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let alice = deployment.add_account("alice@x.io", dec!(5), dec!(50)).await;

    let balances = deployment.tourney.convert_balance(&alice, dec!(20)).await?;
    assert_eq!(balances.deposit, dec!(25));
    assert_eq!(balances.winnings, dec!(30));

    let err = deployment
        .tourney
        .convert_balance(&alice, dec!(31))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let account = deployment.account(&alice).await?;
    assert_eq!(account.transactions().len(), 1);
    assert_eq!(
        account.transactions().next().map(|t| t.kind),
        Some(TransactionKind::Conversion)
    );
    Ok(())
}

#[tokio::test]
async fn adjustments_may_go_negative() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let alice = deployment.add_account("alice@x.io", dec!(10), dec!(20)).await;

    let balances = deployment
        .tourney
        .adjust_balance(&alice, BalanceField::Deposit, dec!(-15), "chargeback")
        .await?;
    assert_eq!(balances.deposit, dec!(-5));

    let balances = deployment
        .tourney
        .adjust_balance(&alice, BalanceField::Winnings, dec!(30), "missed prize")
        .await?;
    assert_eq!(balances.winnings, dec!(50));
    assert_eq!(balances.total_winnings, dec!(30));

    let balances = deployment
        .tourney
        .adjust_balance(&alice, BalanceField::Winnings, dec!(-10), "duplicate prize")
        .await?;
    assert_eq!(balances.winnings, dec!(40));
    assert_eq!(balances.total_winnings, dec!(30));

    let account = deployment.account(&alice).await?;
    assert_eq!(account.transactions().len(), 3);
    assert_eq!(account.notifications().len(), 3);
    Ok(())
}

#[tokio::test]
async fn adjustments_need_a_reason_and_an_amount() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let alice = deployment.add_account("alice@x.io", dec!(10), dec!(0)).await;

    let err = deployment
        .tourney
        .adjust_balance(&alice, BalanceField::Deposit, dec!(5), "  ")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = deployment
        .tourney
        .adjust_balance(&alice, BalanceField::Deposit, dec!(0), "nothing")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(deployment.account(&alice).await?.balances().deposit, dec!(10));
    Ok(())
}
