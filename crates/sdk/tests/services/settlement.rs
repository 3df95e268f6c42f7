use rust_decimal_macros::dec;
use tourney_sdk::{
    model::{test::entry, MatchStatus, NotificationId, TransactionId},
    settlement::{AccountStatus, SettlementWarning},
    store::{FailPoint, MatchStore},
    Error, ErrorKind,
};

use super::setup::{Deployment, ATTEMPTS};

#[tokio::test]
async fn refinalize_with_same_results_changes_nothing() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let a = deployment.add_account("a@x.io", dec!(0), dec!(0)).await;
    let m = deployment
        .add_match("m1", MatchStatus::Ongoing, dec!(200), &[&a])
        .await;

    let report = deployment
        .tourney
        .finalize_match(&m, vec![entry("a@x.io", 3, dec!(50))])
        .await?;
    assert!(report.is_complete());
    assert!(matches!(
        report.accounts[0].status,
        AccountStatus::Applied { winning_delta, kill_delta: 3 } if winning_delta == dec!(50)
    ));
    let first = deployment.account(&a).await?;

    let report = deployment
        .tourney
        .finalize_match(&m, vec![entry("a@x.io", 3, dec!(50))])
        .await?;
    assert!(matches!(report.accounts[0].status, AccountStatus::Skipped));
    assert_eq!(deployment.account(&a).await?, first);

    let stored = deployment.store.get_match(&m).await?;
    assert_eq!(stored.status, MatchStatus::Results);
    assert!(stored.winnings_distributed);
    Ok(())
}

#[tokio::test]
async fn edited_result_credits_only_the_difference() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let a = deployment.add_account("a@x.io", dec!(0), dec!(0)).await;
    let m = deployment
        .add_match("m1", MatchStatus::Ongoing, dec!(200), &[&a])
        .await;

    deployment
        .tourney
        .finalize_match(&m, vec![entry("a@x.io", 2, dec!(50))])
        .await?;
    let report = deployment
        .tourney
        .finalize_match(&m, vec![entry("a@x.io", 2, dec!(80))])
        .await?;
    assert!(matches!(
        report.accounts[0].status,
        AccountStatus::Applied { winning_delta, kill_delta: 0 } if winning_delta == dec!(30)
    ));

    let account = deployment.account(&a).await?;
    assert_eq!(account.balances().winnings, dec!(80));
    assert_eq!(account.balances().total_winnings, dec!(80));
    assert_eq!(account.kill_count(), 2);
    assert_eq!(account.transactions().len(), 1);
    let transaction = account
        .transaction(&TransactionId::winnings(&m))
        .expect("winnings transaction must exist");
    assert_eq!(transaction.amount, dec!(80));
    assert_eq!(account.notifications().len(), 1);
    Ok(())
}

#[tokio::test]
async fn removed_participant_is_revoked() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let a = deployment.add_account("a@x.io", dec!(0), dec!(0)).await;
    let m = deployment
        .add_match("m1", MatchStatus::Ongoing, dec!(200), &[&a])
        .await;

    deployment
        .tourney
        .finalize_match(&m, vec![entry("a@x.io", 4, dec!(50))])
        .await?;
    let report = deployment.tourney.finalize_match(&m, vec![]).await?;
    assert_eq!(report.accounts.len(), 1);
    assert!(report.results.is_empty());

    let account = deployment.account(&a).await?;
    assert_eq!(account.balances().winnings, dec!(0));
    assert_eq!(account.kill_count(), 0);
    assert!(account.transaction(&TransactionId::winnings(&m)).is_none());
    assert!(account.notification(&NotificationId::winnings(&m)).is_none());
    assert!(account.standing(&m).is_none());
    Ok(())
}

#[tokio::test]
async fn kills_only_result_updates_counts_silently() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let a = deployment.add_account("a@x.io", dec!(0), dec!(0)).await;
    let b = deployment.add_account("b@x.io", dec!(0), dec!(0)).await;
    let m = deployment
        .add_match("m1", MatchStatus::Ongoing, dec!(200), &[&a, &b])
        .await;

    let report = deployment
        .tourney
        .finalize_match(
            &m,
            vec![entry("a@x.io", 5, dec!(0)), entry("b@x.io", 2, dec!(100))],
        )
        .await?;
    let ranks = report
        .results
        .iter()
        .map(|r| (r.entry.account_id.as_str(), r.rank))
        .collect::<Vec<_>>();
    assert_eq!(ranks, [("b@x.io", 1), ("a@x.io", 2)]);

    let a = deployment.account(&a).await?;
    assert_eq!(a.kill_count(), 5);
    assert_eq!(a.transactions().len(), 0);
    assert_eq!(a.notifications().len(), 0);

    let b = deployment.account(&b).await?;
    assert_eq!(b.balances().winnings, dec!(100));
    let transaction = b
        .transaction(&TransactionId::winnings(&m))
        .expect("winnings transaction must exist");
    assert!(transaction.reason.contains("#1"));
    Ok(())
}

#[tokio::test]
async fn empty_rows_are_dropped() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let a = deployment.add_account("a@x.io", dec!(0), dec!(0)).await;
    let b = deployment.add_account("b@x.io", dec!(0), dec!(0)).await;
    let m = deployment
        .add_match("m1", MatchStatus::Ongoing, dec!(200), &[&a, &b])
        .await;

    let report = deployment
        .tourney
        .finalize_match(
            &m,
            vec![entry("a@x.io", 0, dec!(0)), entry("b@x.io", 1, dec!(10))],
        )
        .await?;
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.accounts.len(), 1);
    assert_eq!(deployment.store.get_match(&m).await?.results.len(), 1);
    Ok(())
}

#[tokio::test]
async fn exceeding_the_prize_pool_is_a_warning() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let a = deployment.add_account("a@x.io", dec!(0), dec!(0)).await;
    let m = deployment
        .add_match("m1", MatchStatus::Ongoing, dec!(100), &[&a])
        .await;

    let report = deployment
        .tourney
        .finalize_match(&m, vec![entry("a@x.io", 1, dec!(150))])
        .await?;
    assert_eq!(
        report.warnings,
        [SettlementWarning::PrizePoolExceeded {
            distributed: dec!(150),
            pool: dec!(100),
        }]
    );
    assert_eq!(deployment.account(&a).await?.balances().winnings, dec!(150));
    Ok(())
}

#[tokio::test]
async fn invalid_submissions_are_rejected() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let a = deployment.add_account("a@x.io", dec!(0), dec!(0)).await;
    deployment.add_account("x@x.io", dec!(0), dec!(0)).await;
    let upcoming = deployment
        .add_match("m1", MatchStatus::Upcoming, dec!(100), &[&a])
        .await;
    let ongoing = deployment
        .add_match("m2", MatchStatus::Ongoing, dec!(100), &[&a])
        .await;

    let err = deployment
        .tourney
        .finalize_match(&upcoming, vec![entry("a@x.io", 1, dec!(10))])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = deployment
        .tourney
        .finalize_match(&ongoing, vec![entry("x@x.io", 1, dec!(10))])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("x@x.io"));

    let err = deployment
        .tourney
        .finalize_match(
            &ongoing,
            vec![entry("a@x.io", 1, dec!(10)), entry("a@x.io", 2, dec!(20))],
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = deployment
        .tourney
        .finalize_match(&"nope".into(), vec![])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_eq!(deployment.account(&a).await?.balances().winnings, dec!(0));
    Ok(())
}

#[tokio::test]
async fn failed_accounts_are_reported_and_settled_on_rerun() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let a = deployment.add_account("a@x.io", dec!(0), dec!(0)).await;
    let b = deployment.add_account("b@x.io", dec!(0), dec!(0)).await;
    let m = deployment
        .add_match("m1", MatchStatus::Ongoing, dec!(200), &[&a, &b])
        .await;
    deployment
        .store
        .fail_next(FailPoint::Account(b.clone()), ATTEMPTS)
        .await;

    let entries = vec![entry("a@x.io", 1, dec!(50)), entry("b@x.io", 2, dec!(30))];
    let report = deployment
        .tourney
        .finalize_match(&m, entries.clone())
        .await?;
    assert!(!report.is_complete());
    let failure = report.partial_failure().expect("must be partial");
    assert_eq!(failure.succeeded, [a.clone()]);
    assert_eq!(failure.failed_accounts().collect::<Vec<_>>(), [&b]);
    assert!(failure.failed[0].error.is_retryable());
    assert!(matches!(
        report.clone().into_result(),
        Err(Error::PartialFailure(_))
    ));

    // Stored results describe what the accounts hold.
    let stored = deployment.store.get_match(&m).await?;
    assert!(!stored.winnings_distributed);
    assert_eq!(stored.results.len(), 1);
    assert_eq!(stored.results[0].entry.account_id, a);
    assert_eq!(deployment.account(&b).await?.balances().winnings, dec!(0));

    let report = deployment.tourney.finalize_match(&m, entries).await?;
    assert!(report.is_complete());
    let statuses = report
        .accounts
        .iter()
        .map(|r| (r.account_id.as_str(), matches!(r.status, AccountStatus::Skipped)))
        .collect::<Vec<_>>();
    assert_eq!(statuses, [("a@x.io", true), ("b@x.io", false)]);

    assert_eq!(deployment.account(&a).await?.balances().winnings, dec!(50));
    assert_eq!(deployment.account(&b).await?.balances().winnings, dec!(30));
    let stored = deployment.store.get_match(&m).await?;
    assert!(stored.winnings_distributed);
    assert_eq!(stored.results.len(), 2);
    Ok(())
}

#[tokio::test]
async fn failed_results_write_keeps_the_account_report() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let a = deployment.add_account("a@x.io", dec!(0), dec!(0)).await;
    let m = deployment
        .add_match("m1", MatchStatus::Ongoing, dec!(200), &[&a])
        .await;
    deployment
        .store
        .fail_next(FailPoint::Match(m.clone()), ATTEMPTS)
        .await;

    let entries = vec![entry("a@x.io", 1, dec!(50))];
    let report = deployment
        .tourney
        .finalize_match(&m, entries.clone())
        .await?;
    assert!(!report.is_complete());
    assert!(report.partial_failure().is_none());
    assert!(report
        .results_error
        .as_ref()
        .is_some_and(|err| err.is_retryable()));
    assert_eq!(report.accounts.len(), 1);
    assert_eq!(report.accounts[0].account_id, a);
    assert!(matches!(
        report.accounts[0].status,
        AccountStatus::Applied { .. }
    ));
    assert!(matches!(report.clone().into_result(), Err(Error::Store(_))));
    assert_eq!(deployment.account(&a).await?.balances().winnings, dec!(50));
    assert!(deployment.store.get_match(&m).await?.results.is_empty());

    let report = deployment.tourney.finalize_match(&m, entries).await?;
    assert!(report.is_complete());
    assert!(matches!(
        report.accounts[0].status,
        AccountStatus::AlreadyApplied
    ));
    assert_eq!(deployment.account(&a).await?.balances().winnings, dec!(50));
    let stored = deployment.store.get_match(&m).await?;
    assert!(stored.winnings_distributed);
    assert_eq!(stored.results.len(), 1);
    Ok(())
}

#[tokio::test]
async fn lost_acknowledgement_does_not_double_credit() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let a = deployment.add_account("a@x.io", dec!(0), dec!(0)).await;
    let m = deployment
        .add_match("m1", MatchStatus::Ongoing, dec!(200), &[&a])
        .await;
    deployment
        .store
        .drop_next_ack(FailPoint::Account(a.clone()), 1)
        .await;

    let report = deployment
        .tourney
        .finalize_match(&m, vec![entry("a@x.io", 1, dec!(50))])
        .await?;
    assert!(matches!(
        report.accounts[0].status,
        AccountStatus::AlreadyApplied
    ));
    let account = deployment.account(&a).await?;
    assert_eq!(account.balances().winnings, dec!(50));
    assert_eq!(account.kill_count(), 1);
    Ok(())
}

#[tokio::test]
async fn many_participants_settle_concurrently() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let mut ids = Vec::new();
    for i in 0..40 {
        ids.push(
            deployment
                .add_account(&format!("p{i}@x.io"), dec!(0), dec!(0))
                .await,
        );
    }
    let m = deployment
        .add_match(
            "m1",
            MatchStatus::Ongoing,
            dec!(1000),
            &ids.iter().collect::<Vec<_>>(),
        )
        .await;
    let entries = (0..40)
        .map(|i| entry(&format!("p{i}@x.io"), i, rust_decimal::Decimal::from(i)))
        .collect::<Vec<_>>();

    let report = deployment.tourney.finalize_match(&m, entries).await?;
    assert!(report.is_complete());
    // `p0` has neither kills nor winnings.
    assert_eq!(report.accounts.len(), 39);
    assert_eq!(report.results[0].entry.account_id.as_str(), "p39@x.io");
    for (i, id) in ids.iter().enumerate() {
        let account = deployment.account(id).await?;
        assert_eq!(account.balances().winnings, rust_decimal::Decimal::from(i));
    }
    Ok(())
}
