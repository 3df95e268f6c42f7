use rust_decimal_macros::dec;
use tourney_sdk::{
    model::{
        test::funded, AccountId, FieldDeltas, LedgerOp, NotificationId, TransactionId,
        TransactionKind,
    },
    referral::{ReferralOutcome, ReferrerCredit},
    store::{AccountStore, FailPoint},
    ErrorKind,
};

use super::setup::{Deployment, ATTEMPTS};

/// Insert a referrer with code `ALICE1` and an account referred by it.
async fn referral(deployment: &Deployment) -> (AccountId, AccountId) {
    let referrer = deployment
        .insert(funded("alice@x.io", dec!(0), dec!(0)).with_referral_code("ALICE1"))
        .await;
    let referred = deployment
        .insert(funded("bob@x.io", dec!(0), dec!(0)).with_referred_by("ALICE1"))
        .await;
    (referrer, referred)
}

#[tokio::test]
async fn approval_credits_both_sides() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let (referrer, referred) = referral(&deployment).await;

    let pending = deployment.tourney.pending_referrals().await?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id(), &referred);

    let outcome = deployment.tourney.approve_referral(&referred).await?;
    assert_eq!(
        outcome,
        ReferralOutcome::Approved {
            referrer: referrer.clone(),
            new_user_reward: dec!(10),
            referrer_reward: dec!(20),
        }
    );

    let bob = deployment.account(&referred).await?;
    assert!(bob.reward_claimed());
    assert_eq!(bob.balances().deposit, dec!(10));
    let alice = deployment.account(&referrer).await?;
    assert_eq!(alice.balances().deposit, dec!(20));
    assert!(alice
        .notification(&NotificationId::keyed(
            TransactionKind::ReferralBonus,
            &referred
        ))
        .is_some());

    assert!(deployment.tourney.pending_referrals().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn a_referral_is_resolved_once() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let (referrer, referred) = referral(&deployment).await;

    deployment.tourney.approve_referral(&referred).await?;
    assert_eq!(
        deployment.tourney.approve_referral(&referred).await?,
        ReferralOutcome::AlreadyResolved
    );
    assert_eq!(
        deployment.tourney.reject_referral(&referred).await?,
        ReferralOutcome::AlreadyResolved
    );
    assert_eq!(deployment.account(&referred).await?.balances().deposit, dec!(10));
    assert_eq!(deployment.account(&referrer).await?.balances().deposit, dec!(20));
    Ok(())
}

#[tokio::test]
async fn rejection_blocks_later_approval() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let (referrer, referred) = referral(&deployment).await;

    assert_eq!(
        deployment.tourney.reject_referral(&referred).await?,
        ReferralOutcome::Rejected
    );
    assert_eq!(
        deployment.tourney.approve_referral(&referred).await?,
        ReferralOutcome::AlreadyResolved
    );
    let bob = deployment.account(&referred).await?;
    assert!(bob.reward_claimed());
    assert_eq!(bob.balances().deposit, dec!(0));
    assert_eq!(deployment.account(&referrer).await?.balances().deposit, dec!(0));
    Ok(())
}

#[tokio::test]
async fn ineligible_referrals_are_rejected() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let orphan = deployment
        .insert(funded("carol@x.io", dec!(0), dec!(0)).with_referred_by("NOBODY"))
        .await;
    let err = deployment
        .tourney
        .approve_referral(&orphan)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let plain = deployment.add_account("dave@x.io", dec!(0), dec!(0)).await;
    let err = deployment.tourney.approve_referral(&plain).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = deployment.tourney.reject_referral(&plain).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let (_, referred) = referral(&deployment).await;
    deployment
        .store
        .apply_delta(
            &referred,
            &LedgerOp::builder()
                .deltas(FieldDeltas::default().with_matches(1))
                .build(),
        )
        .await?;
    let pending = deployment.tourney.pending_referrals().await?;
    assert_eq!(
        pending.iter().map(|account| account.id()).collect::<Vec<_>>(),
        [&orphan]
    );
    let err = deployment
        .tourney
        .approve_referral(&referred)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(!deployment.account(&referred).await?.reward_claimed());
    Ok(())
}

#[tokio::test]
async fn failed_referrer_credit_can_be_settled_later() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let (referrer, referred) = referral(&deployment).await;
    deployment
        .store
        .fail_next(FailPoint::Account(referrer.clone()), ATTEMPTS)
        .await;

    let err = deployment
        .tourney
        .approve_referral(&referred)
        .await
        .unwrap_err();
    let failure = err.as_partial_failure().expect("must be a partial failure");
    assert_eq!(failure.succeeded, [referred.clone()]);
    assert_eq!(failure.failed_accounts().collect::<Vec<_>>(), [&referrer]);
    assert_eq!(deployment.account(&referred).await?.balances().deposit, dec!(10));
    assert_eq!(deployment.account(&referrer).await?.balances().deposit, dec!(0));

    assert_eq!(
        deployment.tourney.settle_referrer(&referred).await?,
        ReferrerCredit::Credited
    );
    assert_eq!(
        deployment.tourney.settle_referrer(&referred).await?,
        ReferrerCredit::AlreadyCredited
    );
    assert_eq!(deployment.account(&referrer).await?.balances().deposit, dec!(20));
    Ok(())
}

#[tokio::test]
async fn settling_an_unapproved_referral_is_rejected() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let (_, referred) = referral(&deployment).await;

    let err = deployment
        .tourney
        .settle_referrer(&referred)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    deployment.tourney.reject_referral(&referred).await?;
    let err = deployment
        .tourney
        .settle_referrer(&referred)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    Ok(())
}

#[tokio::test]
async fn lost_acknowledgement_still_approves_once() -> eyre::Result<()> {
    let deployment = Deployment::new();
    let (referrer, referred) = referral(&deployment).await;
    deployment
        .store
        .drop_next_ack(FailPoint::Account(referred.clone()), 1)
        .await;
    deployment
        .store
        .drop_next_ack(FailPoint::Account(referrer.clone()), 1)
        .await;

    let outcome = deployment.tourney.approve_referral(&referred).await?;
    assert!(matches!(outcome, ReferralOutcome::Approved { .. }));

    let bob = deployment.account(&referred).await?;
    assert_eq!(bob.balances().deposit, dec!(10));
    let bonus = TransactionId::keyed(TransactionKind::ReferralBonus, &referred);
    assert!(bob.transaction(&bonus).is_some());
    let alice = deployment.account(&referrer).await?;
    assert_eq!(alice.balances().deposit, dec!(20));
    assert_eq!(alice.transactions().len(), 1);
    Ok(())
}
