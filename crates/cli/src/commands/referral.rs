use tourney_sdk::{
    model::AccountId,
    referral::{ReferralOutcome, ReferrerCredit},
};

use super::account::{summary_options, Summary};

/// Referral commands.
#[derive(Debug, clap::Args)]
pub struct Referral {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// List referred accounts waiting for a decision.
    Pending,
    /// Credit both sides of a referral.
    Approve { account: AccountId },
    /// Close a referral without any credit.
    Reject { account: AccountId },
    /// Credit the referrer of an approved referral after a partial failure.
    SettleReferrer { account: AccountId },
}

impl super::Command for Referral {
    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let tourney = ctx.tourney()?;
        let output = ctx.output();

        match &self.command {
            Command::Pending => {
                let pending = tourney.pending_referrals().await?;
                let summaries = pending.iter().map(Summary::from);
                println!("{}", output.display_many(summaries, summary_options())?);
            }
            Command::Approve { account } => match tourney.approve_referral(account).await? {
                ReferralOutcome::Approved {
                    referrer,
                    new_user_reward,
                    referrer_reward,
                } => {
                    println!(
                        "approved: {account} received {new_user_reward}, {referrer} received {referrer_reward}"
                    );
                }
                ReferralOutcome::Rejected => {
                    eyre::bail!("internal: approval reported a rejection");
                }
                ReferralOutcome::AlreadyResolved => {
                    println!("referral of {account} was already resolved");
                }
            },
            Command::Reject { account } => match tourney.reject_referral(account).await? {
                ReferralOutcome::AlreadyResolved => {
                    println!("referral of {account} was already resolved");
                }
                _ => println!("rejected: {account}"),
            },
            Command::SettleReferrer { account } => {
                match tourney.settle_referrer(account).await? {
                    ReferrerCredit::Credited => println!("referrer credited"),
                    ReferrerCredit::AlreadyCredited => println!("referrer was already credited"),
                }
            }
        }
        Ok(())
    }
}
