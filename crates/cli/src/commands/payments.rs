use rust_decimal::Decimal;
use tourney_sdk::model::{AccountId, TransactionId, WithdrawalDetails};

use crate::config::DisplayOptions;

fn transaction_options() -> DisplayOptions {
    DisplayOptions::table_projection([
        ("id", "id"),
        ("kind", "kind"),
        ("amount", "amount"),
        ("status", "status"),
        ("reason", "reason"),
    ])
}

/// Record a confirmed deposit.
#[derive(Debug, clap::Args)]
pub struct Deposit {
    account: AccountId,
    amount: Decimal,
    /// Reference of the payment. Each payment is credited once.
    #[arg(long)]
    payment_ref: String,
}

impl super::Command for Deposit {
    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let balances = ctx
            .tourney()?
            .record_deposit(&self.account, self.amount, &self.payment_ref)
            .await?;
        println!(
            "{}",
            ctx.output().display_one(
                balances,
                DisplayOptions::table_projection([("deposit", "deposit"), ("winnings", "winnings")]),
            )?
        );
        Ok(())
    }
}

/// Withdrawal commands.
#[derive(Debug, clap::Args)]
pub struct Withdrawal {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Request a withdrawal of winnings.
    Request {
        account: AccountId,
        amount: Decimal,
        /// Payout method, e.g. `upi`.
        #[arg(long)]
        method: String,
        #[arg(long)]
        destination: String,
        #[arg(long)]
        holder_name: Option<String>,
    },
    /// Mark a pending withdrawal as paid out.
    Approve { account: AccountId, id: TransactionId },
    /// Refund a pending withdrawal.
    Reject {
        account: AccountId,
        id: TransactionId,
        #[arg(long, default_value = "")]
        reason: String,
    },
}

impl super::Command for Withdrawal {
    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let tourney = ctx.tourney()?;
        let output = ctx.output();

        let transaction = match &self.command {
            Command::Request {
                account,
                amount,
                method,
                destination,
                holder_name,
            } => {
                let details = WithdrawalDetails {
                    method: method.clone(),
                    destination: destination.clone(),
                    holder_name: holder_name.clone(),
                };
                let id = tourney.request_withdrawal(account, *amount, details).await?;
                tourney
                    .account(account)
                    .await?
                    .transaction(&id)
                    .cloned()
                    .ok_or_else(|| eyre::eyre!("withdrawal `{id}` was not recorded"))?
            }
            Command::Approve { account, id } => tourney.approve_withdrawal(account, id).await?,
            Command::Reject {
                account,
                id,
                reason,
            } => tourney.reject_withdrawal(account, id, reason).await?,
        };
        println!("{}", output.display_one(transaction, transaction_options())?);
        Ok(())
    }
}
