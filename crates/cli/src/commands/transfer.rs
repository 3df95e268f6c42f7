use rust_decimal::Decimal;
use tourney_sdk::model::{AccountId, BalanceField};

use crate::config::DisplayOptions;

fn balances_options() -> DisplayOptions {
    DisplayOptions::table_projection([
        ("deposit", "deposit"),
        ("winnings", "winnings"),
        ("total_winnings", "total_winnings"),
    ])
}

/// Share winnings with another account.
#[derive(Debug, clap::Args)]
pub struct Share {
    /// Sender.
    #[arg(long)]
    from: AccountId,
    /// Recipient.
    #[arg(long)]
    to: AccountId,
    amount: Decimal,
}

impl super::Command for Share {
    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let share = ctx
            .tourney()?
            .share_balance(&self.from, &self.to, self.amount)
            .await?;
        println!(
            "{}",
            ctx.output().display_one(
                serde_json::json!({
                    "amount": share.amount,
                    "sender": share.sender,
                    "recipient": share.recipient,
                }),
                // Flattened in both formats.
                DisplayOptions::projection(
                    [
                        ("amount", "amount"),
                        ("sender.winnings", "sender_winnings"),
                        ("recipient.deposit", "recipient_deposit"),
                    ],
                    false,
                ),
            )?
        );
        Ok(())
    }
}

/// Convert winnings into deposit.
#[derive(Debug, clap::Args)]
pub struct Convert {
    account: AccountId,
    amount: Decimal,
}

impl super::Command for Convert {
    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let balances = ctx
            .tourney()?
            .convert_balance(&self.account, self.amount)
            .await?;
        println!("{}", ctx.output().display_one(balances, balances_options())?);
        Ok(())
    }
}

/// Apply a signed correction to a balance. May go below zero.
#[derive(Debug, clap::Args)]
pub struct Adjust {
    account: AccountId,
    /// Balance to adjust.
    #[arg(long)]
    field: BalanceField,
    /// Signed amount.
    #[arg(allow_hyphen_values = true)]
    amount: Decimal,
    #[arg(long)]
    reason: String,
}

impl super::Command for Adjust {
    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let balances = ctx
            .tourney()?
            .adjust_balance(&self.account, self.field, self.amount, &self.reason)
            .await?;
        println!("{}", ctx.output().display_one(balances, balances_options())?);
        Ok(())
    }
}
