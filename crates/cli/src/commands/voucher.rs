use eyre::OptionExt;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tourney_sdk::{
    model::{self, AccountId, CreditTarget, VoucherCode},
    store::VoucherStore,
    ErrorKind,
};

use crate::config::DisplayOptions;

/// Voucher commands.
#[derive(Debug, clap::Args)]
pub struct Voucher {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Create a voucher.
    Create {
        code: VoucherCode,
        #[arg(long)]
        amount: Decimal,
        /// Balance to credit.
        #[arg(long, default_value_t = CreditTarget::Deposit)]
        target: CreditTarget,
        /// Time until the voucher expires, e.g. `30d`.
        #[arg(long)]
        expires_in: humantime::Duration,
        #[arg(long, default_value_t = 1)]
        max_uses: u32,
        #[arg(long, default_value_t = 1)]
        max_uses_per_account: u32,
    },
    /// Show a voucher and its claims.
    Show { code: VoucherCode },
    /// Redeem a voucher.
    Redeem {
        code: VoucherCode,
        #[arg(long)]
        account: AccountId,
    },
}

#[derive(serde::Serialize)]
struct Overview<'a> {
    code: &'a VoucherCode,
    amount: Decimal,
    target: CreditTarget,
    #[serde(with = "time::serde::rfc3339")]
    expires_at: OffsetDateTime,
    uses: u32,
    max_uses: u32,
    max_uses_per_account: u32,
}

impl<'a> From<&'a model::Voucher> for Overview<'a> {
    fn from(voucher: &'a model::Voucher) -> Self {
        Self {
            code: &voucher.code,
            amount: voucher.amount,
            target: voucher.credit_target,
            expires_at: voucher.expires_at,
            uses: voucher.uses(),
            max_uses: voucher.max_uses,
            max_uses_per_account: voucher.max_uses_per_account,
        }
    }
}

impl super::Command for Voucher {
    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let tourney = ctx.tourney()?;
        let output = ctx.output();
        let store = tourney.store();

        match &self.command {
            Command::Create {
                code,
                amount,
                target,
                expires_in,
                max_uses,
                max_uses_per_account,
            } => {
                if code.is_empty() {
                    eyre::bail!("voucher code must not be empty");
                }
                if *amount <= Decimal::ZERO {
                    eyre::bail!("amount must be positive");
                }
                if *max_uses == 0 || *max_uses_per_account == 0 {
                    eyre::bail!("use limits must be at least 1");
                }
                match store.get_voucher(code).await {
                    Ok(_) => eyre::bail!("voucher `{code}` already exists"),
                    Err(err) if err.kind() == ErrorKind::NotFound => {}
                    Err(err) => return Err(err.into()),
                }
                let expires_at = OffsetDateTime::now_utc()
                    .checked_add(time::Duration::try_from(**expires_in)?)
                    .ok_or_eyre("expiry is out of range")?;
                let voucher = model::Voucher::builder()
                    .code(code.clone())
                    .amount(*amount)
                    .credit_target(*target)
                    .expires_at(expires_at)
                    .max_uses(*max_uses)
                    .max_uses_per_account(*max_uses_per_account)
                    .build();
                store.insert_voucher(voucher.clone()).await;
                println!("{}", output.display_one(Overview::from(&voucher), Default::default())?);
            }
            Command::Show { code } => {
                let voucher = store.get_voucher(code).await?;
                println!("{}", output.display_one(Overview::from(&voucher), Default::default())?);
                if !voucher.claims().is_empty() {
                    println!(
                        "{}",
                        output.display_many(voucher.claims(), Default::default())?
                    );
                }
            }
            Command::Redeem { code, account } => {
                let redemption = tourney.redeem_voucher(code, account).await?;
                println!(
                    "{}",
                    output.display_one(
                        serde_json::json!({
                            "code": redemption.code,
                            "amount": redemption.amount,
                            "credited": redemption.credit_target,
                            "transaction": redemption.transaction_id,
                            "balances": redemption.balances,
                        }),
                        DisplayOptions::table_projection([
                            ("code", "code"),
                            ("amount", "amount"),
                            ("credited", "credited"),
                            ("transaction", "transaction"),
                            ("balances.deposit", "deposit"),
                            ("balances.winnings", "winnings"),
                        ]),
                    )?
                );
            }
        }
        Ok(())
    }
}
