use tourney_sdk::{
    model::{self, AccountId, Balances},
    store::AccountStore,
    ErrorKind,
};

use crate::config::DisplayOptions;

/// Account commands.
#[derive(Debug, clap::Args)]
pub struct Account {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Create an empty account.
    Create {
        id: AccountId,
        /// Display name. Defaults to the id.
        #[arg(long)]
        name: Option<String>,
        /// Referral code owned by the account.
        #[arg(long)]
        referral_code: Option<String>,
        /// Referral code the account signed up with.
        #[arg(long)]
        referred_by: Option<String>,
    },
    /// Show balances and counters.
    Show { id: AccountId },
    /// List transactions, newest first.
    Transactions {
        id: AccountId,
        #[arg(long, short, default_value_t = 20)]
        limit: usize,
    },
    /// List notifications, newest first.
    Notifications {
        id: AccountId,
        #[arg(long, short, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(serde::Serialize)]
pub(super) struct Summary<'a> {
    id: &'a AccountId,
    display_name: &'a str,
    balances: Balances,
    kills: u64,
    matches: u64,
    referral_code: Option<&'a str>,
    referred_by: Option<&'a str>,
    referral_resolved: bool,
}

impl<'a> From<&'a model::Account> for Summary<'a> {
    fn from(account: &'a model::Account) -> Self {
        Self {
            id: account.id(),
            display_name: account.display_name(),
            balances: account.balances(),
            kills: account.kill_count(),
            matches: account.match_count(),
            referral_code: account.referral_code(),
            referred_by: account.referred_by_code(),
            referral_resolved: account.reward_claimed(),
        }
    }
}

pub(super) fn summary_options() -> DisplayOptions {
    DisplayOptions::table_projection([
        ("id", "id"),
        ("display_name", "name"),
        ("balances.deposit", "deposit"),
        ("balances.winnings", "winnings"),
        ("balances.total_winnings", "total_winnings"),
        ("kills", "kills"),
        ("matches", "matches"),
        ("referral_code", "referral_code"),
        ("referred_by", "referred_by"),
        ("referral_resolved", "referral_resolved"),
    ])
}

impl super::Command for Account {
    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let tourney = ctx.tourney()?;
        let output = ctx.output();

        match &self.command {
            Command::Create {
                id,
                name,
                referral_code,
                referred_by,
            } => {
                if id.is_empty() {
                    eyre::bail!("account id must not be empty");
                }
                let store = tourney.store();
                match store.get_account(id).await {
                    Ok(_) => eyre::bail!("account `{id}` already exists"),
                    Err(err) if err.kind() == ErrorKind::NotFound => {}
                    Err(err) => return Err(err.into()),
                }
                let mut account =
                    model::Account::new(id.clone(), name.as_deref().unwrap_or(id.as_str()));
                if let Some(code) = referral_code {
                    if store.find_by_referral_code(code).await?.is_some() {
                        eyre::bail!("referral code `{code}` is taken");
                    }
                    account = account.with_referral_code(code.as_str());
                }
                if let Some(code) = referred_by {
                    account = account.with_referred_by(code.as_str());
                }
                store.insert_account(account.clone()).await;
                println!("{}", output.display_one(Summary::from(&account), summary_options())?);
            }
            Command::Show { id } => {
                let account = tourney.account(id).await?;
                println!("{}", output.display_one(Summary::from(&account), summary_options())?);
            }
            Command::Transactions { id, limit } => {
                let account = tourney.account(id).await?;
                println!(
                    "{}",
                    output.display_many(
                        account.transactions().take(*limit),
                        DisplayOptions::table_projection([
                            ("created_at", "time"),
                            ("id", "id"),
                            ("kind", "kind"),
                            ("amount", "amount"),
                            ("status", "status"),
                            ("reason", "reason"),
                        ]),
                    )?
                );
            }
            Command::Notifications { id, limit } => {
                let account = tourney.account(id).await?;
                println!(
                    "{}",
                    output.display_many(
                        account.notifications().take(*limit),
                        DisplayOptions::table_projection([
                            ("created_at", "time"),
                            ("icon", "icon"),
                            ("title", "title"),
                            ("message", "message"),
                        ]),
                    )?
                );
            }
        }
        Ok(())
    }
}
