use std::path::PathBuf;

use rust_decimal::Decimal;
use tourney_sdk::{
    model::{self, AccountId, MatchId, MatchStatus, ResultEntry},
    settlement::{AccountStatus, FinalizeReport, SettlementWarning},
    store::MatchStore,
    ErrorKind,
};

use crate::config::DisplayOptions;

/// Match commands.
#[derive(Debug, clap::Args)]
pub struct Match {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Create an upcoming match.
    Create {
        id: MatchId,
        #[arg(long)]
        title: String,
        #[arg(long, default_value_t = Decimal::ZERO)]
        entry_fee: Decimal,
        #[arg(long, default_value_t = Decimal::ZERO)]
        prize_pool: Decimal,
        #[arg(long, default_value_t = Decimal::ZERO)]
        per_kill_reward: Decimal,
    },
    /// Show a match.
    Show { id: MatchId },
    /// Set the status of a match.
    SetStatus { id: MatchId, status: MatchStatus },
    /// Pay the entry fee and join.
    Join {
        id: MatchId,
        #[arg(long)]
        account: AccountId,
        /// In-game player id.
        #[arg(long)]
        player_id: String,
    },
    /// Settle a new or edited result list.
    Finalize {
        id: MatchId,
        /// JSON file with a list of result rows.
        #[arg(long)]
        results: PathBuf,
    },
}

#[derive(serde::Serialize)]
struct Overview<'a> {
    id: &'a MatchId,
    title: &'a str,
    status: MatchStatus,
    entry_fee: Decimal,
    prize_pool: Decimal,
    per_kill_reward: Decimal,
    participants: usize,
    results: usize,
    winnings_distributed: bool,
}

impl<'a> From<&'a model::Match> for Overview<'a> {
    fn from(m: &'a model::Match) -> Self {
        Self {
            id: &m.id,
            title: &m.title,
            status: m.status,
            entry_fee: m.entry_fee,
            prize_pool: m.prize_pool,
            per_kill_reward: m.per_kill_reward,
            participants: m.participants.len(),
            results: m.results.len(),
            winnings_distributed: m.winnings_distributed,
        }
    }
}

#[derive(serde::Serialize)]
struct SettledRow<'a> {
    account: &'a AccountId,
    status: &'static str,
    winning_delta: Option<Decimal>,
    kill_delta: Option<i64>,
    error: Option<String>,
}

fn settled_rows(report: &FinalizeReport) -> impl Iterator<Item = SettledRow<'_>> {
    report.accounts.iter().map(|account| {
        let (status, winning_delta, kill_delta, error) = match &account.status {
            AccountStatus::Applied {
                winning_delta,
                kill_delta,
            } => ("applied", Some(*winning_delta), Some(*kill_delta), None),
            AccountStatus::AlreadyApplied => ("already_applied", None, None, None),
            AccountStatus::Skipped => ("skipped", None, None, None),
            AccountStatus::Failed(err) => ("failed", None, None, Some(err.to_string())),
        };
        SettledRow {
            account: &account.account_id,
            status,
            winning_delta,
            kill_delta,
            error,
        }
    })
}

impl super::Command for Match {
    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let tourney = ctx.tourney()?;
        let output = ctx.output();
        let store = tourney.store();

        match &self.command {
            Command::Create {
                id,
                title,
                entry_fee,
                prize_pool,
                per_kill_reward,
            } => {
                if id.is_empty() {
                    eyre::bail!("match id must not be empty");
                }
                if entry_fee.is_sign_negative() || prize_pool.is_sign_negative() {
                    eyre::bail!("fees and prizes must not be negative");
                }
                match store.get_match(id).await {
                    Ok(_) => eyre::bail!("match `{id}` already exists"),
                    Err(err) if err.kind() == ErrorKind::NotFound => {}
                    Err(err) => return Err(err.into()),
                }
                let m = model::Match::builder()
                    .id(id.clone())
                    .title(title.as_str())
                    .entry_fee(*entry_fee)
                    .prize_pool(*prize_pool)
                    .per_kill_reward(*per_kill_reward)
                    .build();
                store.insert_match(m.clone()).await;
                println!("{}", output.display_one(Overview::from(&m), Default::default())?);
            }
            Command::Show { id } => {
                let m = store.get_match(id).await?;
                println!("{}", output.display_one(Overview::from(&m), Default::default())?);
                if !m.results.is_empty() {
                    println!(
                        "{}",
                        output.display_many(
                            &m.results,
                            DisplayOptions::table_projection([
                                ("rank", "rank"),
                                ("account_id", "account"),
                                ("display_name", "name"),
                                ("kills", "kills"),
                                ("winning_amount", "winning"),
                            ]),
                        )?
                    );
                }
            }
            Command::SetStatus { id, status } => {
                let mut m = store.get_match(id).await?;
                m.status = *status;
                store.insert_match(m.clone()).await;
                tracing::info!(match_id = %id, %status, "match status set");
                println!("{}", output.display_one(Overview::from(&m), Default::default())?);
            }
            Command::Join {
                id,
                account,
                player_id,
            } => {
                let entry = tourney.join_match(account, id, player_id).await?;
                println!(
                    "{}",
                    output.display_one(
                        serde_json::json!({
                            "match_id": entry.match_id,
                            "fee": entry.fee,
                            "from_deposit": entry.from_deposit,
                            "from_winnings": entry.from_winnings,
                            "balances": entry.balances,
                        }),
                        DisplayOptions::table_projection([
                            ("match_id", "match"),
                            ("fee", "fee"),
                            ("from_deposit", "from_deposit"),
                            ("from_winnings", "from_winnings"),
                            ("balances.deposit", "deposit"),
                            ("balances.winnings", "winnings"),
                        ]),
                    )?
                );
            }
            Command::Finalize { id, results } => {
                let content = tokio::fs::read(results).await?;
                let entries: Vec<ResultEntry> = serde_json::from_slice(&content)?;
                let report = tourney.finalize_match(id, entries).await?;
                for warning in &report.warnings {
                    match warning {
                        SettlementWarning::PrizePoolExceeded { distributed, pool } => {
                            eprintln!("warning: {distributed} distributed exceeds the prize pool of {pool}");
                        }
                    }
                }
                println!(
                    "{}",
                    output.display_many(settled_rows(&report), Default::default())?
                );
                report.into_result()?;
            }
        }
        Ok(())
    }
}
