use std::path::Path;

use account::Account;
use enum_dispatch::enum_dispatch;
use eyre::OptionExt;
use init_config::InitConfig;
use matches::Match;
use payments::{Deposit, Withdrawal};
use referral::Referral;
use tourney_sdk::{store::MemoryStore, Tourney};
use transfer::{Adjust, Convert, Share};
use voucher::Voucher;

use crate::config::{Config, OutputFormat};

mod account;
mod init_config;
mod matches;
mod payments;
mod referral;
mod transfer;
mod voucher;

/// Commands.
#[enum_dispatch]
#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Initialize config file.
    InitConfig(InitConfig),
    /// Account commands.
    Account(Account),
    /// Match commands.
    Match(Match),
    /// Voucher commands.
    Voucher(Voucher),
    /// Referral commands.
    Referral(Referral),
    /// Share winnings with another account.
    Share(Share),
    /// Convert winnings into deposit.
    Convert(Convert),
    /// Adjust a balance.
    Adjust(Adjust),
    /// Record a confirmed deposit.
    Deposit(Deposit),
    /// Withdrawal commands.
    Withdrawal(Withdrawal),
}

#[enum_dispatch(Commands)]
pub(crate) trait Command {
    fn is_state_required(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: Context<'_>) -> eyre::Result<()>;
}

/// Execution context.
pub struct Context<'a> {
    config_path: &'a Path,
    config: &'a Config,
    tourney: Option<&'a Tourney<MemoryStore>>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        config_path: &'a Path,
        config: &'a Config,
        tourney: Option<&'a Tourney<MemoryStore>>,
    ) -> Self {
        Self {
            config_path,
            config,
            tourney,
        }
    }

    /// Get the config path.
    pub fn config_path(&self) -> &Path {
        self.config_path
    }

    /// Get the ledger.
    pub fn tourney(&self) -> eyre::Result<&'a Tourney<MemoryStore>> {
        self.tourney.ok_or_eyre("state is not loaded")
    }

    /// Output format.
    pub fn output(&self) -> OutputFormat {
        self.config.output()
    }
}
