/// Configuration.
pub mod config;

/// State file.
pub mod state;

/// Commands.
pub mod commands;

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use commands::{Command, Commands, Context};
use config::{Config, ConfigArgs};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use state::StateFile;
use tourney_sdk::{store::MemoryStore, Tourney};

const ENV_PREFIX: &str = "TOURNEY_";
const CONFIG_DIR: &str = "tourney";

/// We use `__` in the name of environment variable as an alias of `.`.
///
/// See [`Env`] for more information.
const DOT_ALIAS: &str = "__";

/// Command-line interface for the tournament ledger.
#[derive(Debug)]
pub struct Cli {
    config_path: PathBuf,
    config: Config,
    command: Commands,
}

impl Cli {
    /// Creates from the command line arguments.
    ///
    /// Settings are layered as: built-in defaults, the config file,
    /// `TOURNEY_*` environment variables, then command line flags.
    pub fn init() -> eyre::Result<Self> {
        let Inner {
            config_path,
            args,
            command,
        } = Inner::parse();

        let config_path = match config_path {
            Some(path) => path,
            None => default_config_path()?,
        };

        let config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path.clone()))
            .merge(Env::prefixed(ENV_PREFIX).split(DOT_ALIAS))
            .merge(Serialized::defaults(args))
            .extract()?;

        Ok(Self {
            config_path,
            config,
            command,
        })
    }

    /// Config.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute command.
    ///
    /// The state file is written back even when the command fails, since a
    /// failed multi-account operation may have committed some of its writes.
    pub async fn execute(&self) -> eyre::Result<()> {
        if !self.command.is_state_required() {
            return self
                .command
                .execute(Context::new(&self.config_path, &self.config, None))
                .await;
        }

        let state = StateFile::new(self.config.state_path()?);
        let store = Arc::new(MemoryStore::from_snapshot(state.load().await?));
        let tourney = Tourney::new(store.clone(), self.config.ledger().clone());

        let result = self
            .command
            .execute(Context::new(
                &self.config_path,
                &self.config,
                Some(&tourney),
            ))
            .await;

        state.save(&store.snapshot().await).await?;
        result
    }
}

fn default_config_path() -> eyre::Result<PathBuf> {
    use etcetera::{choose_base_strategy, BaseStrategy};

    let strategy = choose_base_strategy()?;
    Ok(strategy.config_dir().join(CONFIG_DIR).join("config.toml"))
}

/// Command-line interface for the tournament ledger.
#[derive(Debug, Parser)]
#[command(name = "tourney", version)]
struct Inner {
    /// Path to the config file.
    #[clap(long = "config", short)]
    config_path: Option<PathBuf>,
    /// Config.
    #[command(flatten)]
    args: ConfigArgs,
    /// Commands.
    #[command(subcommand)]
    command: Commands,
}
