mod output;

use std::path::PathBuf;

use tourney_sdk::LedgerConfig;

pub use output::{DisplayOptions, OutputFormat};

const DEFAULT_STATE: &str = "~/.config/tourney/state.json";

/// Configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the state file.
    state: String,
    /// Output format.
    output: OutputFormat,
    /// Ledger settings.
    ledger: LedgerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state: DEFAULT_STATE.to_string(),
            output: OutputFormat::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl Config {
    /// Returns the path of the state file with `~` and variables expanded.
    pub fn state_path(&self) -> eyre::Result<PathBuf> {
        Ok(PathBuf::from(shellexpand::full(&self.state)?.as_ref()))
    }

    /// Output format.
    pub fn output(&self) -> OutputFormat {
        self.output
    }

    /// Ledger settings.
    pub fn ledger(&self) -> &LedgerConfig {
        &self.ledger
    }
}

/// Config overrides from the command line.
///
/// Only flags that are actually given override the other sources.
#[derive(Debug, Clone, Default, clap::Args, serde::Serialize)]
pub struct ConfigArgs {
    /// Path to the state file.
    #[arg(long, short)]
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    /// Output format.
    #[arg(long, short, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<OutputFormat>,
}
