use std::path::{Path, PathBuf};

use eyre::WrapErr;
use tokio::fs;
use tourney_sdk::store::Snapshot;

/// JSON file holding the content of the ledger between runs.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// Create from the path of the file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot. A missing file is an empty ledger.
    pub async fn load(&self) -> eyre::Result<Snapshot> {
        if !fs::try_exists(&self.path).await? {
            tracing::info!(path = %self.path.display(), "state file not found, starting empty");
            return Ok(Snapshot::default());
        }
        let content = fs::read(&self.path).await?;
        serde_json::from_slice(&content)
            .wrap_err_with(|| format!("invalid state file `{}`", self.path.display()))
    }

    /// Replace the file with the given snapshot.
    ///
    /// Writes to a sibling file first and renames it over the old one.
    pub async fn save(&self, snapshot: &Snapshot) -> eyre::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_vec_pretty(snapshot)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), "state saved");
        Ok(())
    }
}
