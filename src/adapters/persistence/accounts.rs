//! Account File Store - Line-delimited Wallet Secrets
//!
//! Implements the `AccountStore` port on a plain text file with one
//! `kind:secret` record per line. Saving rewrites the file with the
//! de-duplicated record set; blank lines are ignored.
//!
//! The file holds secrets in cleartext. Keep it out of version control
//! and restrict its permissions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::ports::account_store::{AccountKind, AccountStore, StoredAccount};

/// File-backed account store.
pub struct FileAccountStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileAccountStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_lines(&self) -> Result<Vec<String>> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .await
            .context("Failed to read accounts file")?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }
}

/// Parse one `kind:secret` line. The secret may itself contain ':'.
fn parse_line(line: &str) -> Option<StoredAccount> {
    let (kind, secret) = line.split_once(':')?;
    let kind: AccountKind = kind.trim().parse().ok()?;
    let secret = secret.trim();
    if secret.is_empty() {
        return None;
    }
    Some(StoredAccount {
        kind,
        secret: secret.to_string(),
    })
}

fn format_line(account: &StoredAccount) -> String {
    format!("{}:{}", account.kind, account.secret.trim())
}

#[async_trait]
impl AccountStore for FileAccountStore {
    #[instrument(skip(self, account), fields(kind = %account.kind))]
    async fn save(&self, account: &StoredAccount) -> Result<()> {
        anyhow::ensure!(!account.secret.trim().is_empty(), "Missing account secret");

        let _guard = self.write_lock.lock().await;

        let mut lines = self.read_lines().await?;
        let new_line = format_line(account);
        if lines.contains(&new_line) {
            info!("Account already stored");
            return Ok(());
        }
        lines.push(new_line);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create accounts directory")?;
        }
        fs::write(&self.path, lines.join("\n"))
            .await
            .context("Failed to write accounts file")?;

        info!(total = lines.len(), "Account saved");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn restore(&self) -> Result<Vec<StoredAccount>> {
        let lines = self.read_lines().await?;
        let mut accounts: Vec<StoredAccount> = Vec::with_capacity(lines.len());

        for (idx, line) in lines.iter().enumerate() {
            match parse_line(line) {
                Some(account) if !accounts.contains(&account) => accounts.push(account),
                Some(_) => {}
                None => warn!(line = idx + 1, "Skipping malformed account record"),
            }
        }

        info!(count = accounts.len(), "Accounts restored");
        Ok(accounts)
    }
}
