//! Account Store Port - Key Material Persistence Interface
//!
//! Save/restore contract for wallet secrets. Records have set
//! semantics: saving the same account twice stores it once.
//!
//! Secrets are held in cleartext by every current implementation.
//! They must never be logged or echoed back in errors.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Kind of secret stored for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountKind {
  PrivateKey,
  SeedPhrase,
}

impl AccountKind {
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::PrivateKey => "privateKey",
      Self::SeedPhrase => "seedPhrase",
    }
  }
}

impl fmt::Display for AccountKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for AccountKind {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "privateKey" => Ok(Self::PrivateKey),
      "seedPhrase" => Ok(Self::SeedPhrase),
      other => anyhow::bail!("unknown account kind '{other}'"),
    }
  }
}

/// A stored wallet secret.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredAccount {
  pub kind: AccountKind,
  pub secret: String,
}

impl fmt::Debug for StoredAccount {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StoredAccount")
      .field("kind", &self.kind)
      .field("secret", &"<redacted>")
      .finish()
  }
}

/// Trait for account persistence providers.
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
  /// Persist an account. Duplicates collapse.
  async fn save(&self, account: &StoredAccount) -> anyhow::Result<()>;

  /// Load all stored accounts in file order.
  async fn restore(&self) -> anyhow::Result<Vec<StoredAccount>>;
}
