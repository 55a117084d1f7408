//! Signing Session - Wallet Key Selection
//!
//! Chooses the key the marketplace client signs with:
//! 1. the private key in the configured environment variable, if set
//! 2. otherwise the first stored `privateKey` account that parses
//!
//! Seed phrases are accepted for storage but never derived into keys.
//! Secrets never appear in logs or error messages; only the derived
//! address does.

use std::str::FromStr;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::ports::account_store::{AccountKind, AccountStore, StoredAccount};

/// Word counts accepted for a BIP-39 mnemonic.
const MNEMONIC_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// Why an account could not be imported.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
  #[error("malformed private key")]
  MalformedKey,

  #[error("seed phrase must have 12, 15, 18, 21 or 24 words, got {0}")]
  BadSeedPhrase(usize),

  #[error("account store failed: {0:#}")]
  Store(#[from] anyhow::Error),
}

impl ImportError {
  /// True when the secret itself was rejected, as opposed to storage.
  pub fn is_invalid_input(&self) -> bool {
    !matches!(self, Self::Store(_))
  }
}

/// What a stored account looks like from outside: never the secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
  #[serde(rename = "type")]
  pub kind: AccountKind,
  /// Wallet address for private keys that parse.
  pub address: Option<String>,
}

/// Resolve the signing key, or `None` when no usable key exists.
///
/// # Errors
/// Fails when the environment variable holds an unparsable key or the
/// account store cannot be read.
#[instrument(skip(store))]
pub async fn load_signer<S: AccountStore + ?Sized>(
  store: &S,
  env_var: &str,
) -> Result<Option<PrivateKeySigner>> {
  if let Some(secret) = std::env::var(env_var).ok().filter(|s| !s.trim().is_empty()) {
    let signer = parse_private_key(&secret).with_context(|| format!("{env_var} is not a valid private key"))?;
    info!(address = %signer.address(), source = "env", "Signing key loaded");
    return Ok(Some(signer));
  }

  let accounts = store.restore().await.context("Failed to restore accounts")?;
  let mut seed_phrases = 0usize;

  for (index, account) in accounts.iter().enumerate() {
    match account.kind {
      AccountKind::PrivateKey => match parse_private_key(&account.secret) {
        Ok(signer) => {
          info!(address = %signer.address(), source = "accounts", "Signing key loaded");
          return Ok(Some(signer));
        }
        Err(_) => warn!(index, "Skipping stored private key that does not parse"),
      },
      AccountKind::SeedPhrase => seed_phrases += 1,
    }
  }

  if seed_phrases > 0 {
    warn!(count = seed_phrases, "Seed phrase accounts are stored but not used for signing");
  }
  warn!("No signing key available; offers and purchases will fail");
  Ok(None)
}

/// Validate an account and persist it. Returns the wallet address for
/// private keys.
///
/// A new key is picked up as signer on the next start of the process.
///
/// # Errors
/// [`ImportError::MalformedKey`] or [`ImportError::BadSeedPhrase`] for a
/// rejected secret, [`ImportError::Store`] when saving fails.
pub async fn import_account<S: AccountStore + ?Sized>(
  store: &S,
  account: &StoredAccount,
) -> Result<Option<Address>, ImportError> {
  let address = match account.kind {
    AccountKind::PrivateKey => Some(parse_private_key(&account.secret)?.address()),
    AccountKind::SeedPhrase => {
      validate_mnemonic_shape(&account.secret)?;
      None
    }
  };
  store.save(account).await?;
  info!(kind = %account.kind, address = ?address, "Account saved");
  Ok(address)
}

/// Stored accounts with their kind and, for private keys, the address.
///
/// # Errors
/// Fails when the account store cannot be read.
pub async fn list_accounts<S: AccountStore + ?Sized>(store: &S) -> Result<Vec<AccountSummary>> {
  let accounts = store.restore().await.context("Failed to restore accounts")?;
  Ok(
    accounts
      .iter()
      .map(|account| AccountSummary {
        kind: account.kind,
        address: match account.kind {
          AccountKind::PrivateKey => parse_private_key(&account.secret).ok().map(|s| s.address().to_string()),
          AccountKind::SeedPhrase => None,
        },
      })
      .collect(),
  )
}

/// Parse a hex private key, with or without `0x`.
fn parse_private_key(secret: &str) -> Result<PrivateKeySigner, ImportError> {
  // The underlying error can echo input bytes, so it is replaced.
  PrivateKeySigner::from_str(secret.trim()).map_err(|_| ImportError::MalformedKey)
}

fn validate_mnemonic_shape(phrase: &str) -> Result<(), ImportError> {
  let words = phrase.split_whitespace().count();
  if MNEMONIC_WORD_COUNTS.contains(&words) {
    Ok(())
  } else {
    Err(ImportError::BadSeedPhrase(words))
  }
}
