//! Marketplace Credentials - API Key and Order Signing
//!
//! The API key travels in the `X-API-KEY` header of every request.
//! Offer and fulfillment payloads are signed with the wallet key
//! (EIP-191 personal message over the canonical JSON body). Without a
//! wallet key the session can still read market data, but every
//! submission fails with `SigningUnavailable`.

use alloy::hex;
use alloy::primitives::Address;
use alloy::signers::Signer;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};

use crate::domain::error::MarketplaceError;

/// Detached signature over a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadSignature {
    /// Address recovered from the signing key.
    pub signer: Address,
    /// 65-byte `r || s || v` signature, 0x-prefixed hex.
    pub signature: String,
}

/// API key plus optional wallet signer.
pub struct MarketplaceSession {
    api_key: String,
    signer: Option<PrivateKeySigner>,
}

impl MarketplaceSession {
    pub fn new(api_key: impl Into<String>, signer: Option<PrivateKeySigner>) -> Self {
        Self {
            api_key: api_key.into(),
            signer,
        }
    }

    /// Read the API key from the named environment variable.
    ///
    /// # Errors
    /// Fails when the variable is unset or empty.
    pub fn from_env(api_key_env: &str, signer: Option<PrivateKeySigner>) -> Result<Self> {
        let api_key = std::env::var(api_key_env)
            .with_context(|| format!("{api_key_env} not set"))?;
        anyhow::ensure!(!api_key.trim().is_empty(), "{api_key_env} is empty");
        Ok(Self::new(api_key.trim(), signer))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Wallet address, when a signing key is loaded.
    pub fn address(&self) -> Option<Address> {
        self.signer.as_ref().map(PrivateKeySigner::address)
    }

    pub const fn can_sign(&self) -> bool {
        self.signer.is_some()
    }

    /// Sign `payload` as an EIP-191 personal message.
    pub async fn sign_payload(&self, payload: &[u8]) -> Result<PayloadSignature, MarketplaceError> {
        let signer = self.signer.as_ref().ok_or(MarketplaceError::SigningUnavailable)?;
        let signature = signer
            .sign_message(payload)
            .await
            .map_err(|e| MarketplaceError::Transport(format!("signing failed: {e}")))?;
        Ok(PayloadSignature {
            signer: signer.address(),
            signature: hex::encode_prefixed(signature.as_bytes()),
        })
    }
}

impl std::fmt::Debug for MarketplaceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketplaceSession")
            .field("api_key", &"<redacted>")
            .field("address", &self.address())
            .finish()
    }
}
