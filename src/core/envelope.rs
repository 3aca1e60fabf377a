//! Variable value envelope: plain text or a KMS-encrypted ciphertext.
//!
//! On the wire a plain entry is a bare string and an encrypted entry is a
//! table `{ encrypted = true, value = "<base64>" }`. The marker is a real
//! boolean; a table carrying the marker without ciphertext (or neither
//! field) is a data error, never silently coerced to plaintext.

use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::kms::KeyProvider;
use crate::error::{EnvelopeError, KeyError, Result};

/// Mask rendered for encrypted values when listing without `--decrypt`.
pub const MASK: &str = "*******";

/// A variable's value: exactly one of plain or encrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableEntry {
    /// Raw plaintext value.
    Plain(String),
    /// Base64-encoded ciphertext from the key service.
    Encrypted(String),
}

impl VariableEntry {
    pub fn is_encrypted(&self) -> bool {
        matches!(self, VariableEntry::Encrypted(_))
    }
}

/// Serialized shape of an entry in a scope's variables file.
///
/// Kept separate from [`VariableEntry`] so malformed tables surface as
/// [`EnvelopeError`] at load time instead of deserializer noise.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireEntry {
    Plain(String),
    Tagged {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        encrypted: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
}

impl WireEntry {
    /// Decode the wire shape for the named variable.
    pub fn into_entry(self, name: &str) -> Result<VariableEntry> {
        match self {
            WireEntry::Plain(value) => Ok(VariableEntry::Plain(value)),
            WireEntry::Tagged {
                encrypted: Some(true),
                value: Some(value),
            } => Ok(VariableEntry::Encrypted(value)),
            WireEntry::Tagged {
                encrypted: Some(true),
                value: None,
            } => Err(EnvelopeError::MissingCiphertext {
                name: name.to_string(),
            }
            .into()),
            // A table without the marker is the legacy `{ value = ... }`
            // shape and reads as plain.
            WireEntry::Tagged {
                encrypted: _,
                value: Some(value),
            } => Ok(VariableEntry::Plain(value)),
            WireEntry::Tagged {
                encrypted: _,
                value: None,
            } => Err(EnvelopeError::Empty {
                name: name.to_string(),
            }
            .into()),
        }
    }

    pub fn from_entry(entry: &VariableEntry) -> Self {
        match entry {
            VariableEntry::Plain(value) => WireEntry::Plain(value.clone()),
            VariableEntry::Encrypted(value) => WireEntry::Tagged {
                encrypted: Some(true),
                value: Some(value.clone()),
            },
        }
    }
}

/// Encrypt a plaintext value into an [`VariableEntry::Encrypted`].
///
/// Encryption is opt-in per variable; when no key is configured the caller
/// stores the value as [`VariableEntry::Plain`] instead of calling this.
pub async fn encode(plaintext: &str, provider: &dyn KeyProvider) -> Result<VariableEntry> {
    trace!(plaintext_len = plaintext.len(), "encrypting variable value");
    let ciphertext = provider.encrypt(plaintext.as_bytes()).await?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&ciphertext);
    trace!(ciphertext_len = encoded.len(), "encrypted variable value");
    Ok(VariableEntry::Encrypted(encoded))
}

/// Decrypt an entry to its plaintext value.
///
/// Plain entries decode to themselves, so this is safe to call
/// unconditionally and never mutates the source entry. Decoding an
/// encrypted entry without a configured provider fails with
/// [`KeyError::NotConfigured`].
pub async fn decode(entry: &VariableEntry, provider: Option<&dyn KeyProvider>) -> Result<String> {
    match entry {
        VariableEntry::Plain(value) => Ok(value.clone()),
        VariableEntry::Encrypted(ciphertext_b64) => {
            let provider = provider.ok_or(KeyError::NotConfigured)?;
            let ciphertext = base64::engine::general_purpose::STANDARD
                .decode(ciphertext_b64)
                .map_err(|e| EnvelopeError::Base64(e.to_string()))?;
            let plaintext = provider.decrypt(&ciphertext).await?;
            String::from_utf8(plaintext)
                .map_err(|e| EnvelopeError::Utf8(e.to_string()).into())
        }
    }
}
