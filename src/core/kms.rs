//! Key-management capability: key identifiers and provider backends.
//!
//! The key ARN carries the regional endpoint in its 4th colon-delimited
//! field; there is no implicit default region. Provider failures surface as
//! [`KeyError::Service`] and are never retried at this layer; retry
//! policy, if any, belongs to the transport underneath.

use std::future::Future;

use async_trait::async_trait;

use crate::error::{Error, KeyError, Result};

/// A KMS key identifier with its embedded locality hint.
///
/// Format is colon-delimited, e.g.
/// `arn:aws:kms:us-east-1:123456789012:key/abc-123`; the 4th field
/// (`us-east-1`) selects the regional endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyArn {
    raw: String,
    locality: String,
}

impl KeyArn {
    pub fn parse(raw: &str) -> Result<Self> {
        let fields: Vec<&str> = raw.split(':').collect();
        if fields.len() < 6 || fields[0] != "arn" {
            return Err(KeyError::InvalidIdentifier(raw.to_string()).into());
        }
        let locality = fields[3];
        if locality.is_empty() {
            return Err(KeyError::InvalidIdentifier(format!(
                "{} (missing region field)",
                raw
            ))
            .into());
        }
        Ok(Self {
            raw: raw.to_string(),
            locality: locality.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The region field embedded in the identifier.
    pub fn locality(&self) -> &str {
        &self.locality
    }
}

/// Encrypt/decrypt capability against an external key service.
///
/// Implementations are constructed from a [`KeyArn`] and derive their
/// regional endpoint purely from it.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    async fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;
    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>>;

    /// Backend name for display/logging.
    fn name(&self) -> &'static str;
}

/// Run a future to completion on a fresh current-thread runtime.
///
/// Sync entry points (CLI commands, the materialize hook) use this to drive
/// the async provider; decode batches stay concurrent inside the future.
pub fn block_on<F: Future>(fut: F) -> Result<F::Output> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Other(format!("failed to create runtime: {}", e)))?;
    Ok(rt.block_on(fut))
}

/// Build a provider from the configured key ARN.
///
/// No ARN means no provider (`Ok(None)`): encryption and decryption must
/// not be attempted. An ARN with no compiled-in backend is
/// [`KeyError::ProviderUnavailable`].
pub fn provider_from_arn(key_arn: Option<&str>) -> Result<Option<Box<dyn KeyProvider>>> {
    let Some(raw) = key_arn else {
        return Ok(None);
    };
    let arn = KeyArn::parse(raw)?;

    #[cfg(feature = "test-kms")]
    if std::env::var_os("STAGEHAND_STUB_KMS").is_some() {
        tracing::trace!(key = %arn.as_str(), "using stub KMS provider");
        return Ok(Some(Box::new(StubKms)));
    }

    #[cfg(feature = "aws")]
    {
        tracing::trace!(key = %arn.as_str(), region = %arn.locality(), "using AWS KMS provider");
        return Ok(Some(Box::new(AwsKms::new(arn))));
    }

    #[cfg(not(feature = "aws"))]
    {
        let _ = arn;
        Err(KeyError::ProviderUnavailable.into())
    }
}

/// AWS KMS provider.
///
/// Credentials come from the environment or the default provider chain;
/// the endpoint region comes from the key ARN.
#[cfg(feature = "aws")]
pub struct AwsKms {
    arn: KeyArn,
}

#[cfg(feature = "aws")]
impl AwsKms {
    pub fn new(arn: KeyArn) -> Self {
        Self { arn }
    }

    async fn client(&self) -> aws_sdk_kms::Client {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(self.arn.locality().to_string()))
            .load()
            .await;
        aws_sdk_kms::Client::new(&config)
    }
}

#[cfg(feature = "aws")]
#[async_trait]
impl KeyProvider for AwsKms {
    async fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        tracing::trace!(
            key = %self.arn.as_str(),
            plaintext_len = plaintext.len(),
            "calling KMS encrypt"
        );
        let result = self
            .client()
            .await
            .encrypt()
            .key_id(self.arn.as_str())
            .plaintext(aws_sdk_kms::primitives::Blob::new(plaintext))
            .send()
            .await
            .map_err(|e| KeyError::Service(format!("KMS encrypt failed: {}", e)))?;

        let blob = result
            .ciphertext_blob()
            .ok_or_else(|| KeyError::Service("no ciphertext returned".to_string()))?;
        Ok(blob.as_ref().to_vec())
    }

    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        tracing::trace!(ciphertext_len = ciphertext.len(), "calling KMS decrypt");
        // KMS embeds the key reference in the ciphertext blob; only the
        // endpoint region comes from the ARN here.
        let result = self
            .client()
            .await
            .decrypt()
            .ciphertext_blob(aws_sdk_kms::primitives::Blob::new(ciphertext.to_vec()))
            .send()
            .await
            .map_err(|e| KeyError::Service(format!("KMS decrypt failed: {}", e)))?;

        let blob = result
            .plaintext()
            .ok_or_else(|| KeyError::Service("no plaintext returned".to_string()))?;
        Ok(blob.as_ref().to_vec())
    }

    fn name(&self) -> &'static str {
        "aws-kms"
    }
}

/// Stub provider for tests: reversible prefix transform, no network.
#[cfg(any(test, feature = "test-kms"))]
#[derive(Debug)]
pub struct StubKms;

#[cfg(any(test, feature = "test-kms"))]
const STUB_PREFIX: &[u8] = b"stub-kms:";

#[cfg(any(test, feature = "test-kms"))]
#[async_trait]
impl KeyProvider for StubKms {
    async fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut out = STUB_PREFIX.to_vec();
        out.extend_from_slice(plaintext);
        Ok(out)
    }

    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        match ciphertext.strip_prefix(STUB_PREFIX) {
            Some(rest) => Ok(rest.to_vec()),
            None => Err(KeyError::Service("not a stub-kms ciphertext".to_string()).into()),
        }
    }

    fn name(&self) -> &'static str {
        "stub-kms"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_arn_locality_is_fourth_field() {
        let arn = KeyArn::parse("arn:aws:kms:us-east-1:123:key/abc").unwrap();
        assert_eq!(arn.locality(), "us-east-1");
        assert_eq!(arn.as_str(), "arn:aws:kms:us-east-1:123:key/abc");
    }

    #[test]
    fn key_arn_rejects_short_or_foreign_strings() {
        assert!(KeyArn::parse("not-an-arn").is_err());
        assert!(KeyArn::parse("arn:aws:kms").is_err());
    }

    #[test]
    fn key_arn_has_no_default_region() {
        // Empty region field is an error, never a fallback.
        let err = KeyArn::parse("arn:aws:kms::123:key/abc").unwrap_err();
        assert!(matches!(err, Error::Key(KeyError::InvalidIdentifier(_))));
    }

    #[test]
    fn no_arn_means_no_provider() {
        assert!(provider_from_arn(None).unwrap().is_none());
    }

    #[test]
    fn stub_round_trips() {
        let stub = StubKms;
        let ct = block_on(stub.encrypt(b"value")).unwrap().unwrap();
        let pt = block_on(stub.decrypt(&ct)).unwrap().unwrap();
        assert_eq!(pt, b"value");
    }

    #[test]
    fn stub_rejects_foreign_ciphertext() {
        let stub = StubKms;
        let err = block_on(stub.decrypt(b"garbage")).unwrap().unwrap_err();
        assert!(matches!(err, Error::Key(KeyError::Service(_))));
    }
}
