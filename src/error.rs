//! Error types.
//!
//! Errors are layered by concern: validation, key service, envelope,
//! project config, and persistence each get their own enum, wrapped by
//! the top-level [`Error`]. Callers match on the layer they care about.

use thiserror::Error;

/// Top-level error for all stagehand operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Precondition failures for `set` and `list`.
///
/// Reported before any mutation or persistence happens.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("missing variable key (use --key or run interactively)")]
    MissingKey,

    #[error("missing variable value (use --value or run interactively)")]
    MissingValue,

    #[error("missing variable type (use --type common|stage|region)")]
    MissingType,

    #[error("invalid variable type: {0} (expected common, stage or region)")]
    InvalidType(String),

    #[error("variable key must not be empty")]
    EmptyKey,

    #[error("variable key must not start with '_' (reserved for internal names): {0}")]
    ReservedKey(String),

    #[error("missing stage for {0} variable (use --stage)")]
    MissingStage(&'static str),

    #[error("missing region for region variable (use --region)")]
    MissingRegion,

    #[error("stage {0} does not exist in this project")]
    UnknownStage(String),

    #[error("region {region} does not exist in stage {stage}")]
    UnknownRegion { stage: String, region: String },

    #[error("missing stage and/or region (or pass --all)")]
    MissingSelection,
}

/// Key-management failures.
#[derive(Error, Debug)]
pub enum KeyError {
    /// An encrypted entry was encountered but no key ARN is configured.
    #[error("no KMS key configured: set [kms] key_arn in .stagehand.toml")]
    NotConfigured,

    /// The key service itself failed. Never retried at this layer.
    #[error("key service error: {0}")]
    Service(String),

    #[error("invalid key identifier: {0}")]
    InvalidIdentifier(String),

    /// A key ARN is configured but no provider backend is compiled in.
    #[error("KMS provider unavailable: rebuild with --features aws")]
    ProviderUnavailable,
}

/// Data-integrity failures in the stored envelope shape.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("malformed envelope for {name}: encrypted marker without ciphertext")]
    MissingCiphertext { name: String },

    #[error("malformed envelope for {name}: value table carries neither marker nor value")]
    Empty { name: String },

    #[error("invalid base64 ciphertext: {0}")]
    Base64(String),

    #[error("decrypted value is not valid UTF-8: {0}")]
    Utf8(String),
}

/// Project configuration (`.stagehand.toml`) failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("not a stagehand project: run `stagehand init` first")]
    NotInitialized,

    #[error("already initialized: .stagehand.toml exists")]
    AlreadyInitialized,

    #[error("failed to read project config: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to write project config: {0}")]
    WriteFile(#[source] std::io::Error),

    #[error("invalid project config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize project config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Per-scope variable store persistence failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read variables for scope {scope}: {source}")]
    ReadFile {
        scope: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write variables for scope {scope}: {source}")]
    WriteFile {
        scope: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid variables file for scope {scope}: {source}")]
    Parse {
        scope: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize variables for scope {scope}: {source}")]
    Serialize {
        scope: String,
        #[source]
        source: toml::ser::Error,
    },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
