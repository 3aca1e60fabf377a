//! Stagehand - scoped deployment variables with KMS-encrypted values.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── init          # Scaffold a project
//! │   ├── set           # variables set
//! │   ├── list          # variables list
//! │   ├── run           # Run a command with materialized variables
//! │   ├── prompt        # Interactive option collection
//! │   └── output        # Terminal output helpers
//! └── core/             # Core library components
//!     ├── project       # .stagehand.toml management
//!     ├── scope         # Scope tree: common / stage / region stores
//!     ├── envelope      # Plain/Encrypted value envelope + codec
//!     ├── kms           # Key identifiers and provider backends
//!     ├── resolver      # Effective-variable resolution and ordering
//!     ├── materialize   # Pre-action batch decryption hook
//!     ├── store         # Per-scope TOML persistence
//!     └── validation    # set/list precondition checks
//! ```
//!
//! # Features
//!
//! - Three nested variable scopes with deterministic merge order
//! - Per-variable opt-in KMS encryption (AWS KMS behind `--features aws`)
//! - Concurrent batch decryption with ordered, fail-fast write-back
//! - Per-scope TOML persistence, saved once per mutated scope

pub mod cli;
pub mod core;
pub mod error;
