//! Stagehand - scoped deployment variables with KMS-encrypted values.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stagehand::cli::output;
use stagehand::cli::{execute, Cli};
use stagehand::error::{ConfigError, Error, KeyError};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env("STAGEHAND_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("stagehand=debug")
        } else {
            EnvFilter::new("stagehand=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).without_time())
        .init();

    if let Err(e) = execute(cli.command) {
        let suggestion = match &e {
            Error::Config(ConfigError::NotInitialized) => Some("run: stagehand init"),
            Error::Key(KeyError::NotConfigured) => {
                Some("add [kms] key_arn to .stagehand.toml")
            }
            Error::Key(KeyError::ProviderUnavailable) => {
                Some("rebuild with: cargo install stagehand --features aws")
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
