//! Init command.
//!
//! Scaffolds `.stagehand.toml` with the declared stage and region order.

use tracing::info;

use crate::cli::output;
use crate::cli::InitArgs;
use crate::core::kms::KeyArn;
use crate::core::project::{KmsConfig, ProjectConfig};
use crate::error::{ConfigError, Error, Result};

pub fn execute(args: InitArgs) -> Result<()> {
    if ProjectConfig::exists() {
        return Err(ConfigError::AlreadyInitialized.into());
    }

    let name = match args.name {
        Some(name) => name,
        None => std::env::current_dir()?
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string()),
    };

    let mut config = ProjectConfig::new(&name);
    config.project.stages = args.stages;

    for decl in &args.regions {
        let Some((stage, region)) = decl.split_once(':') else {
            return Err(Error::Other(format!(
                "invalid region declaration: {} (expected STAGE:REGION)",
                decl
            )));
        };
        if !config.stage_exists(stage) {
            return Err(Error::Other(format!(
                "region {} declared for undeclared stage {}",
                region, stage
            )));
        }
        config
            .project
            .regions
            .entry(stage.to_string())
            .or_default()
            .push(region.to_string());
    }

    if let Some(arn) = args.kms {
        // fail early on an identifier the provider could never use
        KeyArn::parse(&arn)?;
        config.kms = Some(KmsConfig { key_arn: arn });
    }

    config.save()?;
    info!(name = %name, "project initialized");

    output::success(&format!("initialized stagehand project {}", name));
    if config.kms.is_none() {
        output::dimmed("no KMS key configured; variables will be stored plain");
    }
    Ok(())
}
