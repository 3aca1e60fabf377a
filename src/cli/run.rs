//! Run command.
//!
//! Materializes the stage's variable set (the pre-run hook) and executes a
//! command with the variables injected as environment variables.

use tracing::{debug, info};

use crate::cli::RunArgs;
use crate::core::kms;
use crate::core::materialize::{self, Action, ActionEvent};
use crate::core::project::ProjectConfig;
use crate::core::resolver;
use crate::core::scope::StageSel;
use crate::core::store::{self, FsStore};
use crate::error::{Error, Result, ValidationError};

pub fn execute(args: RunArgs) -> Result<()> {
    let project = ProjectConfig::load()?;

    let stage = StageSel::parse(&args.stage);
    if !stage.is_local() && !project.stage_exists(stage.name()) {
        return Err(ValidationError::UnknownStage(stage.name().to_string()).into());
    }

    let provider = kms::provider_from_arn(project.key_arn())?;
    let mut tree = store::load_tree(&project, &FsStore::open())?;

    let event = ActionEvent {
        stage: Some(stage.name().to_string()),
        region: args.region.clone(),
        run_deployed: args.deployed,
    };
    let report = materialize::before_action(Action::Run, &event, &mut tree, provider.as_deref())?;
    info!(
        decrypted = report.decrypted,
        skipped = report.skipped,
        "variables materialized for run"
    );

    let exit_code = run_with_variables(&tree, &event, &args.command)?;
    std::process::exit(exit_code);
}

/// Run a command with the resolved stage/region variables as environment
/// variables. Later scopes override earlier ones (region over stage).
fn run_with_variables(
    tree: &crate::core::scope::ScopeTree,
    event: &ActionEvent,
    command: &[String],
) -> Result<i32> {
    if command.is_empty() {
        return Err(Error::Other("no command specified".to_string()));
    }

    let mut cmd = std::process::Command::new(&command[0]);
    cmd.args(&command[1..]);

    let resolved = resolver::resolve_deploy(tree, event.stage.as_deref(), event.region.as_deref());
    for entry in resolved {
        match entry.entry {
            crate::core::envelope::VariableEntry::Plain(value) => {
                cmd.env(&entry.name, value);
            }
            // only reachable when --deployed skipped materialization;
            // ciphertext is never injected
            crate::core::envelope::VariableEntry::Encrypted(_) => {
                debug!(key = %entry.name, "skipping still-encrypted variable");
            }
        }
    }

    let status = cmd.status()?;
    Ok(status.code().unwrap_or(1))
}
