//! `variables set` command.

use tracing::info;

use crate::cli::{output, prompt, SetArgs};
use crate::core::kms;
use crate::core::project::ProjectConfig;
use crate::core::store::FsStore;
use crate::core::validation::{ScopeKind, SetRequest};
use crate::core::variables;
use crate::error::{Result, ValidationError};

pub fn execute(mut args: SetArgs) -> Result<()> {
    let project = ProjectConfig::load()?;
    prompt::fill_set_args(&mut args, &project)?;

    let kind = match args.scope_type.as_deref() {
        Some(t) => ScopeKind::parse(t)?,
        None => return Err(ValidationError::MissingType.into()),
    };
    let req = SetRequest {
        kind,
        stage: args.stage,
        region: args.region,
        key: args.key.ok_or(ValidationError::MissingKey)?,
        value: args.value.ok_or(ValidationError::MissingValue)?,
        encrypt: args.encrypt,
    };

    let provider = if req.encrypt {
        kms::provider_from_arn(project.key_arn())?
    } else {
        None
    };
    if req.encrypt && provider.is_none() {
        output::warn("no KMS key configured, storing variable plain");
    }

    let store = FsStore::open();
    let outcome = variables::set_variable(&project, &store, &req, provider.as_deref())?;
    info!(scope = %outcome.scope, key = %req.key, "variable saved");

    let how = if outcome.entry.is_encrypted() {
        " (encrypted)"
    } else {
        ""
    };
    output::success(&format!(
        "set {} in {}{}",
        output::key(&req.key),
        outcome.scope,
        how
    ));
    Ok(())
}
