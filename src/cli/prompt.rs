//! Interactive option collection.
//!
//! Fills in missing `variables set` options (and, when explicitly
//! requested, the `list` stage/region) via terminal prompts. Piped stdin
//! skips all prompting; validation then reports what's missing.

use std::io::{self, IsTerminal};

use dialoguer::{Input, Select};

use crate::cli::SetArgs;
use crate::core::project::ProjectConfig;
use crate::error::{Error, Result};

const SCOPE_TYPES: [&str; 3] = ["common", "stage", "region"];

fn prompt_err(e: dialoguer::Error) -> Error {
    Error::Other(format!("prompt failed: {}", e))
}

/// Collect any missing set options interactively.
///
/// No-op when stdin is not a terminal.
pub fn fill_set_args(args: &mut SetArgs, project: &ProjectConfig) -> Result<()> {
    if !io::stdin().is_terminal() {
        return Ok(());
    }

    if args.key.is_none() {
        let key: String = Input::new()
            .with_prompt("Variable key")
            .interact_text()
            .map_err(prompt_err)?;
        args.key = Some(key);
    }

    if args.value.is_none() {
        let value: String = Input::new()
            .with_prompt("Variable value")
            .interact_text()
            .map_err(prompt_err)?;
        args.value = Some(value);
    }

    if !matches!(args.scope_type.as_deref(), Some("common" | "stage" | "region")) {
        let idx = Select::new()
            .with_prompt("Select variable type")
            .items(&SCOPE_TYPES)
            .default(0)
            .interact()
            .map_err(prompt_err)?;
        args.scope_type = Some(SCOPE_TYPES[idx].to_string());
    }

    let scope_type = args.scope_type.as_deref().unwrap_or("common");
    if scope_type != "common" && args.stage.is_none() {
        args.stage = Some(choose_stage(project)?);
    }
    if scope_type == "region" && args.region.is_none() {
        let stage = args.stage.as_deref().unwrap_or_default();
        args.region = Some(choose_region(project, stage)?);
    }

    Ok(())
}

/// Pick a stage from the project's declared stages.
pub fn choose_stage(project: &ProjectConfig) -> Result<String> {
    let stages = &project.project.stages;
    if stages.is_empty() {
        let stage: String = Input::new()
            .with_prompt("Stage")
            .interact_text()
            .map_err(prompt_err)?;
        return Ok(stage);
    }
    let idx = Select::new()
        .with_prompt("Select a stage")
        .items(stages)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    Ok(stages[idx].clone())
}

/// Pick a region from the stage's declared regions, `all` included.
pub fn choose_region(project: &ProjectConfig, stage: &str) -> Result<String> {
    let mut items: Vec<String> = project.regions_of(stage).to_vec();
    items.push("all".to_string());
    let idx = Select::new()
        .with_prompt("Select a region")
        .items(&items)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    Ok(items[idx].clone())
}
