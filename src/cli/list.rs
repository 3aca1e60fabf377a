//! `variables list` command.

use crate::cli::{output, prompt, ListArgs};
use crate::core::kms;
use crate::core::project::ProjectConfig;
use crate::core::resolver::Selection;
use crate::core::store::{self, FsStore};
use crate::core::validation;
use crate::core::variables::{self, ListGroup};
use crate::error::Result;

pub fn execute(mut args: ListArgs) -> Result<()> {
    let project = ProjectConfig::load()?;

    // Interactive stage/region selection is explicitly opt-in.
    if args.interactive && !args.all {
        if args.stage.is_none() {
            args.stage = Some(prompt::choose_stage(&project)?);
        }
        if args.region.is_none() {
            let stage = args.stage.as_deref().unwrap_or_default();
            args.region = Some(prompt::choose_region(&project, stage)?);
        }
    }

    let selection = validation::validate_list(
        &project,
        args.stage.as_deref(),
        args.region.as_deref(),
        args.all,
    )?;

    let provider = if args.decrypt {
        kms::provider_from_arn(project.key_arn())?
    } else {
        None
    };

    let tree = store::load_tree(&project, &FsStore::open())?;
    let groups = variables::list_variables(&tree, &selection, args.decrypt, provider.as_deref())?;

    if groups.len() == 1 && !matches!(selection, Selection::Common) {
        output::dimmed("no matching stages/regions");
        return Ok(());
    }

    if args.json {
        print_json(&groups)?;
    } else {
        print_grouped(&groups);
    }
    Ok(())
}

fn print_grouped(groups: &[ListGroup]) {
    for group in groups {
        let depth = group.depth();
        println!("{}", output::scope_header(depth, &group.scope.to_string()));
        for (name, value) in &group.lines {
            println!("{}", output::variable_line(depth, name, value));
        }
    }
}

fn print_json(groups: &[ListGroup]) -> Result<()> {
    let json: Vec<serde_json::Value> = groups
        .iter()
        .map(|group| {
            let vars: serde_json::Map<String, serde_json::Value> = group
                .lines
                .iter()
                .map(|(name, value)| (name.clone(), serde_json::Value::String(value.clone())))
                .collect();
            serde_json::json!({
                "scope": group.scope.to_string(),
                "variables": vars,
            })
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&json).map_err(|e| crate::error::Error::Other(e.to_string()))?
    );
    Ok(())
}
