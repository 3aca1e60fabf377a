//! Per-scope variable persistence.
//!
//! Each scope node's variables live in their own TOML file under
//! `.stagehand/variables/` (`common.toml`, `<stage>.toml`,
//! `<stage>/<region>.toml`). Saves are per scope: a mutation writes exactly
//! the file for the scope it touched.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::debug;

use crate::core::envelope::{VariableEntry, WireEntry};
use crate::core::project::ProjectConfig;
use crate::core::scope::{ScopeId, ScopeTree};
use crate::error::{Result, StoreError};

/// Directory holding per-scope variable files, relative to the project root.
pub const VARIABLES_DIR: &str = ".stagehand/variables";

/// Persistence boundary for one scope's variable store.
pub trait ScopeStore {
    fn load(&self, scope: &ScopeId) -> Result<BTreeMap<String, VariableEntry>>;
    fn save(&self, scope: &ScopeId, entries: &BTreeMap<String, VariableEntry>) -> Result<()>;
}

/// Filesystem-backed scope store.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store in the current directory (the project root for CLI commands).
    pub fn open() -> Self {
        Self::new(".")
    }

    fn path_for(&self, scope: &ScopeId) -> PathBuf {
        let dir = self.root.join(VARIABLES_DIR);
        match scope {
            ScopeId::Common => dir.join("common.toml"),
            ScopeId::Stage(stage) => dir.join(format!("{}.toml", stage)),
            // region files nest under the stage so hyphenated stage and
            // region names cannot collide
            ScopeId::Region { stage, region } => dir.join(stage).join(format!("{}.toml", region)),
        }
    }
}

impl ScopeStore for FsStore {
    fn load(&self, scope: &ScopeId) -> Result<BTreeMap<String, VariableEntry>> {
        let path = self.path_for(scope);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&path).map_err(|source| StoreError::ReadFile {
            scope: scope.to_string(),
            source,
        })?;
        let wire: BTreeMap<String, WireEntry> =
            toml::from_str(&contents).map_err(|source| StoreError::Parse {
                scope: scope.to_string(),
                source,
            })?;

        let mut entries = BTreeMap::new();
        for (name, raw) in wire {
            let entry = raw.into_entry(&name)?;
            entries.insert(name, entry);
        }
        debug!(scope = %scope, count = entries.len(), "loaded scope variables");
        Ok(entries)
    }

    fn save(&self, scope: &ScopeId, entries: &BTreeMap<String, VariableEntry>) -> Result<()> {
        let path = self.path_for(scope);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::WriteFile {
                scope: scope.to_string(),
                source,
            })?;
        }

        let wire: BTreeMap<&String, WireEntry> = entries
            .iter()
            .map(|(name, entry)| (name, WireEntry::from_entry(entry)))
            .collect();
        let contents = toml::to_string_pretty(&wire).map_err(|source| StoreError::Serialize {
            scope: scope.to_string(),
            source,
        })?;
        std::fs::write(&path, contents).map_err(|source| StoreError::WriteFile {
            scope: scope.to_string(),
            source,
        })?;
        debug!(scope = %scope, count = entries.len(), "saved scope variables");
        Ok(())
    }
}

/// Load the full scope tree for a project: common plus every declared
/// stage and region, in declared order.
pub fn load_tree(project: &ProjectConfig, store: &dyn ScopeStore) -> Result<ScopeTree> {
    let mut tree = ScopeTree::new();
    tree.common_mut().merge(store.load(&ScopeId::Common)?);

    for stage in &project.project.stages {
        let entries = store.load(&ScopeId::Stage(stage.clone()))?;
        tree.ensure_stage(stage).store_mut().merge(entries);
        for region in project.regions_of(stage) {
            let entries = store.load(&ScopeId::Region {
                stage: stage.clone(),
                region: region.clone(),
            })?;
            tree.ensure_region(stage, region).store_mut().merge(entries);
        }
    }
    Ok(tree)
}
