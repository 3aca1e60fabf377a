//! Scope hierarchy: common, per-stage, and per-stage-per-region stores.
//!
//! A project has a single common scope, an ordered list of stages, and an
//! ordered list of regions under each stage. Every scope node carries its
//! own variable store; setting a variable in one scope never touches any
//! other scope.

use std::collections::BTreeMap;
use std::fmt;

use crate::core::envelope::VariableEntry;

/// Reserved-name prefix. Names starting with this are internal and are
/// excluded from listing, resolution, and replacement.
pub const RESERVED_PREFIX: char = '_';

/// Returns true if a variable name is externally visible.
pub fn visible(name: &str) -> bool {
    !name.starts_with(RESERVED_PREFIX)
}

/// Identifies one scope node in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeId {
    Common,
    Stage(String),
    Region { stage: String, region: String },
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeId::Common => write!(f, "common"),
            ScopeId::Stage(name) => write!(f, "{}", name),
            ScopeId::Region { stage, region } => write!(f, "{}/{}", stage, region),
        }
    }
}

/// Stage selector with the `local` pass-through sentinel.
///
/// `local` bypasses structural existence validation by convention; it is a
/// real variant here rather than a string comparison at each call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageSel {
    Named(String),
    Local,
}

impl StageSel {
    pub fn parse(s: &str) -> Self {
        if s == "local" {
            StageSel::Local
        } else {
            StageSel::Named(s.to_string())
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, StageSel::Local)
    }

    pub fn name(&self) -> &str {
        match self {
            StageSel::Named(n) => n,
            StageSel::Local => "local",
        }
    }
}

/// Region selector with the `all` pass-through sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionSel {
    Named(String),
    All,
}

impl RegionSel {
    pub fn parse(s: &str) -> Self {
        if s == "all" {
            RegionSel::All
        } else {
            RegionSel::Named(s.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, RegionSel::All)
    }

    pub fn name(&self) -> &str {
        match self {
            RegionSel::Named(n) => n,
            RegionSel::All => "all",
        }
    }
}

/// Variable store attached to one scope node.
///
/// Keys are variable names; iteration order is name order, which keeps
/// resolution deterministic across runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableStore {
    entries: BTreeMap<String, VariableEntry>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&VariableEntry> {
        self.entries.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: VariableEntry) {
        self.entries.insert(name.into(), entry);
    }

    /// Merge the given name/entry pairs into this store, overwriting
    /// existing names and leaving unrelated names untouched.
    pub fn merge(&mut self, vars: impl IntoIterator<Item = (String, VariableEntry)>) {
        for (name, entry) in vars {
            self.entries.insert(name, entry);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VariableEntry)> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &BTreeMap<String, VariableEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One stage node and its regions.
#[derive(Debug, Clone, Default)]
pub struct StageNode {
    name: String,
    store: VariableStore,
    regions: Vec<RegionNode>,
}

impl StageNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut VariableStore {
        &mut self.store
    }

    pub fn regions(&self) -> &[RegionNode] {
        &self.regions
    }

    pub fn region(&self, name: &str) -> Option<&RegionNode> {
        self.regions.iter().find(|r| r.name == name)
    }
}

/// One region node under a stage.
#[derive(Debug, Clone, Default)]
pub struct RegionNode {
    name: String,
    store: VariableStore,
}

impl RegionNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut VariableStore {
        &mut self.store
    }
}

/// The full scope tree: common store plus stages in project-declared order.
#[derive(Debug, Clone, Default)]
pub struct ScopeTree {
    common: VariableStore,
    stages: Vec<StageNode>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn common(&self) -> &VariableStore {
        &self.common
    }

    pub fn common_mut(&mut self) -> &mut VariableStore {
        &mut self.common
    }

    pub fn stages(&self) -> &[StageNode] {
        &self.stages
    }

    pub fn stage(&self, name: &str) -> Option<&StageNode> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Get the stage node with the given name, creating it (at the end of
    /// the stage order) if absent.
    pub fn ensure_stage(&mut self, name: &str) -> &mut StageNode {
        if let Some(idx) = self.stages.iter().position(|s| s.name == name) {
            return &mut self.stages[idx];
        }
        self.stages.push(StageNode {
            name: name.to_string(),
            ..Default::default()
        });
        self.stages.last_mut().expect("stage just pushed")
    }

    /// Get the region node under `stage`, creating stage and region nodes
    /// as needed.
    pub fn ensure_region(&mut self, stage: &str, region: &str) -> &mut RegionNode {
        let node = self.ensure_stage(stage);
        if let Some(idx) = node.regions.iter().position(|r| r.name == region) {
            return &mut node.regions[idx];
        }
        node.regions.push(RegionNode {
            name: region.to_string(),
            ..Default::default()
        });
        node.regions.last_mut().expect("region just pushed")
    }

    /// The store for a scope, if the node structurally exists.
    pub fn get(&self, scope: &ScopeId) -> Option<&VariableStore> {
        match scope {
            ScopeId::Common => Some(&self.common),
            ScopeId::Stage(name) => self.stage(name).map(StageNode::store),
            ScopeId::Region { stage, region } => self
                .stage(stage)
                .and_then(|s| s.region(region))
                .map(RegionNode::store),
        }
    }

    pub fn get_mut(&mut self, scope: &ScopeId) -> Option<&mut VariableStore> {
        match scope {
            ScopeId::Common => Some(&mut self.common),
            ScopeId::Stage(name) => self
                .stages
                .iter_mut()
                .find(|s| s.name == *name)
                .map(|s| &mut s.store),
            ScopeId::Region { stage, region } => self
                .stages
                .iter_mut()
                .find(|s| s.name == *stage)
                .and_then(|s| s.regions.iter_mut().find(|r| r.name == *region))
                .map(|r| &mut r.store),
        }
    }

    /// Merge name/entry pairs into the given scope's store, creating the
    /// node on demand. Never cascades into any other scope.
    pub fn add_variables(
        &mut self,
        scope: &ScopeId,
        vars: impl IntoIterator<Item = (String, VariableEntry)>,
    ) {
        let store = match scope {
            ScopeId::Common => &mut self.common,
            ScopeId::Stage(name) => self.ensure_stage(name).store_mut(),
            ScopeId::Region { stage, region } => self.ensure_region(stage, region).store_mut(),
        };
        store.merge(vars);
    }

    /// Stage and region scopes in traversal order, honoring the filters.
    ///
    /// `None` or the literal `all` means no filter. A literal region filter
    /// keeps only stages that structurally have that region, and only that
    /// region under them. Common is not part of this listing; selection
    /// logic decides whether the common block applies.
    pub fn list_scopes(&self, stage: Option<&str>, region: Option<&str>) -> Vec<ScopeId> {
        let stage_filter = stage.filter(|s| *s != "all");
        let region_filter = region.filter(|r| *r != "all");

        let mut out = Vec::new();
        for node in &self.stages {
            if let Some(wanted) = stage_filter {
                if node.name != wanted {
                    continue;
                }
            }
            if let Some(wanted) = region_filter {
                if node.region(wanted).is_none() {
                    continue;
                }
            }
            out.push(ScopeId::Stage(node.name.clone()));
            for r in &node.regions {
                if let Some(wanted) = region_filter {
                    if r.name != wanted {
                        continue;
                    }
                }
                out.push(ScopeId::Region {
                    stage: node.name.clone(),
                    region: r.name.clone(),
                });
            }
        }
        out
    }
}
