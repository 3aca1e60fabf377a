//! Effective-variable resolution across the scope hierarchy.
//!
//! Traversal order is fixed: common first, then stages in project-declared
//! order, then regions within each stage in declared order. Reserved
//! (`_`-prefixed) names are filtered uniformly at every level. The resolver
//! only reads; it never mutates entries.

use crate::core::envelope::VariableEntry;
use crate::core::scope::{visible, ScopeId, ScopeTree};

/// What a caller wants resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Project-wide variables only.
    Common,
    /// Common plus one stage and its regions; a region name narrows to
    /// that region. The `local` stage and `all` region sentinels are
    /// tolerated pass-throughs, not structural scopes.
    Stage {
        stage: String,
        region: Option<String>,
    },
    /// Common plus every stage and region.
    All,
}

/// One resolved `(scope, name, entry)` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntry {
    pub scope: ScopeId,
    pub name: String,
    pub entry: VariableEntry,
}

/// Ordered resolution result; order is stable across runs for the same
/// tree state.
pub type ResolvedVariableSet = Vec<ResolvedEntry>;

/// Resolved entries grouped per scope, keeping empty scopes so listings
/// can render their headers.
#[derive(Debug, Clone)]
pub struct ScopeGroup {
    pub scope: ScopeId,
    pub entries: Vec<(String, VariableEntry)>,
}

fn group_for(tree: &ScopeTree, scope: ScopeId) -> ScopeGroup {
    let entries = tree
        .get(&scope)
        .map(|store| {
            store
                .iter()
                .filter(|(name, _)| visible(name))
                .map(|(name, entry)| (name.clone(), entry.clone()))
                .collect()
        })
        .unwrap_or_default();
    ScopeGroup { scope, entries }
}

/// Resolve a selection into per-scope groups in traversal order.
///
/// Non-existent stage or region filters yield empty branches, not errors;
/// existence validation is the caller's job before resolving.
pub fn resolve_grouped(tree: &ScopeTree, selection: &Selection) -> Vec<ScopeGroup> {
    let mut groups = vec![group_for(tree, ScopeId::Common)];
    match selection {
        Selection::Common => {}
        Selection::Stage { stage, region } => {
            for scope in tree.list_scopes(Some(stage), region.as_deref()) {
                groups.push(group_for(tree, scope));
            }
        }
        Selection::All => {
            for scope in tree.list_scopes(None, None) {
                groups.push(group_for(tree, scope));
            }
        }
    }
    groups
}

/// Resolve a selection into a flat ordered variable set.
pub fn resolve(tree: &ScopeTree, selection: &Selection) -> ResolvedVariableSet {
    resolve_grouped(tree, selection)
        .into_iter()
        .flat_map(|group| {
            let scope = group.scope;
            group.entries.into_iter().map(move |(name, entry)| ResolvedEntry {
                scope: scope.clone(),
                name,
                entry,
            })
        })
        .collect()
}

/// Resolve the scopes that feed a deploy/run artifact.
///
/// Stage and region stores only; common is intentionally excluded from
/// materialization. No stage means every stage and region.
pub fn resolve_deploy(
    tree: &ScopeTree,
    stage: Option<&str>,
    region: Option<&str>,
) -> ResolvedVariableSet {
    tree.list_scopes(stage, region)
        .into_iter()
        .flat_map(|scope| {
            let group = group_for(tree, scope);
            let scope = group.scope;
            group
                .entries
                .into_iter()
                .map(move |(name, entry)| ResolvedEntry {
                    scope: scope.clone(),
                    name,
                    entry,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(v: &str) -> VariableEntry {
        VariableEntry::Plain(v.to_string())
    }

    fn sample_tree() -> ScopeTree {
        let mut tree = ScopeTree::new();
        tree.common_mut().insert("COMMON", plain("c"));
        tree.common_mut().insert("_META", plain("hidden"));
        tree.ensure_stage("dev").store_mut().insert("DEV", plain("d"));
        tree.ensure_region("dev", "us-east")
            .store_mut()
            .insert("EAST", plain("e"));
        tree.ensure_region("dev", "us-west")
            .store_mut()
            .insert("WEST", plain("w"));
        tree.ensure_stage("prod").store_mut().insert("PROD", plain("p"));
        tree
    }

    fn labels(set: &ResolvedVariableSet) -> Vec<(String, String)> {
        set.iter()
            .map(|e| (e.scope.to_string(), e.name.clone()))
            .collect()
    }

    #[test]
    fn resolve_all_follows_traversal_order() {
        let tree = sample_tree();
        let set = resolve(&tree, &Selection::All);
        assert_eq!(
            labels(&set),
            vec![
                ("common".to_string(), "COMMON".to_string()),
                ("dev".to_string(), "DEV".to_string()),
                ("dev/us-east".to_string(), "EAST".to_string()),
                ("dev/us-west".to_string(), "WEST".to_string()),
                ("prod".to_string(), "PROD".to_string()),
            ]
        );
    }

    #[test]
    fn common_selection_resolves_only_common() {
        let tree = sample_tree();
        let set = resolve(&tree, &Selection::Common);
        assert_eq!(
            labels(&set),
            vec![("common".to_string(), "COMMON".to_string())]
        );

        let groups = resolve_grouped(&tree, &Selection::Common);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].scope, ScopeId::Common);
    }

    #[test]
    fn reserved_names_never_resolve() {
        let tree = sample_tree();
        let set = resolve(&tree, &Selection::All);
        assert!(set.iter().all(|e| !e.name.starts_with('_')));
    }

    #[test]
    fn stage_selection_implies_common_and_regions() {
        let tree = sample_tree();
        let set = resolve(
            &tree,
            &Selection::Stage {
                stage: "dev".into(),
                region: None,
            },
        );
        let scopes: Vec<String> = set.iter().map(|e| e.scope.to_string()).collect();
        assert_eq!(scopes, ["common", "dev", "dev/us-east", "dev/us-west"]);
    }

    #[test]
    fn region_filter_narrows_stage_selection() {
        let tree = sample_tree();
        let set = resolve(
            &tree,
            &Selection::Stage {
                stage: "dev".into(),
                region: Some("us-west".into()),
            },
        );
        let scopes: Vec<String> = set.iter().map(|e| e.scope.to_string()).collect();
        assert_eq!(scopes, ["common", "dev", "dev/us-west"]);
    }

    #[test]
    fn unknown_stage_yields_empty_branch_not_error() {
        let tree = sample_tree();
        let set = resolve(
            &tree,
            &Selection::Stage {
                stage: "staging".into(),
                region: None,
            },
        );
        // common still resolves; the missing stage contributes nothing
        let scopes: Vec<String> = set.iter().map(|e| e.scope.to_string()).collect();
        assert_eq!(scopes, ["common"]);
    }

    #[test]
    fn local_sentinel_is_tolerated() {
        let tree = sample_tree();
        let set = resolve(
            &tree,
            &Selection::Stage {
                stage: "local".into(),
                region: Some("all".into()),
            },
        );
        let scopes: Vec<String> = set.iter().map(|e| e.scope.to_string()).collect();
        assert_eq!(scopes, ["common"]);
    }

    #[test]
    fn resolve_deploy_excludes_common() {
        let tree = sample_tree();
        let set = resolve_deploy(&tree, Some("dev"), None);
        assert!(set.iter().all(|e| e.scope != ScopeId::Common));
        let scopes: Vec<String> = set.iter().map(|e| e.scope.to_string()).collect();
        assert_eq!(scopes, ["dev", "dev/us-east", "dev/us-west"]);
    }

    #[test]
    fn resolve_deploy_without_stage_covers_everything_but_common() {
        let tree = sample_tree();
        let set = resolve_deploy(&tree, None, None);
        let scopes: Vec<String> = set.iter().map(|e| e.scope.to_string()).collect();
        assert_eq!(scopes, ["dev", "dev/us-east", "dev/us-west", "prod"]);
    }

    #[test]
    fn resolve_never_mutates_the_tree() {
        let tree = sample_tree();
        let before = tree.get(&ScopeId::Stage("dev".into())).unwrap().clone();
        let _ = resolve(&tree, &Selection::All);
        assert_eq!(tree.get(&ScopeId::Stage("dev".into())).unwrap(), &before);
    }
}
