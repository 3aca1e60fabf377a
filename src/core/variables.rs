//! High-level variable operations: set and list.

use tracing::{debug, info};

use crate::core::envelope::{self, VariableEntry, MASK};
use crate::core::kms::{block_on, KeyProvider};
use crate::core::project::ProjectConfig;
use crate::core::resolver::{self, Selection};
use crate::core::scope::{ScopeId, ScopeTree};
use crate::core::store::ScopeStore;
use crate::core::validation::{self, SetRequest};
use crate::error::Result;

/// What a set operation wrote.
#[derive(Debug)]
pub struct SetOutcome {
    pub scope: ScopeId,
    pub entry: VariableEntry,
}

/// Validate, optionally encrypt, merge into the target scope's store, and
/// persist that one scope.
///
/// Encryption is opt-in per variable: when requested without a configured
/// provider, the value falls back to plain storage (the caller can tell
/// from the outcome's entry variant). Validation and key-service errors
/// abort before anything is persisted.
pub fn set_variable(
    project: &ProjectConfig,
    store: &dyn ScopeStore,
    req: &SetRequest,
    provider: Option<&dyn KeyProvider>,
) -> Result<SetOutcome> {
    let scope = validation::validate_set(project, req)?;

    let entry = if req.encrypt {
        match provider {
            Some(p) => {
                info!(key = %req.key, "calling key service to encrypt variable");
                block_on(envelope::encode(&req.value, p))??
            }
            None => {
                debug!(key = %req.key, "no KMS key configured, storing plain");
                VariableEntry::Plain(req.value.clone())
            }
        }
    } else {
        VariableEntry::Plain(req.value.clone())
    };

    let mut entries = store.load(&scope)?;
    entries.insert(req.key.clone(), entry.clone());
    store.save(&scope, &entries)?;
    debug!(scope = %scope, key = %req.key, "variable set");

    Ok(SetOutcome { scope, entry })
}

/// One scope's display block in a listing.
#[derive(Debug)]
pub struct ListGroup {
    pub scope: ScopeId,
    /// `(name, display value)` pairs in name order.
    pub lines: Vec<(String, String)>,
}

impl ListGroup {
    /// Nesting depth for indentation: common 0, stage 1, region 2.
    pub fn depth(&self) -> usize {
        match self.scope {
            ScopeId::Common => 0,
            ScopeId::Stage(_) => 1,
            ScopeId::Region { .. } => 2,
        }
    }
}

/// Resolve a selection and render each entry for display.
///
/// With `reveal` false, encrypted entries render the fixed mask and no
/// decode call is made; with `reveal` true each encrypted entry is
/// decrypted. A read-only projection: the tree is never mutated.
pub fn list_variables(
    tree: &ScopeTree,
    selection: &Selection,
    reveal: bool,
    provider: Option<&dyn KeyProvider>,
) -> Result<Vec<ListGroup>> {
    let groups = resolver::resolve_grouped(tree, selection);

    block_on(async {
        let mut out = Vec::with_capacity(groups.len());
        for group in groups {
            let mut lines = Vec::with_capacity(group.entries.len());
            for (name, entry) in &group.entries {
                let value = if entry.is_encrypted() && !reveal {
                    MASK.to_string()
                } else {
                    envelope::decode(entry, provider).await?
                };
                lines.push((name.clone(), value));
            }
            out.push(ListGroup {
                scope: group.scope,
                lines,
            });
        }
        Ok(out)
    })?
}
