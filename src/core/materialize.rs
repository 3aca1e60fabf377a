//! Pre-action materialization: batch-decrypt every encrypted entry in the
//! selected stage/region scopes and write the plaintexts back in place.
//!
//! Decode calls are independent and run concurrently, but results are
//! buffered and applied in resolver traversal order, so the outcome is
//! deterministic regardless of completion order. Any decode failure fails
//! the whole hook; no deploy/run proceeds on a partially-decrypted set.

use futures::future::try_join_all;
use tracing::debug;

use crate::core::envelope::{self, VariableEntry};
use crate::core::kms::{block_on, KeyProvider};
use crate::core::resolver;
use crate::core::scope::ScopeTree;
use crate::error::{Error, KeyError, Result};

/// The action this hook runs in front of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Deploy,
    Run,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::Deploy => "deploy",
            Action::Run => "run",
        }
    }
}

/// Event passed to the hook by the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct ActionEvent {
    pub stage: Option<String>,
    pub region: Option<String>,
    /// When true the artifact is assumed already resolved and
    /// materialization is skipped entirely.
    pub run_deployed: bool,
}

/// Hook lifecycle. `Applied` and `Failed` are terminal for an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookState {
    Idle,
    Collecting,
    Decrypting,
    Applied,
    Failed,
}

/// What a finished materialization did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    /// Encrypted entries decrypted and written back.
    pub decrypted: usize,
    /// Plain entries that needed no decode call.
    pub passed_through: usize,
    /// True when `run_deployed` short-circuited the hook.
    pub skipped: bool,
}

/// One materialization pass over a scope tree.
pub struct Materializer<'a> {
    provider: Option<&'a dyn KeyProvider>,
    state: HookState,
}

impl<'a> Materializer<'a> {
    pub fn new(provider: Option<&'a dyn KeyProvider>) -> Self {
        Self {
            provider,
            state: HookState::Idle,
        }
    }

    pub fn state(&self) -> HookState {
        self.state
    }

    /// Decrypt all encrypted entries reachable from the event's selection
    /// and replace them in place with their plaintext values.
    pub fn materialize(
        &mut self,
        tree: &mut ScopeTree,
        event: &ActionEvent,
    ) -> Result<MaterializeReport> {
        if self.state != HookState::Idle {
            return Err(Error::Other(
                "materializer already ran; states are terminal per invocation".to_string(),
            ));
        }

        if event.run_deployed {
            debug!("artifact already resolved, skipping materialization");
            self.state = HookState::Applied;
            return Ok(MaterializeReport {
                skipped: true,
                ..Default::default()
            });
        }

        self.state = HookState::Collecting;
        let resolved = resolver::resolve_deploy(tree, event.stage.as_deref(), event.region.as_deref());
        let (targets, passed): (Vec<_>, Vec<_>) = resolved
            .into_iter()
            .partition(|entry| entry.entry.is_encrypted());
        debug!(
            encrypted = targets.len(),
            plain = passed.len(),
            "collected entries for materialization"
        );

        self.state = HookState::Decrypting;
        if targets.is_empty() {
            self.state = HookState::Applied;
            return Ok(MaterializeReport {
                passed_through: passed.len(),
                ..Default::default()
            });
        }

        let provider = match self.provider {
            Some(p) => p,
            None => {
                self.state = HookState::Failed;
                return Err(KeyError::NotConfigured.into());
            }
        };

        // Concurrent decode, fail-fast; try_join_all yields results in
        // input order regardless of completion order.
        let decoded = block_on(async {
            try_join_all(
                targets
                    .iter()
                    .map(|t| envelope::decode(&t.entry, Some(provider))),
            )
            .await
        });
        let plaintexts = match decoded {
            Ok(Ok(values)) => values,
            Ok(Err(e)) | Err(e) => {
                self.state = HookState::Failed;
                return Err(e);
            }
        };

        // Write-backs in the same relative order the entries resolved.
        for (target, plaintext) in targets.iter().zip(plaintexts) {
            if let Some(store) = tree.get_mut(&target.scope) {
                store.insert(target.name.clone(), VariableEntry::Plain(plaintext));
            }
        }

        debug!(decrypted = targets.len(), "materialization applied");
        self.state = HookState::Applied;
        Ok(MaterializeReport {
            decrypted: targets.len(),
            passed_through: passed.len(),
            skipped: false,
        })
    }
}

/// Pre-action hook entry point, invoked by the deploy/run orchestrator.
///
/// The result is threaded forward to the caller rather than mutated onto a
/// shared event object.
pub fn before_action(
    action: Action,
    event: &ActionEvent,
    tree: &mut ScopeTree,
    provider: Option<&dyn KeyProvider>,
) -> Result<MaterializeReport> {
    debug!(
        action = action.label(),
        stage = event.stage.as_deref().unwrap_or("<all>"),
        region = event.region.as_deref().unwrap_or("<all>"),
        "running pre-action variable materialization"
    );
    Materializer::new(provider).materialize(tree, event)
}
