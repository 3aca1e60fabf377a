//! Library-level workflow tests: set → resolve → list → materialize.
//!
//! Uses a local mock key provider implementing the public `KeyProvider`
//! trait, so these run in every build configuration.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use stagehand::core::envelope::{self, VariableEntry, MASK};
use stagehand::core::kms::{block_on, KeyProvider};
use stagehand::core::materialize::{before_action, Action, ActionEvent, HookState, Materializer};
use stagehand::core::project::ProjectConfig;
use stagehand::core::resolver::{self, Selection};
use stagehand::core::scope::{ScopeId, ScopeTree};
use stagehand::core::store::{load_tree, FsStore};
use stagehand::core::validation::{ScopeKind, SetRequest};
use stagehand::core::variables::{list_variables, set_variable};
use stagehand::error::{Error, KeyError, Result};

/// Mock provider: ciphertext is the reversed plaintext behind a marker.
/// Optionally refuses one plaintext to exercise fail-fast paths.
struct MockKms {
    refuse: Option<String>,
    decrypts: Arc<Mutex<usize>>,
}

impl MockKms {
    fn new() -> Self {
        Self {
            refuse: None,
            decrypts: Arc::new(Mutex::new(0)),
        }
    }

    fn refusing(plaintext: &str) -> Self {
        Self {
            refuse: Some(plaintext.to_string()),
            ..Self::new()
        }
    }
}

#[async_trait]
impl KeyProvider for MockKms {
    async fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut out = b"mock:".to_vec();
        out.extend(plaintext.iter().rev());
        Ok(out)
    }

    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        *self.decrypts.lock().unwrap() += 1;
        let body = ciphertext
            .strip_prefix(b"mock:")
            .ok_or_else(|| KeyError::Service("foreign ciphertext".to_string()))?;
        let plaintext: Vec<u8> = body.iter().rev().copied().collect();
        if self.refuse.as_deref().map(str::as_bytes) == Some(plaintext.as_slice()) {
            return Err(KeyError::Service("access denied".to_string()).into());
        }
        Ok(plaintext)
    }

    fn name(&self) -> &'static str {
        "mock-kms"
    }
}

fn project() -> ProjectConfig {
    let mut config = ProjectConfig::new("demo");
    config.project.stages = vec!["dev".into(), "prod".into()];
    config
        .project
        .regions
        .insert("dev".into(), vec!["us-east".into(), "us-west".into()]);
    config
        .project
        .regions
        .insert("prod".into(), vec!["us-east".into()]);
    config
}

fn encrypted(provider: &MockKms, plaintext: &str) -> VariableEntry {
    block_on(envelope::encode(plaintext, provider))
        .unwrap()
        .unwrap()
}

#[test]
fn set_encrypted_then_reveal_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path());
    let kms = MockKms::new();
    let project = project();

    let req = SetRequest {
        kind: ScopeKind::Region,
        stage: Some("prod".into()),
        region: Some("us-east".into()),
        key: "DB_PASS".into(),
        value: "s3cr3t".into(),
        encrypt: true,
    };
    let outcome = set_variable(&project, &store, &req, Some(&kms)).unwrap();
    assert!(outcome.entry.is_encrypted());

    let tree = load_tree(&project, &store).unwrap();
    let groups = list_variables(
        &tree,
        &Selection::Stage {
            stage: "prod".into(),
            region: None,
        },
        true,
        Some(&kms),
    )
    .unwrap();
    let lines: Vec<_> = groups.iter().flat_map(|g| g.lines.clone()).collect();
    assert_eq!(lines, [("DB_PASS".to_string(), "s3cr3t".to_string())]);
}

#[test]
fn masked_listing_contains_neither_plaintext_nor_ciphertext() {
    let kms = MockKms::new();
    let entry = encrypted(&kms, "hunter2");
    let ciphertext = match &entry {
        VariableEntry::Encrypted(ct) => ct.clone(),
        _ => unreachable!(),
    };

    let mut tree = ScopeTree::new();
    tree.ensure_stage("prod").store_mut().insert("TOKEN", entry);

    let groups = list_variables(&tree, &Selection::All, false, None).unwrap();
    let values: Vec<String> = groups
        .iter()
        .flat_map(|g| g.lines.iter().map(|(_, v)| v.clone()))
        .collect();
    assert_eq!(values, [MASK.to_string()]);
    assert!(!values.contains(&"hunter2".to_string()));
    assert!(!values.contains(&ciphertext));
    // no decode call was issued for a masked listing
    assert_eq!(*kms.decrypts.lock().unwrap(), 0);
}

#[test]
fn traversal_order_matches_declared_stage_order() {
    let kms = MockKms::new();
    let mut tree = ScopeTree::new();
    tree.common_mut().insert("C", VariableEntry::Plain("c".into()));
    tree.ensure_stage("dev")
        .store_mut()
        .insert("D", encrypted(&kms, "d"));
    tree.ensure_region("dev", "us-east")
        .store_mut()
        .insert("E", VariableEntry::Plain("e".into()));
    tree.ensure_region("dev", "us-west")
        .store_mut()
        .insert("W", VariableEntry::Plain("w".into()));
    tree.ensure_stage("prod")
        .store_mut()
        .insert("P", VariableEntry::Plain("p".into()));

    let scopes: Vec<String> = resolver::resolve(&tree, &Selection::All)
        .iter()
        .map(|e| e.scope.to_string())
        .collect();
    assert_eq!(scopes, ["common", "dev", "dev/us-east", "dev/us-west", "prod"]);
}

#[test]
fn materialize_before_deploy_replaces_in_place() {
    let kms = MockKms::new();
    let mut tree = ScopeTree::new();
    tree.ensure_stage("prod")
        .store_mut()
        .insert("DB_PASS", encrypted(&kms, "s3cr3t"));
    tree.ensure_region("prod", "us-east")
        .store_mut()
        .insert("TOKEN", encrypted(&kms, "tok"));
    tree.common_mut()
        .insert("SHARED", encrypted(&kms, "shared"));

    let event = ActionEvent {
        stage: Some("prod".into()),
        region: None,
        run_deployed: false,
    };
    let report = before_action(Action::Deploy, &event, &mut tree, Some(&kms)).unwrap();
    assert_eq!(report.decrypted, 2);

    assert_eq!(
        tree.get(&ScopeId::Stage("prod".into())).unwrap().get("DB_PASS"),
        Some(&VariableEntry::Plain("s3cr3t".into()))
    );
    // common stays encrypted: only stage/region scopes feed the artifact
    assert!(tree.common().get("SHARED").unwrap().is_encrypted());
}

#[test]
fn materialize_fail_fast_reports_failed_state() {
    let kms = MockKms::refusing("bad");
    let mut tree = ScopeTree::new();
    let store = tree.ensure_stage("prod").store_mut();
    store.insert("A", encrypted(&kms, "ok-a"));
    store.insert("B", encrypted(&kms, "bad"));
    store.insert("C", encrypted(&kms, "ok-c"));

    let mut m = Materializer::new(Some(&kms));
    let err = m
        .materialize(
            &mut tree,
            &ActionEvent {
                stage: Some("prod".into()),
                region: None,
                run_deployed: false,
            },
        )
        .unwrap_err();

    assert!(matches!(err, Error::Key(KeyError::Service(_))));
    assert_eq!(m.state(), HookState::Failed);
    // the refused entry is never silently replaced
    assert!(tree
        .get(&ScopeId::Stage("prod".into()))
        .unwrap()
        .get("B")
        .unwrap()
        .is_encrypted());
}

#[test]
fn run_deployed_event_issues_no_decrypt_calls() {
    let kms = MockKms::new();
    let mut tree = ScopeTree::new();
    tree.ensure_stage("prod")
        .store_mut()
        .insert("SECRET", encrypted(&kms, "x"));

    let report = before_action(
        Action::Run,
        &ActionEvent {
            stage: Some("prod".into()),
            region: None,
            run_deployed: true,
        },
        &mut tree,
        Some(&kms),
    )
    .unwrap();

    assert!(report.skipped);
    assert_eq!(*kms.decrypts.lock().unwrap(), 0);
}

#[test]
fn merge_isolation_across_scopes() {
    let mut tree = ScopeTree::new();
    tree.ensure_region("dev", "us-east");
    tree.add_variables(
        &ScopeId::Stage("dev".into()),
        [("X".to_string(), VariableEntry::Plain("1".into()))],
    );

    assert!(tree.get(&ScopeId::Common).unwrap().is_empty());
    assert!(tree
        .get(&ScopeId::Region {
            stage: "dev".into(),
            region: "us-east".into()
        })
        .unwrap()
        .is_empty());
}

mod roundtrip {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn decode_of_encode_is_identity(plaintext in "\\PC{1,64}") {
            let kms = MockKms::new();
            let entry = block_on(envelope::encode(&plaintext, &kms)).unwrap().unwrap();
            let decoded = block_on(envelope::decode(&entry, Some(&kms))).unwrap().unwrap();
            prop_assert_eq!(decoded, plaintext);
        }
    }
}
