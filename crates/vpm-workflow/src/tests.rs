use std::sync::Mutex;

use anyhow::{anyhow, Result};
use semver::Version;
use tokio::sync::mpsc;
use vpm_catalog::{reconcile, PackageRow};
use vpm_core::{
    BasePackageInfo, PackageRecord, PackageSource, PendingChangeSet, ProjectState,
    RepositoryVisibility,
};

use super::*;

fn base(name: &str, version: &str) -> BasePackageInfo {
    BasePackageInfo {
        name: name.to_string(),
        display_name: None,
        aliases: Vec::new(),
        version: Version::parse(version).expect("version must parse"),
        unity: None,
        changelog_url: None,
        vpm_dependencies: Vec::new(),
        is_yanked: false,
    }
}

fn record(name: &str, version: &str) -> PackageRecord {
    PackageRecord {
        info: base(name, version),
        env_version: 1,
        index: 0,
        source: PackageSource::Remote {
            id: "com.example.repo".to_string(),
            display_name: "Example Repo".to_string(),
        },
    }
}

fn change_set(version: u32) -> PendingChangeSet {
    PendingChangeSet {
        changes_version: version,
        ..PendingChangeSet::default()
    }
}

// rows with installed 1.0.0 and catalog 2.0.0 per entry, one env tag each
fn upgradable_rows(env_versions: &[u32]) -> Vec<PackageRow> {
    let mut packages = Vec::new();
    let mut installed = Vec::new();
    for (index, env_version) in env_versions.iter().enumerate() {
        let name = format!("com.example.pkg{index}");
        let mut pkg = record(&name, "2.0.0");
        pkg.env_version = *env_version;
        pkg.index = index;
        packages.push(pkg);
        installed.push((name.clone(), base(&name, "1.0.0")));
    }
    let project = ProjectState {
        unity: None,
        installed_packages: installed,
    };
    reconcile(&packages, Some(&project), &RepositoryVisibility::default())
}

#[derive(Default)]
struct MockBackend {
    calls: Mutex<Vec<String>>,
    fail_compute: bool,
    fail_apply: bool,
    prechecks: Mutex<Vec<MigrationPrecheck>>,
    finalize: Option<FinalizeStart>,
    output: Vec<MigrationOutput>,
    visibility: RepositoryVisibility,
}

impl MockBackend {
    fn log(&self, call: String) {
        self.calls.lock().expect("lock must not be poisoned").push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock must not be poisoned").clone()
    }
}

impl ProjectBackend for MockBackend {
    async fn fetch_repository_visibility(&self) -> Result<RepositoryVisibility> {
        self.log("fetch_repository_visibility".to_string());
        Ok(self.visibility.clone())
    }

    async fn fetch_catalog(&self) -> Result<Vec<PackageRecord>> {
        self.log("fetch_catalog".to_string());
        Ok(Vec::new())
    }

    async fn fetch_project_state(&self, project_path: &str) -> Result<ProjectState> {
        self.log(format!("fetch_project_state {project_path}"));
        Ok(ProjectState::default())
    }

    async fn compute_install(
        &self,
        _project_path: &str,
        env_version: u32,
        candidate: usize,
    ) -> Result<PendingChangeSet> {
        self.log(format!("compute_install {env_version} {candidate}"));
        if self.fail_compute {
            return Err(anyhow!("backend failed"));
        }
        Ok(change_set(7))
    }

    async fn compute_upgrade_many(
        &self,
        _project_path: &str,
        env_version: u32,
        candidates: &[usize],
    ) -> Result<PendingChangeSet> {
        self.log(format!("compute_upgrade_many {env_version} {candidates:?}"));
        if self.fail_compute {
            return Err(anyhow!("backend failed"));
        }
        Ok(change_set(7))
    }

    async fn compute_remove(&self, _project_path: &str, name: &str) -> Result<PendingChangeSet> {
        self.log(format!("compute_remove {name}"));
        if self.fail_compute {
            return Err(anyhow!("backend failed"));
        }
        Ok(change_set(7))
    }

    async fn compute_resolve_all(&self, _project_path: &str) -> Result<PendingChangeSet> {
        self.log("compute_resolve_all".to_string());
        if self.fail_compute {
            return Err(anyhow!("backend failed"));
        }
        Ok(change_set(7))
    }

    async fn apply_changes(&self, _project_path: &str, changes_version: u32) -> Result<()> {
        self.log(format!("apply_changes {changes_version}"));
        if self.fail_apply {
            return Err(anyhow!("changes are stale"));
        }
        Ok(())
    }

    async fn set_repository_hidden(&self, repository_id: &str, hidden: bool) -> Result<()> {
        self.log(format!("set_repository_hidden {repository_id} {hidden}"));
        Ok(())
    }

    async fn set_local_user_packages_hidden(&self, hidden: bool) -> Result<()> {
        self.log(format!("set_local_user_packages_hidden {hidden}"));
        Ok(())
    }

    async fn migration_precheck(&self, allow_mismatch: bool) -> Result<MigrationPrecheck> {
        self.log(format!("migration_precheck {allow_mismatch}"));
        let mut prechecks = self.prechecks.lock().expect("lock must not be poisoned");
        if prechecks.is_empty() {
            Ok(MigrationPrecheck::Ready)
        } else {
            Ok(prechecks.remove(0))
        }
    }

    async fn copy_project_for_migration(&self, project_path: &str) -> Result<String> {
        self.log(format!("copy_project {project_path}"));
        Ok("/projects/app-2022".to_string())
    }

    async fn migrate_project(&self, project_path: &str) -> Result<()> {
        self.log(format!("migrate_project {project_path}"));
        Ok(())
    }

    async fn finalize_migration(&self, project_path: &str) -> Result<FinalizeStart> {
        self.log(format!("finalize_migration {project_path}"));
        Ok(self.finalize.clone().unwrap_or(FinalizeStart::Started {
            stream_id: "stream-1".to_string(),
        }))
    }

    fn subscribe_migration_output(
        &self,
        stream_id: &str,
    ) -> mpsc::UnboundedReceiver<MigrationOutput> {
        self.log(format!("subscribe {stream_id}"));
        let (sender, receiver) = mpsc::unbounded_channel();
        for message in &self.output {
            sender.send(message.clone()).expect("receiver is alive");
        }
        receiver
    }
}

fn workflow(backend: MockBackend) -> ChangeWorkflow<MockBackend> {
    ChangeWorkflow::new(backend, "/projects/app")
}

#[tokio::test]
async fn install_prompts_then_applies_once() {
    let mut wf = workflow(MockBackend::default());

    let mut pkg = record("com.example.tool", "1.2.0");
    pkg.env_version = 3;
    pkg.index = 9;
    wf.request_install(pkg).await.expect("request must succeed");

    assert!(matches!(wf.state(), WorkflowState::PromptingChanges { .. }));
    assert_eq!(
        wf.pending_changes().expect("changes must be pending").changes_version,
        7
    );

    let requested = wf.apply_changes().await.expect("apply must succeed");
    assert!(matches!(requested, RequestedOperation::Install(_)));
    assert!(wf.state().is_normal());
    assert_eq!(
        wf.backend().calls(),
        ["compute_install 3 9", "apply_changes 7"]
    );
}

#[tokio::test]
async fn new_requests_are_rejected_while_busy() {
    let mut wf = workflow(MockBackend::default());
    wf.request_migration().expect("request must succeed");

    let err = wf
        .request_install(record("com.example.tool", "1.0.0"))
        .await
        .expect_err("busy workflow must reject requests");
    assert!(err.to_string().contains("already in progress"));
    assert!(matches!(wf.state(), WorkflowState::MigrationConfirm));
}

#[tokio::test]
async fn cancel_from_prompting_returns_to_normal_without_applying() {
    let mut wf = workflow(MockBackend::default());
    wf.request_install(record("com.example.tool", "1.0.0"))
        .await
        .expect("request must succeed");

    wf.cancel();

    assert!(wf.state().is_normal());
    assert!(wf.pending_changes().is_none());
    assert!(!wf
        .backend()
        .calls()
        .iter()
        .any(|call| call.starts_with("apply_changes")));
}

#[tokio::test]
async fn apply_without_pending_changes_fails() {
    let mut wf = workflow(MockBackend::default());
    let err = wf.apply_changes().await.expect_err("nothing to apply");
    assert!(err.to_string().contains("no pending changes"));
    assert!(wf.state().is_normal());
}

#[tokio::test]
async fn compute_failure_recovers_to_normal() {
    let mut wf = workflow(MockBackend {
        fail_compute: true,
        ..MockBackend::default()
    });

    wf.request_install(record("com.example.tool", "1.0.0"))
        .await
        .expect_err("backend failure must surface");
    assert!(wf.state().is_normal());
}

#[tokio::test]
async fn stale_apply_fails_without_retry() {
    let mut wf = workflow(MockBackend {
        fail_apply: true,
        ..MockBackend::default()
    });
    wf.request_install(record("com.example.tool", "1.0.0"))
        .await
        .expect("request must succeed");

    wf.apply_changes().await.expect_err("stale apply must fail");

    assert!(wf.state().is_normal());
    assert!(wf.pending_changes().is_none());
    let applies = wf
        .backend()
        .calls()
        .iter()
        .filter(|call| call.starts_with("apply_changes"))
        .count();
    assert_eq!(applies, 1);
}

#[tokio::test]
async fn upgrade_all_rejects_mixed_environment_versions_before_any_backend_call() {
    let rows = upgradable_rows(&[1, 2]);
    let mut wf = workflow(MockBackend::default());

    let err = wf
        .request_upgrade_all(&rows)
        .await
        .expect_err("mixed env versions must be rejected");
    assert!(err.to_string().contains("inconsistent environment"));
    assert!(wf.state().is_normal());
    assert!(wf.backend().calls().is_empty());
}

#[tokio::test]
async fn upgrade_all_with_nothing_upgradable_skips_the_backend() {
    // catalog only, nothing installed, so nothing is upgradable
    let packages = vec![record("com.example.tool", "1.0.0")];
    let rows = reconcile(&packages, None, &RepositoryVisibility::default());
    let mut wf = workflow(MockBackend::default());

    let outcome = wf
        .request_upgrade_all(&rows)
        .await
        .expect("request must succeed");

    assert_eq!(outcome, UpgradeAllOutcome::NothingToUpgrade);
    assert!(wf.state().is_normal());
    assert!(wf.backend().calls().is_empty());
}

#[tokio::test]
async fn upgrade_all_batches_every_upgradable_candidate() {
    let rows = upgradable_rows(&[5, 5]);
    let mut wf = workflow(MockBackend::default());

    let outcome = wf
        .request_upgrade_all(&rows)
        .await
        .expect("request must succeed");

    assert_eq!(outcome, UpgradeAllOutcome::Prompting);
    assert_eq!(wf.backend().calls(), ["compute_upgrade_many 5 [0, 1]"]);
}

#[tokio::test]
async fn remove_and_resolve_carry_their_own_requested_operation() {
    let mut wf = workflow(MockBackend::default());

    wf.request_remove("com.example.tool")
        .await
        .expect("request must succeed");
    let requested = wf.apply_changes().await.expect("apply must succeed");
    assert_eq!(requested, RequestedOperation::Remove("com.example.tool".to_string()));

    wf.request_resolve().await.expect("request must succeed");
    let requested = wf.apply_changes().await.expect("apply must succeed");
    assert_eq!(requested, RequestedOperation::Resolve);
}

#[tokio::test]
async fn migration_mismatch_then_cancel_issues_no_further_calls() {
    let mut wf = workflow(MockBackend {
        prechecks: Mutex::new(vec![MigrationPrecheck::VersionMismatch {
            recommended: "2022.3.6f1".to_string(),
            found: "2022.3.22f1".to_string(),
        }]),
        ..MockBackend::default()
    });

    wf.request_migration().expect("request must succeed");
    let outcome = wf.migrate(false, true).await.expect("precheck must succeed");

    assert_eq!(outcome, MigrationOutcome::NeedsMismatchConfirmation);
    assert!(matches!(
        wf.state(),
        WorkflowState::MigrationVersionMismatch { in_place: true, .. }
    ));

    wf.cancel();

    assert!(wf.state().is_normal());
    assert_eq!(wf.backend().calls(), ["migration_precheck false"]);
}

#[tokio::test]
async fn confirming_a_mismatch_reruns_the_precheck_with_mismatch_allowed() {
    let mut wf = workflow(MockBackend {
        prechecks: Mutex::new(vec![
            MigrationPrecheck::VersionMismatch {
                recommended: "2022.3.6f1".to_string(),
                found: "2022.3.22f1".to_string(),
            },
            MigrationPrecheck::Ready,
        ]),
        ..MockBackend::default()
    });

    wf.request_migration().expect("request must succeed");
    let outcome = wf.migrate(false, false).await.expect("precheck must succeed");
    assert_eq!(outcome, MigrationOutcome::NeedsMismatchConfirmation);

    let outcome = wf
        .confirm_version_mismatch()
        .await
        .expect("migration must complete");

    assert_eq!(outcome, MigrationOutcome::Relocated("/projects/app-2022".to_string()));
    assert!(wf.state().is_normal());
    assert_eq!(
        wf.backend().calls(),
        [
            "migration_precheck false",
            "migration_precheck true",
            "copy_project /projects/app",
            "migrate_project /projects/app-2022",
            "finalize_migration /projects/app-2022",
            "subscribe stream-1",
        ]
    );
}

#[tokio::test]
async fn in_place_migration_skips_the_copy() {
    let mut wf = workflow(MockBackend {
        output: vec![
            MigrationOutput::Line("rewriting manifest".to_string()),
            MigrationOutput::Finished,
        ],
        ..MockBackend::default()
    });

    wf.request_migration().expect("request must succeed");
    let outcome = wf.migrate(false, true).await.expect("migration must complete");

    assert_eq!(outcome, MigrationOutcome::Completed);
    assert!(wf.state().is_normal());
    let calls = wf.backend().calls();
    assert!(calls.contains(&"migrate_project /projects/app".to_string()));
    assert!(!calls.iter().any(|call| call.starts_with("copy_project")));
}

#[tokio::test]
async fn precheck_unity_not_found_recovers_to_normal() {
    let mut wf = workflow(MockBackend {
        prechecks: Mutex::new(vec![MigrationPrecheck::UnityNotFound]),
        ..MockBackend::default()
    });

    wf.request_migration().expect("request must succeed");
    let err = wf
        .migrate(false, true)
        .await
        .expect_err("missing unity must fail");

    assert!(err.to_string().contains("no compatible unity"));
    assert!(wf.state().is_normal());
}

#[tokio::test]
async fn finalize_unity_not_found_recovers_to_normal() {
    let mut wf = workflow(MockBackend {
        finalize: Some(FinalizeStart::UnityNotFound),
        ..MockBackend::default()
    });

    wf.request_migration().expect("request must succeed");
    let err = wf
        .migrate(false, true)
        .await
        .expect_err("missing unity must fail");

    assert!(err.to_string().contains("finalize"));
    assert!(wf.state().is_normal());
}

#[tokio::test]
async fn migration_without_confirmation_is_rejected() {
    let mut wf = workflow(MockBackend::default());
    let err = wf
        .migrate(false, true)
        .await
        .expect_err("unconfirmed migration must fail");
    assert!(err.to_string().contains("not been confirmed"));
    assert!(wf.backend().calls().is_empty());
}

#[tokio::test]
async fn lines_outside_the_finalizing_state_are_dropped() {
    let mut wf = workflow(MockBackend::default());
    wf.push_migration_line("late line".to_string());
    assert!(wf.migration_output().is_none());
    assert!(wf.state().is_normal());
}

#[test]
fn line_buffer_caps_at_capacity_with_fifo_eviction() {
    let mut buffer = LineBuffer::new();
    for index in 0..250 {
        buffer.push(format!("line {index}"));
    }

    assert_eq!(buffer.len(), LINE_BUFFER_CAPACITY);
    let numbers: Vec<u64> = buffer.iter().map(|(number, _)| number).collect();
    // the oldest 50 lines are gone, numbers keep growing monotonically
    assert_eq!(numbers.first(), Some(&51));
    assert_eq!(numbers.last(), Some(&250));
    assert!(numbers.windows(2).all(|pair| pair[0] < pair[1]));
}

#[tokio::test]
async fn visibility_mutators_refetch_the_settings() {
    let backend = MockBackend {
        visibility: RepositoryVisibility {
            hidden_repositories: vec!["com.example.repo".to_string()],
            ..RepositoryVisibility::default()
        },
        ..MockBackend::default()
    };

    let visibility = set_repository_hidden(&backend, "com.example.repo", true)
        .await
        .expect("mutation must succeed");
    assert_eq!(visibility.hidden_repositories, ["com.example.repo"]);
    assert_eq!(
        backend.calls(),
        [
            "set_repository_hidden com.example.repo true",
            "fetch_repository_visibility",
        ]
    );

    let visibility = set_local_user_packages_hidden(&backend, true)
        .await
        .expect("mutation must succeed");
    assert!(!visibility.hide_local_user_packages);
}
