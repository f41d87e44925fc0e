use anyhow::Result;
use tokio::sync::mpsc;
use vpm_core::{PackageRecord, PendingChangeSet, ProjectState, RepositoryVisibility};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationPrecheck {
    UnityNotFound,
    VersionMismatch { recommended: String, found: String },
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeStart {
    UnityNotFound,
    Started { stream_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutput {
    Line(String),
    Finished,
}

// The external package-management backend. Everything that touches disk,
// the network, or the Unity installation lives behind this trait; the
// workflow only sequences the calls.
#[allow(async_fn_in_trait)]
pub trait ProjectBackend {
    async fn fetch_repository_visibility(&self) -> Result<RepositoryVisibility>;
    async fn fetch_catalog(&self) -> Result<Vec<PackageRecord>>;
    async fn fetch_project_state(&self, project_path: &str) -> Result<ProjectState>;

    async fn compute_install(
        &self,
        project_path: &str,
        env_version: u32,
        candidate: usize,
    ) -> Result<PendingChangeSet>;
    async fn compute_upgrade_many(
        &self,
        project_path: &str,
        env_version: u32,
        candidates: &[usize],
    ) -> Result<PendingChangeSet>;
    async fn compute_remove(&self, project_path: &str, name: &str) -> Result<PendingChangeSet>;
    async fn compute_resolve_all(&self, project_path: &str) -> Result<PendingChangeSet>;
    // fails when the change-set version is stale
    async fn apply_changes(&self, project_path: &str, changes_version: u32) -> Result<()>;

    async fn set_repository_hidden(&self, repository_id: &str, hidden: bool) -> Result<()>;
    async fn set_local_user_packages_hidden(&self, hidden: bool) -> Result<()>;

    async fn migration_precheck(&self, allow_mismatch: bool) -> Result<MigrationPrecheck>;
    async fn copy_project_for_migration(&self, project_path: &str) -> Result<String>;
    async fn migrate_project(&self, project_path: &str) -> Result<()>;
    async fn finalize_migration(&self, project_path: &str) -> Result<FinalizeStart>;
    fn subscribe_migration_output(&self, stream_id: &str)
        -> mpsc::UnboundedReceiver<MigrationOutput>;
}
