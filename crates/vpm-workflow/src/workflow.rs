use anyhow::{anyhow, bail, Result};
use vpm_catalog::{PackageLatest, PackageRow};
use vpm_core::{PackageRecord, PendingChangeSet};

use crate::backend::ProjectBackend;
use crate::state::{RequestedOperation, WorkflowState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeAllOutcome {
    NothingToUpgrade,
    Prompting,
}

// Sequences "compute pending changes -> confirm -> apply" against the
// backend. At most one operation is in flight; every failure path lands the
// state back in Normal before the error reaches the caller.
pub struct ChangeWorkflow<B> {
    pub(crate) backend: B,
    pub(crate) project_path: String,
    pub(crate) state: WorkflowState,
}

impl<B: ProjectBackend> ChangeWorkflow<B> {
    pub fn new(backend: B, project_path: impl Into<String>) -> Self {
        Self {
            backend,
            project_path: project_path.into(),
            state: WorkflowState::Normal,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn project_path(&self) -> &str {
        &self.project_path
    }

    pub fn pending_changes(&self) -> Option<&PendingChangeSet> {
        match &self.state {
            WorkflowState::PromptingChanges { changes, .. } => Some(changes),
            _ => None,
        }
    }

    pub(crate) fn ensure_normal(&self) -> Result<()> {
        if self.state.is_busy() {
            bail!("another operation is already in progress");
        }
        Ok(())
    }

    pub(crate) fn fail_to_normal<T>(&mut self, err: anyhow::Error) -> Result<T> {
        self.state = WorkflowState::Normal;
        Err(err)
    }

    pub async fn request_install(&mut self, pkg: PackageRecord) -> Result<()> {
        self.ensure_normal()?;
        self.state = WorkflowState::CreatingChanges;
        let changes = match self
            .backend
            .compute_install(&self.project_path, pkg.env_version, pkg.index)
            .await
        {
            Ok(changes) => changes,
            Err(err) => return self.fail_to_normal(err),
        };
        self.state = WorkflowState::PromptingChanges {
            changes,
            requested: RequestedOperation::Install(pkg),
        };
        Ok(())
    }

    pub async fn request_upgrade_all(&mut self, rows: &[PackageRow]) -> Result<UpgradeAllOutcome> {
        self.ensure_normal()?;
        self.state = WorkflowState::CreatingChanges;

        let mut candidates: Vec<usize> = Vec::new();
        let mut env_version: Option<u32> = None;
        for row in rows {
            if let PackageLatest::Upgradable(pkg) = &row.latest {
                match env_version {
                    None => env_version = Some(pkg.env_version),
                    Some(expected) if expected != pkg.env_version => {
                        return self.fail_to_normal(anyhow!(
                            "upgradable packages span inconsistent environment versions"
                        ));
                    }
                    Some(_) => {}
                }
                candidates.push(pkg.index);
            }
        }
        let Some(env_version) = env_version else {
            self.state = WorkflowState::Normal;
            return Ok(UpgradeAllOutcome::NothingToUpgrade);
        };

        let changes = match self
            .backend
            .compute_upgrade_many(&self.project_path, env_version, &candidates)
            .await
        {
            Ok(changes) => changes,
            Err(err) => return self.fail_to_normal(err),
        };
        self.state = WorkflowState::PromptingChanges {
            changes,
            requested: RequestedOperation::UpgradeAll,
        };
        Ok(UpgradeAllOutcome::Prompting)
    }

    pub async fn request_remove(&mut self, name: &str) -> Result<()> {
        self.ensure_normal()?;
        self.state = WorkflowState::CreatingChanges;
        let changes = match self.backend.compute_remove(&self.project_path, name).await {
            Ok(changes) => changes,
            Err(err) => return self.fail_to_normal(err),
        };
        self.state = WorkflowState::PromptingChanges {
            changes,
            requested: RequestedOperation::Remove(name.to_string()),
        };
        Ok(())
    }

    pub async fn request_resolve(&mut self) -> Result<()> {
        self.ensure_normal()?;
        self.state = WorkflowState::CreatingChanges;
        let changes = match self.backend.compute_resolve_all(&self.project_path).await {
            Ok(changes) => changes,
            Err(err) => return self.fail_to_normal(err),
        };
        self.state = WorkflowState::PromptingChanges {
            changes,
            requested: RequestedOperation::Resolve,
        };
        Ok(())
    }

    // Consumes the pending change set: its version token is used exactly
    // once, even when the backend rejects it as stale.
    pub async fn apply_changes(&mut self) -> Result<RequestedOperation> {
        let (changes, requested) =
            match std::mem::replace(&mut self.state, WorkflowState::ApplyingChanges) {
                WorkflowState::PromptingChanges { changes, requested } => (changes, requested),
                other => {
                    self.state = other;
                    bail!("no pending changes to apply");
                }
            };

        if let Err(err) = self
            .backend
            .apply_changes(&self.project_path, changes.changes_version)
            .await
        {
            return self.fail_to_normal(err);
        }
        self.state = WorkflowState::Normal;
        Ok(requested)
    }

    pub fn cancel(&mut self) {
        match self.state {
            WorkflowState::PromptingChanges { .. }
            | WorkflowState::MigrationConfirm
            | WorkflowState::MigrationVersionMismatch { .. } => {
                self.state = WorkflowState::Normal;
            }
            _ => {}
        }
    }
}
