use vpm_core::{PackageRecord, PendingChangeSet};

use crate::line_buffer::LineBuffer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedOperation {
    Install(PackageRecord),
    UpgradeAll,
    Remove(String),
    Resolve,
}

// Every shape the workflow can be in. Each variant carries exactly the data
// that exists in that state, so stale fields cannot leak across transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WorkflowState {
    #[default]
    Normal,
    CreatingChanges,
    PromptingChanges {
        changes: PendingChangeSet,
        requested: RequestedOperation,
    },
    ApplyingChanges,
    MigrationConfirm,
    MigrationVersionMismatch {
        recommended: String,
        found: String,
        in_place: bool,
    },
    MigrationCopyingProject,
    MigrationUpdating,
    MigrationFinalizing {
        lines: LineBuffer,
    },
}

impl WorkflowState {
    pub fn is_normal(&self) -> bool {
        matches!(self, WorkflowState::Normal)
    }

    // the surface layer disables new requests while this is true
    pub fn is_busy(&self) -> bool {
        !self.is_normal()
    }
}
