use anyhow::{anyhow, bail, Result};

use crate::backend::{FinalizeStart, MigrationOutput, MigrationPrecheck, ProjectBackend};
use crate::line_buffer::LineBuffer;
use crate::state::WorkflowState;
use crate::workflow::ChangeWorkflow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    // precheck found a Unity, but not the recommended release; the user must
    // confirm before the migration continues
    NeedsMismatchConfirmation,
    // migrated in place; the caller should refresh project details
    Completed,
    // migrated a copy; the caller should navigate to the new path
    Relocated(String),
}

impl<B: ProjectBackend> ChangeWorkflow<B> {
    pub fn request_migration(&mut self) -> Result<()> {
        self.ensure_normal()?;
        self.state = WorkflowState::MigrationConfirm;
        Ok(())
    }

    pub async fn migrate(&mut self, allow_mismatch: bool, in_place: bool) -> Result<MigrationOutcome> {
        match self.state {
            WorkflowState::MigrationConfirm | WorkflowState::MigrationVersionMismatch { .. } => {}
            _ => bail!("migration has not been confirmed"),
        }

        let precheck = match self.backend.migration_precheck(allow_mismatch).await {
            Ok(precheck) => precheck,
            Err(err) => return self.fail_to_normal(err),
        };
        match precheck {
            MigrationPrecheck::UnityNotFound => {
                return self.fail_to_normal(anyhow!(
                    "failed to migrate the project: no compatible unity found"
                ));
            }
            MigrationPrecheck::VersionMismatch { recommended, found } => {
                self.state = WorkflowState::MigrationVersionMismatch {
                    recommended,
                    found,
                    in_place,
                };
                return Ok(MigrationOutcome::NeedsMismatchConfirmation);
            }
            MigrationPrecheck::Ready => {}
        }

        // past this point there is no cancelling; the flow runs to
        // completion or failure
        let migrate_path = if in_place {
            self.project_path.clone()
        } else {
            self.state = WorkflowState::MigrationCopyingProject;
            match self.backend.copy_project_for_migration(&self.project_path).await {
                Ok(path) => path,
                Err(err) => return self.fail_to_normal(err),
            }
        };

        self.state = WorkflowState::MigrationUpdating;
        if let Err(err) = self.backend.migrate_project(&migrate_path).await {
            return self.fail_to_normal(err);
        }

        self.state = WorkflowState::MigrationFinalizing {
            lines: LineBuffer::new(),
        };
        let stream_id = match self.backend.finalize_migration(&migrate_path).await {
            Ok(FinalizeStart::Started { stream_id }) => stream_id,
            Ok(FinalizeStart::UnityNotFound) => {
                return self.fail_to_normal(anyhow!(
                    "failed to finalize the migration: no compatible unity found"
                ));
            }
            Err(err) => return self.fail_to_normal(err),
        };

        // No timeout here: the external process exit is the only completion
        // signal for the finalize step.
        let mut output = self.backend.subscribe_migration_output(&stream_id);
        while let Some(message) = output.recv().await {
            match message {
                MigrationOutput::Line(line) => self.push_migration_line(line),
                MigrationOutput::Finished => break,
            }
        }

        self.state = WorkflowState::Normal;
        if in_place {
            Ok(MigrationOutcome::Completed)
        } else {
            Ok(MigrationOutcome::Relocated(migrate_path))
        }
    }

    pub async fn confirm_version_mismatch(&mut self) -> Result<MigrationOutcome> {
        let in_place = match &self.state {
            WorkflowState::MigrationVersionMismatch { in_place, .. } => *in_place,
            _ => bail!("no version mismatch is awaiting confirmation"),
        };
        self.migrate(true, in_place).await
    }

    // Lines arriving after the finalize state is gone are dropped.
    pub fn push_migration_line(&mut self, line: String) {
        if let WorkflowState::MigrationFinalizing { lines } = &mut self.state {
            lines.push(line);
        }
    }

    pub fn migration_output(&self) -> Option<&LineBuffer> {
        match &self.state {
            WorkflowState::MigrationFinalizing { lines } => Some(lines),
            _ => None,
        }
    }
}
