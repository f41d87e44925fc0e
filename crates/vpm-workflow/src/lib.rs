mod backend;
mod line_buffer;
mod migration;
mod state;
mod visibility;
mod workflow;

pub use backend::{FinalizeStart, MigrationOutput, MigrationPrecheck, ProjectBackend};
pub use line_buffer::{LineBuffer, LINE_BUFFER_CAPACITY};
pub use migration::MigrationOutcome;
pub use state::{RequestedOperation, WorkflowState};
pub use visibility::{set_local_user_packages_hidden, set_repository_hidden};
pub use workflow::{ChangeWorkflow, UpgradeAllOutcome};

#[cfg(test)]
mod tests;
