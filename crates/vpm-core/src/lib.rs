mod changes;
mod record;
mod repository;
mod unity;

pub use changes::{ConflictInfo, PackageChange, PendingChangeSet, RemoveReason};
pub use record::{BasePackageInfo, PackageRecord, PackageSource, ProjectState};
pub use repository::{
    RepositoryInfo, RepositoryVisibility, CURATED_REPOSITORY_ID, OFFICIAL_REPOSITORY_ID,
};
pub use unity::UnityVersion;
