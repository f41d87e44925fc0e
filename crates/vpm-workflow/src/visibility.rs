use anyhow::Result;
use vpm_core::RepositoryVisibility;

use crate::backend::ProjectBackend;

// Visibility mutators are always followed by a refetch so callers render
// the backend's view of the settings, not their own guess.

pub async fn set_repository_hidden<B: ProjectBackend>(
    backend: &B,
    repository_id: &str,
    hidden: bool,
) -> Result<RepositoryVisibility> {
    backend.set_repository_hidden(repository_id, hidden).await?;
    backend.fetch_repository_visibility().await
}

pub async fn set_local_user_packages_hidden<B: ProjectBackend>(
    backend: &B,
    hidden: bool,
) -> Result<RepositoryVisibility> {
    backend.set_local_user_packages_hidden(hidden).await?;
    backend.fetch_repository_visibility().await
}
