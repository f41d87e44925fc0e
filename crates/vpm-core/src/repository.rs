use serde::{Deserialize, Serialize};

pub const OFFICIAL_REPOSITORY_ID: &str = "com.vrchat.repos.official";
pub const CURATED_REPOSITORY_ID: &str = "com.vrchat.repos.curated";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryVisibility {
    #[serde(default)]
    pub hidden_repositories: Vec<String>,
    #[serde(default)]
    pub hide_local_user_packages: bool,
    #[serde(default)]
    pub user_repositories: Vec<RepositoryInfo>,
    #[serde(default)]
    pub show_prerelease_packages: bool,
}
