use serde::{Deserialize, Serialize};

use crate::BasePackageInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoveReason {
    Requested,
    Legacy,
    Unused,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageChange {
    InstallNew(Box<BasePackageInfo>),
    Remove(RemoveReason),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictInfo {
    #[serde(default)]
    pub packages: Vec<String>,
    #[serde(default)]
    pub unity_conflict: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChangeSet {
    pub changes_version: u32,
    #[serde(default)]
    pub package_changes: Vec<(String, PackageChange)>,
    #[serde(default)]
    pub conflicts: Vec<(String, ConflictInfo)>,
    #[serde(default)]
    pub remove_legacy_files: Vec<String>,
    #[serde(default)]
    pub remove_legacy_folders: Vec<String>,
}

impl PendingChangeSet {
    pub fn version_conflicts(&self) -> impl Iterator<Item = &(String, ConflictInfo)> {
        self.conflicts
            .iter()
            .filter(|(_, conflict)| !conflict.packages.is_empty())
    }

    pub fn unity_conflicts(&self) -> impl Iterator<Item = &(String, ConflictInfo)> {
        self.conflicts
            .iter()
            .filter(|(_, conflict)| conflict.unity_conflict)
    }

    pub fn removes_legacy_content(&self) -> bool {
        !self.remove_legacy_files.is_empty() || !self.remove_legacy_folders.is_empty()
    }
}
