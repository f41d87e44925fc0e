use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use semver::Version;
use vpm_core::{BasePackageInfo, PackageRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledInfo {
    pub version: Version,
    pub yanked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PackageLatest {
    #[default]
    None,
    Contains(PackageRecord),
    Upgradable(PackageRecord),
}

impl PackageLatest {
    pub fn record(&self) -> Option<&PackageRecord> {
        match self {
            PackageLatest::None => None,
            PackageLatest::Contains(pkg) | PackageLatest::Upgradable(pkg) => Some(pkg),
        }
    }

    pub fn is_upgradable(&self) -> bool {
        matches!(self, PackageLatest::Upgradable(_))
    }
}

// One reconciled logical package: every source and version folded under a
// single name. Both candidate maps iterate in strictly descending version
// order and never share a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRow {
    pub name: String,
    pub display_name: String,
    pub aliases: Vec<String>,
    pub(crate) info_source: Version,
    pub unity_compatible: BTreeMap<Reverse<Version>, PackageRecord>,
    pub unity_incompatible: BTreeMap<Reverse<Version>, PackageRecord>,
    pub sources: BTreeSet<String>,
    pub is_there_source: bool,
    pub installed: Option<InstalledInfo>,
    pub latest: PackageLatest,
}

impl PackageRow {
    pub(crate) fn new(info: &BasePackageInfo) -> Self {
        Self {
            name: info.name.clone(),
            display_name: info.display_name_or_id().to_string(),
            aliases: info.aliases.clone(),
            info_source: info.version.clone(),
            unity_compatible: BTreeMap::new(),
            unity_incompatible: BTreeMap::new(),
            sources: BTreeSet::new(),
            is_there_source: false,
            installed: None,
            latest: PackageLatest::None,
        }
    }

    pub fn best_compatible(&self) -> Option<&PackageRecord> {
        self.unity_compatible.values().next()
    }

    pub fn compatible_versions(&self) -> impl Iterator<Item = &Version> {
        self.unity_compatible.keys().map(|Reverse(version)| version)
    }

    pub fn incompatible_versions(&self) -> impl Iterator<Item = &Version> {
        self.unity_incompatible.keys().map(|Reverse(version)| version)
    }

    pub(crate) fn matches_query(&self, query_lower: &str) -> bool {
        self.display_name.to_lowercase().contains(query_lower)
            || self.name.to_lowercase().contains(query_lower)
            || self
                .aliases
                .iter()
                .any(|alias| alias.to_lowercase().contains(query_lower))
    }
}
