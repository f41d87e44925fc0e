use anyhow::{anyhow, Context};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::UnityVersion;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageSource {
    LocalUser,
    Remote { id: String, display_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePackageInfo {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub version: Version,
    #[serde(default)]
    pub unity: Option<UnityVersion>,
    #[serde(default)]
    pub changelog_url: Option<String>,
    #[serde(default)]
    pub vpm_dependencies: Vec<String>,
    #[serde(default)]
    pub is_yanked: bool,
}

impl BasePackageInfo {
    pub fn display_name_or_id(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    // Only web links are worth handing to the rendering layer; anything
    // else in the changelog field is treated as absent.
    pub fn web_changelog_url(&self) -> Option<&str> {
        self.changelog_url
            .as_deref()
            .filter(|url| url.starts_with("http://") || url.starts_with("https://"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    #[serde(flatten)]
    pub info: BasePackageInfo,
    pub env_version: u32,
    pub index: usize,
    pub source: PackageSource,
}

impl PackageRecord {
    pub fn from_json_str(input: &str) -> anyhow::Result<Self> {
        let record: Self =
            serde_json::from_str(input).context("failed to parse package record")?;
        record.validate()?;
        Ok(record)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.info.name.trim().is_empty() {
            return Err(anyhow!("package record is missing a name"));
        }
        if let PackageSource::Remote { id, .. } = &self.source {
            if id.trim().is_empty() {
                return Err(anyhow!(
                    "remote source for '{}' is missing a repository id",
                    self.info.name
                ));
            }
        }
        Ok(())
    }

    pub fn is_prerelease(&self) -> bool {
        !self.info.version.pre.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectState {
    pub unity: Option<UnityVersion>,
    #[serde(default)]
    pub installed_packages: Vec<(String, BasePackageInfo)>,
}
