// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Bootstrap descriptor parsing and data types.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{BOOTSTRAP_FILENAME, Error, VersionSpecs, environment_dir};

#[cfg(test)]
#[path = "./bootstrap_test.rs"]
mod bootstrap_test;

/// API version for bootstrap descriptors.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ApiVersion {
    #[default]
    #[serde(rename = "spboot/v0")]
    V0,
}

/// Helper for two-stage deserialization to determine API version first.
#[derive(Deserialize)]
struct ApiVersionMapping {
    #[serde(default)]
    api: ApiVersion,
}

/// A repository that another repository depends on.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Dependency {
    /// Root of the dependency (absolute, `~/` or relative to the
    /// declaring repository).
    pub root: String,

    /// Configuration to activate the dependency with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,
}

impl Dependency {
    /// Resolve the dependency root against the declaring repository's root.
    pub fn resolve_root(&self, repo_root: &Path) -> std::io::Result<PathBuf> {
        let path = if let Some(rel) = self.root.strip_prefix('~') {
            let home = dirs::home_dir().ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Cannot resolve ~ without HOME",
                )
            })?;
            home.join(rel.trim_start_matches('/'))
        } else if Path::new(&self.root).is_absolute() {
            PathBuf::from(&self.root)
        } else {
            repo_root.join(&self.root)
        };

        dunce::canonicalize(path)
    }
}

/// One named variant of a repository's declarations.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ConfigurationInfo {
    /// Configuration name; absent for repositories that are not configurable.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,

    #[serde(default, skip_serializing_if = "VersionSpecs::is_empty")]
    pub version_specs: VersionSpecs,

    /// Fingerprint captured when setup last ran.
    #[serde(default)]
    pub fingerprint: BTreeMap<String, String>,

    /// Only honored on the root repository's unconfigured entry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_conflicted_repository_names: Vec<String>,

    /// Only honored on the root repository's unconfigured entry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_conflicted_library_names: Vec<String>,
}

/// Bootstrap descriptor of a single repository.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct BootstrapInfo {
    #[serde(default)]
    pub api: ApiVersion,

    /// Mixin repositories customize an environment but cannot be
    /// activated on their own.
    #[serde(default)]
    pub mixin: bool,

    pub configurations: Vec<ConfigurationInfo>,

    /// Path to the file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,

    /// Digest of the file content this was loaded from (not serialized).
    #[serde(skip)]
    pub source_digest: Option<String>,
}

impl BootstrapInfo {
    /// Location of the descriptor for a repository root.
    pub fn path(root: &Path, environment: &str) -> PathBuf {
        environment_dir(root, environment).join(BOOTSTRAP_FILENAME)
    }

    /// Parse and validate a descriptor; `path` is only used for diagnostics.
    pub fn from_yaml(yaml: &str, path: &Path) -> crate::Result<Self> {
        let invalid_yaml = |e| Error::InvalidYaml {
            path: path.to_path_buf(),
            error: e,
        };

        // Stage 1: Parse to get API version
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(invalid_yaml)?;
        let with_version: ApiVersionMapping =
            serde_yaml::from_value(value.clone()).map_err(invalid_yaml)?;

        // Stage 2: Deserialize based on version
        let info: Self = match with_version.api {
            ApiVersion::V0 => serde_yaml::from_value(value).map_err(invalid_yaml)?,
        };

        info.validate(path)?;
        Ok(info)
    }

    /// Load the descriptor of the repository at `root`.
    pub fn load(root: &Path, environment: &str) -> crate::Result<Self> {
        let path = Self::path(root, environment);
        let yaml = read_descriptor(&path)?;

        let mut info = Self::from_yaml(&yaml, &path)?;
        info.source_path = Some(path);
        info.source_digest = Some(content_digest(&yaml));
        Ok(info)
    }

    /// Digest of the descriptor currently stored for the repository at
    /// `root`, matching [`BootstrapInfo::source_digest`] after a load.
    pub fn digest(root: &Path, environment: &str) -> crate::Result<String> {
        let yaml = read_descriptor(&Self::path(root, environment))?;
        Ok(content_digest(&yaml))
    }

    /// Write the descriptor for the repository at `root`.
    pub fn save(&self, root: &Path, environment: &str) -> crate::Result<PathBuf> {
        let path = Self::path(root, environment);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self).map_err(|e| Error::InvalidYaml {
            path: path.clone(),
            error: e,
        })?;
        std::fs::write(&path, yaml)?;
        Ok(path)
    }

    fn validate(&self, path: &Path) -> crate::Result<()> {
        let invalid = |reason: String| Error::InvalidDescriptor {
            path: path.to_path_buf(),
            reason,
        };

        if self.configurations.is_empty() {
            return Err(invalid("at least one configuration is required".to_string()));
        }

        let mut seen = HashSet::new();
        for config in &self.configurations {
            if !seen.insert(config.name.as_deref()) {
                return Err(invalid(format!(
                    "configuration '{}' is declared more than once",
                    display_configuration(config.name.as_deref())
                )));
            }
        }

        if seen.contains(&None) && self.configurations.len() > 1 {
            return Err(invalid(
                "an unnamed configuration cannot be combined with named configurations"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// True if the repository declares named configurations.
    pub fn is_configurable(&self) -> bool {
        self.configurations.iter().any(|c| c.name.is_some())
    }

    /// Find a configuration by name (`None` for the unconfigured entry).
    pub fn configuration(&self, name: Option<&str>) -> Option<&ConfigurationInfo> {
        self.configurations
            .iter()
            .find(|c| c.name.as_deref() == name)
    }

    pub fn configuration_names(&self) -> Vec<String> {
        self.configurations
            .iter()
            .map(|c| display_configuration(c.name.as_deref()).to_string())
            .collect()
    }

    /// Recompute the fingerprint of every configuration.
    ///
    /// Each fingerprint covers the repository itself and the roots of the
    /// configuration's direct dependencies.
    pub fn refresh_fingerprints(&mut self, root: &Path) -> crate::Result<()> {
        let root = dunce::canonicalize(root)?;
        for config in &mut self.configurations {
            let paths = crate::fingerprint::fingerprint_paths(&root, config)?;
            config.fingerprint = crate::calculate_fingerprint(&paths, &root)?;
        }
        Ok(())
    }
}

fn read_descriptor(path: &Path) -> crate::Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::ReadFailed {
        path: path.to_path_buf(),
        error: e,
    })
}

fn content_digest(yaml: &str) -> String {
    format!("{:x}", Sha256::digest(yaml.as_bytes()))
}

pub(crate) fn display_configuration(name: Option<&str>) -> &str {
    name.unwrap_or("<None>")
}
