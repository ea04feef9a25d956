// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Activation data: the resolved environment of a repository, cached on
//! disk per configuration.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bootstrap::display_configuration;
use crate::fingerprint::validate_fingerprint;
use crate::graph::describe;
use crate::{
    ACTIVATION_FILENAME, BootstrapInfo, DEFAULT_CONFIGURATION_NAME, DEFAULT_ENVIRONMENT_NAME,
    DependencyWalker, Error, Repository, VersionSpecs, environment_dir,
};

#[cfg(test)]
#[path = "./activation_test.rs"]
mod activation_test;

/// The currently activated environment, if any.
///
/// Commands running inside an activated shell reuse the activated
/// repository instead of the one they were given, unless forced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationContext {
    pub activated_root: Option<PathBuf>,
    pub activated_configuration: Option<String>,
    /// Name of the generated environment directory.
    pub environment: String,
}

impl Default for ActivationContext {
    fn default() -> Self {
        Self {
            activated_root: None,
            activated_configuration: None,
            environment: DEFAULT_ENVIRONMENT_NAME.to_string(),
        }
    }
}

/// Reasons a cached activation could not be used.
#[derive(Error, Debug)]
pub enum CacheReadError {
    #[error("No activation data at {0:?}")]
    Missing(PathBuf),

    #[error("Failed to read activation data {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("Failed to parse activation data {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        error: serde_json::Error,
    },
}

/// Everything needed to activate a repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivationData {
    pub id: String,
    pub root: PathBuf,
    pub is_mixin_repo: bool,
    pub configuration: Option<String>,
    pub is_fast_environment: bool,

    /// Every repository in the environment by descending priority. Unless
    /// a dependency refers back to it, the activated repository is last.
    pub prioritized_repositories: Vec<Repository>,
    pub version_specs: VersionSpecs,
    pub ignore_conflicted_library_names: Vec<String>,

    /// Digest of each repository's bootstrap descriptor when this was
    /// resolved, by repository id.
    #[serde(default)]
    pub descriptor_digests: BTreeMap<String, String>,
}

impl ActivationData {
    /// Load the activation data of a repository.
    ///
    /// Unless `force` is set, an activated environment in `ctx` takes the
    /// place of `root` and `configuration`, and cached data is reused while
    /// no bootstrap descriptor changed. A reused entry must still match its
    /// fingerprint. Otherwise the dependency graph is resolved again and the
    /// result is written back to the cache.
    pub fn load(
        root: Option<&Path>,
        configuration: Option<&str>,
        fast: bool,
        force: bool,
        ctx: &ActivationContext,
    ) -> crate::Result<Self> {
        let (root, configuration) = match (&ctx.activated_root, force) {
            (Some(activated), false) => {
                tracing::debug!(
                    root = %activated.display(),
                    configuration = ?ctx.activated_configuration,
                    "using activated environment"
                );
                (activated.clone(), ctx.activated_configuration.clone())
            }
            _ => {
                let root = root.ok_or(Error::NoRepositoryRoot)?;
                (root.to_path_buf(), configuration.map(String::from))
            }
        };

        if !root.is_dir() {
            return Err(Error::NotADirectory(root));
        }
        let root = dunce::canonicalize(&root)?;
        let configuration = configuration.as_deref();

        if !force {
            let path = Self::cache_path(&root, configuration, fast, &ctx.environment);
            match Self::read_cache(&path) {
                Ok(data) if !data.descriptors_match(&ctx.environment) => {
                    tracing::debug!(
                        path = %path.display(),
                        "bootstrap descriptors changed since activation data was cached"
                    );
                }
                Ok(data) => {
                    Self::check_fingerprint(&root, configuration, &ctx.environment)?;
                    tracing::debug!(path = %path.display(), "using cached activation data");
                    return Ok(data);
                }
                Err(CacheReadError::Missing(_)) => {
                    tracing::debug!(path = %path.display(), "no cached activation data");
                }
                Err(err) => {
                    tracing::warn!("Ignoring cached activation data: {err}");
                }
            }
        }

        let data = Self::resolve(&root, configuration, fast, &ctx.environment)?;
        data.save(&ctx.environment)?;
        Ok(data)
    }

    /// Walk the dependency graph without consulting or updating the cache.
    pub fn resolve(
        root: &Path,
        configuration: Option<&str>,
        fast: bool,
        environment: &str,
    ) -> crate::Result<Self> {
        let resolution = DependencyWalker::new(environment).resolve(root, configuration)?;

        let Some(config) = resolution.root_bootstrap.configuration(configuration) else {
            return Err(Error::UnknownConfiguration {
                configuration: display_configuration(configuration).to_string(),
                root: resolution.root.root.clone(),
                referenced_by: describe(None),
                valid: resolution.root_bootstrap.configuration_names(),
            });
        };
        validate_fingerprint(&resolution.root.root, config)?;

        Ok(Self {
            id: resolution.root.id,
            root: resolution.root.root,
            is_mixin_repo: resolution.root.is_mixin_repo,
            configuration: configuration.map(String::from),
            is_fast_environment: fast,
            prioritized_repositories: resolution.prioritized_repositories,
            version_specs: resolution.version_specs,
            ignore_conflicted_library_names: resolution.ignore_conflicted_library_names,
            descriptor_digests: resolution.descriptor_digests,
        })
    }

    /// True if every descriptor read while resolving this data is unchanged.
    fn descriptors_match(&self, environment: &str) -> bool {
        !self.prioritized_repositories.is_empty()
            && self.prioritized_repositories.iter().all(|repo| {
                let Some(recorded) = self.descriptor_digests.get(&repo.id) else {
                    return false;
                };
                BootstrapInfo::digest(&repo.root, environment).is_ok_and(|d| &d == recorded)
            })
    }

    /// Read cached activation data, without validating it.
    pub fn read_cache(path: &Path) -> Result<Self, CacheReadError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheReadError::Missing(path.to_path_buf()));
            }
            Err(err) => {
                return Err(CacheReadError::Read {
                    path: path.to_path_buf(),
                    error: err,
                });
            }
        };

        serde_json::from_str(&content).map_err(|err| CacheReadError::Parse {
            path: path.to_path_buf(),
            error: err,
        })
    }

    fn check_fingerprint(
        root: &Path,
        configuration: Option<&str>,
        environment: &str,
    ) -> crate::Result<()> {
        let bootstrap = BootstrapInfo::load(root, environment)?;
        let Some(config) = bootstrap.configuration(configuration) else {
            return Err(Error::UnknownConfiguration {
                configuration: display_configuration(configuration).to_string(),
                root: root.to_path_buf(),
                referenced_by: describe(None),
                valid: bootstrap.configuration_names(),
            });
        };
        validate_fingerprint(root, config)
    }

    /// Write the activation data to its cache file.
    ///
    /// The content is written to a temporary file in the same directory
    /// and renamed into place, so readers never observe a partial file.
    pub fn save(&self, environment: &str) -> crate::Result<PathBuf> {
        let path = self.cache_path_in(environment);
        let write_error = |error: std::io::Error| Error::CacheWrite {
            path: path.clone(),
            error,
        };

        let dir = self.activation_dir(environment);
        std::fs::create_dir_all(&dir).map_err(write_error)?;

        let json = serde_json::to_string_pretty(self).map_err(|e| write_error(e.into()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_error)?;
        tmp.write_all(json.as_bytes()).map_err(write_error)?;
        tmp.as_file().sync_all().map_err(write_error)?;
        tmp.persist(&path).map_err(|e| write_error(e.error))?;

        tracing::debug!(path = %path.display(), "saved activation data");
        Ok(path)
    }

    /// Directory holding this activation's generated content.
    pub fn activation_dir(&self, environment: &str) -> PathBuf {
        Self::activation_dir_for(
            &self.root,
            self.configuration.as_deref(),
            self.is_fast_environment,
            environment,
        )
    }

    fn cache_path_in(&self, environment: &str) -> PathBuf {
        self.activation_dir(environment).join(ACTIVATION_FILENAME)
    }

    /// `<root>/Generated/<environment>/<configuration>[.fast]`
    pub fn activation_dir_for(
        root: &Path,
        configuration: Option<&str>,
        fast: bool,
        environment: &str,
    ) -> PathBuf {
        let mut name = configuration
            .unwrap_or(DEFAULT_CONFIGURATION_NAME)
            .to_string();
        if fast {
            name.push_str(".fast");
        }
        environment_dir(root, environment).join(name)
    }

    /// Location of the cache file for a repository and configuration.
    pub fn cache_path(
        root: &Path,
        configuration: Option<&str>,
        fast: bool,
        environment: &str,
    ) -> PathBuf {
        Self::activation_dir_for(root, configuration, fast, environment).join(ACTIVATION_FILENAME)
    }
}

/// When the file at `path` was last written, if it exists.
pub fn cached_at(path: &Path) -> Option<DateTime<Utc>> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}
