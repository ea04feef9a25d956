// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Dependency graph walk that aggregates repositories and their versions.

use std::collections::BTreeMap;
use std::path::Path;

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::bootstrap::display_configuration;
use crate::{BootstrapInfo, Dependency, Error, Repository, VersionMerger, VersionSpecs};

#[cfg(test)]
#[path = "./graph_test.rs"]
mod graph_test;

/// Result of walking the dependency graph of a repository.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The repository the walk started from.
    pub root: Repository,

    /// Descriptor of the root repository.
    pub root_bootstrap: BootstrapInfo,

    /// All repositories, most referenced first.
    pub prioritized_repositories: Vec<Repository>,

    /// Merged version requirements of every repository.
    pub version_specs: VersionSpecs,

    /// Library names whose conflicts were ignored.
    pub ignore_conflicted_library_names: Vec<String>,

    /// Digest of every descriptor read during the walk, by repository id.
    pub descriptor_digests: BTreeMap<String, String>,
}

/// A registered repository and what is known about its first reference.
#[derive(Debug)]
struct RegistryEntry {
    repo: Repository,
    referenced_by: Option<Repository>,
    bootstrap: BootstrapInfo,
    priority: u64,
}

/// A dependency waiting to be visited.
#[derive(Debug)]
struct PendingVisit {
    referenced_by: Repository,
    dependency: Dependency,
    priority: u64,
}

/// Walks the dependency graph of a single repository.
///
/// The walker owns the registry of visited repositories for the duration
/// of one resolution. Dependencies are visited depth first, in declaration
/// order, using an explicit stack. A repository is only expanded the first
/// time it is seen, so cycles terminate; later references still add to its
/// priority and are checked for consistency.
#[derive(Debug)]
pub struct DependencyWalker {
    environment: String,
    root: Option<Repository>,
    registry: IndexMap<String, RegistryEntry>,
    versions: VersionMerger,
    ignored_repositories: Vec<String>,
    ignored_libraries: Vec<String>,
}

impl DependencyWalker {
    pub fn new<S: Into<String>>(environment: S) -> Self {
        Self {
            environment: environment.into(),
            root: None,
            registry: IndexMap::new(),
            versions: VersionMerger::new(),
            ignored_repositories: Vec::new(),
            ignored_libraries: Vec::new(),
        }
    }

    /// Resolve the repository at `root` activated with `configuration`.
    pub fn resolve(
        mut self,
        root: &Path,
        configuration: Option<&str>,
    ) -> crate::Result<Resolution> {
        let root_repo = Repository::create(root, configuration.map(String::from))?;
        tracing::debug!(
            root = %root_repo.root.display(),
            configuration = ?configuration,
            "resolving dependency graph"
        );
        self.root = Some(root_repo.clone());

        let mut stack = Vec::new();
        self.visit(None, root_repo.clone(), 1, &mut stack)?;

        while let Some(pending) = stack.pop() {
            let dep_root = pending
                .dependency
                .resolve_root(&pending.referenced_by.root)
                .map_err(|e| Error::DependencyNotFound {
                    reference: pending.dependency.root.clone(),
                    referenced_by: pending.referenced_by.display_name(),
                    error: e,
                })?;
            let repo = Repository::create(&dep_root, pending.dependency.configuration.clone())?;
            self.visit(Some(pending.referenced_by), repo, pending.priority, &mut stack)?;
        }

        Ok(self.finish(root_repo))
    }

    fn visit(
        &mut self,
        referenced_by: Option<Repository>,
        mut repo: Repository,
        priority: u64,
        stack: &mut Vec<PendingVisit>,
    ) -> crate::Result<()> {
        let first_visit = !self.registry.contains_key(&repo.id);
        tracing::debug!(
            repository = %repo.name,
            id = %repo.id,
            configuration = ?repo.configuration,
            priority,
            first_visit,
            "visiting repository"
        );

        let entry = match self.registry.entry(repo.id.clone()) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                let bootstrap = BootstrapInfo::load(&repo.root, &self.environment)?;
                repo.is_mixin_repo = bootstrap.mixin;
                vacant.insert(RegistryEntry {
                    repo: repo.clone(),
                    referenced_by: referenced_by.clone(),
                    bootstrap,
                    priority: 0,
                })
            }
        };
        entry.priority += priority;

        // The ignore lists of the root's unconfigured entry apply to the
        // rest of this resolution.
        let is_root = self.root.as_ref().is_some_and(|r| r.root == repo.root);
        if first_visit && is_root && !entry.bootstrap.is_configurable() {
            if let Some(config) = entry.bootstrap.configuration(None) {
                self.ignored_repositories = config.ignore_conflicted_repository_names.clone();
                self.ignored_libraries = config.ignore_conflicted_library_names.clone();
            }
        }

        let configurable = entry.bootstrap.is_configurable();
        if configurable != repo.configuration.is_some() {
            return Err(Error::ConfigurationMismatch {
                root: repo.root.clone(),
                configuration: repo.configuration.clone(),
                referenced_by: describe(referenced_by.as_ref()),
            });
        }

        let Some(config) = entry.bootstrap.configuration(repo.configuration.as_deref()) else {
            return Err(Error::UnknownConfiguration {
                configuration: display_configuration(repo.configuration.as_deref()).to_string(),
                root: repo.root.clone(),
                referenced_by: describe(referenced_by.as_ref()),
                valid: entry.bootstrap.configuration_names(),
            });
        };

        if repo.root != entry.repo.root {
            return Err(Error::LocationMismatch {
                repository: format!("{} <{}>", repo.name, repo.id),
                new_value: repo.root.display().to_string(),
                new_referenced_by: describe(referenced_by.as_ref()),
                original_value: entry.repo.root.display().to_string(),
                original_referenced_by: describe(entry.referenced_by.as_ref()),
            });
        }

        if repo.configuration != entry.repo.configuration {
            if !self.ignored_repositories.contains(&repo.name) {
                return Err(Error::ConfigurationConflict {
                    repository: format!("{} <{}>", repo.name, repo.id),
                    new_value: display_configuration(repo.configuration.as_deref()).to_string(),
                    new_referenced_by: describe(referenced_by.as_ref()),
                    original_value: display_configuration(entry.repo.configuration.as_deref())
                        .to_string(),
                    original_referenced_by: describe(entry.referenced_by.as_ref()),
                });
            }
            tracing::debug!(
                repository = %repo.name,
                kept = ?entry.repo.configuration,
                ignored = ?repo.configuration,
                "ignoring conflicted repository configuration"
            );
        }

        if !first_visit {
            return Ok(());
        }

        self.versions
            .merge(&entry.repo, &config.version_specs, &self.ignored_libraries)?;

        // Reversed so that the first declared dependency is visited first.
        for dependency in config.dependencies.iter().rev() {
            stack.push(PendingVisit {
                referenced_by: entry.repo.clone(),
                dependency: dependency.clone(),
                priority: priority + 1,
            });
        }

        Ok(())
    }

    fn finish(self, root: Repository) -> Resolution {
        let mut entries: Vec<RegistryEntry> = self.registry.into_values().collect();
        // Stable: repositories with equal priority keep their visit order.
        entries.sort_by(|a, b| b.priority.cmp(&a.priority));

        let root_bootstrap = entries
            .iter()
            .find(|e| e.repo.id == root.id)
            .map(|e| e.bootstrap.clone())
            .unwrap_or_default();

        let descriptor_digests = entries
            .iter()
            .filter_map(|e| {
                let digest = e.bootstrap.source_digest.clone()?;
                Some((e.repo.id.clone(), digest))
            })
            .collect();
        let prioritized_repositories = entries.into_iter().map(|e| e.repo).collect();

        Resolution {
            root: Repository {
                is_mixin_repo: root_bootstrap.mixin,
                ..root
            },
            root_bootstrap,
            prioritized_repositories,
            version_specs: self.versions.into_version_specs(),
            ignore_conflicted_library_names: self.ignored_libraries,
            descriptor_digests,
        }
    }
}

pub(crate) fn describe(repo: Option<&Repository>) -> String {
    match repo {
        Some(repo) => repo.display_name(),
        None => "<root>".to_string(),
    }
}
