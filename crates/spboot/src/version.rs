// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Tool and library version requirements, and the rules for merging them
//! across repositories.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{Error, Repository};

#[cfg(test)]
#[path = "./version_test.rs"]
mod version_test;

/// A named item pinned to a version.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionInfo {
    #[serde(alias = "name")]
    pub name: String,
    #[serde(alias = "version")]
    pub version: String,
}

impl VersionInfo {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, version: V) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Tool versions and per-language library versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionSpecs {
    #[serde(default, alias = "tools")]
    pub tools: Vec<VersionInfo>,
    #[serde(default, alias = "libraries")]
    pub libraries: BTreeMap<String, Vec<VersionInfo>>,
}

impl VersionSpecs {
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty() && self.libraries.values().all(Vec::is_empty)
    }
}

/// Accumulates version requirements from many repositories.
///
/// The first repository to declare an item wins; any later declaration of
/// the same item with a different version is an error, except for library
/// names that are explicitly ignored. Tools can never be ignored.
#[derive(Debug, Default)]
pub struct VersionMerger {
    specs: VersionSpecs,
    tool_sources: HashMap<String, Repository>,
    library_sources: HashMap<(String, String), Repository>,
}

impl VersionMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the requirements declared by `repo`.
    pub fn merge(
        &mut self,
        repo: &Repository,
        specs: &VersionSpecs,
        ignored_libraries: &[String],
    ) -> crate::Result<()> {
        for info in &specs.tools {
            match self.specs.tools.iter().find(|t| t.name == info.name) {
                None => {
                    self.specs.tools.push(info.clone());
                    self.tool_sources.insert(info.name.clone(), repo.clone());
                }
                Some(existing) if existing.version != info.version => {
                    let original = &self.tool_sources[&info.name];
                    return Err(mismatch("Tools", info, repo, existing, original));
                }
                Some(_) => {}
            }
        }

        for (language, infos) in &specs.libraries {
            for info in infos {
                let known = self.specs.libraries.entry(language.clone()).or_default();
                match known.iter().find(|l| l.name == info.name) {
                    None => {
                        known.push(info.clone());
                        self.library_sources
                            .insert((language.clone(), info.name.clone()), repo.clone());
                    }
                    Some(existing) if existing.version != info.version => {
                        if ignored_libraries.contains(&info.name) {
                            tracing::debug!(
                                library = %info.name,
                                kept = %existing.version,
                                ignored = %info.version,
                                "ignoring conflicted library version"
                            );
                            continue;
                        }
                        let original = &self.library_sources[&(language.clone(), info.name.clone())];
                        return Err(mismatch(
                            &format!("{language} Libraries"),
                            info,
                            repo,
                            existing,
                            original,
                        ));
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(())
    }

    pub fn into_version_specs(self) -> VersionSpecs {
        self.specs
    }
}

fn specified_by(repo: &Repository) -> String {
    format!(
        "{} ({}) <{}> [{}]",
        repo.name,
        repo.configuration.as_deref().unwrap_or("<None>"),
        repo.id,
        repo.root.display()
    )
}

fn mismatch(
    kind: &str,
    info: &VersionInfo,
    repo: &Repository,
    existing: &VersionInfo,
    original: &Repository,
) -> Error {
    Error::VersionMismatch {
        name: info.name.clone(),
        kind: kind.to_string(),
        new_value: info.version.clone(),
        new_specified_by: specified_by(repo),
        original_value: existing.version.clone(),
        original_specified_by: specified_by(original),
    }
}
