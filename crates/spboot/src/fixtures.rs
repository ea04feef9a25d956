// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! On-disk repository fixtures shared by the unit tests.

use std::path::PathBuf;

use tempfile::TempDir;

use crate::{
    BootstrapInfo, ConfigurationInfo, DEFAULT_ENVIRONMENT_NAME, Dependency, VersionInfo,
    write_repository_id,
};

/// A directory of sibling repositories, each created with an identity
/// marker and a bootstrap descriptor.
pub(crate) struct Workspace {
    _tmp: TempDir,
    pub base: PathBuf,
    names: Vec<String>,
}

impl Workspace {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let base = dunce::canonicalize(tmp.path()).unwrap();
        Self {
            _tmp: tmp,
            base,
            names: Vec::new(),
        }
    }

    pub fn root(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }

    /// Create a repository; its id is `<name>-ID`.
    pub fn add(&mut self, name: &str, info: BootstrapInfo) -> PathBuf {
        let root = self.root(name);
        std::fs::create_dir_all(&root).unwrap();
        write_repository_id(&root, name, &format!("{name}-ID")).unwrap();
        info.save(&root, DEFAULT_ENVIRONMENT_NAME).unwrap();
        self.names.push(name.to_string());
        root
    }

    /// Capture the fingerprints of every repository, as setup would.
    pub fn setup(&self) {
        for name in &self.names {
            let root = self.root(name);
            let mut info = BootstrapInfo::load(&root, DEFAULT_ENVIRONMENT_NAME).unwrap();
            info.refresh_fingerprints(&root).unwrap();
            info.save(&root, DEFAULT_ENVIRONMENT_NAME).unwrap();
        }
    }
}

pub(crate) fn dep(name: &str, configuration: Option<&str>) -> Dependency {
    Dependency {
        root: format!("../{name}"),
        configuration: configuration.map(String::from),
    }
}

/// A repository with a single unnamed configuration.
pub(crate) fn unconfigured(dependencies: Vec<Dependency>) -> BootstrapInfo {
    BootstrapInfo {
        configurations: vec![ConfigurationInfo {
            dependencies,
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// A repository with the given named configurations.
pub(crate) fn configured(configurations: Vec<(&str, Vec<Dependency>)>) -> BootstrapInfo {
    BootstrapInfo {
        configurations: configurations
            .into_iter()
            .map(|(name, dependencies)| ConfigurationInfo {
                name: Some(name.to_string()),
                dependencies,
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

/// Add library requirements to every configuration.
pub(crate) fn with_libraries(
    mut info: BootstrapInfo,
    language: &str,
    libraries: &[(&str, &str)],
) -> BootstrapInfo {
    for config in &mut info.configurations {
        config
            .version_specs
            .libraries
            .entry(language.to_string())
            .or_default()
            .extend(libraries.iter().map(|(n, v)| VersionInfo::new(*n, *v)));
    }
    info
}

/// Add tool requirements to every configuration.
pub(crate) fn with_tools(mut info: BootstrapInfo, tools: &[(&str, &str)]) -> BootstrapInfo {
    for config in &mut info.configurations {
        config
            .version_specs
            .tools
            .extend(tools.iter().map(|(n, v)| VersionInfo::new(*n, *v)));
    }
    info
}
