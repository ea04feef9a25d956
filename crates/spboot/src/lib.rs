// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! spboot - Multi-Repository Development Environment Bootstrap
//!
//! This crate provides the resolution core used to activate development
//! environments that span several source repositories.
//!
//! # Overview
//!
//! Every repository carries an identity marker (`__RepositoryId__`) and a
//! bootstrap descriptor generated during setup. Activation walks the
//! dependency graph declared by those descriptors, checks that every
//! repository is referenced consistently, merges the tool and library
//! versions they require, and verifies that nothing changed since setup.
//! The result is cached per configuration so that nested shells can reuse it.
//!
//! # Example
//!
//! ```yaml
//! # Generated/DefaultEnv/EnvironmentBootstrap.yaml
//! api: spboot/v0
//! configurations:
//!   - name: python36
//!     dependencies:
//!       - root: ../Common_Environment
//!         configuration: python36
//!     version_specs:
//!       tools:
//!         - name: Python
//!           version: v3.6.5
//! ```

pub mod activation;
pub mod bootstrap;
pub mod error;
pub mod fingerprint;
pub mod graph;
pub mod repository;
pub mod version;

#[cfg(test)]
mod fixtures;

pub use activation::{ActivationContext, ActivationData, CacheReadError, cached_at};
pub use bootstrap::{ApiVersion, BootstrapInfo, ConfigurationInfo, Dependency};
pub use error::{Error, Result};
pub use fingerprint::{
    FingerprintChange, FingerprintChangeKind, calculate_fingerprint, compare_fingerprints,
    validate_fingerprint,
};
pub use graph::{DependencyWalker, Resolution};
pub use repository::{Repository, generate_repository_id, write_repository_id};
pub use version::{VersionInfo, VersionMerger, VersionSpecs};

/// Well-known filename of the repository identity marker.
pub const REPOSITORY_ID_FILENAME: &str = "__RepositoryId__";

/// Directory (relative to a repository root) that holds generated content.
pub const GENERATED_DIRECTORY_NAME: &str = "Generated";

/// Well-known filename of the bootstrap descriptor.
pub const BOOTSTRAP_FILENAME: &str = "EnvironmentBootstrap.yaml";

/// Well-known filename of the activation cache.
pub const ACTIVATION_FILENAME: &str = "EnvironmentActivation.json";

/// Environment name used when none is provided.
pub const DEFAULT_ENVIRONMENT_NAME: &str = "DefaultEnv";

/// Cache directory name used for repositories without a configuration.
pub const DEFAULT_CONFIGURATION_NAME: &str = "DefaultConfig";

/// Variable naming the root of the activated repository.
pub const DE_REPO_ROOT_NAME: &str = "DEVELOPMENT_ENVIRONMENT_REPOSITORY";

/// Variable naming the configuration of the activated repository.
pub const DE_REPO_CONFIGURATION_NAME: &str = "DEVELOPMENT_ENVIRONMENT_REPOSITORY_CONFIGURATION";

/// Variable naming the environment used to locate generated content.
pub const DE_ENVIRONMENT_NAME: &str = "DEVELOPMENT_ENVIRONMENT_ENVIRONMENT_NAME";

/// Returns the generated directory of a repository for an environment.
pub fn environment_dir(root: &std::path::Path, environment: &str) -> std::path::PathBuf {
    root.join(GENERATED_DIRECTORY_NAME).join(environment)
}
