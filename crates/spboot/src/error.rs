// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for spboot operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::fingerprint::FingerprintChange;

/// Convenience Result type with spboot Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving an environment.
///
/// All of these are fatal to the current resolution.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Failed to read file
    #[error("Failed to read file: {path:?}")]
    #[diagnostic(code(spboot::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Invalid YAML in a bootstrap descriptor
    #[error("Invalid bootstrap descriptor {path:?}: {error}")]
    #[diagnostic(
        code(spboot::invalid_yaml),
        help("Check YAML syntax and ensure 'api: spboot/v0' is present")
    )]
    InvalidYaml {
        path: PathBuf,
        #[source]
        error: serde_yaml::Error,
    },

    /// Descriptor parsed but is not usable
    #[error("Invalid bootstrap descriptor {path:?}: {reason}")]
    #[diagnostic(code(spboot::invalid_descriptor))]
    InvalidDescriptor { path: PathBuf, reason: String },

    /// Repository root is not a directory
    #[error("Repository root is not a directory: {0:?}")]
    #[diagnostic(code(spboot::not_a_directory))]
    NotADirectory(PathBuf),

    /// Missing identity marker
    #[error("No repository identity marker found in {0:?}")]
    #[diagnostic(
        code(spboot::repository_id_not_found),
        help("Create one with 'spboot init --name <NAME>'")
    )]
    RepositoryIdNotFound(PathBuf),

    /// Identity marker without a name or id
    #[error("Invalid repository identity marker {path:?}: {reason}")]
    #[diagnostic(
        code(spboot::invalid_repository_id),
        help("The marker must contain 'Friendly Name:' and 'Id:' lines")
    )]
    InvalidRepositoryId { path: PathBuf, reason: String },

    /// A declared dependency root does not exist
    #[error("Dependency '{reference}' of {referenced_by} could not be found")]
    #[diagnostic(
        code(spboot::dependency_not_found),
        help("Check the dependency roots in the bootstrap descriptor and run setup again")
    )]
    DependencyNotFound {
        reference: String,
        referenced_by: String,
        #[source]
        error: std::io::Error,
    },

    /// Configuration is not declared by the repository
    #[error(
        "The configuration '{configuration}' is not a valid configuration for the repository at {root:?}\n\
         \n  Referenced by:  {referenced_by}"
    )]
    #[diagnostic(
        code(spboot::unknown_configuration),
        help("Valid configuration values are: {}", valid.join(", "))
    )]
    UnknownConfiguration {
        configuration: String,
        root: PathBuf,
        referenced_by: String,
        valid: Vec<String>,
    },

    /// Configuration provided to a non-configurable repository, or missing
    /// for a configurable one
    #[error(
        "{}\n\n  Referenced by:  {referenced_by}",
        mismatch_message(root, configuration)
    )]
    #[diagnostic(code(spboot::configuration_mismatch))]
    ConfigurationMismatch {
        root: PathBuf,
        configuration: Option<String>,
        referenced_by: String,
    },

    /// Same repository found in two locations
    #[error(
        "There is a mismatch in repository locations for {repository}\n\
         \n  New location:       {new_value}\n  Referenced by:      {new_referenced_by}\
         \n\n  Original location:  {original_value}\n  Referenced by:      {original_referenced_by}"
    )]
    #[diagnostic(code(spboot::location_mismatch))]
    LocationMismatch {
        repository: String,
        new_value: String,
        new_referenced_by: String,
        original_value: String,
        original_referenced_by: String,
    },

    /// Same repository referenced with different configurations
    #[error(
        "There is a mismatch in repository configurations for {repository}\n\
         \n  New configuration:       {new_value}\n  Referenced by:           {new_referenced_by}\
         \n\n  Original configuration:  {original_value}\n  Referenced by:           {original_referenced_by}"
    )]
    #[diagnostic(
        code(spboot::configuration_conflict),
        help(
            "Align the configurations or add the repository name to ignore_conflicted_repository_names"
        )
    )]
    ConfigurationConflict {
        repository: String,
        new_value: String,
        new_referenced_by: String,
        original_value: String,
        original_referenced_by: String,
    },

    /// Conflicting tool or library versions
    #[error(
        "There was a mismatch in version information for {name} <{kind}>\n\
         \n  New version:       {new_value}\n  Specified by:      {new_specified_by}\
         \n\n  Original version:  {original_value}\n  Specified by:      {original_specified_by}"
    )]
    #[diagnostic(code(spboot::version_mismatch))]
    VersionMismatch {
        name: String,
        kind: String,
        new_value: String,
        new_specified_by: String,
        original_value: String,
        original_specified_by: String,
    },

    /// Fingerprint differs from the one captured at setup
    #[error(
        "One or more of the repositories that {root:?} depends on have changed:\n{}",
        format_changes(changes)
    )]
    #[diagnostic(
        code(spboot::stale_environment),
        help("Run 'spboot setup' for this repository again")
    )]
    StaleEnvironment {
        root: PathBuf,
        changes: Vec<FingerprintChange>,
    },

    /// Neither an explicit nor an activated root is available
    #[error("No repository root was provided and no environment is activated")]
    #[diagnostic(
        code(spboot::no_repository_root),
        help("Pass a repository path or run from within an activated environment")
    )]
    NoRepositoryRoot,

    /// Failed to persist the activation cache
    #[error("Failed to write activation data to {path:?}")]
    #[diagnostic(code(spboot::cache_write_failed))]
    CacheWrite {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// IO error passthrough
    #[error(transparent)]
    #[diagnostic(code(spboot::io_error))]
    Io(#[from] std::io::Error),
}

fn mismatch_message(root: &std::path::Path, configuration: &Option<String>) -> String {
    match configuration {
        None => format!(
            "The repository at {root:?} is configurable, but no configuration was provided"
        ),
        Some(cfg) => format!(
            "The repository at {root:?} is not configurable, but a configuration was provided ({cfg})"
        ),
    }
}

fn format_changes(changes: &[FingerprintChange]) -> String {
    changes
        .iter()
        .map(|c| format!("    {:<60}  :  {}", c.key, c.kind))
        .collect::<Vec<_>>()
        .join("\n")
}
