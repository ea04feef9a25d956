// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;

fn data(configuration: Option<&str>) -> spboot::ActivationData {
    spboot::ActivationData {
        id: "A-ID".to_string(),
        root: PathBuf::from("/src/it's here"),
        is_mixin_repo: false,
        configuration: configuration.map(String::from),
        is_fast_environment: false,
        prioritized_repositories: Vec::new(),
        version_specs: Default::default(),
        ignore_conflicted_library_names: Vec::new(),
        descriptor_digests: Default::default(),
    }
}

#[rstest]
fn test_exports_with_configuration() {
    let exports = format_exports(&data(Some("debug")), "DefaultEnv");

    assert_eq!(
        exports,
        "export DEVELOPMENT_ENVIRONMENT_REPOSITORY='/src/it'\\''s here'\n\
         export DEVELOPMENT_ENVIRONMENT_REPOSITORY_CONFIGURATION='debug'\n\
         export DEVELOPMENT_ENVIRONMENT_ENVIRONMENT_NAME='DefaultEnv'\n"
    );
}

#[rstest]
fn test_exports_without_configuration() {
    let exports = format_exports(&data(None), "Other");

    assert!(exports.contains("unset DEVELOPMENT_ENVIRONMENT_REPOSITORY_CONFIGURATION\n"));
    assert!(exports.ends_with("export DEVELOPMENT_ENVIRONMENT_ENVIRONMENT_NAME='Other'\n"));
}
