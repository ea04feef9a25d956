// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;
use crate::{DEFAULT_ENVIRONMENT_NAME, VersionInfo};

fn parse(yaml: &str) -> crate::Result<BootstrapInfo> {
    BootstrapInfo::from_yaml(yaml, Path::new("test.yaml"))
}

#[rstest]
fn test_parse_minimal_descriptor() {
    let yaml = r#"
api: spboot/v0
configurations:
  - {}
"#;
    let info = parse(yaml).expect("Should parse minimal descriptor");
    assert_eq!(info.api, ApiVersion::V0);
    assert!(!info.mixin);
    assert!(!info.is_configurable());
    assert!(info.configuration(None).is_some());
    assert_eq!(info.configuration_names(), vec!["<None>"]);
}

#[rstest]
fn test_parse_full_descriptor() {
    let yaml = r#"
api: spboot/v0
mixin: true
configurations:
  - name: python36
    dependencies:
      - root: ../Common_Environment
        configuration: python36
    version_specs:
      Tools:
        - Name: Python
          Version: v3.6.5
      Libraries:
        Python:
          - Name: six
            Version: "1.11"
    fingerprint:
      ".": abc
      "../Common_Environment": def
  - name: python27
"#;
    let info = parse(yaml).expect("Should parse full descriptor");
    assert!(info.mixin);
    assert!(info.is_configurable());
    assert_eq!(info.configuration_names(), vec!["python36", "python27"]);

    let config = info.configuration(Some("python36")).unwrap();
    assert_eq!(config.dependencies.len(), 1);
    assert_eq!(config.dependencies[0].configuration.as_deref(), Some("python36"));
    assert_eq!(config.version_specs.tools, vec![VersionInfo::new("Python", "v3.6.5")]);
    assert_eq!(config.fingerprint.len(), 2);
    assert!(info.configuration(None).is_none());
}

#[rstest]
#[case::no_configurations("api: spboot/v0\nconfigurations: []\n")]
#[case::duplicate_names("api: spboot/v0\nconfigurations:\n  - name: a\n  - name: a\n")]
#[case::mixed_names("api: spboot/v0\nconfigurations:\n  - {}\n  - name: a\n")]
fn test_invalid_descriptor(#[case] yaml: &str) {
    match parse(yaml) {
        Err(Error::InvalidDescriptor { .. }) => {}
        other => panic!("Expected InvalidDescriptor, got: {:?}", other),
    }
}

#[rstest]
#[case::bad_syntax("api: spboot/v0\nconfigurations: [\n")]
#[case::bad_api("api: spboot/v9\nconfigurations:\n  - {}\n")]
#[case::missing_configurations("api: spboot/v0\n")]
fn test_invalid_yaml(#[case] yaml: &str) {
    match parse(yaml) {
        Err(Error::InvalidYaml { .. }) => {}
        other => panic!("Expected InvalidYaml, got: {:?}", other),
    }
}

#[rstest]
fn test_load_missing_descriptor() {
    let tmp = TempDir::new().unwrap();

    match BootstrapInfo::load(tmp.path(), DEFAULT_ENVIRONMENT_NAME) {
        Err(Error::ReadFailed { path, .. }) => {
            assert!(path.ends_with("Generated/DefaultEnv/EnvironmentBootstrap.yaml"))
        }
        other => panic!("Expected ReadFailed, got: {:?}", other),
    }
}

#[rstest]
fn test_save_and_load() {
    let tmp = TempDir::new().unwrap();
    let info = BootstrapInfo {
        configurations: vec![ConfigurationInfo {
            ignore_conflicted_library_names: vec!["six".to_string()],
            ..Default::default()
        }],
        ..Default::default()
    };

    let path = info.save(tmp.path(), DEFAULT_ENVIRONMENT_NAME).unwrap();
    let loaded = BootstrapInfo::load(tmp.path(), DEFAULT_ENVIRONMENT_NAME).unwrap();

    assert_eq!(loaded.source_path.as_deref(), Some(path.as_path()));
    assert_eq!(loaded.configurations, info.configurations);
}

#[rstest]
fn test_resolve_dependency_root() {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path().join("repo");
    let dep = tmp.path().join("dep");
    std::fs::create_dir_all(&repo).unwrap();
    std::fs::create_dir_all(&dep).unwrap();

    let relative = Dependency {
        root: "../dep".to_string(),
        configuration: None,
    };
    assert_eq!(
        relative.resolve_root(&repo).unwrap(),
        dunce::canonicalize(&dep).unwrap()
    );

    let absolute = Dependency {
        root: dep.display().to_string(),
        configuration: None,
    };
    assert_eq!(
        absolute.resolve_root(&repo).unwrap(),
        dunce::canonicalize(&dep).unwrap()
    );

    let missing = Dependency {
        root: "../missing".to_string(),
        configuration: None,
    };
    assert!(missing.resolve_root(&repo).is_err());
}

#[rstest]
fn test_refresh_fingerprints() {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path().join("repo");
    let dep = tmp.path().join("dep");
    std::fs::create_dir_all(&repo).unwrap();
    std::fs::create_dir_all(&dep).unwrap();
    std::fs::write(dep.join("file.txt"), "content").unwrap();

    let mut info = BootstrapInfo {
        configurations: vec![ConfigurationInfo {
            dependencies: vec![Dependency {
                root: "../dep".to_string(),
                configuration: None,
            }],
            ..Default::default()
        }],
        ..Default::default()
    };
    info.refresh_fingerprints(&repo).unwrap();

    let fingerprint = &info.configurations[0].fingerprint;
    assert_eq!(fingerprint.len(), 2);
    assert!(fingerprint.contains_key("."));
    assert!(fingerprint.contains_key("../dep"));
}

#[rstest]
fn test_descriptor_digest_tracks_content() {
    let tmp = TempDir::new().unwrap();
    let mut info = BootstrapInfo {
        configurations: vec![ConfigurationInfo::default()],
        ..Default::default()
    };
    info.save(tmp.path(), DEFAULT_ENVIRONMENT_NAME).unwrap();

    let loaded = BootstrapInfo::load(tmp.path(), DEFAULT_ENVIRONMENT_NAME).unwrap();
    let before = BootstrapInfo::digest(tmp.path(), DEFAULT_ENVIRONMENT_NAME).unwrap();
    assert_eq!(loaded.source_digest.as_deref(), Some(before.as_str()));

    info.configurations[0]
        .version_specs
        .tools
        .push(VersionInfo::new("cmake", "3.26"));
    info.save(tmp.path(), DEFAULT_ENVIRONMENT_NAME).unwrap();

    let after = BootstrapInfo::digest(tmp.path(), DEFAULT_ENVIRONMENT_NAME).unwrap();
    assert_ne!(before, after);
}
