// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

fn init(path: PathBuf, configurations: &[&str]) -> CmdInit {
    CmdInit {
        path,
        name: Some("MyRepo".to_string()),
        configurations: configurations.iter().map(|c| c.to_string()).collect(),
        mixin: false,
        env: crate::EnvFlags::default(),
    }
}

#[rstest]
fn test_init_creates_marker_and_descriptor() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("repo");

    let code = init(root.clone(), &["debug", "release"]).run().unwrap();
    assert_eq!(code, 0);

    let repo = spboot::Repository::create(&root, None).unwrap();
    assert_eq!(repo.name, "MyRepo");
    assert_eq!(repo.id.len(), 32);

    let info = spboot::BootstrapInfo::load(&root, spboot::DEFAULT_ENVIRONMENT_NAME).unwrap();
    assert!(info.is_configurable());
    assert_eq!(info.configuration_names(), vec!["debug", "release"]);
}

#[rstest]
fn test_init_unconfigured() {
    let tmp = TempDir::new().unwrap();

    init(tmp.path().to_path_buf(), &[]).run().unwrap();

    let info = spboot::BootstrapInfo::load(tmp.path(), spboot::DEFAULT_ENVIRONMENT_NAME).unwrap();
    assert!(!info.is_configurable());
    assert!(info.configuration(None).is_some());
}

#[rstest]
fn test_init_twice_fails() {
    let tmp = TempDir::new().unwrap();

    init(tmp.path().to_path_buf(), &[]).run().unwrap();
    assert!(init(tmp.path().to_path_buf(), &[]).run().is_err());
}
