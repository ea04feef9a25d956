// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Repository identity, as recorded in the `__RepositoryId__` marker.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, REPOSITORY_ID_FILENAME};

#[cfg(test)]
#[path = "./repository_test.rs"]
mod repository_test;

const NAME_PREFIX: &str = "Friendly Name:";
const ID_PREFIX: &str = "Id:";

/// A repository bound to a root on disk and an optional configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Repository {
    pub id: String,
    pub name: String,
    pub root: PathBuf,
    pub configuration: Option<String>,
    /// Updated from the bootstrap descriptor once the repository is visited.
    pub is_mixin_repo: bool,
}

impl Repository {
    /// Identify the repository rooted at `root`.
    ///
    /// The root is canonicalized so that two references to the same
    /// directory always compare equal.
    pub fn create<P: AsRef<Path>>(root: P, configuration: Option<String>) -> crate::Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::NotADirectory(root.to_path_buf()));
        }
        let root = dunce::canonicalize(root)?;
        let (name, id) = read_repository_id(&root)?;

        Ok(Self {
            id,
            name,
            root,
            configuration,
            is_mixin_repo: false,
        })
    }

    /// Short description used in diagnostics: `name <id> [root]`.
    pub fn display_name(&self) -> String {
        format!("{} <{}> [{}]", self.name, self.id, self.root.display())
    }
}

/// Read the friendly name and id from the marker in `root`.
pub fn read_repository_id(root: &Path) -> crate::Result<(String, String)> {
    let path = root.join(REPOSITORY_ID_FILENAME);
    if !path.is_file() {
        return Err(Error::RepositoryIdNotFound(root.to_path_buf()));
    }
    let content = std::fs::read_to_string(&path).map_err(|e| Error::ReadFailed {
        path: path.clone(),
        error: e,
    })?;

    let mut name = None;
    let mut id = None;
    for line in content.lines().map(str::trim) {
        if let Some(value) = line.strip_prefix(NAME_PREFIX) {
            name = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix(ID_PREFIX) {
            id = Some(value.trim().to_string());
        }
    }

    let invalid = |reason: &str| Error::InvalidRepositoryId {
        path: path.clone(),
        reason: reason.to_string(),
    };
    let name = name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| invalid("missing friendly name"))?;
    let id = id.filter(|i| !i.is_empty()).ok_or_else(|| invalid("missing id"))?;
    Ok((name, id))
}

/// Write the identity marker for a repository.
pub fn write_repository_id(root: &Path, name: &str, id: &str) -> crate::Result<PathBuf> {
    let path = root.join(REPOSITORY_ID_FILENAME);
    let content = format!(
        "This file is used to uniquely identify this repository for the purposes of dependency management.\n\
         Other repositories that depend on this one will search for this file upon initial setup and\n\
         generate information that can be used when activating development environments.\n\
         \n\
         **** PLEASE DO NOT MODIFY, REMOVE, OR RENAME THIS FILE, AS DOING SO WILL LIKELY BREAK OTHER REPOSITORIES! ****\n\
         \n\
         {NAME_PREFIX}      {name}\n\
         {ID_PREFIX}                 {id}\n"
    );
    std::fs::write(&path, content)?;
    Ok(path)
}

/// Generate a new 32 digit hex id for a repository.
pub fn generate_repository_id() -> String {
    format!("{:032X}", u128::from(ulid::Ulid::new()))
}
