// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Content fingerprints used to detect changes made since setup.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::{ConfigurationInfo, Error, GENERATED_DIRECTORY_NAME};

#[cfg(test)]
#[path = "./fingerprint_test.rs"]
mod fingerprint_test;

/// Directories that never contribute to a fingerprint.
const SKIPPED_DIRECTORIES: &[&str] = &[GENERATED_DIRECTORY_NAME, ".git", ".hg", ".svn"];

/// Signature recorded for paths that do not exist.
pub const MISSING_SIGNATURE: &str = "missing";

/// Calculate a signature for each of `paths`.
///
/// Keys are the paths relative to `base_path`, using `/` as the separator.
pub fn calculate_fingerprint<P: AsRef<Path>>(
    paths: &[P],
    base_path: &Path,
) -> crate::Result<BTreeMap<String, String>> {
    let mut fingerprint = BTreeMap::new();
    for path in paths {
        let path = path.as_ref();
        let signature = if path.is_dir() {
            hash_tree(path)?
        } else {
            MISSING_SIGNATURE.to_string()
        };
        fingerprint.insert(fingerprint_key(path, base_path), signature);
    }
    Ok(fingerprint)
}

/// Paths covered by the fingerprint of a configuration: the repository
/// itself followed by the roots of its direct dependencies.
pub fn fingerprint_paths(root: &Path, config: &ConfigurationInfo) -> crate::Result<Vec<PathBuf>> {
    let mut paths = vec![root.to_path_buf()];
    for dependency in &config.dependencies {
        let dep_root = dependency
            .resolve_root(root)
            .map_err(|e| Error::DependencyNotFound {
                reference: dependency.root.clone(),
                referenced_by: root.display().to_string(),
                error: e,
            })?;
        paths.push(dep_root);
    }
    Ok(paths)
}

/// Check the fingerprint captured for `config` against the file system.
pub fn validate_fingerprint(root: &Path, config: &ConfigurationInfo) -> crate::Result<()> {
    let paths = fingerprint_paths(root, config)?;
    let calculated = calculate_fingerprint(&paths, root)?;
    let changes = compare_fingerprints(&config.fingerprint, &calculated);
    if changes.is_empty() {
        return Ok(());
    }

    tracing::debug!(root = %root.display(), ?changes, "fingerprint mismatch");
    Err(Error::StaleEnvironment {
        root: root.to_path_buf(),
        changes,
    })
}

/// Hash every file below `root`, in a stable order.
fn hash_tree(root: &Path) -> crate::Result<String> {
    let mut hasher = Sha256::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.depth() > 0
                && e.file_type().is_dir()
                && SKIPPED_DIRECTORIES.iter().any(|s| e.file_name() == *s))
        });

    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let content = std::fs::read(entry.path())?;

        hasher.update(to_key(relative).as_bytes());
        hasher.update([0u8]);
        hasher.update(Sha256::digest(&content));
    }

    Ok(format!("{:x}", hasher.finalize()))
}

fn fingerprint_key(path: &Path, base_path: &Path) -> String {
    match relative_path(path, base_path) {
        Some(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Some(rel) => to_key(&rel),
        None => path.display().to_string(),
    }
}

/// Express `path` relative to `base`, walking up with `..` where needed.
fn relative_path(path: &Path, base: &Path) -> Option<PathBuf> {
    if path.is_absolute() != base.is_absolute() {
        return None;
    }

    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    // Paths on different prefixes (e.g. drive letters) cannot be related.
    if path_parts.first() != base_parts.first() {
        return None;
    }

    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base_parts.len() {
        rel.push("..");
    }
    for part in &path_parts[common..] {
        rel.push(part.as_os_str());
    }
    Some(rel)
}

fn to_key(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// How a single fingerprint entry differs from the captured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintChangeKind {
    Added,
    Removed,
    Modified,
    Identical,
}

impl std::fmt::Display for FingerprintChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Added => "Added",
            Self::Removed => "Removed",
            Self::Modified => "Modified",
            Self::Identical => "Identical",
        };
        f.write_str(s)
    }
}

/// A single entry in a fingerprint comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintChange {
    pub key: String,
    pub kind: FingerprintChangeKind,
}

/// Classify every key of the two fingerprints.
///
/// Returns an empty list when they are identical, otherwise one entry for
/// every key in either fingerprint (including the identical ones) so that
/// the full picture can be reported.
pub fn compare_fingerprints(
    captured: &BTreeMap<String, String>,
    calculated: &BTreeMap<String, String>,
) -> Vec<FingerprintChange> {
    if captured == calculated {
        return Vec::new();
    }

    let mut changes = Vec::new();
    for (key, value) in calculated {
        let kind = match captured.get(key) {
            None => FingerprintChangeKind::Added,
            Some(old) if old == value => FingerprintChangeKind::Identical,
            Some(_) => FingerprintChangeKind::Modified,
        };
        changes.push(FingerprintChange {
            key: key.clone(),
            kind,
        });
    }

    for key in captured.keys() {
        if !calculated.contains_key(key) {
            changes.push(FingerprintChange {
                key: key.clone(),
                kind: FingerprintChangeKind::Removed,
            });
        }
    }

    changes
}
