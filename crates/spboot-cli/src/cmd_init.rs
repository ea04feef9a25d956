// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `spboot init` command.

use std::path::PathBuf;

use clap::Args;
use miette::{IntoDiagnostic, Result};

#[cfg(test)]
#[path = "./cmd_init_test.rs"]
mod cmd_init_test;

/// Create the identity marker and an initial bootstrap descriptor
#[derive(Debug, Args)]
pub struct CmdInit {
    /// Repository root
    #[clap(default_value = ".")]
    path: PathBuf,

    /// Friendly name of the repository (defaults to the directory name)
    #[clap(long)]
    name: Option<String>,

    /// Declare a named configuration (repeatable)
    #[clap(short = 'c', long = "configuration")]
    configurations: Vec<String>,

    /// Mark the repository as a mixin
    #[clap(long)]
    mixin: bool,

    #[clap(flatten)]
    env: crate::EnvFlags,
}

impl CmdInit {
    pub fn run(&mut self) -> Result<i32> {
        std::fs::create_dir_all(&self.path).into_diagnostic()?;
        let root = dunce::canonicalize(&self.path).into_diagnostic()?;

        let marker = root.join(spboot::REPOSITORY_ID_FILENAME);
        if marker.exists() {
            return Err(miette::miette!(
                "{} already exists at {:?}",
                spboot::REPOSITORY_ID_FILENAME,
                marker
            ));
        }

        let name = match &self.name {
            Some(name) => name.clone(),
            None => root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or_else(|| miette::miette!("Cannot derive a name from {:?}", root))?,
        };
        let id = spboot::generate_repository_id();
        spboot::write_repository_id(&root, &name, &id)?;
        println!("Created {:?} for {name} <{id}>", marker);

        let environment = self.env.environment();
        let descriptor = spboot::BootstrapInfo::path(&root, environment);
        if descriptor.exists() {
            println!("Keeping existing descriptor at {:?}", descriptor);
        } else {
            let path = self.initial_descriptor().save(&root, environment)?;
            println!("Created {:?}", path);
        }

        println!();
        println!("Next steps:");
        println!("  1. Add dependencies and version requirements to the descriptor");
        println!("  2. Run 'spboot setup' to capture the repository fingerprint");
        println!("  3. Run 'spboot activate' to resolve the environment");

        Ok(0)
    }

    fn initial_descriptor(&self) -> spboot::BootstrapInfo {
        let configurations = if self.configurations.is_empty() {
            vec![spboot::ConfigurationInfo::default()]
        } else {
            self.configurations
                .iter()
                .map(|name| spboot::ConfigurationInfo {
                    name: Some(name.clone()),
                    ..Default::default()
                })
                .collect()
        };

        spboot::BootstrapInfo {
            mixin: self.mixin,
            configurations,
            ..Default::default()
        }
    }
}
