// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `spboot setup` command.

use std::path::PathBuf;

use clap::Args;
use miette::{IntoDiagnostic, Result};

/// Capture fingerprints and cache activation data
#[derive(Debug, Args)]
pub struct CmdSetup {
    /// Repository root
    #[clap(default_value = ".")]
    path: PathBuf,

    /// Configuration to resolve and cache after capturing fingerprints
    #[clap(short = 'c', long)]
    configuration: Option<String>,

    /// Cache a fast environment
    #[clap(long)]
    fast: bool,

    /// Only capture fingerprints
    #[clap(long)]
    no_cache: bool,

    #[clap(flatten)]
    env: crate::EnvFlags,
}

impl CmdSetup {
    pub fn run(&mut self) -> Result<i32> {
        let root = dunce::canonicalize(&self.path).into_diagnostic()?;
        let environment = self.env.environment();

        let mut info = spboot::BootstrapInfo::load(&root, environment)?;
        info.refresh_fingerprints(&root)?;
        let path = info.save(&root, environment)?;
        tracing::info!(path = %path.display(), "captured fingerprints");
        println!("Updated fingerprints in {:?}", path);

        if self.no_cache {
            return Ok(0);
        }
        if info.is_configurable() && self.configuration.is_none() {
            println!(
                "Pass --configuration to cache activation data (one of: {})",
                info.configuration_names().join(", ")
            );
            return Ok(0);
        }

        let data = spboot::ActivationData::resolve(
            &root,
            self.configuration.as_deref(),
            self.fast,
            environment,
        )?;
        let cache = data.save(environment)?;
        println!(
            "Cached activation data for {} repositories in {:?}",
            data.prioritized_repositories.len(),
            cache
        );

        Ok(0)
    }
}
