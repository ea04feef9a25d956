// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Verify that a repository and its dependencies match the captured
//! fingerprint.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use spboot::FingerprintChangeKind;

/// Verify that nothing changed since setup
#[derive(Debug, Args)]
pub struct CmdCheck {
    /// Repository root
    #[clap(default_value = ".")]
    path: PathBuf,

    /// Configuration to check
    #[clap(short = 'c', long)]
    configuration: Option<String>,

    /// Exit with error on mismatch
    #[clap(long)]
    strict: bool,

    #[clap(flatten)]
    env: crate::EnvFlags,
}

impl CmdCheck {
    pub fn run(&mut self) -> Result<i32> {
        let root = dunce::canonicalize(&self.path).into_diagnostic()?;
        let info = spboot::BootstrapInfo::load(&root, self.env.environment())?;
        let configuration = self.configuration.as_deref();
        let Some(config) = info.configuration(configuration) else {
            return Err(spboot::Error::UnknownConfiguration {
                configuration: configuration.unwrap_or("<None>").to_string(),
                root,
                referenced_by: "<root>".to_string(),
                valid: info.configuration_names(),
            }
            .into());
        };

        let changes = match spboot::validate_fingerprint(&root, config) {
            Ok(()) => {
                println!("{} Environment matches the captured fingerprint", "✓".green());
                return Ok(0);
            }
            Err(spboot::Error::StaleEnvironment { changes, .. }) => changes,
            Err(err) => return Err(err.into()),
        };

        if self.strict {
            eprintln!("Error: Environment differs from the captured fingerprint:");
        } else {
            println!("Warning: Environment differs from the captured fingerprint:");
        }

        for change in &changes {
            let kind = match change.kind {
                FingerprintChangeKind::Identical => continue,
                FingerprintChangeKind::Added => change.kind.to_string().green(),
                FingerprintChangeKind::Removed => change.kind.to_string().red(),
                FingerprintChangeKind::Modified => change.kind.to_string().yellow(),
            };
            println!("  - {} {}", change.key, kind);
        }

        if self.strict {
            return Ok(1);
        }

        println!("\nRun 'spboot setup' to capture the fingerprint again");
        Ok(0)
    }
}
