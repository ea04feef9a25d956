// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `spboot show` command.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};

/// Display the bootstrap descriptor of a repository
#[derive(Debug, Args)]
pub struct CmdShow {
    /// Repository root
    #[clap(default_value = ".")]
    path: PathBuf,

    /// Show the captured fingerprints
    #[clap(long)]
    fingerprints: bool,

    /// Output format: table, json
    #[clap(long, default_value = "table")]
    format: String,

    #[clap(flatten)]
    env: crate::EnvFlags,
}

impl CmdShow {
    pub fn run(&mut self) -> Result<i32> {
        let repo = spboot::Repository::create(&self.path, None)?;
        let info = spboot::BootstrapInfo::load(&repo.root, self.env.environment())?;

        if self.format == "json" {
            println!("{}", serde_json::to_string_pretty(&info).into_diagnostic()?);
            return Ok(0);
        }

        println!(
            "{} {} <{}>",
            "Repository:".bold(),
            repo.name.green(),
            repo.id.dimmed()
        );
        println!("  {}", repo.root.display());
        if info.mixin {
            println!("  {}", "mixin".yellow());
        }
        if let Some(path) = &info.source_path {
            println!("  Descriptor: {}", path.display().to_string().cyan());
        }

        for config in &info.configurations {
            println!();
            println!(
                "{} {}",
                "Configuration:".bold(),
                config.name.as_deref().unwrap_or("<None>").cyan()
            );

            if config.dependencies.is_empty() {
                println!("  {}", "(no dependencies)".dimmed());
            }
            for dependency in &config.dependencies {
                match &dependency.configuration {
                    Some(cfg) => println!("  -> {} [{}]", dependency.root, cfg.yellow()),
                    None => println!("  -> {}", dependency.root),
                }
            }

            for tool in &config.version_specs.tools {
                println!("  tool {} {}", tool.name.green(), tool.version);
            }
            for (language, libraries) in &config.version_specs.libraries {
                for library in libraries {
                    println!("  {language} {} {}", library.name.green(), library.version);
                }
            }

            if !config.ignore_conflicted_repository_names.is_empty() {
                println!(
                    "  ignoring repository conflicts: {}",
                    config.ignore_conflicted_repository_names.join(", ")
                );
            }
            if !config.ignore_conflicted_library_names.is_empty() {
                println!(
                    "  ignoring library conflicts: {}",
                    config.ignore_conflicted_library_names.join(", ")
                );
            }

            if config.fingerprint.is_empty() {
                println!("  {}", "not set up".red());
            } else if self.fingerprints {
                for (key, signature) in &config.fingerprint {
                    println!("  {:<40} {}", key, signature.dimmed());
                }
            }
        }

        Ok(0)
    }
}
