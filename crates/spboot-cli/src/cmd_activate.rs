// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `spboot activate` command.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};

#[cfg(test)]
#[path = "./cmd_activate_test.rs"]
mod cmd_activate_test;

/// Resolve the environment of a repository
#[derive(Debug, Args)]
pub struct CmdActivate {
    /// Repository root (defaults to the activated repository)
    path: Option<PathBuf>,

    /// Configuration to activate
    #[clap(short = 'c', long)]
    configuration: Option<String>,

    /// Activate a fast environment
    #[clap(long)]
    fast: bool,

    /// Ignore cached data and the activated environment
    #[clap(long)]
    force: bool,

    /// Output format: table, json, exports
    #[clap(long, default_value = "table")]
    format: String,

    #[clap(flatten)]
    env: crate::EnvFlags,
}

impl CmdActivate {
    pub fn run(&mut self) -> Result<i32> {
        let ctx = self.env.context();
        let data = spboot::ActivationData::load(
            self.path.as_deref(),
            self.configuration.as_deref(),
            self.fast,
            self.force,
            &ctx,
        )?;

        match self.format.as_str() {
            "json" => {
                println!("{}", serde_json::to_string_pretty(&data).into_diagnostic()?);
            }
            "exports" => print!("{}", format_exports(&data, &ctx.environment)),
            _ => self.show_table(&data, &ctx.environment),
        }

        Ok(0)
    }

    fn show_table(&self, data: &spboot::ActivationData, environment: &str) {
        println!(
            "{} {}",
            "Activated:".bold(),
            data.root.display().to_string().cyan()
        );
        println!(
            "  Configuration: {}",
            data.configuration.as_deref().unwrap_or("<None>")
        );
        if data.is_fast_environment {
            println!("  {}", "fast environment".yellow());
        }
        let cache = spboot::ActivationData::cache_path(
            &data.root,
            data.configuration.as_deref(),
            data.is_fast_environment,
            environment,
        );
        if let Some(at) = spboot::cached_at(&cache) {
            println!("  Cached: {}", at.format("%Y-%m-%d %H:%M:%S UTC").to_string().dimmed());
        }

        println!();
        println!("{}", "Repositories:".bold());
        for (i, repo) in data.prioritized_repositories.iter().enumerate() {
            let mixin = if repo.is_mixin_repo { " [mixin]" } else { "" };
            println!(
                "  {}. {} <{}>{}",
                i + 1,
                repo.name.green(),
                repo.id.dimmed(),
                mixin.yellow()
            );
            println!("     {}", repo.root.display());
        }

        if !data.version_specs.tools.is_empty() {
            println!();
            println!("{}", "Tools:".bold());
            for tool in &data.version_specs.tools {
                println!("  {} {}", tool.name.cyan(), tool.version);
            }
        }

        for (language, libraries) in &data.version_specs.libraries {
            println!();
            println!("{}", format!("{language} Libraries:").bold());
            for library in libraries {
                let ignored = if data.ignore_conflicted_library_names.contains(&library.name) {
                    " [conflicts ignored]"
                } else {
                    ""
                };
                println!("  {} {}{}", library.name.cyan(), library.version, ignored.yellow());
            }
        }
    }
}

/// Shell statements that mark `data` as the activated environment.
fn format_exports(data: &spboot::ActivationData, environment: &str) -> String {
    let mut out = format!(
        "export {}={}\n",
        spboot::DE_REPO_ROOT_NAME,
        quote(&data.root.display().to_string())
    );
    match &data.configuration {
        Some(configuration) => out.push_str(&format!(
            "export {}={}\n",
            spboot::DE_REPO_CONFIGURATION_NAME,
            quote(configuration)
        )),
        None => out.push_str(&format!("unset {}\n", spboot::DE_REPO_CONFIGURATION_NAME)),
    }
    out.push_str(&format!(
        "export {}={}\n",
        spboot::DE_ENVIRONMENT_NAME,
        quote(environment)
    ));
    out
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
