// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! spboot - Multi-Repository Development Environment Bootstrap CLI

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;

mod cmd_activate;
mod cmd_check;
mod cmd_init;
mod cmd_setup;
mod cmd_show;

use cmd_activate::CmdActivate;
use cmd_check::CmdCheck;
use cmd_init::CmdInit;
use cmd_setup::CmdSetup;
use cmd_show::CmdShow;

#[derive(Parser)]
#[clap(
    name = "spboot",
    about = "Multi-Repository Development Environment Bootstrap",
    version,
    long_about = "Resolve and activate development environments that span several repositories"
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[clap(short, long, global = true)]
    quiet: bool,
}

/// Describes the environment that is currently activated, usually set by
/// the shell that activated it.
#[derive(Parser, Clone, Debug, Default)]
pub struct EnvFlags {
    /// Root of the activated repository
    #[clap(long = "activated-root", env = spboot::DE_REPO_ROOT_NAME)]
    pub activated_root: Option<PathBuf>,

    /// Configuration of the activated repository
    #[clap(long = "activated-configuration", env = spboot::DE_REPO_CONFIGURATION_NAME)]
    pub activated_configuration: Option<String>,

    /// Name of the generated environment directory
    #[clap(long = "environment", env = spboot::DE_ENVIRONMENT_NAME)]
    pub environment: Option<String>,
}

impl EnvFlags {
    pub fn environment(&self) -> &str {
        self.environment
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or(spboot::DEFAULT_ENVIRONMENT_NAME)
    }

    pub fn context(&self) -> spboot::ActivationContext {
        spboot::ActivationContext {
            activated_root: self
                .activated_root
                .clone()
                .filter(|p| !p.as_os_str().is_empty()),
            activated_configuration: self
                .activated_configuration
                .clone()
                .filter(|c| !c.is_empty()),
            environment: self.environment().to_string(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create the identity marker and an initial bootstrap descriptor
    Init(CmdInit),

    /// Capture fingerprints and cache activation data
    Setup(CmdSetup),

    /// Resolve the environment of a repository
    Activate(CmdActivate),

    /// Display the bootstrap descriptor of a repository
    Show(CmdShow),

    /// Verify that nothing changed since setup
    Check(CmdCheck),
}

impl Opt {
    fn run(self) -> Result<i32> {
        // Setup logging
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .init();

        // Dispatch to command
        match self.cmd {
            Command::Init(mut cmd) => cmd.run(),
            Command::Setup(mut cmd) => cmd.run(),
            Command::Activate(mut cmd) => cmd.run(),
            Command::Show(mut cmd) => cmd.run(),
            Command::Check(mut cmd) => cmd.run(),
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    let code = opt.run()?;
    std::process::exit(code);
}
