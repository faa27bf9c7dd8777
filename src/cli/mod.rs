//! CLI argument parsing for gitops-provider.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::config::ConfigOverrides;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// gitops-provider: bootstrap and populate GitOps repositories with igc.
///
/// A plan file lists the provider settings, the resources to manage and the
/// data sources to read:
/// - resources are created or destroyed concurrently
/// - operations on the same repository are serialized
/// - results are recorded in a JSON state file
#[derive(Parser, Debug)]
#[command(name = "gitops-provider")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Provider settings that override the plan's `provider:` block.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Directory holding igc, kubectl and kubeseal.
    #[arg(long, global = true, env = "GITOPS_BIN_DIR")]
    pub bin_dir: Option<String>,

    /// Log subprocess output at debug level and pass --debug to igc.
    #[arg(long, global = true, env = "GITOPS_DEBUG")]
    pub debug: bool,

    /// Lock mode passed to igc as --lock.
    #[arg(long, global = true, env = "GITOPS_LOCK")]
    pub lock: Option<String>,

    /// Base64-encoded CA certificate for the git server.
    #[arg(long, global = true, env = "GITOPS_CA_CERT")]
    pub ca_cert: Option<String>,

    /// Path to a PEM CA certificate for the git server.
    #[arg(long, global = true, env = "GITOPS_CA_CERT_FILE")]
    pub ca_cert_file: Option<String>,

    /// Default git username.
    #[arg(long, global = true, env = "GIT_USERNAME")]
    pub username: Option<String>,

    /// Default git token.
    #[arg(long, global = true, env = "GIT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl GlobalArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bin_dir: self.bin_dir.clone(),
            username: self.username.clone(),
            token: self.token.clone(),
            lock: self.lock.clone(),
            ca_cert: self.ca_cert.clone(),
            ca_cert_file: self.ca_cert_file.clone(),
            debug: self.debug,
        }
    }
}

/// Available commands for gitops-provider.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read data sources, then create every resource in the plan.
    ///
    /// Resources with prior state are updated instead of created.
    Apply(ApplyArgs),

    /// Delete every resource in the plan.
    ///
    /// Prior state is used where a resource needs it, e.g. to tell whether a
    /// repository was created or adopted.
    Destroy(DestroyArgs),

    /// Evaluate data sources only and print their state.
    Read(ReadArgs),
}

/// Arguments for the `apply` command.
#[derive(Parser, Debug)]
pub struct ApplyArgs {
    /// Plan file (YAML).
    pub plan: PathBuf,

    /// State file to read prior state from and write results to. Without it
    /// the state is printed to stdout.
    #[arg(long)]
    pub state: Option<PathBuf>,
}

/// Arguments for the `destroy` command.
#[derive(Parser, Debug)]
pub struct DestroyArgs {
    /// Plan file (YAML).
    pub plan: PathBuf,

    /// State file written by a previous apply.
    #[arg(long)]
    pub state: Option<PathBuf>,
}

/// Arguments for the `read` command.
#[derive(Parser, Debug)]
pub struct ReadArgs {
    /// Plan file (YAML).
    pub plan: PathBuf,
}
