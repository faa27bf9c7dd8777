//! ProviderConfig struct definition and default implementation.

use super::types::*;
use crate::exec::REDACTED;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider-level settings shared by every resource and data source.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    // =========================================================================
    // Tooling
    // =========================================================================
    /// Directory holding igc, kubectl and kubeseal. Empty means `PATH` lookup;
    /// a relative directory is searched ahead of `PATH`.
    pub bin_dir: String,

    /// Lock mode passed to the GitOps tool as `--lock` (default: "branch").
    #[serde(default = "default_lock")]
    pub lock: String,

    /// Log subprocess output at debug and pass `--debug` to the GitOps tool.
    pub debug: bool,

    // =========================================================================
    // Git credentials
    // =========================================================================
    /// Default git host for repositories.
    pub host: String,

    /// Default git username.
    pub username: String,

    /// Default git token.
    pub token: String,

    /// Base64-encoded CA certificate for self-signed git servers.
    pub ca_cert: String,

    /// Path to a PEM CA certificate. Takes precedence over `ca_cert`.
    pub ca_cert_file: String,

    // =========================================================================
    // Repository defaults
    // =========================================================================
    /// Default organization for repositories.
    pub org: String,

    /// Default project (Azure DevOps) for repositories.
    pub project: String,

    /// Default repository name.
    pub repo: String,

    /// Default branch (default: "main").
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Default server name (default: "default").
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Whether created repositories are public.
    pub public: bool,

    // =========================================================================
    // Commit identity
    // =========================================================================
    #[serde(default = "default_git_email")]
    pub git_email: String,

    #[serde(default = "default_git_name")]
    pub git_name: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            bin_dir: String::new(),
            lock: default_lock(),
            debug: false,
            host: String::new(),
            username: String::new(),
            token: String::new(),
            ca_cert: String::new(),
            ca_cert_file: String::new(),
            org: String::new(),
            project: String::new(),
            repo: String::new(),
            branch: default_branch(),
            server_name: default_server_name(),
            public: false,
            git_email: default_git_email(),
            git_name: default_git_name(),
        }
    }
}

// The token must not leak through `{:?}`.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.token.is_empty() { "" } else { REDACTED };

        f.debug_struct("ProviderConfig")
            .field("bin_dir", &self.bin_dir)
            .field("lock", &self.lock)
            .field("debug", &self.debug)
            .field("host", &self.host)
            .field("username", &self.username)
            .field("token", &token)
            .field("ca_cert_file", &self.ca_cert_file)
            .field("org", &self.org)
            .field("project", &self.project)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("server_name", &self.server_name)
            .field("public", &self.public)
            .field("git_email", &self.git_email)
            .field("git_name", &self.git_name)
            .finish()
    }
}

/// Values given on the command line (or through their environment
/// variables). `None` leaves the file value in place.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bin_dir: Option<String>,
    pub username: Option<String>,
    pub token: Option<String>,
    pub lock: Option<String>,
    pub ca_cert: Option<String>,
    pub ca_cert_file: Option<String>,
    /// Debug can only be switched on from the command line.
    pub debug: bool,
}
