//! Docker registry pull secret generation.

use crate::error::{ProviderError, Result};
use crate::exec::{CommandLine, Invocation, KUBECTL_BINARY, OutputChannel};
use crate::provider::Provider;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Contents of a `docker-registry` secret.
#[derive(Clone, PartialEq, Eq)]
pub struct PullSecret {
    pub name: String,
    pub namespace: String,
    pub server: String,
    pub username: String,
    pub password: String,
}

impl PullSecret {
    fn command_line(&self) -> CommandLine {
        CommandLine::new("create")
            .positional("secret")
            .positional("docker-registry")
            .positional(&self.name)
            .flag("--namespace", &self.namespace)
            .assigned("--docker-server", &self.server)
            .assigned("--docker-username", &self.username)
            .secret_assigned("--docker-password", &self.password)
            .positional("--dry-run=client")
            .positional("--output=json")
    }
}

impl fmt::Debug for PullSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PullSecret")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("server", &self.server)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Render `secret` with `kubectl create secret docker-registry --dry-run` and
/// write the manifest to `dest_dir/file_name`.
///
/// The manifest carries the registry password, so kubectl's stdout is
/// captured rather than logged.
pub fn create_pull_secret(
    provider: &Provider,
    secret: &PullSecret,
    dest_dir: &Path,
    file_name: &str,
) -> Result<PathBuf> {
    let invocation = Invocation::new(KUBECTL_BINARY, secret.command_line())
        .output(OutputChannel::Stdout);
    let completed = provider.run(&invocation)?;

    std::fs::create_dir_all(dest_dir).map_err(|e| {
        ProviderError::IoError(format!(
            "failed to create directory '{}': {}",
            dest_dir.display(),
            e
        ))
    })?;

    let dest = dest_dir.join(file_name);
    std::fs::write(&dest, completed.payload().unwrap_or_default()).map_err(|e| {
        ProviderError::IoError(format!(
            "failed to write secret '{}': {}",
            dest.display(),
            e
        ))
    })?;

    debug!("Pull secret written to {}", dest.display());
    Ok(dest)
}
