//! Provider service object and diagnostics.
//!
//! A [`Provider`] owns the resolved configuration, the executor and a handle
//! to the shared [`MutexKv`]. Every resource and data source operation takes
//! the provider by reference; nothing reaches for global state.

use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use crate::exec::{CommandLine, Completed, EnvOverlay, Executor, GITOPS_BINARY, Invocation};
use crate::mutex::{LockKey, MutexKv};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Shared context for resource and data source operations.
#[derive(Debug, Clone)]
pub struct Provider {
    config: ProviderConfig,
    locks: Arc<MutexKv>,
    executor: Executor,
}

impl Provider {
    /// Create a provider using `locks` for serialization.
    pub fn new(config: ProviderConfig, locks: Arc<MutexKv>) -> Self {
        let executor = Executor::new(&config.bin_dir);
        Self {
            config,
            locks,
            executor,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn locks(&self) -> &MutexKv {
        &self.locks
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Run `invocation` while holding the lock for `key`.
    ///
    /// The guard lives on this frame, so the lock is released however the
    /// run ends, including a panic.
    pub fn run_locked(&self, key: &LockKey, invocation: &Invocation) -> Result<Completed> {
        let _guard = self.locks.lock(key);
        self.executor.run(invocation)
    }

    /// Run `invocation` without taking a lock.
    pub fn run(&self, invocation: &Invocation) -> Result<Completed> {
        self.executor.run(invocation)
    }

    /// An invocation of the GitOps tool in the provider's debug mode.
    pub fn gitops(&self, command: CommandLine, env: EnvOverlay) -> Invocation {
        Invocation::new(GITOPS_BINARY, command)
            .env(env)
            .debug(self.config.debug)
    }

    /// Append the provider-level `--lock`, `--caCert` and `--debug` flags.
    pub fn content_flags(&self, command: CommandLine) -> CommandLine {
        command
            .optional("--lock", &self.config.lock)
            .optional("--caCert", &self.config.ca_cert_file)
            .flag_if("--debug", "true", self.config.debug)
    }

    /// Environment for commands that write to a GitOps repository.
    pub fn git_env(&self, credentials: &str, gitops_config: &str) -> EnvOverlay {
        EnvOverlay::new()
            .var("GIT_CREDENTIALS", credentials)
            .var("GITOPS_CONFIG", gitops_config)
            .with_git_identity(&self.config.git_email, &self.config.git_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// User-facing report of one operation's failure or caveat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    /// Resource or data source address the diagnostic belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Diagnostic {
    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            address: None,
        }
    }

    /// Attach the address of the failing resource.
    pub fn at(mut self, address: &str) -> Self {
        self.address = Some(address.to_string());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<&ProviderError> for Diagnostic {
    fn from(err: &ProviderError) -> Self {
        Self {
            severity: Severity::Error,
            summary: err.summary().to_string(),
            detail: err.to_string(),
            address: None,
        }
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(err: ProviderError) -> Self {
        Self::from(&err)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
        };

        match &self.address {
            Some(address) => write!(
                f,
                "{}: {} ({}): {}",
                severity, self.summary, address, self.detail
            ),
            None => write!(f, "{}: {}: {}", severity, self.summary, self.detail),
        }
    }
}
