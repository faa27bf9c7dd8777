//! Subprocess orchestration for the igc tool and its companions.
//!
//! Provides a declarative argument builder, an environment overlay that is
//! safe to log, and an executor that streams output into the log sink while
//! the process runs. All external commands go through this module.

mod args;
mod env;
mod runner;


// Re-export public API
pub use args::CommandLine;
pub use env::{EnvOverlay, REDACTED, SENSITIVE_VARS};
pub use runner::{Completed, Executor, Invocation, OutputChannel};

/// Name of the GitOps command-line tool.
pub const GITOPS_BINARY: &str = "igc";

/// Name of the Kubernetes command-line tool.
pub const KUBECTL_BINARY: &str = "kubectl";

/// Name of the sealed-secrets command-line tool.
pub const KUBESEAL_BINARY: &str = "kubeseal";
