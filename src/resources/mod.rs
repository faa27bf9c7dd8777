//! Resource kinds managed by the provider.
//!
//! Each kind is a typed configuration struct implementing [`Resource`].
//! Create and delete do the work; read and update return the prior state
//! because the remote side is never refreshed. Every operation validates its
//! configuration before taking a lock or starting a process.

mod metadata;
mod module;
mod namespace;
mod pull_secret;
mod rbac;
mod repo;
mod seal_secrets;
mod service_account;
pub mod types;


use crate::error::Result;
use crate::provider::Provider;

// Re-export public API
pub use metadata::MetadataConfig;
pub use module::ModuleConfig;
pub use namespace::NamespaceConfig;
pub use pull_secret::PullSecretConfig;
pub use rbac::{RbacConfig, RbacRole, RbacRule};
pub use repo::{GitCredential, GitopsConfigResult, RepoConfig, RepoResult};
pub use seal_secrets::SealSecretsConfig;
pub use service_account::ServiceAccountConfig;
pub use types::{ContentSource, GitopsTarget, Layer, ModuleType, ResourceState};

/// Lifecycle of one resource kind.
pub trait Resource {
    /// Type name as written in plan files, e.g. `gitops_module`.
    fn kind(&self) -> &'static str;

    fn create(&self, provider: &Provider) -> Result<ResourceState>;

    fn read(&self, _provider: &Provider, prior: &ResourceState) -> Result<ResourceState> {
        Ok(prior.clone())
    }

    fn update(&self, provider: &Provider, prior: &ResourceState) -> Result<ResourceState> {
        self.read(provider, prior)
    }

    /// Remove the resource. `prior` is the state recorded by the last create,
    /// when there is one.
    fn delete(&self, provider: &Provider, prior: Option<&ResourceState>) -> Result<()>;
}
