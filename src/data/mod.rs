//! Data sources: read-only lookups against the GitOps repository.
//!
//! Each kind is a typed configuration struct implementing [`DataSource`].
//! Identifiers are built from the inputs, so reading the same source twice
//! yields the same state.

mod metadata;
mod repo_config;

#[cfg(test)]
mod tests;

use crate::error::Result;
use crate::provider::Provider;
use crate::resources::ResourceState;

// Re-export public API
pub use metadata::{
    ClusterMetadata, GitopsMetadata, MetadataClusterConfig, MetadataPackagesConfig, Package,
    filter_packages,
};
pub use repo_config::RepoConfigSource;

/// A lookup evaluated before resources are applied.
pub trait DataSource {
    /// Type name as written in plan files, e.g. `gitops_metadata_cluster`.
    fn kind(&self) -> &'static str;

    fn read(&self, provider: &Provider) -> Result<ResourceState>;
}
