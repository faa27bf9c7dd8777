//! Plan file model.

use crate::config::ProviderConfig;
use crate::data::{DataSource, MetadataClusterConfig, MetadataPackagesConfig, RepoConfigSource};
use crate::error::{ProviderError, Result};
use crate::resources::{
    MetadataConfig, ModuleConfig, NamespaceConfig, PullSecretConfig, RbacConfig, RepoConfig,
    Resource, SealSecretsConfig, ServiceAccountConfig,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One resource entry, tagged by `resource: <kind>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "resource")]
pub enum ResourceSpec {
    #[serde(rename = "gitops_repo")]
    Repo(RepoConfig),
    #[serde(rename = "gitops_module")]
    Module(ModuleConfig),
    #[serde(rename = "gitops_namespace")]
    Namespace(NamespaceConfig),
    #[serde(rename = "gitops_service_account")]
    ServiceAccount(ServiceAccountConfig),
    #[serde(rename = "gitops_rbac")]
    Rbac(RbacConfig),
    #[serde(rename = "gitops_pull_secret")]
    PullSecret(PullSecretConfig),
    #[serde(rename = "gitops_seal_secrets")]
    SealSecrets(SealSecretsConfig),
    #[serde(rename = "gitops_metadata")]
    Metadata(MetadataConfig),
}

impl ResourceSpec {
    pub fn as_resource(&self) -> &dyn Resource {
        match self {
            ResourceSpec::Repo(r) => r,
            ResourceSpec::Module(r) => r,
            ResourceSpec::Namespace(r) => r,
            ResourceSpec::ServiceAccount(r) => r,
            ResourceSpec::Rbac(r) => r,
            ResourceSpec::PullSecret(r) => r,
            ResourceSpec::SealSecrets(r) => r,
            ResourceSpec::Metadata(r) => r,
        }
    }
}

/// One data source entry, tagged by `source: <kind>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "source")]
pub enum DataSpec {
    #[serde(rename = "gitops_repo_config")]
    RepoConfig(RepoConfigSource),
    #[serde(rename = "gitops_metadata_cluster")]
    MetadataCluster(MetadataClusterConfig),
    #[serde(rename = "gitops_metadata_packages")]
    MetadataPackages(MetadataPackagesConfig),
}

impl DataSpec {
    pub fn as_data_source(&self) -> &dyn DataSource {
        match self {
            DataSpec::RepoConfig(d) => d,
            DataSpec::MetadataCluster(d) => d,
            DataSpec::MetadataPackages(d) => d,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Plan {
    pub provider: ProviderConfig,
    pub resources: BTreeMap<String, ResourceSpec>,
    pub data: BTreeMap<String, DataSpec>,
}

impl Plan {
    /// Load a plan from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::UserError(format!(
                "failed to read plan file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse a plan and validate its provider block.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let plan: Plan = serde_yaml::from_str(yaml)
            .map_err(|e| ProviderError::UserError(format!("failed to parse plan YAML: {}", e)))?;

        plan.provider.validate()?;
        Ok(plan)
    }

    /// `kind.name` for the resource called `name`.
    pub fn resource_address(&self, name: &str) -> Option<String> {
        self.resources
            .get(name)
            .map(|spec| format!("{}.{}", spec.as_resource().kind(), name))
    }

    /// `data.kind.name` for the data source called `name`.
    pub fn data_address(&self, name: &str) -> Option<String> {
        self.data
            .get(name)
            .map(|spec| format!("data.{}.{}", spec.as_data_source().kind(), name))
    }
}
