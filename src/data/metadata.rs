//! `gitops_metadata_cluster` and `gitops_metadata_packages`: cluster facts
//! and operator packages recorded in the GitOps repository.

use super::DataSource;
use crate::error::{ProviderError, Result};
use crate::exec::{CommandLine, OutputChannel};
use crate::provider::Provider;
use crate::resources::{GitopsTarget, ResourceState};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Result of `gitops-metadata-get`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GitopsMetadata {
    pub cluster: ClusterMetadata,
    pub packages: Vec<Package>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterMetadata {
    pub default_ingress_subdomain: String,
    pub default_ingress_secret: String,
    pub kube_version: String,
    #[serde(rename = "openShiftVersion")]
    pub openshift_version: String,
    #[serde(rename = "type")]
    pub cluster_type: String,
    pub operator_namespace: String,
    pub gitops_namespace: String,
}

/// An operator package available from a catalog source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all(deserialize = "camelCase"))]
pub struct Package {
    pub package_name: String,
    pub catalog_source: String,
    pub catalog_source_namespace: String,
    pub default_channel: String,
    pub publisher: String,
    pub channels: Vec<String>,
}

/// Packages whose name matches one of `filters`, grouped in filter order.
///
/// An empty filter list returns every package. A package matching several
/// filters is listed once per filter.
pub fn filter_packages(packages: &[Package], filters: &[String]) -> Result<Vec<Package>> {
    if filters.is_empty() {
        return Ok(packages.to_vec());
    }

    let mut result = Vec::new();
    for filter in filters {
        let re = Regex::new(filter).map_err(|e| {
            ProviderError::ConfigError(format!("invalid package_name_filter '{}': {}", filter, e))
        })?;
        result.extend(
            packages
                .iter()
                .filter(|package| re.is_match(&package.package_name))
                .cloned(),
        );
    }

    Ok(result)
}

/// Run `gitops-metadata-get` for `target`.
fn read_metadata(
    provider: &Provider,
    target: &GitopsTarget,
    kube_config_path: &str,
) -> Result<GitopsMetadata> {
    target.validate()?;

    let command = CommandLine::new("gitops-metadata-get")
        .flag("--branch", &target.branch)
        .flag("--serverName", &target.server_name)
        .optional("--caCert", &provider.config().ca_cert_file)
        .flag_if("--debug", "true", provider.config().debug);
    let env = provider
        .git_env(&target.credentials, &target.config)
        .var_if_set("KUBECONFIG", kube_config_path);

    info!(
        "Retrieving gitops metadata: serverName={}",
        target.server_name
    );
    let metadata: GitopsMetadata = provider
        .run_locked(
            &target.lock_key(),
            &provider.gitops(command, env).output(OutputChannel::JsonFile),
        )?
        .json()?;
    debug!(
        "Result values from gitops metadata: {}",
        metadata.cluster.cluster_type
    );

    Ok(metadata)
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataClusterConfig {
    #[serde(default)]
    pub kube_config_path: String,

    #[serde(flatten)]
    pub target: GitopsTarget,
}

impl MetadataClusterConfig {
    /// `cluster:serverName:branch`
    pub fn id(&self) -> String {
        format!(
            "cluster:{}:{}",
            self.target.server_name, self.target.branch
        )
    }
}

impl DataSource for MetadataClusterConfig {
    fn kind(&self) -> &'static str {
        "gitops_metadata_cluster"
    }

    fn read(&self, provider: &Provider) -> Result<ResourceState> {
        let cluster = read_metadata(provider, &self.target, &self.kube_config_path)?.cluster;

        Ok(ResourceState::new(self.id())
            .with("default_ingress_subdomain", cluster.default_ingress_subdomain)
            .with("default_ingress_secret", cluster.default_ingress_secret)
            .with("cluster_type", cluster.cluster_type)
            .with("kube_version", cluster.kube_version)
            .with("openshift_version", cluster.openshift_version)
            .with("operator_namespace", cluster.operator_namespace)
            .with("gitops_namespace", cluster.gitops_namespace))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataPackagesConfig {
    /// Regular expressions matched against package names.
    #[serde(default)]
    pub package_name_filter: Vec<String>,

    #[serde(default)]
    pub kube_config_path: String,

    #[serde(flatten)]
    pub target: GitopsTarget,
}

impl MetadataPackagesConfig {
    /// `packages:serverName:branch`
    pub fn id(&self) -> String {
        format!(
            "packages:{}:{}",
            self.target.server_name, self.target.branch
        )
    }
}

impl DataSource for MetadataPackagesConfig {
    fn kind(&self) -> &'static str {
        "gitops_metadata_packages"
    }

    fn read(&self, provider: &Provider) -> Result<ResourceState> {
        // Compile the filters before running anything.
        filter_packages(&[], &self.package_name_filter)?;

        let metadata = read_metadata(provider, &self.target, &self.kube_config_path)?;
        let packages = filter_packages(&metadata.packages, &self.package_name_filter)?;

        let packages = serde_json::to_value(packages).map_err(|e| {
            ProviderError::ParseError(format!("failed to serialize packages: {}", e))
        })?;
        Ok(ResourceState::new(self.id()).with("packages", packages))
    }
}
