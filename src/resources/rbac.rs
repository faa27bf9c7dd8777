//! `gitops_rbac`: roles and rules for an existing service account, published
//! through the toolkit rbac chart.

use super::Resource;
use super::module::ModuleRequest;
use super::types::*;
use crate::error::Result;
use crate::provider::Provider;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const RBAC_CHART: &str = "rbac";
const RBAC_CHART_VERSION: &str = "0.2.0";

fn default_tmp_dir() -> String {
    ".tmp/rbac".to_string()
}

/// One policy rule. Plan files use snake_case keys; the chart expects
/// camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RbacRule {
    #[serde(rename(serialize = "apiGroups", deserialize = "api_groups"))]
    pub api_groups: Vec<String>,

    pub resources: Vec<String>,

    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        rename(serialize = "resourceNames", deserialize = "resource_names")
    )]
    pub resource_names: Vec<String>,

    pub verbs: Vec<String>,
}

/// A cluster role bound to the service account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RbacRole {
    pub name: String,
}

/// `cluster` for cluster-scoped rules, the namespace otherwise.
pub(crate) fn scope(cluster_scope: bool, namespace: &str) -> &str {
    if cluster_scope { "cluster" } else { namespace }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RbacConfig {
    pub name: String,
    pub namespace: String,

    #[serde(default)]
    pub layer: Layer,

    #[serde(default)]
    pub cluster_scope: bool,

    #[serde(default)]
    pub service_account_name: String,

    /// Defaults to `namespace`.
    #[serde(default)]
    pub service_account_namespace: String,

    #[serde(default = "default_tmp_dir")]
    pub tmp_dir: String,

    #[serde(default)]
    pub rules: Vec<RbacRule>,

    #[serde(default)]
    pub roles: Vec<RbacRole>,

    #[serde(flatten)]
    pub target: GitopsTarget,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RbacValues<'a> {
    service_account: ServiceAccountRef<'a>,
    cluster_scope: bool,
    roles: &'a [RbacRole],
    rules: &'a [RbacRule],
}

#[derive(Debug, Serialize)]
struct ServiceAccountRef<'a> {
    name: &'a str,
    namespace: &'a str,
}

impl RbacConfig {
    fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        require("namespace", &self.namespace)?;
        self.target.validate()
    }

    fn scope(&self) -> &str {
        scope(self.cluster_scope, &self.namespace)
    }

    /// `scope:name:serverName:rbac`
    pub fn id(&self) -> String {
        format!(
            "{}:{}:{}:rbac",
            self.scope(),
            self.name,
            self.target.server_name
        )
    }

    fn write_values(&self) -> Result<String> {
        let service_account_namespace = if self.service_account_namespace.is_empty() {
            &self.namespace
        } else {
            &self.service_account_namespace
        };

        let values = RbacValues {
            service_account: ServiceAccountRef {
                name: &self.service_account_name,
                namespace: service_account_namespace,
            },
            cluster_scope: self.cluster_scope,
            roles: &self.roles,
            rules: &self.rules,
        };

        let dir = Path::new(&self.tmp_dir).join(self.scope()).join(&self.name);
        Ok(write_values(&dir, &values)?.display().to_string())
    }

    fn request<'a>(&'a self, source: &'a ContentSource, value_files: &'a str) -> ModuleRequest<'a> {
        ModuleRequest {
            name: &self.name,
            namespace: &self.namespace,
            layer: self.layer,
            module_type: ModuleType::Base,
            source,
            value_files,
            ignore_diff: "",
            target: &self.target,
        }
    }
}

impl Resource for RbacConfig {
    fn kind(&self) -> &'static str {
        "gitops_rbac"
    }

    fn create(&self, provider: &Provider) -> Result<ResourceState> {
        self.validate()?;
        let values_file = self.write_values()?;
        let source = ContentSource::toolkit_chart(RBAC_CHART, RBAC_CHART_VERSION);

        info!(
            "Provisioning gitops rbac: name={}, namespace={}, serverName={}",
            self.name, self.namespace, self.target.server_name
        );
        self.request(&source, &values_file).run(provider, false)?;

        Ok(ResourceState::new(self.id()))
    }

    fn delete(&self, provider: &Provider, _prior: Option<&ResourceState>) -> Result<()> {
        self.validate()?;
        let source = ContentSource::toolkit_chart(RBAC_CHART, RBAC_CHART_VERSION);

        info!(
            "Destroying gitops rbac: name={}, namespace={}, serverName={}",
            self.name, self.namespace, self.target.server_name
        );
        self.request(&source, "").run(provider, true)
    }
}
