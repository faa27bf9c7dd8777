//! `gitops_service_account`: a service account with optional SCCs, roles and
//! rules, published through the toolkit service-account chart.

use super::Resource;
use super::module::ModuleRequest;
use super::rbac::{RbacRole, RbacRule, scope};
use super::types::*;
use crate::error::Result;
use crate::provider::Provider;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const SERVICE_ACCOUNT_CHART: &str = "service-account";
const SERVICE_ACCOUNT_CHART_VERSION: &str = "1.0.0";

fn default_tmp_dir() -> String {
    ".tmp/service-account".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountConfig {
    pub name: String,
    pub namespace: String,

    #[serde(default)]
    pub layer: Layer,

    /// Name of the service account. Defaults to the chart's own choice.
    #[serde(default)]
    pub service_account_name: String,

    #[serde(default = "default_true")]
    pub create_service_account: bool,

    /// Apply the rules to every service account in the namespace.
    #[serde(default)]
    pub all_service_accounts: bool,

    #[serde(default)]
    pub cluster_scope: bool,

    /// Namespace for the rbac rules. Defaults to the service account's.
    #[serde(default)]
    pub rbac_namespace: String,

    #[serde(default = "default_tmp_dir")]
    pub tmp_dir: String,

    /// Security context constraints, e.g. `anyuid` or `privileged`.
    #[serde(default)]
    pub sccs: Vec<String>,

    #[serde(default)]
    pub rules: Vec<RbacRule>,

    #[serde(default)]
    pub roles: Vec<RbacRole>,

    #[serde(flatten)]
    pub target: GitopsTarget,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceAccountValues<'a> {
    create: bool,
    all_service_accounts: bool,
    cluster_scope: bool,
    sccs: &'a [String],
    roles: &'a [RbacRole],
    rules: &'a [RbacRule],
    rbac_namespace: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl ServiceAccountConfig {
    fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        require("namespace", &self.namespace)?;
        self.target.validate()
    }

    fn scope(&self) -> &str {
        scope(self.cluster_scope, &self.namespace)
    }

    /// `scope:name:serverName:service-account`
    pub fn id(&self) -> String {
        format!(
            "{}:{}:{}:service-account",
            self.scope(),
            self.name,
            self.target.server_name
        )
    }

    fn write_values(&self) -> Result<String> {
        let values = ServiceAccountValues {
            create: self.create_service_account,
            all_service_accounts: self.all_service_accounts,
            cluster_scope: self.cluster_scope,
            sccs: &self.sccs,
            roles: &self.roles,
            rules: &self.rules,
            rbac_namespace: &self.rbac_namespace,
            name: Some(self.service_account_name.as_str()).filter(|n| !n.is_empty()),
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

impl Resource for ServiceAccountConfig {
    fn kind(&self) -> &'static str {
        "gitops_service_account"
    }

    fn create(&self, provider: &Provider) -> Result<ResourceState> {
        self.validate()?;
        let values_file = self.write_values()?;
        let source =
            ContentSource::toolkit_chart(SERVICE_ACCOUNT_CHART, SERVICE_ACCOUNT_CHART_VERSION);

        info!(
            "Provisioning gitops service account: name={}, namespace={}, serverName={}",
            self.name, self.namespace, self.target.server_name
        );
        self.request(&source, &values_file).run(provider, false)?;

        Ok(ResourceState::new(self.id()))
    }

    fn delete(&self, provider: &Provider, _prior: Option<&ResourceState>) -> Result<()> {
        self.validate()?;
        let source =
            ContentSource::toolkit_chart(SERVICE_ACCOUNT_CHART, SERVICE_ACCOUNT_CHART_VERSION);

        info!(
            "Destroying gitops service account: name={}, namespace={}, serverName={}",
            self.name, self.namespace, self.target.server_name
        );
        self.request(&source, "").run(provider, true)
    }
}
