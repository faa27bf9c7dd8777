//! `gitops_namespace`: a namespace published into the GitOps repository,
//! either from a content directory or from the toolkit namespace chart.

use super::Resource;
use super::types::*;
use crate::error::Result;
use crate::exec::CommandLine;
use crate::provider::Provider;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const NAMESPACE_CHART: &str = "namespace";
const NAMESPACE_CHART_VERSION: &str = "0.2.0";

fn default_tmp_dir() -> String {
    ".tmp/namespace".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamespaceConfig {
    pub name: String,

    /// Manifests to publish instead of the generated chart.
    #[serde(default)]
    pub content_dir: String,

    #[serde(default)]
    pub value_files: String,

    #[serde(default = "default_true")]
    pub create_operator_group: bool,

    #[serde(default = "default_argocd_namespace")]
    pub argocd_namespace: String,

    /// Scratch directory for the generated values file.
    #[serde(default = "default_tmp_dir")]
    pub tmp_dir: String,

    #[serde(flatten)]
    pub target: GitopsTarget,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceValues<'a> {
    create_operator_group: bool,
    argocd_namespace: &'a str,
    gitops_config: GitopsConfigValues,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GitopsConfigValues {
    create: bool,
    application_base_path: String,
    host: String,
    org: String,
    repo: String,
    branch: String,
}

impl NamespaceConfig {
    fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        self.target.validate()
    }

    /// `name:serverName:contentDir`
    pub fn id(&self) -> String {
        format!(
            "{}:{}:{}",
            self.name, self.target.server_name, self.content_dir
        )
    }

    fn base_command(&self, delete: bool) -> CommandLine {
        CommandLine::new("gitops-namespace")
            .positional(&self.name)
            .flag("--branch", &self.target.branch)
            .flag("--serverName", &self.target.server_name)
            .switch("--delete", delete)
    }

    /// Content for create: the configured directory, or the namespace chart
    /// with a values file generated under `tmp_dir`.
    fn create_command(&self) -> Result<CommandLine> {
        let command = self.base_command(false);

        if !self.content_dir.is_empty() {
            return Ok(command
                .flag("--contentDir", &self.content_dir)
                .optional("--valueFiles", &self.value_files));
        }

        let values = NamespaceValues {
            create_operator_group: self.create_operator_group,
            argocd_namespace: &self.argocd_namespace,
            gitops_config: GitopsConfigValues::default(),
        };
        let dir = Path::new(&self.tmp_dir).join("namespace").join(&self.name);
        let values_file = write_values(&dir, &values)?;

        Ok(ContentSource::toolkit_chart(NAMESPACE_CHART, NAMESPACE_CHART_VERSION)
            .append_to(command)
            .flag("--valueFiles", &values_file.display().to_string()))
    }

    fn delete_command(&self) -> CommandLine {
        self.base_command(true)
            .optional("--contentDir", &self.content_dir)
            .optional("--valueFiles", &self.value_files)
    }

    fn run(&self, provider: &Provider, command: CommandLine) -> Result<()> {
        let env = provider.git_env(&self.target.credentials, &self.target.config);
        let invocation = provider.gitops(provider.content_flags(command), env);

        provider.run_locked(&self.target.lock_key(), &invocation)?;
        Ok(())
    }
}

impl Resource for NamespaceConfig {
    fn kind(&self) -> &'static str {
        "gitops_namespace"
    }

    fn create(&self, provider: &Provider) -> Result<ResourceState> {
        self.validate()?;
        let command = self.create_command()?;

        info!(
            "Provisioning gitops namespace: name={}, serverName={}",
            self.name, self.target.server_name
        );
        self.run(provider, command)?;

        Ok(ResourceState::new(self.id()))
    }

    fn delete(&self, provider: &Provider, _prior: Option<&ResourceState>) -> Result<()> {
        self.validate()?;

        info!(
            "Destroying gitops namespace: name={}, serverName={}",
            self.name, self.target.server_name
        );
        self.run(provider, self.delete_command())
    }
}
