//! `gitops_module`: a directory of manifests or a Helm chart published into
//! one layer of the GitOps repository.

use super::Resource;
use super::types::*;
use crate::error::Result;
use crate::exec::CommandLine;
use crate::provider::Provider;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleConfig {
    pub name: String,
    pub namespace: String,
    pub layer: Layer,

    #[serde(default, rename = "type")]
    pub module_type: ModuleType,

    #[serde(default)]
    pub content_dir: String,

    #[serde(default)]
    pub helm_repo_url: String,

    #[serde(default)]
    pub helm_chart: String,

    #[serde(default)]
    pub helm_chart_version: String,

    /// Comma-separated values files passed through to the chart.
    #[serde(default)]
    pub value_files: String,

    #[serde(default)]
    pub ignore_diff: String,

    #[serde(flatten)]
    pub target: GitopsTarget,
}

impl ModuleConfig {
    fn source(&self) -> Result<ContentSource> {
        require("name", &self.name)?;
        require("namespace", &self.namespace)?;
        self.target.validate()?;

        ContentSource::from_fields(
            &self.content_dir,
            &self.helm_repo_url,
            &self.helm_chart,
            &self.helm_chart_version,
        )
    }

    fn request<'a>(&'a self, source: &'a ContentSource) -> ModuleRequest<'a> {
        ModuleRequest {
            name: &self.name,
            namespace: &self.namespace,
            layer: self.layer,
            module_type: self.module_type,
            source,
            value_files: &self.value_files,
            ignore_diff: &self.ignore_diff,
            target: &self.target,
        }
    }
}

impl Resource for ModuleConfig {
    fn kind(&self) -> &'static str {
        "gitops_module"
    }

    fn create(&self, provider: &Provider) -> Result<ResourceState> {
        let source = self.source()?;
        let request = self.request(&source);

        info!(
            "Provisioning gitops module: name={}, namespace={}, serverName={}",
            self.name, self.namespace, self.target.server_name
        );
        request.run(provider, false)?;

        Ok(ResourceState::new(request.id()))
    }

    fn delete(&self, provider: &Provider, _prior: Option<&ResourceState>) -> Result<()> {
        let source = self.source()?;

        info!(
            "Destroying gitops module: name={}, namespace={}, serverName={}",
            self.name, self.namespace, self.target.server_name
        );
        self.request(&source).run(provider, true)
    }
}

/// One `gitops-module` call. Also used by the resources that publish a
/// generated chart or sealed secrets as a module.
pub(crate) struct ModuleRequest<'a> {
    pub name: &'a str,
    pub namespace: &'a str,
    pub layer: Layer,
    pub module_type: ModuleType,
    pub source: &'a ContentSource,
    pub value_files: &'a str,
    pub ignore_diff: &'a str,
    pub target: &'a GitopsTarget,
}

impl ModuleRequest<'_> {
    /// `namespace:name:serverName:layer:type`
    pub(crate) fn id(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.namespace, self.name, self.target.server_name, self.layer, self.module_type
        )
    }

    pub(crate) fn command_line(&self, delete: bool) -> CommandLine {
        let command = CommandLine::new("gitops-module")
            .positional(self.name)
            .flag("-n", self.namespace)
            .flag("--branch", &self.target.branch)
            .flag("--serverName", &self.target.server_name)
            .flag("--layer", self.layer.as_str())
            .flag("--type", self.module_type.as_str())
            .switch("--delete", delete);

        self.source
            .append_to(command)
            .optional("--valueFiles", self.value_files)
            .optional("--ignoreDiff", self.ignore_diff)
    }

    /// Run `gitops-module` under the lock of the target repository.
    pub(crate) fn run(&self, provider: &Provider, delete: bool) -> Result<()> {
        let command = provider.content_flags(self.command_line(delete));
        let env = provider.git_env(&self.target.credentials, &self.target.config);

        provider.run_locked(&self.target.lock_key(), &provider.gitops(command, env))?;
        Ok(())
    }
}
