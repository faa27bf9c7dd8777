//! `gitops_metadata`: record cluster metadata in the GitOps repository.

use super::Resource;
use super::types::*;
use crate::error::Result;
use crate::exec::CommandLine;
use crate::provider::Provider;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    #[serde(default)]
    pub gitops_namespace: String,

    /// Kube config of the cluster to inspect. Defaults to the inherited one.
    #[serde(default)]
    pub kube_config_path: String,

    #[serde(flatten)]
    pub target: GitopsTarget,
}

impl MetadataConfig {
    /// `metadata:serverName:branch`
    pub fn id(&self) -> String {
        format!(
            "metadata:{}:{}",
            self.target.server_name, self.target.branch
        )
    }

    fn command_line(&self, provider: &Provider) -> CommandLine {
        CommandLine::new("gitops-metadata-update")
            .flag("--branch", &self.target.branch)
            .flag("--serverName", &self.target.server_name)
            .optional("--caCert", &provider.config().ca_cert_file)
            .optional("--gitopsNamespace", &self.gitops_namespace)
            .flag_if("--debug", "true", provider.config().debug)
    }
}

impl Resource for MetadataConfig {
    fn kind(&self) -> &'static str {
        "gitops_metadata"
    }

    fn create(&self, provider: &Provider) -> Result<ResourceState> {
        self.target.validate()?;

        let env = provider
            .git_env(&self.target.credentials, &self.target.config)
            .var_if_set("KUBECONFIG", &self.kube_config_path);

        info!(
            "Updating gitops metadata: serverName={}, branch={}",
            self.target.server_name, self.target.branch
        );
        provider.run_locked(
            &self.target.lock_key(),
            &provider.gitops(self.command_line(provider), env),
        )?;

        Ok(ResourceState::new(self.id()))
    }

    /// Metadata stays in the repository.
    fn delete(&self, _provider: &Provider, _prior: Option<&ResourceState>) -> Result<()> {
        Ok(())
    }
}
